//! The ECC200 symbol-size table and lookup (spec §4.5 "SymbolInfo table").

/// Which symbol shape the caller will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolShape {
    /// Either square or rectangular.
    #[default]
    None,
    /// Square only.
    Square,
    /// Rectangular only.
    Rectangle,
}

/// One row of the ECC200 symbol-size table: a fixed (data capacity, error
/// codewords, matrix size, data-region count) tuple, plus the optional
/// per-block interleaving sizes used by the four largest (144x144-class)
/// symbols.
#[derive(Debug, Clone, Copy)]
pub struct SymbolInfo {
    /// Whether this is one of the eight defined rectangular sizes.
    pub rectangular: bool,
    /// Total data codeword capacity.
    pub data_capacity: u32,
    /// Total error-correction codeword count.
    pub error_codewords: u32,
    /// Width, in modules, of a single data region (excludes finder/timing).
    pub matrix_width: u32,
    /// Height, in modules, of a single data region.
    pub matrix_height: u32,
    /// Number of data regions tiled across the symbol (1, 2, 4, 16 or 36).
    pub data_regions: u32,
    /// Data codewords per interleaved RS block (0 means "use `data_capacity`
    /// directly", i.e. this symbol has a single uninterleaved block).
    rs_block_data: u32,
    /// Error codewords per interleaved RS block.
    rs_block_error: u32,
}

impl SymbolInfo {
    const fn square(data_capacity: u32, error_codewords: u32, matrix_size: u32, data_regions: u32) -> Self {
        Self::rect(false, data_capacity, error_codewords, matrix_size, matrix_size, data_regions, 0, 0)
    }

    const fn rectangle(
        data_capacity: u32,
        error_codewords: u32,
        matrix_width: u32,
        matrix_height: u32,
        data_regions: u32,
    ) -> Self {
        Self::rect(true, data_capacity, error_codewords, matrix_width, matrix_height, data_regions, 0, 0)
    }

    #[allow(clippy::too_many_arguments)]
    const fn rect(
        rectangular: bool,
        data_capacity: u32,
        error_codewords: u32,
        matrix_width: u32,
        matrix_height: u32,
        data_regions: u32,
        rs_block_data: u32,
        rs_block_error: u32,
    ) -> Self {
        Self {
            rectangular,
            data_capacity,
            error_codewords,
            matrix_width,
            matrix_height,
            data_regions,
            rs_block_data,
            rs_block_error,
        }
    }

    /// Number of data regions tiled horizontally.
    pub fn horizontal_data_regions(&self) -> u32 {
        match self.data_regions {
            1 => 1,
            2 => 2,
            4 => 2,
            16 => 4,
            36 => 6,
            other => unreachable!("unsupported data-region count {other}"),
        }
    }

    /// Number of data regions tiled vertically.
    pub fn vertical_data_regions(&self) -> u32 {
        match self.data_regions {
            1 => 1,
            2 => 1,
            4 => 2,
            16 => 4,
            36 => 6,
            other => unreachable!("unsupported data-region count {other}"),
        }
    }

    /// Full data-area width across all tiled regions.
    pub fn symbol_data_width(&self) -> u32 {
        self.horizontal_data_regions() * self.matrix_width
    }

    /// Full data-area height across all tiled regions.
    pub fn symbol_data_height(&self) -> u32 {
        self.vertical_data_regions() * self.matrix_height
    }

    /// Total module width, including the per-region finder/timing border.
    pub fn symbol_width(&self) -> u32 {
        self.symbol_data_width() + self.horizontal_data_regions() * 2
    }

    /// Total module height, including the per-region finder/timing border.
    pub fn symbol_height(&self) -> u32 {
        self.symbol_data_height() + self.vertical_data_regions() * 2
    }

    /// Total codewords (data plus error correction).
    pub fn codeword_count(&self) -> u32 {
        self.data_capacity + self.error_codewords
    }

    /// Number of interleaved Reed-Solomon blocks.
    pub fn interleaved_block_count(&self) -> u32 {
        if self.rs_block_data > 0 {
            self.data_capacity / self.rs_block_data
        } else {
            10 // the 144x144 symbol interleaves 8 blocks of 156 plus 2 of 155
        }
    }

    /// Data-codeword length of interleaved block `index` (0-based).
    pub fn data_length_for_interleaved_block(&self, index: u32) -> u32 {
        if self.rs_block_data > 0 {
            self.rs_block_data
        } else if index < 8 {
            156
        } else {
            155
        }
    }

    /// Error-codeword length of every interleaved block.
    pub fn error_length_for_interleaved_block(&self) -> u32 {
        self.rs_block_error
    }
}

/// The 30 ECC200 symbol sizes defined by ISO/IEC 16022, in ascending data
/// capacity order (24 square, 6 rectangular) — ties broken in favour of the
/// next symbol [`lookup`] tries.
pub const SYMBOLS: [SymbolInfo; 30] = [
    SymbolInfo::square(3, 5, 8, 1),
    SymbolInfo::square(5, 7, 10, 1),
    SymbolInfo::rectangle(5, 7, 16, 6, 1),
    SymbolInfo::square(8, 10, 12, 1),
    SymbolInfo::rectangle(10, 11, 14, 6, 2),
    SymbolInfo::square(12, 12, 14, 1),
    SymbolInfo::rectangle(16, 14, 24, 10, 1),
    SymbolInfo::square(18, 14, 16, 1),
    SymbolInfo::square(22, 18, 18, 1),
    SymbolInfo::rectangle(22, 18, 16, 10, 2),
    SymbolInfo::square(30, 20, 20, 1),
    SymbolInfo::rectangle(32, 24, 16, 14, 2),
    SymbolInfo::square(36, 24, 22, 1),
    SymbolInfo::square(44, 28, 24, 1),
    SymbolInfo::rectangle(49, 28, 22, 14, 2),
    SymbolInfo::square(62, 36, 14, 4),
    SymbolInfo::square(86, 42, 16, 4),
    SymbolInfo::square(114, 48, 18, 4),
    SymbolInfo::square(144, 56, 20, 4),
    SymbolInfo::square(174, 68, 22, 4),
    SymbolInfo::rect(false, 204, 84, 24, 24, 4, 102, 42),
    SymbolInfo::rect(false, 280, 112, 14, 14, 16, 140, 56),
    SymbolInfo::rect(false, 368, 144, 16, 16, 16, 92, 36),
    SymbolInfo::rect(false, 456, 192, 18, 18, 16, 114, 48),
    SymbolInfo::rect(false, 576, 224, 20, 20, 16, 144, 56),
    SymbolInfo::rect(false, 696, 272, 22, 22, 16, 174, 68),
    SymbolInfo::rect(false, 816, 336, 24, 24, 16, 136, 56),
    SymbolInfo::rect(false, 1050, 408, 18, 18, 36, 175, 68),
    SymbolInfo::rect(false, 1304, 496, 20, 20, 36, 163, 62),
    SymbolInfo::rect(false, 1558, 620, 22, 22, 36, 0, 62),
];

/// Find the smallest symbol whose data capacity is at least `data_codewords`,
/// honouring an optional shape hint and/or module-size bounds.
pub fn lookup(
    data_codewords: u32,
    shape: SymbolShape,
    min_width: Option<u32>,
    min_height: Option<u32>,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Option<&'static SymbolInfo> {
    SYMBOLS.iter().find(|symbol| {
        if shape == SymbolShape::Square && symbol.rectangular {
            return false;
        }
        if shape == SymbolShape::Rectangle && !symbol.rectangular {
            return false;
        }
        if let (Some(w), Some(h)) = (min_width, min_height) {
            if symbol.symbol_width() < w || symbol.symbol_height() < h {
                return false;
            }
        }
        if let (Some(w), Some(h)) = (max_width, max_height) {
            if symbol.symbol_width() > w || symbol.symbol_height() > h {
                return false;
            }
        }
        data_codewords <= symbol.data_capacity
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_symbol_holds_three_codewords() {
        let info = lookup(3, SymbolShape::None, None, None, None, None).unwrap();
        assert_eq!(info.data_capacity, 3);
        assert_eq!(info.symbol_width(), 10);
        assert_eq!(info.symbol_height(), 10);
    }

    #[test]
    fn square_hint_skips_rectangular_entries() {
        // 6 data codewords: the next fit by capacity alone is the 5/7 rectangle,
        // but a square-only hint should skip it for the 8/10 square.
        let info = lookup(6, SymbolShape::Square, None, None, None, None).unwrap();
        assert!(!info.rectangular);
        assert_eq!(info.data_capacity, 8);
    }

    #[test]
    fn largest_symbol_interleaves_ten_blocks() {
        let info = &SYMBOLS[29];
        assert_eq!(info.interleaved_block_count(), 10);
        assert_eq!(info.data_length_for_interleaved_block(0), 156);
        assert_eq!(info.data_length_for_interleaved_block(9), 155);
    }

    #[test]
    fn data_region_tiling_matches_symbol_size() {
        let info = &SYMBOLS[20]; // 204 data codewords, 24x24 per region, 4 regions (2x2)
        assert_eq!(info.horizontal_data_regions(), 2);
        assert_eq!(info.vertical_data_regions(), 2);
        assert_eq!(info.symbol_width(), 2 * 24 + 2 * 2);
    }
}
