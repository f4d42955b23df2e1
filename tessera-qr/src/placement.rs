//! Full QR Code module placement: function patterns (finder, separator,
//! timing, alignment, dark module, format/version reserved areas), the
//! zigzag data placement order, and mask application (ISO/IEC 18004 §6.3,
//! §7.7; no placement source was retrieved, so transcribed from the
//! well-known reference placement order shared by public QR encoders).

use tessera_common::BitMatrix;

use crate::tables::{self, EcLevel};

/// Tracks which modules are function patterns (finder/timing/alignment/etc)
/// so the data zigzag can skip them, both when writing and reading back.
/// Width and height are tracked separately so the same type covers
/// rectangular rMQR symbols, not just square full QR / Micro QR ones.
pub struct FunctionPatterns {
    reserved: Vec<bool>,
    width: usize,
    height: usize,
}

impl FunctionPatterns {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self { reserved: vec![false; width * height], width, height }
    }

    pub(crate) fn mark(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.reserved[y as usize * self.width + x as usize] = true;
        }
    }

    pub fn is_reserved(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return true;
        }
        self.reserved[y as usize * self.width + x as usize]
    }
}

pub(crate) fn place_finder(matrix: &mut BitMatrix, fp: &mut FunctionPatterns, cx: i32, cy: i32) {
    for dy in -4..=4i32 {
        for dx in -4..=4i32 {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= matrix.width() || y >= matrix.height() {
                continue;
            }
            let d = dx.abs().max(dy.abs());
            let set = d != 4 && d != 2;
            matrix.set(x, y, set);
            fp.mark(x, y);
        }
    }
}

/// Lay out the finder/separator/timing/alignment/dark-module function
/// patterns for a full QR symbol of `version`, returning the reservation
/// mask used to drive data placement.
pub fn place_function_patterns(matrix: &mut BitMatrix, version: u32) -> FunctionPatterns {
    let size = matrix.width() as usize;
    let mut fp = FunctionPatterns::new(size, size);
    let dim = size as i32;

    place_finder(matrix, &mut fp, 3, 3);
    place_finder(matrix, &mut fp, dim - 4, 3);
    place_finder(matrix, &mut fp, 3, dim - 4);

    for i in 0..dim {
        matrix.set(i, 6, i % 2 == 0);
        fp.mark(i, 6);
        matrix.set(6, i, i % 2 == 0);
        fp.mark(6, i);
    }

    let positions = tables::ALIGNMENT_POSITIONS[(version - 1) as usize];
    for &cy in positions {
        for &cx in positions {
            let (cx, cy) = (cx as i32, cy as i32);
            if fp.is_reserved(cx, cy) {
                continue;
            }
            for dy in -2..=2i32 {
                for dx in -2..=2i32 {
                    let d = dx.abs().max(dy.abs());
                    matrix.set(cx + dx, cy + dy, d != 1);
                    fp.mark(cx + dx, cy + dy);
                }
            }
        }
    }

    matrix.set(8, dim - 8, true);
    fp.mark(8, dim - 8);

    for i in 0..9 {
        fp.mark(i, 8);
        fp.mark(8, i);
    }
    for i in (dim - 8)..dim {
        fp.mark(i, 8);
        fp.mark(8, i);
    }

    if version >= 7 {
        for i in 0..6 {
            for j in 0..3 {
                fp.mark(dim - 11 + j, i);
                fp.mark(i, dim - 11 + j);
            }
        }
    }

    fp
}

/// Write the two copies of 15-bit format info around the finder patterns.
pub fn place_format_info(matrix: &mut BitMatrix, level: EcLevel, mask_pattern: u32) {
    let bits = tables::format_info_bits(level, mask_pattern);
    let dim = matrix.width();
    let get_bit = |i: u32| (bits >> i) & 1 == 1;

    // Around the top-left finder.
    for i in 0..6 {
        matrix.set(8, i, get_bit(i));
    }
    matrix.set(8, 7, get_bit(6));
    matrix.set(8, 8, get_bit(7));
    matrix.set(7, 8, get_bit(8));
    for i in 9..15 {
        matrix.set(14 - i, 8, get_bit(i));
    }

    // Top-right / bottom-left copies.
    for i in 0..8 {
        matrix.set(dim - 1 - i as i32, 8, get_bit(i));
    }
    for i in 8..15 {
        matrix.set(8, dim - (15 - i as i32), get_bit(i));
    }
}

/// Read back the more reliable (top-left) copy of the format info bits.
pub fn read_format_info(matrix: &BitMatrix) -> u32 {
    let mut bits = 0u32;
    for i in 0..6 {
        bits |= (matrix.get(8, i) as u32) << i;
    }
    bits |= (matrix.get(8, 7) as u32) << 6;
    bits |= (matrix.get(8, 8) as u32) << 7;
    bits |= (matrix.get(7, 8) as u32) << 8;
    for i in 9..15 {
        bits |= (matrix.get(14 - i, 8) as u32) << i;
    }
    bits
}

/// Write the two copies of 18-bit version info (version ≥ 7 only).
pub fn place_version_info(matrix: &mut BitMatrix, version: u32) {
    if version < 7 {
        return;
    }
    let bits = tables::version_info_bits(version);
    let dim = matrix.width();
    for i in 0..18u32 {
        let bit = (bits >> i) & 1 == 1;
        let a = (i / 3) as i32;
        let b = (i % 3) as i32;
        matrix.set(dim - 11 + b, a, bit);
        matrix.set(a, dim - 11 + b, bit);
    }
}

/// Read back the bottom-left copy of the 18-bit version info.
pub fn read_version_info(matrix: &BitMatrix) -> u32 {
    let dim = matrix.width();
    let mut bits = 0u32;
    for i in 0..18u32 {
        let a = (i / 3) as i32;
        let b = (i % 3) as i32;
        if matrix.get(a, dim - 11 + b) {
            bits |= 1 << i;
        }
    }
    bits
}

/// Place `data` (already masked, one bit set per module) into the
/// non-reserved modules following the up/down zigzag column order (skipping
/// the vertical timing column), returning the number of bits written.
pub fn place_data_bits(matrix: &mut BitMatrix, fp: &FunctionPatterns, bits: &[bool]) -> usize {
    let mut idx = 0usize;
    visit_zigzag(matrix.width(), matrix.height(), Some(6), |x, y| {
        if !fp.is_reserved(x, y) {
            if let Some(&bit) = bits.get(idx) {
                matrix.set(x, y, bit);
            }
            idx += 1;
        }
    });
    idx
}

/// Read back module values in the same zigzag order [`place_data_bits`] uses.
pub fn read_data_bits(matrix: &BitMatrix, fp: &FunctionPatterns) -> Vec<bool> {
    let mut out = Vec::new();
    visit_zigzag(matrix.width(), matrix.height(), Some(6), |x, y| {
        if !fp.is_reserved(x, y) {
            out.push(matrix.get(x, y));
        }
    });
    out
}

/// Apply/unapply the given mask pattern to every non-reserved module.
pub fn apply_mask(matrix: &mut BitMatrix, fp: &FunctionPatterns, pattern: u32) {
    let dim = matrix.width();
    for y in 0..dim {
        for x in 0..dim {
            if !fp.is_reserved(x, y) && crate::mask::applies(pattern, x, y) {
                matrix.set(x, y, !matrix.get(x, y));
            }
        }
    }
}

/// Walk the up/down two-column zigzag full QR, Micro QR and rMQR all place
/// data in, from the rightmost column inward. `skip_col`, when set, is an
/// extra column (the vertical timing line) stepped over without being
/// visited; Micro QR and rMQR have no such column since their single timing
/// line runs along column 0, already outside the zigzag's `x > 0` range.
pub(crate) fn visit_zigzag(width: i32, height: i32, skip_col: Option<i32>, mut visit: impl FnMut(i32, i32)) {
    let mut x = width - 1;
    let mut upward = true;
    while x > 0 {
        if Some(x) == skip_col {
            x -= 1;
        }
        let ys: Box<dyn Iterator<Item = i32>> = if upward { Box::new((0..height).rev()) } else { Box::new(0..height) };
        for y in ys {
            visit(x, y);
            visit(x - 1, y);
        }
        x -= 2;
        upward = !upward;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_pattern_marks_finder_corners() {
        let mut matrix = BitMatrix::new(21, 21);
        let fp = place_function_patterns(&mut matrix, 1);
        assert!(fp.is_reserved(3, 3));
        assert!(fp.is_reserved(17, 3));
        assert!(fp.is_reserved(3, 17));
        assert!(matrix.get(3, 3));
    }

    #[test]
    fn format_info_round_trips_through_placement() {
        let mut matrix = BitMatrix::new(21, 21);
        place_function_patterns(&mut matrix, 1);
        place_format_info(&mut matrix, EcLevel::M, 3);
        let bits = read_format_info(&matrix);
        assert_eq!(tables::decode_format_info(bits), Some((EcLevel::M, 3)));
    }

    #[test]
    fn version_info_round_trips_for_version_7() {
        let mut matrix = BitMatrix::new(45, 45);
        place_function_patterns(&mut matrix, 7);
        place_version_info(&mut matrix, 7);
        let bits = read_version_info(&matrix);
        assert_eq!(tables::decode_version_info(bits), Some(7));
    }

    #[test]
    fn data_bits_round_trip_through_placement() {
        let mut matrix = BitMatrix::new(21, 21);
        let fp = place_function_patterns(&mut matrix, 1);
        let capacity = (0..21).flat_map(|y| (0..21).map(move |x| (x, y))).filter(|&(x, y)| !fp.is_reserved(x, y)).count();
        let bits: Vec<bool> = (0..capacity).map(|i| i % 3 == 0).collect();
        place_data_bits(&mut matrix, &fp, &bits);
        let read_back = read_data_bits(&matrix, &fp);
        assert_eq!(read_back, bits);
    }
}
