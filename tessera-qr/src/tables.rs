//! Version geometry and error-correction block tables (spec §4.9 supplement;
//! no QR table source was retrieved, so these are transcribed from the
//! well-known ISO/IEC 18004 Annex tables reproduced across public QR
//! implementations rather than ported from `original_source`).

/// Error-correction level, ordered low to high as the two format-info bits
/// encode it (`01=L, 00=M, 11=Q, 10=H`, per ISO/IEC 18004 Table 25).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcLevel {
    /// ~7% recovery.
    L,
    /// ~15% recovery.
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    H,
}

impl EcLevel {
    pub(crate) fn format_bits(self) -> u32 {
        match self {
            EcLevel::L => 0b01,
            EcLevel::M => 0b00,
            EcLevel::Q => 0b11,
            EcLevel::H => 0b10,
        }
    }

    pub(crate) fn from_format_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b01 => EcLevel::L,
            0b00 => EcLevel::M,
            0b11 => EcLevel::Q,
            _ => EcLevel::H,
        }
    }
}

/// Row-count alignment-pattern centre coordinates for QR versions 2-40
/// (version 1 has none); every symbol also has implicit centres at module 6
/// and `dimension - 7`, which are folded into this table already.
pub const ALIGNMENT_POSITIONS: [&[u32]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

/// Dimension in modules for a given full-QR `version` (1-40).
pub fn dimension(version: u32) -> u32 {
    17 + 4 * version
}

/// Total raw data+ECC bit capacity for `version`, computed from first
/// principles (finder/separator/timing/alignment/format/version overhead)
/// rather than tabulated, following the well-known formula used by
/// Project Nayuki's public-domain QR Code generator.
pub fn raw_data_modules(version: u32) -> u32 {
    let mut result = (16 * version + 128) * version + 64;
    if version >= 2 {
        let num_align = version / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if version >= 7 {
            result -= 36;
        }
    }
    result
}

/// Total codewords available to data+ECC for `version` (raw modules / 8,
/// dropping the few unused "remainder bits" some versions have).
pub fn total_codewords(version: u32) -> u32 {
    raw_data_modules(version) / 8
}

/// Per-block Reed-Solomon layout for one (version, level) combination:
/// `ec_per_block` error-correction codewords, plus one or two groups of
/// blocks, each block in a group carrying `data_per_block` data codewords.
#[derive(Debug, Clone, Copy)]
pub struct EcBlocks {
    /// Error-correction codewords carried by every block.
    pub ec_per_block: u32,
    /// Blocks in the first group and their data codeword count.
    pub group1: (u32, u32),
    /// Blocks in the second group and their data codeword count (0 blocks if
    /// the version/level has only one group).
    pub group2: (u32, u32),
}

impl EcBlocks {
    pub(crate) fn block_count(&self) -> u32 {
        self.group1.0 + self.group2.0
    }

    pub(crate) fn total_data_codewords(&self) -> u32 {
        self.group1.0 * self.group1.1 + self.group2.0 * self.group2.1
    }
}

/// ISO/IEC 18004 Table 9: error-correction block layout indexed by
/// `[version - 1][level]` (`level` ordered L, M, Q, H).
pub fn ec_blocks(version: u32, level: EcLevel) -> EcBlocks {
    let idx = level as usize;
    EC_BLOCK_TABLE[(version - 1) as usize][idx]
}

macro_rules! blocks {
    ($ec:expr, $g1n:expr, $g1d:expr) => {
        EcBlocks { ec_per_block: $ec, group1: ($g1n, $g1d), group2: (0, 0) }
    };
    ($ec:expr, $g1n:expr, $g1d:expr, $g2n:expr, $g2d:expr) => {
        EcBlocks { ec_per_block: $ec, group1: ($g1n, $g1d), group2: ($g2n, $g2d) }
    };
}

static EC_BLOCK_TABLE: [[EcBlocks; 4]; 40] = [
    [blocks!(7, 1, 19), blocks!(10, 1, 16), blocks!(13, 1, 13), blocks!(17, 1, 9)],
    [blocks!(10, 1, 34), blocks!(16, 1, 28), blocks!(22, 1, 22), blocks!(28, 1, 16)],
    [blocks!(15, 1, 55), blocks!(26, 1, 44), blocks!(18, 2, 17), blocks!(22, 2, 13)],
    [blocks!(20, 1, 80), blocks!(18, 2, 32), blocks!(26, 2, 24), blocks!(16, 4, 9)],
    [blocks!(26, 1, 108), blocks!(24, 2, 43), blocks!(18, 2, 15, 2, 16), blocks!(22, 2, 11, 2, 12)],
    [blocks!(18, 2, 68), blocks!(16, 4, 27), blocks!(24, 4, 19), blocks!(28, 4, 15)],
    [blocks!(20, 2, 78), blocks!(18, 4, 31), blocks!(18, 2, 14, 4, 15), blocks!(26, 4, 13, 1, 14)],
    [blocks!(24, 2, 97), blocks!(22, 2, 38, 2, 39), blocks!(22, 4, 18, 2, 19), blocks!(26, 4, 14, 2, 15)],
    [blocks!(30, 2, 116), blocks!(22, 3, 36, 2, 37), blocks!(20, 4, 16, 4, 17), blocks!(24, 4, 12, 4, 13)],
    [blocks!(18, 2, 68, 2, 69), blocks!(26, 4, 43, 1, 44), blocks!(24, 6, 19, 2, 20), blocks!(28, 6, 15, 2, 16)],
    [blocks!(20, 4, 81), blocks!(30, 1, 50, 4, 51), blocks!(28, 4, 22, 4, 23), blocks!(24, 3, 12, 8, 13)],
    [blocks!(24, 2, 92, 2, 93), blocks!(22, 6, 36, 2, 37), blocks!(26, 4, 20, 6, 21), blocks!(28, 7, 14, 4, 15)],
    [blocks!(26, 4, 107), blocks!(22, 8, 37, 1, 38), blocks!(24, 8, 20, 4, 21), blocks!(22, 12, 11, 4, 12)],
    [blocks!(30, 3, 115, 1, 116), blocks!(24, 4, 40, 5, 41), blocks!(20, 11, 16, 5, 17), blocks!(24, 11, 12, 5, 13)],
    [blocks!(22, 5, 87, 1, 88), blocks!(24, 5, 41, 5, 42), blocks!(30, 5, 24, 7, 25), blocks!(24, 11, 12, 7, 13)],
    [blocks!(24, 5, 98, 1, 99), blocks!(28, 7, 45, 3, 46), blocks!(24, 15, 19, 2, 20), blocks!(30, 3, 15, 13, 16)],
    [blocks!(28, 1, 107, 5, 108), blocks!(28, 10, 46, 1, 47), blocks!(28, 1, 22, 15, 23), blocks!(28, 2, 14, 17, 15)],
    [blocks!(30, 5, 120, 1, 121), blocks!(26, 9, 43, 4, 44), blocks!(28, 17, 22, 1, 23), blocks!(28, 2, 14, 19, 15)],
    [blocks!(28, 3, 113, 4, 114), blocks!(26, 3, 44, 11, 45), blocks!(26, 17, 21, 4, 22), blocks!(26, 9, 13, 16, 14)],
    [blocks!(28, 3, 107, 5, 108), blocks!(26, 3, 41, 13, 42), blocks!(30, 15, 24, 5, 25), blocks!(28, 15, 15, 10, 16)],
    [blocks!(28, 4, 116, 4, 117), blocks!(26, 17, 42), blocks!(28, 17, 22, 6, 23), blocks!(30, 19, 16, 6, 17)],
    [blocks!(28, 2, 111, 7, 112), blocks!(28, 17, 46), blocks!(30, 7, 24, 16, 25), blocks!(24, 34, 13)],
    [blocks!(30, 4, 121, 5, 122), blocks!(28, 4, 47, 14, 48), blocks!(30, 11, 24, 14, 25), blocks!(30, 16, 15, 14, 16)],
    [blocks!(30, 6, 117, 4, 118), blocks!(28, 6, 45, 14, 46), blocks!(30, 11, 24, 16, 25), blocks!(30, 30, 16, 2, 17)],
    [blocks!(26, 8, 106, 4, 107), blocks!(28, 8, 47, 13, 48), blocks!(30, 7, 24, 22, 25), blocks!(30, 22, 15, 13, 16)],
    [blocks!(28, 10, 114, 2, 115), blocks!(28, 19, 46, 4, 47), blocks!(28, 28, 22, 6, 23), blocks!(30, 33, 16, 4, 17)],
    [blocks!(30, 8, 122, 4, 123), blocks!(28, 22, 45, 3, 46), blocks!(30, 8, 23, 26, 24), blocks!(30, 12, 15, 28, 16)],
    [blocks!(30, 3, 117, 10, 118), blocks!(28, 3, 45, 23, 46), blocks!(30, 4, 24, 31, 25), blocks!(30, 11, 15, 31, 16)],
    [blocks!(30, 7, 116, 7, 117), blocks!(28, 21, 45, 7, 46), blocks!(30, 1, 23, 37, 24), blocks!(30, 19, 15, 26, 16)],
    [blocks!(30, 5, 115, 10, 116), blocks!(28, 19, 47, 10, 48), blocks!(30, 15, 24, 25, 25), blocks!(30, 23, 15, 25, 16)],
    [blocks!(30, 13, 115, 3, 116), blocks!(28, 2, 46, 29, 47), blocks!(30, 42, 24, 1, 25), blocks!(30, 23, 15, 28, 16)],
    [blocks!(30, 17, 115), blocks!(28, 10, 46, 23, 47), blocks!(30, 10, 24, 35, 25), blocks!(30, 19, 15, 35, 16)],
    [blocks!(30, 17, 115, 1, 116), blocks!(28, 14, 46, 21, 47), blocks!(30, 29, 24, 19, 25), blocks!(30, 11, 15, 46, 16)],
    [blocks!(30, 13, 115, 6, 116), blocks!(28, 14, 46, 23, 47), blocks!(30, 44, 24, 7, 25), blocks!(30, 59, 16, 1, 17)],
    [blocks!(30, 12, 121, 7, 122), blocks!(28, 12, 47, 26, 48), blocks!(30, 39, 24, 14, 25), blocks!(30, 22, 15, 41, 16)],
    [blocks!(30, 6, 121, 14, 122), blocks!(28, 6, 47, 34, 48), blocks!(30, 46, 24, 10, 25), blocks!(30, 2, 15, 64, 16)],
    [blocks!(30, 17, 122, 4, 123), blocks!(28, 29, 46, 14, 47), blocks!(30, 49, 24, 10, 25), blocks!(30, 24, 15, 46, 16)],
    [blocks!(30, 4, 122, 18, 123), blocks!(28, 13, 46, 32, 47), blocks!(30, 48, 24, 14, 25), blocks!(30, 42, 15, 32, 16)],
    [blocks!(30, 20, 117, 4, 118), blocks!(28, 40, 47, 7, 48), blocks!(30, 43, 24, 22, 25), blocks!(30, 10, 15, 67, 16)],
    [blocks!(30, 19, 118, 6, 119), blocks!(28, 18, 47, 31, 48), blocks!(30, 34, 24, 34, 25), blocks!(30, 20, 15, 61, 16)],
];

/// Append a BCH(15,5) parity to a 5-bit `data` value (generator
/// `0b10100110111`, the polynomial ISO/IEC 18004 uses for both full QR's and
/// Micro QR's format info, shared here since they differ only in the data
/// layout and XOR mask layered on top).
pub(crate) fn bch_15_5(data: u32) -> u32 {
    let mut value = data << 10;
    const GENERATOR: u32 = 0b10100110111;
    for i in (10..15).rev() {
        if value & (1 << i) != 0 {
            value ^= GENERATOR << (i - 10);
        }
    }
    (data << 10) | value
}

/// Compute the 15-bit format-info codeword (5 data bits + BCH(15,5) parity,
/// XOR-masked) for an EC level and mask pattern.
pub fn format_info_bits(level: EcLevel, mask_pattern: u32) -> u32 {
    let data = (level.format_bits() << 3) | (mask_pattern & 0x7);
    bch_15_5(data) ^ 0x5412
}

/// Decode a 15-bit (possibly corrupted) format-info value to the closest
/// `(level, mask)` by minimum Hamming distance against all 32 valid codes.
pub fn decode_format_info(bits: u32) -> Option<(EcLevel, u32)> {
    let mut best: Option<(u32, EcLevel, u32)> = None;
    for level in [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H] {
        for mask in 0..8u32 {
            let candidate = format_info_bits(level, mask);
            let distance = (candidate ^ bits).count_ones();
            if best.is_none_or(|(d, ..)| distance < d) {
                best = Some((distance, level, mask));
            }
        }
    }
    best.filter(|(d, ..)| *d <= 3).map(|(_, level, mask)| (level, mask))
}

/// Compute the 18-bit version-info codeword (6 data bits + BCH(18,6) parity)
/// carried by symbols version 7 and up.
pub fn version_info_bits(version: u32) -> u32 {
    let mut value = version << 12;
    const GENERATOR: u32 = 0b1111100100101;
    for i in (12..18).rev() {
        if value & (1 << i) != 0 {
            value ^= GENERATOR << (i - 12);
        }
    }
    (version << 12) | value
}

/// Decode an 18-bit (possibly corrupted) version-info value to the closest
/// version (7-40) by minimum Hamming distance.
pub fn decode_version_info(bits: u32) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for version in 7..=40u32 {
        let candidate = version_info_bits(version);
        let distance = (candidate ^ bits).count_ones();
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, version));
        }
    }
    best.filter(|(d, _)| *d <= 3).map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_codewords_matches_known_version_1_and_40() {
        assert_eq!(total_codewords(1), 26);
        assert_eq!(total_codewords(40), 3706);
    }

    #[test]
    fn ec_block_layout_sums_to_total_codewords() {
        for version in 1..=40u32 {
            for level in [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H] {
                let blocks = ec_blocks(version, level);
                let total = blocks.total_data_codewords() + blocks.block_count() * blocks.ec_per_block;
                assert_eq!(total, total_codewords(version), "version {version} level {level:?}");
            }
        }
    }

    #[test]
    fn format_info_round_trips_through_decode() {
        let bits = format_info_bits(EcLevel::Q, 5);
        assert_eq!(decode_format_info(bits), Some((EcLevel::Q, 5)));
    }

    #[test]
    fn format_info_decode_tolerates_bit_errors() {
        let bits = format_info_bits(EcLevel::H, 2) ^ 0b100; // flip one bit
        assert_eq!(decode_format_info(bits), Some((EcLevel::H, 2)));
    }

    #[test]
    fn version_info_round_trips_for_version_7() {
        let bits = version_info_bits(7);
        assert_eq!(decode_version_info(bits), Some(7));
    }
}
