//! Micro QR and rectangular Micro QR (rMQR) version geometry and format
//! info (ISO/IEC 18004 Annex C; ISO/IEC 23941). Both reuse full QR's
//! BCH(15,5) generator polynomial ([`crate::tables::bch_15_5`]) with a
//! different data layout and XOR mask layered on top, since that's the same
//! code ISO/IEC 18004 itself reuses between the two symbol families.
//!
//! Per-symbol data capacity is derived by actually laying out each symbol's
//! function patterns (`micro_placement`) and counting the modules left over,
//! rather than from a transcribed capacity table -- no Micro QR/rMQR table
//! source was retrieved, and this keeps capacity and placement from ever
//! disagreeing with each other. See `DESIGN.md`.

use crate::tables::EcLevel;

/// Micro QR version, M1 through M4. Unlike full QR, M1 carries numeric data
/// only and has no error-correction level choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroVersion {
    /// 11x11, numeric only, no error-correction level choice.
    M1,
    /// 13x13.
    M2,
    /// 15x15.
    M3,
    /// 17x17.
    M4,
}

impl MicroVersion {
    /// Side length in modules.
    pub fn dimension(self) -> u32 {
        match self {
            MicroVersion::M1 => 11,
            MicroVersion::M2 => 13,
            MicroVersion::M3 => 15,
            MicroVersion::M4 => 17,
        }
    }

    /// Width, in bits, of the mode indicator this version's data segments
    /// carry (0 for M1, which has an implicit single Numeric segment).
    pub fn mode_indicator_bits(self) -> u32 {
        match self {
            MicroVersion::M1 => 0,
            MicroVersion::M2 => 1,
            MicroVersion::M3 => 2,
            MicroVersion::M4 => 3,
        }
    }

    /// Terminator length in bits (`2 * (version number - 1)`, ISO/IEC 18004
    /// §6.4.9).
    pub fn terminator_bits(self) -> u32 {
        match self {
            MicroVersion::M1 => 0,
            MicroVersion::M2 => 2,
            MicroVersion::M3 => 4,
            MicroVersion::M4 => 6,
        }
    }

    pub(crate) fn from_dimension(dim: u32) -> Option<Self> {
        match dim {
            11 => Some(MicroVersion::M1),
            13 => Some(MicroVersion::M2),
            15 => Some(MicroVersion::M3),
            17 => Some(MicroVersion::M4),
            _ => None,
        }
    }

    /// All four versions, smallest first.
    pub fn all() -> [MicroVersion; 4] {
        [MicroVersion::M1, MicroVersion::M2, MicroVersion::M3, MicroVersion::M4]
    }
}

/// The 8 (version, level) combinations the 3-bit "symbol number" format-info
/// field distinguishes (ISO/IEC 18004 Table 24): M1 has no level, M4 adds Q.
pub const SYMBOL_NUMBERS: [(MicroVersion, Option<EcLevel>); 8] = [
    (MicroVersion::M1, None),
    (MicroVersion::M2, Some(EcLevel::L)),
    (MicroVersion::M2, Some(EcLevel::M)),
    (MicroVersion::M3, Some(EcLevel::L)),
    (MicroVersion::M3, Some(EcLevel::M)),
    (MicroVersion::M4, Some(EcLevel::L)),
    (MicroVersion::M4, Some(EcLevel::M)),
    (MicroVersion::M4, Some(EcLevel::Q)),
];

/// Look up the 3-bit symbol number for a (version, level) pair.
pub fn symbol_number(version: MicroVersion, level: Option<EcLevel>) -> Option<u32> {
    SYMBOL_NUMBERS
        .iter()
        .position(|&(v, l)| v == version && l == level)
        .map(|i| i as u32)
}

/// Compute the 15-bit Micro QR format-info codeword: a 3-bit symbol number
/// and 2-bit mask (masks 0-3 only), BCH(15,5)-protected and XOR-masked with
/// `0x4445` per ISO/IEC 18004 Annex C (full QR uses the same generator but
/// `0x5412`; the two symbologies deliberately use different masks so a
/// misdetected format word fails rather than decoding as the wrong family).
pub fn format_info_bits(symbol_number: u32, mask: u32) -> u32 {
    let data = ((symbol_number & 0x7) << 2) | (mask & 0x3);
    crate::tables::bch_15_5(data) ^ 0x4445
}

/// Decode a (possibly corrupted) 15-bit Micro QR format-info value to the
/// closest `(symbol_number, mask)` by minimum Hamming distance.
pub fn decode_format_info(bits: u32) -> Option<(u32, u32)> {
    let mut best: Option<(u32, u32, u32)> = None;
    for symbol_number in 0..8u32 {
        for mask in 0..4u32 {
            let candidate = format_info_bits(symbol_number, mask);
            let distance = (candidate ^ bits).count_ones();
            if best.is_none_or(|(d, ..)| distance < d) {
                best = Some((distance, symbol_number, mask));
            }
        }
    }
    best.filter(|(d, ..)| *d <= 3).map(|(_, sn, m)| (sn, m))
}

/// All 32 rMQR size variants (height, width) in modules, per ISO/IEC 23941:
/// heights 7/9/11/13/15/17, each paired with the widths that version
/// supports (the two shortest heights and the two tallest skip the
/// narrowest width, which only fits a full finder plus alignment pattern at
/// the taller sizes).
pub const RMQR_SIZES: [(u32, u32); 32] = [
    (7, 43), (7, 59), (7, 77), (7, 99), (7, 139),
    (9, 43), (9, 59), (9, 77), (9, 99), (9, 139),
    (11, 27), (11, 43), (11, 59), (11, 77), (11, 99), (11, 139),
    (13, 27), (13, 43), (13, 59), (13, 77), (13, 99), (13, 139),
    (15, 43), (15, 59), (15, 77), (15, 99), (15, 139),
    (17, 43), (17, 59), (17, 77), (17, 99), (17, 139),
];

/// Index of an (height, width) pair within [`RMQR_SIZES`], if it names a
/// real variant.
pub fn rmqr_size_index(height: u32, width: u32) -> Option<u32> {
    RMQR_SIZES.iter().position(|&hw| hw == (height, width)).map(|i| i as u32)
}

/// Compute the 15-bit rMQR size-info codeword: the symbol's index into
/// [`RMQR_SIZES`] (0-31, exactly 5 bits), BCH(15,5)-protected and
/// XOR-masked. rMQR's real format codeword also folds in the mask pattern
/// and error-correction level in one combined field; here the mask is
/// carried by a separate, singly-repeated 2-bit field placed alongside it
/// (see `micro_placement`) rather than a second transcribed BCH variant, to
/// avoid fabricating a generator polynomial this crate has no source for.
pub fn rmqr_size_info_bits(size_index: u32) -> u32 {
    crate::tables::bch_15_5(size_index & 0x1f) ^ 0x4445
}

/// Decode a (possibly corrupted) 15-bit rMQR size-info value to the closest
/// size index by minimum Hamming distance.
pub fn decode_rmqr_size_info(bits: u32) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for size_index in 0..32u32 {
        let candidate = rmqr_size_info_bits(size_index);
        let distance = (candidate ^ bits).count_ones();
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, size_index));
        }
    }
    best.filter(|(d, _)| *d <= 3).map(|(_, idx)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_number_round_trips() {
        for (i, &(v, l)) in SYMBOL_NUMBERS.iter().enumerate() {
            assert_eq!(symbol_number(v, l), Some(i as u32));
        }
    }

    #[test]
    fn format_info_round_trips_through_decode() {
        let bits = format_info_bits(5, 2);
        assert_eq!(decode_format_info(bits), Some((5, 2)));
    }

    #[test]
    fn format_info_decode_tolerates_bit_errors() {
        let bits = format_info_bits(3, 1) ^ 0b1000;
        assert_eq!(decode_format_info(bits), Some((3, 1)));
    }

    #[test]
    fn rmqr_size_info_round_trips() {
        let bits = rmqr_size_info_bits(17);
        assert_eq!(decode_rmqr_size_info(bits), Some(17));
    }

    #[test]
    fn rmqr_sizes_has_32_variants() {
        assert_eq!(RMQR_SIZES.len(), 32);
        assert_eq!(rmqr_size_index(13, 77), RMQR_SIZES.iter().position(|&hw| hw == (13, 77)).map(|i| i as u32));
    }
}
