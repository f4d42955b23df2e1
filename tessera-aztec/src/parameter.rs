//! Aztec mode-message (parameter) encoding and decoding: orientation via Hamming
//! distance against the four canonical rotations, and GF(16) Reed-Solomon over
//! the remaining mode bits (spec §4.4 "Parameter decoding").

use tessera_common::{format_err, Error};
use tessera_rs::{self as rs};

/// The four canonical 12-bit orientation words, one per 90-degree rotation.
const ORIENTATIONS: [u16; 4] = [0xEE0, 0x1DC, 0x83B, 0x707];

/// Decoded mode-message contents, common to compact and full symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeMessage {
    /// Number of data-ring layers.
    pub layers: u32,
    /// Number of data codewords blocks encoded in the symbol.
    pub data_blocks: u32,
    /// Reader-initialisation flag (a reserved bit in the full-size message).
    pub reader_init: bool,
    /// Which of the four 90-degree rotations matched, 0..4.
    pub rotation: u8,
}

/// Find the rotation (0..4) of `orientation_bits` closest, by Hamming distance,
/// to one of the four canonical words, tolerating up to 2 bit errors. Returns
/// `None` on a tie or if the minimum distance exceeds the tolerance.
pub fn match_orientation(orientation_bits: u16) -> Option<u8> {
    let mut best = None;
    let mut best_distance = u32::MAX;
    let mut tie = false;

    for (rotation, &word) in ORIENTATIONS.iter().enumerate() {
        let distance = (orientation_bits ^ word).count_ones();
        if distance < best_distance {
            best_distance = distance;
            best = Some(rotation as u8);
            tie = false;
        } else if distance == best_distance {
            tie = true;
        }
    }

    if tie || best_distance > 2 {
        None
    } else {
        best
    }
}

/// Decode the 28 (compact) or 40 (full) mode-data bits, already Hamming-corrected
/// for orientation, via GF(16) Reed-Solomon.
pub fn decode_mode_data(raw_codewords: &[u16], compact: bool) -> Result<ModeMessage, Error> {
    let field = rs::aztec_parameter_field();
    let ecc_codewords = if compact { 5 } else { 6 };
    let mut codewords = raw_codewords.to_vec();

    rs::decode(&field, &mut codewords, ecc_codewords)
        .map_err(|e| format_err!("Aztec mode message Reed-Solomon failed: {e}"))?;

    let data_len = codewords.len() - ecc_codewords;
    let mut bits = 0u64;
    let mut bit_count = 0u32;
    for &cw in &codewords[..data_len] {
        bits = (bits << 4) | u64::from(cw);
        bit_count += 4;
    }
    // Drop any padding bits beyond the defined field width.
    let total_bits = if compact { 28 } else { 40 };
    let shift = bit_count.saturating_sub(total_bits);
    let bits = bits >> shift;

    if compact {
        let layers = ((bits >> 6) & 0x3) as u32 + 1;
        let data_blocks = (bits & 0x3F) as u32 + 1;
        Ok(ModeMessage {
            layers,
            data_blocks,
            reader_init: false,
            rotation: 0,
        })
    } else {
        let reader_init = (bits >> 39) & 1 == 1;
        let layers = ((bits >> 11) & 0x1F) as u32 + 1;
        let data_blocks = (bits & 0x7FF) as u32 + 1;
        Ok(ModeMessage {
            layers,
            data_blocks,
            reader_init,
            rotation: 0,
        })
    }
}

/// Build the mode-data codewords (before RS parity) for an encoder: `layers`
/// (1-based) and `data_blocks` (1-based), optionally with the reader-init flag
/// set.
pub fn encode_mode_data(layers: u32, data_blocks: u32, reader_init: bool, compact: bool) -> Vec<u16> {
    let (value, total_bits, codeword_bits) = if compact {
        let value = (((layers - 1) & 0x3) << 6) | ((data_blocks - 1) & 0x3F);
        (value as u64, 28u32, 4u32)
    } else {
        let mut value = (((layers - 1) as u64 & 0x1F) << 11) | ((data_blocks - 1) as u64 & 0x7FF);
        if reader_init {
            value |= 1 << 39;
        }
        (value, 40u32, 4u32)
    };

    let codeword_count = total_bits / codeword_bits;
    (0..codeword_count)
        .rev()
        .map(|i| ((value >> (i * codeword_bits as u64 as u32)) & 0xF) as u16)
        .collect()
}

/// Append GF(16) Reed-Solomon parity to `data_codewords`.
pub fn append_mode_ecc(data_codewords: &[u16], compact: bool) -> Vec<u16> {
    let field = rs::aztec_parameter_field();
    let ecc_codewords = if compact { 5 } else { 6 };
    let ecc = rs::encode(&field, data_codewords, ecc_codewords);
    let mut out = data_codewords.to_vec();
    out.extend(ecc);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_matches_exact_word() {
        assert_eq!(match_orientation(0xEE0), Some(0));
        assert_eq!(match_orientation(0x1DC), Some(1));
    }

    #[test]
    fn orientation_tolerates_one_bit_error() {
        assert_eq!(match_orientation(0xEE0 ^ 0x1), Some(0));
    }

    #[test]
    fn mode_data_round_trips_through_ecc() {
        let data = encode_mode_data(4, 10, false, true);
        let with_ecc = append_mode_ecc(&data, true);
        let decoded = decode_mode_data(&with_ecc, true).unwrap();
        assert_eq!(decoded.layers, 4);
        assert_eq!(decoded.data_blocks, 10);
    }
}
