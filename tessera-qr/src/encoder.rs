//! High-level QR Code encoding: version/mask selection and final symbol
//! assembly (ISO/IEC 18004 §6.3, §7.8).

use tessera_common::{format_err, BitMatrix, Error};

use crate::bitstream::{self, BitWriter};
use crate::data;
use crate::mask;
use crate::placement;
use crate::tables::{self, EcLevel};

/// Pick the smallest version (1-40) at `level` whose data capacity fits
/// `text`'s greedy-segmented bit stream, returning the padded data codewords
/// alongside the chosen version.
fn encode_high_level(text: &[u8], level: EcLevel) -> Result<(Vec<u8>, u32), Error> {
    for version in 1..=40u32 {
        let layout = tables::ec_blocks(version, level);
        let capacity = layout.total_data_codewords() as usize;

        let mut writer = BitWriter::new();
        bitstream::encode_segments(&mut writer, text, version);
        if writer.len() + 4 <= capacity * 8 {
            return Ok((bitstream::finish_and_pad(writer, capacity), version));
        }
    }
    Err(format_err!("text too long for any QR version at this error-correction level"))
}

/// Encode `text` as a QR Code symbol at the given error-correction `level`,
/// choosing the smallest version that fits and the mask pattern with the
/// lowest structural penalty score.
pub fn encode(text: &str, level: EcLevel) -> Result<BitMatrix, Error> {
    let (data_codewords, version) = encode_high_level(text.as_bytes(), level)?;
    let codewords = data::encode(&data_codewords, version, level);

    let dim = tables::dimension(version);
    let mut matrix = BitMatrix::new(dim, dim);
    let fp = placement::place_function_patterns(&mut matrix, version);
    placement::place_version_info(&mut matrix, version);

    let bits: Vec<bool> = codewords.iter().flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1 == 1)).collect();
    placement::place_data_bits(&mut matrix, &fp, &bits);

    let mut best_mask = 0u32;
    let mut best_score = u32::MAX;
    for pattern in 0..8u32 {
        placement::apply_mask(&mut matrix, &fp, pattern);
        let score = mask::penalty_score(|x, y| matrix.get(x, y), dim as i32);
        placement::apply_mask(&mut matrix, &fp, pattern); // undo trial
        if score < best_score {
            best_score = score;
            best_mask = pattern;
        }
    }

    placement::apply_mask(&mut matrix, &fp, best_mask);
    placement::place_format_info(&mut matrix, level, best_mask);

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_picks_version_one_for_short_text() {
        let matrix = encode("HELLO", EcLevel::M).unwrap();
        assert_eq!(matrix.width(), tables::dimension(1));
    }

    #[test]
    fn encode_scales_version_with_text_length() {
        let long_text = "A".repeat(200);
        let matrix = encode(&long_text, EcLevel::L).unwrap();
        assert!(matrix.width() > tables::dimension(1));
    }
}
