//! High-level Micro QR / rMQR encoding: version/size and mask selection and
//! final symbol assembly, mirroring full QR's own [`crate::encoder`] but
//! against the single-finder layouts in `micro_placement`.

use tessera_common::{format_err, BitMatrix, Error};
use tessera_rs as rs;

use crate::bitstream::BitWriter;
use crate::mask;
use crate::micro_bitstream::{self, SegmentContext};
use crate::micro_placement;
use crate::micro_tables::{self, MicroVersion};
use crate::tables::EcLevel;

/// Fraction of a single RS block's codewords spent on error correction, one
/// entry per `EcLevel` -- Micro QR/rMQR never use per-block grouping the way
/// full QR does at larger versions, so a single block covers the whole
/// symbol and these ratios stand in for the (untranscribed) official
/// per-version block tables. See `DESIGN.md`.
fn ec_fraction(level: EcLevel) -> f64 {
    match level {
        EcLevel::L => 0.07,
        EcLevel::M => 0.15,
        EcLevel::Q => 0.25,
        EcLevel::H => 0.30,
    }
}

fn split_capacity(total_codewords: u32, level: EcLevel) -> (u32, u32) {
    let ec = ((total_codewords as f64 * ec_fraction(level)).round() as u32).clamp(2, total_codewords.saturating_sub(1).max(2));
    (total_codewords - ec, ec)
}

fn rs_protect(data: &[u8], ec_codewords: usize) -> Vec<u8> {
    let field = rs::qr_field();
    let data_u16: Vec<u16> = data.iter().map(|&b| b as u16).collect();
    let ecc = rs::encode(&field, &data_u16, ec_codewords);
    let mut out = data.to_vec();
    out.extend(ecc.iter().map(|&w| w as u8));
    out
}

fn bits_of(bytes: &[u8]) -> Vec<bool> {
    bytes.iter().flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1 == 1)).collect()
}

fn choose_mask(width: u32, height: u32, place: impl Fn(&mut BitMatrix, u32)) -> BitMatrix {
    let mut best_score = u32::MAX;
    let mut best_matrix = None;
    for pattern in 0..4u32 {
        let mut matrix = BitMatrix::new(width, height);
        place(&mut matrix, pattern);
        let score = mask::penalty_score_rect(|x, y| matrix.get(x, y), width as i32, height as i32);
        if score < best_score {
            best_score = score;
            best_matrix = Some(matrix);
        }
    }
    best_matrix.expect("at least one mask pattern is always tried")
}

/// Encode `text` as a Micro QR symbol, picking the smallest version (and, for
/// versions that offer a choice, the lowest-overhead level) that fits, and
/// the mask pattern with the lowest structural penalty score. `preferred_level`
/// pins the error-correction level when the version supports more than one
/// (ignored for M1, which has none).
pub fn encode_micro(text: &str, preferred_level: Option<EcLevel>) -> Result<BitMatrix, Error> {
    let bytes = text.as_bytes();

    for version in MicroVersion::all() {
        let levels: Vec<Option<EcLevel>> =
            micro_tables::SYMBOL_NUMBERS.iter().filter(|&&(v, _)| v == version).map(|&(_, l)| l).collect();

        for &level in &levels {
            if let (Some(preferred), Some(candidate)) = (preferred_level, level) {
                if preferred != candidate {
                    continue;
                }
            }

            let dim = version.dimension();
            let capacity_bits = micro_placement::micro_data_capacity_bits(dim);
            let total_codewords = (capacity_bits / 8) as u32;
            if total_codewords < 3 {
                continue;
            }
            let (data_codewords, ec_codewords) = split_capacity(total_codewords, level.unwrap_or(EcLevel::L));

            let ctx = SegmentContext::Micro(version);
            if !micro_bitstream::fits(bytes, ctx) {
                break; // a narrower level won't change mode support; try the next version.
            }

            let mut writer = BitWriter::new();
            if micro_bitstream::encode_segments(&mut writer, bytes, ctx, None).is_err() {
                continue;
            }
            if writer.len() + version.terminator_bits() as usize > data_codewords as usize * 8 {
                continue;
            }

            let data = micro_bitstream::finish_and_pad(writer, ctx, data_codewords as usize);
            let codewords = rs_protect(&data, ec_codewords as usize);
            let bits = bits_of(&codewords);

            let Some(symbol_number) = micro_tables::symbol_number(version, level) else { continue };

            let matrix = choose_mask(dim, dim, |matrix, pattern| {
                let fp = micro_placement::place_micro_function_patterns(matrix);
                micro_placement::place_micro_data_bits(matrix, &fp, &bits);
                micro_placement::apply_mask(matrix, &fp, pattern);
                micro_placement::place_micro_format_info(matrix, symbol_number, pattern);
            });
            return Ok(matrix);
        }
    }

    Err(format_err!("text too long for any Micro QR version at this error-correction level"))
}

/// Encode `text` as an rMQR symbol at the given error-correction `level`,
/// picking the smallest size variant that fits (trying widths in
/// [`micro_tables::RMQR_SIZES`] order) and the lowest-penalty mask. `eci`, if
/// given, is carried as a leading ECI designator segment.
pub fn encode_rmqr(text: &str, level: EcLevel, eci: Option<u32>) -> Result<BitMatrix, Error> {
    let bytes = text.as_bytes();
    let ctx = SegmentContext::Rmqr;
    if !micro_bitstream::fits(bytes, ctx) {
        return Err(format_err!("text does not fit any rMQR mode"));
    }

    for (size_index, &(height, width)) in micro_tables::RMQR_SIZES.iter().enumerate() {
        let capacity_bits = micro_placement::rmqr_data_capacity_bits(width, height);
        let total_codewords = (capacity_bits / 8) as u32;
        if total_codewords < 3 {
            continue;
        }
        let (data_codewords, ec_codewords) = split_capacity(total_codewords, level);

        let mut writer = BitWriter::new();
        if micro_bitstream::encode_segments(&mut writer, bytes, ctx, eci).is_err() {
            continue;
        }
        if writer.len() > data_codewords as usize * 8 {
            continue;
        }

        let data = micro_bitstream::finish_and_pad(writer, ctx, data_codewords as usize);
        let codewords = rs_protect(&data, ec_codewords as usize);
        let bits = bits_of(&codewords);

        let matrix = choose_mask(width, height, |matrix, pattern| {
            let fp = micro_placement::place_rmqr_function_patterns(matrix);
            micro_placement::place_rmqr_data_bits(matrix, &fp, &bits);
            micro_placement::apply_mask(matrix, &fp, pattern);
            micro_placement::place_rmqr_format_info(matrix, size_index as u32, pattern);
        });
        return Ok(matrix);
    }

    Err(format_err!("text too long for any rMQR size at this error-correction level"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_micro_picks_m1_for_short_numeric_text() {
        let matrix = encode_micro("12345", None).unwrap();
        assert_eq!(matrix.width(), MicroVersion::M1.dimension());
    }

    #[test]
    fn encode_micro_scales_version_for_longer_text() {
        let matrix = encode_micro("HELLO MICRO QR WORLD 12345", None).unwrap();
        assert!(matrix.width() > MicroVersion::M1.dimension());
    }

    #[test]
    fn encode_rmqr_produces_a_listed_size() {
        let matrix = encode_rmqr("HELLO RMQR", EcLevel::M, None).unwrap();
        assert!(micro_tables::rmqr_size_index(matrix.height(), matrix.width()).is_some());
    }

    #[test]
    fn encode_rmqr_carries_an_eci_designator() {
        let matrix = encode_rmqr("hi", EcLevel::M, Some(20)).unwrap();
        assert!(matrix.width() > 0);
    }
}
