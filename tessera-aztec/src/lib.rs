//! Aztec Code detection, decoding and high-level encoding (spec §4.4, §4.8).
//!
//! Entry points: [`decode`] reads one Aztec symbol from a binarized image;
//! [`encode`] turns `Content` bytes into a sampled symbol [`BitMatrix`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bitstream;
mod data;
mod detector;
mod encoder;
mod mode_ring;
mod parameter;
mod tables;

use tessera_common::symbology::assign_identifier;
use tessera_common::{format_err, BarcodeFormat, Barcode, CharacterSet, Content};

/// Decode one Aztec symbol out of a binarized `image`.
pub fn decode(image: &tessera_common::BitMatrix, is_pure: bool) -> Barcode {
    match decode_inner(image, is_pure) {
        Ok(barcode) => barcode,
        Err(_) => Barcode::failed(
            BarcodeFormat::Aztec,
            tessera_common::Quadrilateral::new(
                tessera_common::PointF::new(0.0, 0.0),
                tessera_common::PointF::new(0.0, 0.0),
                tessera_common::PointF::new(0.0, 0.0),
                tessera_common::PointF::new(0.0, 0.0),
            ),
            format_err!("no Aztec symbol located"),
        ),
    }
}

fn decode_inner(image: &tessera_common::BitMatrix, is_pure: bool) -> Result<Barcode, tessera_common::Error> {
    let detection = detector::detect(image, is_pure)?;

    if detection.mode.layers == 0 {
        return Err(format_err!("Aztec rune decoding is handled separately"));
    }

    let symbol = detector::sample_symbol(image, &detection);
    let bits = data::decode_data_bits(&symbol, detection.mode.layers, detection.compact, detection.mode.data_blocks)?;

    let mut content = Content::new(CharacterSet::Unknown);
    let structured_append = bitstream::decode(&bits, &mut content)?;

    let addend = if structured_append.count > 1 { 6 } else { 0 };
    let mut bytes = content.bytes().to_vec();
    let symbology = assign_identifier('z', '0', addend, &mut bytes);

    let mut final_content = Content::new(CharacterSet::Unknown);
    final_content.append(&bytes);
    final_content.set_symbology(symbology);

    let ec_level = format!("{}%", ecc_percent(detection.mode.layers, detection.compact, detection.mode.data_blocks));

    Ok(Barcode::new(
        BarcodeFormat::Aztec,
        final_content,
        detection.position,
        0,
        ec_level,
        detection.mode.layers.to_string(),
    )
    .with_flags(false, detection.mode.reader_init)
    .with_structured_append(structured_append)
    .with_bit_matrix(symbol))
}

fn ecc_percent(layers: u32, compact: bool, data_blocks: u32) -> u32 {
    let cw_bits = data::codeword_bits(layers);
    let capacity = data::ring_capacity_bits(layers, compact);
    let total_codewords = capacity / cw_bits;
    if total_codewords == 0 || data_blocks > total_codewords {
        return 0;
    }
    ((total_codewords - data_blocks) * 100 / total_codewords).max(0)
}

/// Encode `text` as a square Aztec symbol at the given minimum error-correction
/// fraction (0.0..1.0), choosing the smallest compact or full symbol that fits.
pub fn encode(text: &str, min_ec_fraction: f64) -> Result<tessera_common::BitMatrix, tessera_common::Error> {
    let char_bits = encoder::encode_text(text);

    for compact in [true, false] {
        let Some(layers) = encoder::choose_layers(char_bits.len() as u32, compact, min_ec_fraction) else {
            continue;
        };

        let data_bits = data::encode_data_bits(&char_bits, layers, compact);
        let cw_bits = data::codeword_bits(layers);
        let data_blocks = (char_bits.len() as u32).div_ceil(cw_bits - 1).max(1);

        let mode_message = encoder::build_mode_message(layers, data_blocks, false, compact);
        let size = data::matrix_size(layers, compact);
        let mut matrix = tessera_common::BitMatrix::new(size, size);

        place_bullseye(&mut matrix, compact);
        place_mode_message(&mut matrix, &mode_message, compact);
        data::place_bits(&mut matrix, layers, compact, &data_bits);

        return Ok(matrix);
    }

    Err(format_err!("no Aztec symbol size fits the requested payload at the requested EC fraction"))
}

fn place_bullseye(matrix: &mut tessera_common::BitMatrix, compact: bool) {
    let size = matrix.width() as i32;
    let half = size / 2;
    let rings = data::bullseye_size(compact) as i32 / 2;
    for r in 0..=rings {
        let set = r % 2 == 0;
        matrix.set_region(half - r, half - r, (2 * r + 1) as u32, 1, set);
        matrix.set_region(half - r, half + r, (2 * r + 1) as u32, 1, set);
        matrix.set_region(half - r, half - r, 1, (2 * r + 1) as u32, set);
        matrix.set_region(half + r, half - r, 1, (2 * r + 1) as u32, set);
    }
}

fn place_mode_message(matrix: &mut tessera_common::BitMatrix, codewords: &[u16], compact: bool) {
    let bits: Vec<bool> = codewords
        .iter()
        .flat_map(|&cw| (0..4).rev().map(move |i| (cw >> i) & 1 == 1))
        .collect();

    let size = matrix.width() as f64;
    let half = size / 2.0;
    let raw_sides = mode_ring::sides(compact);
    let (orientation_points, data_points) = mode_ring::split_orientation_and_data(&raw_sides);

    let orientation_value = 0xEE0u16; // rotation 0, our own canonical orientation for freshly-encoded symbols.
    let orientation_bits: Vec<bool> = (0..12).rev().map(|i| (orientation_value >> i) & 1 == 1).collect();

    for (point, bit) in orientation_points.iter().zip(orientation_bits.iter()) {
        let px = (point.x + half).round() as i32;
        let py = (point.y + half).round() as i32;
        matrix.set(px, py, *bit);
    }
    for (point, bit) in data_points.iter().zip(bits.iter()) {
        let px = (point.x + half).round() as i32;
        let py = (point.y + half).round() as i32;
        matrix.set(px, py, *bit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_picks_a_layer_count_for_short_text() {
        let matrix = encode("HELLO", 0.23).unwrap();
        assert!(matrix.width() >= 15);
        assert_eq!(matrix.width(), matrix.height());
    }

    #[test]
    fn ecc_percent_is_bounded() {
        let pct = ecc_percent(2, true, 10);
        assert!(pct <= 100);
    }
}
