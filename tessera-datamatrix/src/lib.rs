//! Data Matrix (ECC200) detection, decoding and high-level encoding (spec
//! §4.4, §4.8).
//!
//! Entry points: [`decode`] reads one symbol from a binarized image;
//! [`encode`] turns text into a sampled symbol [`BitMatrix`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod data;
mod detector;
mod encoder;
mod high_level_decode;
mod placement;
mod symbol_info;

pub use symbol_info::SymbolShape;

use tessera_common::symbology::assign_identifier;
use tessera_common::{format_err, BarcodeFormat, Barcode, BitMatrix, CharacterSet, Content};

/// Decode one Data Matrix symbol out of a binarized `image`.
pub fn decode(image: &BitMatrix, is_pure: bool) -> Barcode {
    match decode_inner(image, is_pure) {
        Ok(barcode) => barcode,
        Err(_) => Barcode::failed(
            BarcodeFormat::DataMatrix,
            tessera_common::Quadrilateral::new(
                tessera_common::PointF::new(0.0, 0.0),
                tessera_common::PointF::new(0.0, 0.0),
                tessera_common::PointF::new(0.0, 0.0),
                tessera_common::PointF::new(0.0, 0.0),
            ),
            format_err!("no Data Matrix symbol located"),
        ),
    }
}

fn decode_inner(image: &BitMatrix, is_pure: bool) -> Result<Barcode, tessera_common::Error> {
    let detection = detector::detect(image, is_pure)?;
    let symbol_info = detector::symbol_info_for_detection(&detection)?;
    let full_symbol = detector::sample_symbol(image, &detection);

    let data_region = placement::strip_finder_pattern(&full_symbol, symbol_info);
    let codewords = placement::read_codewords(&data_region, symbol_info.symbol_data_width(), symbol_info.symbol_data_height(), symbol_info.codeword_count() as usize);
    let message = data::decode_ecc200(&codewords, symbol_info)?;
    let text = high_level_decode::decode(&message)?;

    let mut content = Content::new(CharacterSet::Unknown);
    content.append(&text);

    let mut bytes = content.bytes().to_vec();
    let symbology = assign_identifier('d', '0', 0, &mut bytes);

    let mut final_content = Content::new(CharacterSet::Unknown);
    final_content.append(&bytes);
    final_content.set_symbology(symbology);

    let ec_level = format!("{}", symbol_info.error_codewords);

    Ok(Barcode::new(
        BarcodeFormat::DataMatrix,
        final_content,
        detection.position,
        0,
        ec_level,
        String::new(),
    )
    .with_flags(false, false)
    .with_bit_matrix(full_symbol))
}

/// Encode `text` as a Data Matrix symbol, choosing the smallest symbol of the
/// given `shape` (or any shape, with [`SymbolShape::None`]) that fits, with an
/// optional `(max_width, max_height)` module cap.
pub fn encode(text: &str, shape: SymbolShape, max_size: Option<(u32, u32)>) -> Result<BitMatrix, tessera_common::Error> {
    let (codewords, symbol) = encoder::encode_high_level(text.as_bytes(), shape, max_size)?;
    let message = data::encode_ecc200(&codewords, symbol);
    let data_region = placement::place_codewords(&message, symbol.symbol_data_width(), symbol.symbol_data_height());
    Ok(placement::overlay_finder_pattern(&data_region, symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_picks_a_symbol_size_for_short_text() {
        let matrix = encode("HELLO", SymbolShape::None, None).unwrap();
        assert!(matrix.width() >= 10);
        assert!(matrix.height() >= 10);
    }

    #[test]
    fn encode_then_detect_round_trips_geometry() {
        let matrix = encode("123", SymbolShape::None, None).unwrap();
        assert_eq!(matrix.width(), matrix.height());
    }
}
