//! The `tessera` facade: [`read_barcodes`] and [`create_barcode`], plus the
//! pixel/SVG writers, tying `tessera-aztec`, `tessera-datamatrix` and
//! `tessera-qr` together behind one entry point (spec §6).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod options;
mod writer;

pub use options::{CreatorOptions, ReaderOptions};
pub use writer::{write_barcode_to_image, write_barcode_to_svg, GreyscaleImage, ImageWriteOptions};

use log::debug;
use tessera_binarize::ImageView;
use tessera_common::{format_err, BarcodeFormat, Barcode, BitMatrix, CharacterSet, Content, Error};

const ALL_FORMATS: [BarcodeFormat; 5] =
    [BarcodeFormat::Aztec, BarcodeFormat::DataMatrix, BarcodeFormat::QrCode, BarcodeFormat::MicroQrCode, BarcodeFormat::RectangularMicroQrCode];

/// Read every symbol `options` allows out of `image`, trying rotations as
/// configured and stopping once `max_number_of_symbols` results are found.
pub fn read_barcodes(image: &ImageView<'_>, options: &ReaderOptions) -> Vec<Barcode> {
    let formats: Vec<BarcodeFormat> = if options.formats.is_empty() { ALL_FORMATS.to_vec() } else { options.formats.clone() };

    let rotations: Vec<ImageView<'_>> = if options.try_rotate && !options.is_pure {
        vec![*image, image.rotated_90(), image.rotated_180(), image.rotated_270()]
    } else {
        vec![*image]
    };

    // 1 means "no downscaling"; also try 1/2, 1/3, 1/4 when requested.
    let downscales: &[u32] = if options.try_downscale && !options.is_pure { &[1, 2, 3, 4] } else { &[1] };

    let mut results = Vec::new();
    for rotated in &rotations {
        for &factor in downscales {
            let scaled = rotated.downscaled(factor);
            let Some(matrix) = tessera_binarize::binarize(&scaled, options.binarizer) else {
                debug!("binarization produced no matrix for this rotation/downscale");
                continue;
            };

            let polarities: Vec<BitMatrix> =
                if options.try_invert && !options.is_pure { vec![matrix.clone(), matrix.inverted()] } else { vec![matrix] };

            for candidate in &polarities {
                for &format in &formats {
                    let barcode = decode_one(format, candidate, options.is_pure);
                    if barcode.is_valid() || options.return_errors {
                        results.push(barcode);
                        if results.len() >= options.max_number_of_symbols as usize {
                            return results;
                        }
                    }
                }
            }
        }

        if !results.is_empty() {
            break;
        }
    }

    results
}

fn decode_one(format: BarcodeFormat, matrix: &BitMatrix, is_pure: bool) -> Barcode {
    match format {
        BarcodeFormat::Aztec => tessera_aztec::decode(matrix, is_pure),
        BarcodeFormat::DataMatrix => tessera_datamatrix::decode(matrix, is_pure),
        BarcodeFormat::QrCode => tessera_qr::decode(matrix),
        BarcodeFormat::MicroQrCode => tessera_qr::decode_micro(matrix),
        BarcodeFormat::RectangularMicroQrCode => tessera_qr::decode_rmqr(matrix),
        BarcodeFormat::None => Barcode::failed(format, tessera_common::Quadrilateral::new(zero(), zero(), zero(), zero()), format_err!("unsupported format")),
    }
}

fn zero() -> tessera_common::PointF {
    tessera_common::PointF::new(0.0, 0.0)
}

/// Encode `text` as a symbol of the given `format`, returning a `Barcode`
/// whose `bit_matrix` holds the rendered module grid.
pub fn create_barcode(text: &str, format: BarcodeFormat, options: &CreatorOptions) -> Result<Barcode, Error> {
    let matrix = match format {
        BarcodeFormat::Aztec => {
            let min_ec_fraction = options.ec_level.as_ref().and_then(|s| s.parse::<f64>().ok()).map(|pct| pct / 100.0).unwrap_or(0.23);
            tessera_aztec::encode(text, min_ec_fraction)?
        }
        BarcodeFormat::DataMatrix => {
            let shape = if options.force_square { tessera_datamatrix::SymbolShape::Square } else { tessera_datamatrix::SymbolShape::None };
            tessera_datamatrix::encode(text, shape, None)?
        }
        BarcodeFormat::QrCode => {
            let level = match options.ec_level.as_deref() {
                Some("L") => tessera_qr::EcLevel::L,
                Some("Q") => tessera_qr::EcLevel::Q,
                Some("H") => tessera_qr::EcLevel::H,
                _ => tessera_qr::EcLevel::M,
            };
            tessera_qr::encode(text, level)?
        }
        BarcodeFormat::MicroQrCode => {
            let level = match options.ec_level.as_deref() {
                Some("L") => Some(tessera_qr::EcLevel::L),
                Some("M") => Some(tessera_qr::EcLevel::M),
                Some("Q") => Some(tessera_qr::EcLevel::Q),
                Some("H") => Some(tessera_qr::EcLevel::H),
                _ => None,
            };
            tessera_qr::encode_micro(text, level)?
        }
        BarcodeFormat::RectangularMicroQrCode => {
            let level = match options.ec_level.as_deref() {
                Some("L") => tessera_qr::EcLevel::L,
                Some("Q") => tessera_qr::EcLevel::Q,
                Some("H") => tessera_qr::EcLevel::H,
                _ => tessera_qr::EcLevel::M,
            };
            tessera_qr::encode_rmqr(text, level, None)?
        }
        BarcodeFormat::None => return Err(format_err!("no format specified")),
    };

    let mut content = Content::new(CharacterSet::Unknown);
    content.append(text.as_bytes());

    let dim = (matrix.width(), matrix.height());
    let position = tessera_common::Quadrilateral::new(
        tessera_common::PointF::new(0.0, 0.0),
        tessera_common::PointF::new(dim.0 as f64, 0.0),
        tessera_common::PointF::new(dim.0 as f64, dim.1 as f64),
        tessera_common::PointF::new(0.0, dim.1 as f64),
    );

    Ok(Barcode::new(format, content, position, 0, options.ec_level.clone().unwrap_or_default(), options.version.map(|v| v.to_string()).unwrap_or_default()).with_bit_matrix(matrix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_rasterize_qr_round_trips_size() {
        let barcode = create_barcode("HELLO", BarcodeFormat::QrCode, &CreatorOptions::default()).unwrap();
        let matrix = barcode.bit_matrix().unwrap();
        let image = write_barcode_to_image(matrix, ImageWriteOptions::default()).unwrap();
        assert_eq!(image.width, matrix.width() + 8);
    }

    #[test]
    fn create_barcode_encodes_micro_qr() {
        let barcode = create_barcode("HELLO", BarcodeFormat::MicroQrCode, &CreatorOptions::default()).unwrap();
        let matrix = barcode.bit_matrix().unwrap();
        assert_eq!(matrix.width(), matrix.height());
    }

    #[test]
    fn create_barcode_encodes_rmqr() {
        let barcode = create_barcode("HELLO RMQR", BarcodeFormat::RectangularMicroQrCode, &CreatorOptions::default()).unwrap();
        let matrix = barcode.bit_matrix().unwrap();
        assert!(matrix.width() > 0 && matrix.height() > 0);
    }
}
