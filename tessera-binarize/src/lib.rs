//! Image binarization and the shared pixel-geometry primitives for the
//! `tessera` 2-D barcode crates: [`ImageView`], the two binarizer strategies,
//! [`cursor::BitMatrixCursor`], [`grid_sampler`], the concentric finder-pattern
//! locator, and [`white_rect::detect_white_rect`].
//!
//! Each symbology crate (`tessera-aztec`, `tessera-datamatrix`, `tessera-qr`)
//! builds its detector on top of these primitives rather than walking pixels
//! directly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod concentric;
pub mod cursor;
pub mod global_histogram;
pub mod grid_sampler;
pub mod hybrid;
pub mod image;
pub mod white_rect;

pub use concentric::{find_finder_patterns, find_concentric_pattern_corners, locate_concentric_pattern, FinderCandidate};
pub use cursor::{BitMatrixCursor, FastEdgeToEdgeCounter, Pixel};
pub use grid_sampler::{sample_grid, DetectorResult};
pub use image::{ImageView, PixelFormat};
pub use white_rect::{detect_white_rect, detect_white_rect_sized};

/// Which binarizer strategy to apply, matching `ReaderOptions::binarizer` (spec
/// §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinarizerKind {
    /// 8x8-block local-average thresholding with a global-histogram fallback
    /// for small images.
    #[default]
    LocalAverage,
    /// Single global threshold from a 32-bucket luminance histogram.
    GlobalHistogram,
    /// A single caller-supplied threshold applied uniformly.
    FixedThreshold(u8),
    /// Treat any non-zero luminance as black (used for already-binary test
    /// fixtures).
    BoolCast,
}

/// Binarize `image` per `kind`.
pub fn binarize(image: &image::ImageView<'_>, kind: BinarizerKind) -> Option<tessera_common::BitMatrix> {
    match kind {
        BinarizerKind::LocalAverage => hybrid::binarize(image),
        BinarizerKind::GlobalHistogram => global_histogram::binarize(image),
        BinarizerKind::FixedThreshold(threshold) => Some(fixed_threshold(image, threshold)),
        BinarizerKind::BoolCast => Some(bool_cast(image)),
    }
}

fn fixed_threshold(image: &image::ImageView<'_>, threshold: u8) -> tessera_common::BitMatrix {
    let mut matrix = tessera_common::BitMatrix::new(image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            matrix.set(x as i32, y as i32, image.luminance(x, y) <= threshold);
        }
    }
    matrix
}

fn bool_cast(image: &image::ImageView<'_>) -> tessera_common::BitMatrix {
    let mut matrix = tessera_common::BitMatrix::new(image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            matrix.set(x as i32, y as i32, image.luminance(x, y) != 0);
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_cast_treats_zero_as_white() {
        let data = [0u8, 1, 255];
        let view = ImageView::new(&data, 3, 1, PixelFormat::Lum, None, None);
        let matrix = binarize(&view, BinarizerKind::BoolCast).unwrap();
        assert!(!matrix.get(0, 0));
        assert!(matrix.get(1, 0));
        assert!(matrix.get(2, 0));
    }
}
