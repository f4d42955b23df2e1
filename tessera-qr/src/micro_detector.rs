//! Micro QR and rMQR symbol location: unlike full QR's three-finder
//! triangulation, both families carry a single finder, so orientation and
//! scale come from trying the four axis-aligned rotations and checking which
//! one's timing-pattern edge and format/size info actually decode (spec
//! §4.9's Micro QR paragraph). No perspective correction is attempted here --
//! the four candidate axes are treated as exactly orthogonal, which the
//! three-finder full QR detector doesn't need to assume. See `DESIGN.md`.

use tessera_binarize::{find_finder_patterns, FinderCandidate};
use tessera_common::{format_err, BitMatrix, Error, PerspectiveTransform, PointF, Quadrilateral};

use crate::micro_placement;
use crate::micro_tables::{self, MicroVersion};
use crate::tables::EcLevel;

/// Geometry and decoded format info for a located Micro QR symbol.
pub struct MicroDetection {
    /// Outer corners of the symbol, for `Barcode::position`.
    pub position: Quadrilateral<PointF>,
    /// Resolved version.
    pub version: MicroVersion,
    /// Resolved error-correction level (`None` for M1).
    pub level: Option<EcLevel>,
    /// Resolved mask pattern (0-3).
    pub mask: u32,
    /// The sampled, still-masked module grid.
    pub symbol: BitMatrix,
}

const ROTATIONS: [(f64, f64, f64, f64); 4] = [
    (1.0, 0.0, 0.0, 1.0),
    (0.0, -1.0, 1.0, 0.0),
    (-1.0, 0.0, 0.0, -1.0),
    (0.0, 1.0, -1.0, 0.0),
];

fn module_quad(width: f64, height: f64) -> Quadrilateral<PointF> {
    Quadrilateral::new(
        PointF::new(-0.5, -0.5),
        PointF::new(width - 0.5, -0.5),
        PointF::new(width - 0.5, height - 0.5),
        PointF::new(-0.5, height - 0.5),
    )
}

/// Build the module-space -> pixel-space transform for one finder candidate
/// under one of the four axis-aligned rotations, assuming the finder sits at
/// module `(3, 3)` and the symbol is `width`x`height` modules.
fn build_transform(finder: &FinderCandidate, rotation: (f64, f64, f64, f64), width: f64, height: f64) -> PerspectiveTransform {
    let (rx, ry, dx, dy) = rotation;
    let to_pixel = |mx: f64, my: f64| {
        let ox = mx - 3.0;
        let oy = my - 3.0;
        PointF::new(
            finder.center.x + (ox * rx + oy * dx) * finder.module_size,
            finder.center.y + (ox * ry + oy * dy) * finder.module_size,
        )
    };
    let pixels = Quadrilateral::new(to_pixel(-0.5, -0.5), to_pixel(width - 0.5, -0.5), to_pixel(width - 0.5, height - 0.5), to_pixel(-0.5, height - 0.5));
    PerspectiveTransform::from_quads(&module_quad(width, height), &pixels)
}

fn sample(matrix: &BitMatrix, transform: &PerspectiveTransform, width: u32, height: u32) -> BitMatrix {
    let mut out = BitMatrix::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let p = transform.apply(PointF::new(x as f64, y as f64)).round();
            out.set(x as i32, y as i32, matrix.get(p.x, p.y));
        }
    }
    out
}

/// Count how many of the cells along row 0 / column 0 past the finder match
/// the expected alternating timing pattern, out of how many were checked.
fn timing_plausibility(symbol: &BitMatrix) -> (u32, u32) {
    let (width, height) = (symbol.width() as i32, symbol.height() as i32);
    let mut matches = 0u32;
    let mut total = 0u32;
    for x in 8..width {
        total += 1;
        if symbol.get(x, 0) == (x % 2 == 0) {
            matches += 1;
        }
    }
    for y in 8..height {
        total += 1;
        if symbol.get(0, y) == (y % 2 == 0) {
            matches += 1;
        }
    }
    (matches, total)
}

/// Locate and sample one Micro QR symbol out of a binarized `image`.
pub fn detect(matrix: &BitMatrix) -> Result<MicroDetection, Error> {
    let row_skip = (matrix.height() / 180).max(1);
    let candidates = find_finder_patterns(matrix, row_skip);

    let mut best: Option<(u32, MicroDetection)> = None;
    for finder in &candidates {
        for &rotation in &ROTATIONS {
            for version in MicroVersion::all() {
                let dim = version.dimension() as f64;
                let transform = build_transform(finder, rotation, dim, dim);
                if !transform.is_valid() {
                    continue;
                }
                let symbol = sample(matrix, &transform, dim as u32, dim as u32);
                let (matches, total) = timing_plausibility(&symbol);
                if total == 0 || matches * 4 < total * 3 {
                    continue;
                }

                let format_bits = micro_placement::read_micro_format_info(&symbol);
                let Some((symbol_number, mask)) = micro_tables::decode_format_info(format_bits) else { continue };
                let Some(&(found_version, level)) = micro_tables::SYMBOL_NUMBERS.get(symbol_number as usize) else { continue };
                if found_version != version {
                    continue;
                }

                let distance = (total - matches) + (micro_tables::format_info_bits(symbol_number, mask) ^ format_bits).count_ones();
                let half = dim / 2.0 - 0.5;
                let position = Quadrilateral::new(
                    finder.center + PointF::new(-half, -half) * finder.module_size,
                    finder.center + PointF::new(dim - 0.5 - 3.0, -half) * finder.module_size,
                    finder.center + PointF::new(dim - 0.5 - 3.0, dim - 0.5 - 3.0) * finder.module_size,
                    finder.center + PointF::new(-half, dim - 0.5 - 3.0) * finder.module_size,
                );
                let detection = MicroDetection { position, version, level, mask, symbol };
                if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                    best = Some((distance, detection));
                }
            }
        }
    }

    best.map(|(_, d)| d).ok_or_else(|| format_err!("no Micro QR finder produced a valid sample"))
}

/// Geometry and decoded size info for a located rMQR symbol.
pub struct RmqrDetection {
    /// Outer corners of the symbol, for `Barcode::position`.
    pub position: Quadrilateral<PointF>,
    /// Height in modules.
    pub height: u32,
    /// Width in modules.
    pub width: u32,
    /// Resolved mask pattern (0-3).
    pub mask: u32,
    /// The sampled, still-masked module grid.
    pub symbol: BitMatrix,
}

fn rmqr_timing_plausibility(symbol: &BitMatrix) -> (u32, u32) {
    timing_plausibility(symbol)
}

/// Locate and sample one rMQR symbol out of a binarized `image`.
pub fn detect_rmqr(matrix: &BitMatrix) -> Result<RmqrDetection, Error> {
    let row_skip = (matrix.height() / 180).max(1);
    let candidates = find_finder_patterns(matrix, row_skip);

    let mut best: Option<(u32, RmqrDetection)> = None;
    for finder in &candidates {
        for &rotation in &ROTATIONS {
            for &(height, width) in &micro_tables::RMQR_SIZES {
                let transform = build_transform(finder, rotation, width as f64, height as f64);
                if !transform.is_valid() {
                    continue;
                }
                let symbol = sample(matrix, &transform, width, height);
                let (matches, total) = rmqr_timing_plausibility(&symbol);
                if total == 0 || matches * 4 < total * 3 {
                    continue;
                }

                let (size_bits, mask) = micro_placement::read_rmqr_format_info(&symbol);
                let Some(size_index) = micro_tables::decode_rmqr_size_info(size_bits) else { continue };
                let Some(&(found_height, found_width)) = micro_tables::RMQR_SIZES.get(size_index as usize) else { continue };
                if (found_height, found_width) != (height, width) {
                    continue;
                }

                let distance = (total - matches) + (micro_tables::rmqr_size_info_bits(size_index) ^ size_bits).count_ones();
                let half_w = width as f64 / 2.0 - 0.5;
                let half_h = height as f64 / 2.0 - 0.5;
                let position = Quadrilateral::new(
                    finder.center + PointF::new(-half_w, -half_h) * finder.module_size,
                    finder.center + PointF::new(width as f64 - 0.5 - 3.0, -half_h) * finder.module_size,
                    finder.center + PointF::new(width as f64 - 0.5 - 3.0, height as f64 - 0.5 - 3.0) * finder.module_size,
                    finder.center + PointF::new(-half_w, height as f64 - 0.5 - 3.0) * finder.module_size,
                );
                let detection = RmqrDetection { position, height, width, mask, symbol };
                if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                    best = Some((distance, detection));
                }
            }
        }
    }

    best.map(|(_, d)| d).ok_or_else(|| format_err!("no rMQR finder produced a valid sample"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_plausibility_scores_a_perfect_pattern() {
        let mut symbol = BitMatrix::new(13, 13);
        for i in 8..13 {
            symbol.set(i, 0, i % 2 == 0);
            symbol.set(0, i, i % 2 == 0);
        }
        let (matches, total) = timing_plausibility(&symbol);
        assert_eq!(matches, total);
    }
}
