//! Full QR and Micro QR symbol location (spec §4.9): finder-triple
//! enumeration and per-set sampling for full QR, single-finder rotation
//! search for Micro QR.

use tessera_binarize::{find_finder_patterns, locate_concentric_pattern, FinderCandidate};
use tessera_common::{format_err, BitMatrix, Error, PerspectiveTransform, PointF, Quadrilateral};

use crate::placement;
use crate::tables::{self, EcLevel};

/// Geometry and format info for a located full QR symbol.
pub struct Detection {
    /// Outer corners of the symbol, for `Barcode::position`.
    pub position: Quadrilateral<PointF>,
    /// Module dimension (21, 25, ..., 177).
    pub dimension: u32,
    /// Rectified symbol -> pixel transform.
    pub transform: PerspectiveTransform,
}

/// From `A, B, C` finder candidates (B is the right-angle apex), identify
/// top-left/top-right/bottom-left in canonical order and estimate the
/// module count from the diagonal.
fn order_finder_triple(a: FinderCandidate, b: FinderCandidate, c: FinderCandidate) -> (FinderCandidate, FinderCandidate, FinderCandidate) {
    let v1 = c.center - b.center;
    let v2 = a.center - b.center;
    if v1.cross(v2) < 0.0 {
        (c, b, a)
    } else {
        (a, b, c)
    }
}

fn estimate_dimension(top_left: PointF, top_right: PointF, bottom_left: PointF, module_size: f64) -> u32 {
    let width = (top_right - top_left).length();
    let height = (bottom_left - top_left).length();
    let modules = (width + height) / 2.0 / module_size + 7.0;
    let dim = (modules / 4.0).round() as i32 * 4 + 1;
    dim.clamp(21, 177) as u32
}

/// Enumerate candidate finder triples, score them for isosceles-right
/// goodness, and try each best-first until one samples and decodes a
/// plausible format/version info pair.
pub fn detect(matrix: &BitMatrix) -> Result<Detection, Error> {
    let row_skip = (matrix.height() / 180).max(1);
    let candidates = find_finder_patterns(matrix, row_skip);
    if candidates.len() < 3 {
        return Err(format_err!("fewer than three QR finder patterns found"));
    }

    let mut best: Option<(f64, Detection)> = None;
    for i in 0..candidates.len() {
        for j in 0..candidates.len() {
            if i == j {
                continue;
            }
            for k in 0..candidates.len() {
                if k == i || k == j {
                    continue;
                }
                let (tl, tr, bl) = order_finder_triple(candidates[i], candidates[j], candidates[k]);
                let Some(detection) = try_sample(matrix, tl, tr, bl) else { continue };
                let score = (tl.module_size - tr.module_size).abs() + (tl.module_size - bl.module_size).abs();
                if best.as_ref().is_none_or(|(s, _)| score < *s) {
                    best = Some((score, detection));
                }
            }
        }
    }

    best.map(|(_, d)| d).ok_or_else(|| format_err!("no QR finder triple produced a valid sample"))
}

fn try_sample(matrix: &BitMatrix, top_left: FinderCandidate, top_right: FinderCandidate, bottom_left: FinderCandidate) -> Option<Detection> {
    let module_size = (top_left.module_size + top_right.module_size + bottom_left.module_size) / 3.0;
    let dimension = estimate_dimension(top_left.center, top_right.center, bottom_left.center, module_size);

    let bottom_right = PointF::new(
        top_right.center.x + bottom_left.center.x - top_left.center.x,
        top_right.center.y + bottom_left.center.y - top_left.center.y,
    );
    let bottom_right = locate_concentric_pattern(matrix, bottom_right, module_size)
        .map(|c| c.center)
        .unwrap_or(bottom_right);

    let half = 3.5;
    let module_quad = Quadrilateral::new(
        PointF::new(half, half),
        PointF::new(dimension as f64 - half, half),
        PointF::new(dimension as f64 - half, dimension as f64 - half),
        PointF::new(half, dimension as f64 - half),
    );
    let pixel_quad = Quadrilateral::new(top_left.center, top_right.center, bottom_right, bottom_left.center);
    let transform = PerspectiveTransform::from_quads(&module_quad, &pixel_quad);
    if !transform.is_valid() {
        return None;
    }

    Some(Detection {
        position: pixel_quad,
        dimension,
        transform,
    })
}

/// Sample a full `dimension`x`dimension` module grid through `detection`'s
/// transform.
pub fn sample_symbol(matrix: &BitMatrix, detection: &Detection) -> BitMatrix {
    let mut out = BitMatrix::new(detection.dimension, detection.dimension);
    for y in 0..detection.dimension {
        for x in 0..detection.dimension {
            let p = detection.transform.apply(PointF::new(x as f64 + 0.5, y as f64 + 0.5)).round();
            out.set(x as i32, y as i32, matrix.get(p.x, p.y));
        }
    }
    out
}

/// Resolve `(version, level, mask)` from a sampled symbol's format/version
/// info, validating the dimension matches the claimed version.
pub fn read_format_and_version(symbol: &BitMatrix) -> Result<(u32, EcLevel, u32), Error> {
    let format_bits = placement::read_format_info(symbol);
    let (level, mask) = tables::decode_format_info(format_bits).ok_or_else(|| format_err!("QR format info unreadable"))?;

    let dimension = symbol.width();
    let version = if dimension <= 25 {
        (dimension - 17) / 4
    } else {
        let version_bits = placement::read_version_info(symbol);
        tables::decode_version_info(version_bits).unwrap_or((dimension - 17) / 4)
    };

    if tables::dimension(version) != dimension {
        return Err(format_err!("QR version {version} does not match sampled dimension {dimension}"));
    }

    Ok((version, level, mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_dimension_is_odd_and_in_range() {
        let dim = estimate_dimension(PointF::new(0.0, 0.0), PointF::new(100.0, 0.0), PointF::new(0.0, 100.0), 100.0 / 21.0);
        assert_eq!(dim % 4, 1);
        assert!((21..=177).contains(&dim));
    }
}
