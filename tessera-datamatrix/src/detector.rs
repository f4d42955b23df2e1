//! Data Matrix symbol location: quiet-zone search, solid-border/clock-track
//! orientation, module-count estimation and grid sampling (spec §4.4
//! "Detector"). No detector source was recovered from the original
//! implementation for this format, so this is grounded on the same
//! `detect_white_rect` + cursor-based edge walk used by the Aztec detector,
//! adapted to ECC200's L-shaped solid finder instead of a bullseye.

use log::trace;
use tessera_binarize::{detect_white_rect, BitMatrixCursor};
use tessera_common::{format_err, BitMatrix, Error, PerspectiveTransform, PointF, Quadrilateral};

use crate::symbol_info::{lookup, SymbolInfo, SymbolShape};

/// Geometry and module counts for a located Data Matrix symbol.
pub struct Detection {
    /// The symbol's four outer corners in pixel space, for `Barcode::position`.
    pub position: Quadrilateral<PointF>,
    /// Module columns across the full symbol (including finder/timing border).
    pub modules_wide: u32,
    /// Module rows across the full symbol.
    pub modules_high: u32,
    /// The transform from module-offset space (top-left origin) into source
    /// pixels.
    pub transform: PerspectiveTransform,
}

fn seed_point(matrix: &BitMatrix, is_pure: bool) -> PointF {
    if is_pure {
        if let Some(((min_x, min_y), (max_x, max_y))) = matrix.bounding_box_of_set() {
            return PointF::new((min_x + max_x) as f64 / 2.0, (min_y + max_y) as f64 / 2.0);
        }
    }
    PointF::new(matrix.width() as f64 / 2.0, matrix.height() as f64 / 2.0)
}

/// Count the black/white transitions along the segment from `from` to `to`,
/// used to estimate the module count on a given side of the symbol.
fn count_transitions(matrix: &BitMatrix, from: PointF, to: PointF) -> u32 {
    let delta = to - from;
    let len = delta.length();
    if len < 1.0 {
        return 0;
    }
    let dir = delta.normalized();
    let mut cursor = BitMatrixCursor::new(matrix, from, dir);
    let mut transitions = 0u32;
    let steps = len.round() as u32;
    let mut last = cursor.test_here();
    for _ in 0..steps {
        cursor.step(1.0);
        let current = cursor.test_here();
        if current != last {
            transitions += 1;
            last = current;
        }
    }
    transitions
}

/// Try every rotation of `quad` (a corner-ordered quadrilateral from
/// `detect_white_rect`) and pick the one whose left and bottom edges have the
/// fewest transitions (the two solid sides of the L-shaped finder).
fn orient(matrix: &BitMatrix, quad: Quadrilateral<PointF>) -> Quadrilateral<PointF> {
    let rotations = [
        quad,
        Quadrilateral::new(quad.top_right, quad.bottom_right, quad.bottom_left, quad.top_left),
        Quadrilateral::new(quad.bottom_right, quad.bottom_left, quad.top_left, quad.top_right),
        Quadrilateral::new(quad.bottom_left, quad.top_left, quad.top_right, quad.bottom_right),
    ];

    rotations
        .into_iter()
        .min_by_key(|q| {
            let left = count_transitions(matrix, q.top_left, q.bottom_left);
            let bottom = count_transitions(matrix, q.bottom_left, q.bottom_right);
            left + bottom
        })
        .unwrap_or(quad)
}

/// Locate and sample a Data Matrix symbol in `matrix`.
pub fn detect(matrix: &BitMatrix, is_pure: bool) -> Result<Detection, Error> {
    let seed = seed_point(matrix, is_pure);
    let raw_quad = detect_white_rect(matrix, seed.x.round() as i32, seed.y.round() as i32)
        .ok_or_else(|| format_err!("no white quiet zone found around the candidate Data Matrix symbol"))?;
    let quad = orient(matrix, raw_quad);

    let top_transitions = count_transitions(matrix, quad.top_left, quad.top_right);
    let right_transitions = count_transitions(matrix, quad.top_right, quad.bottom_right);

    // The clock-track sides alternate once per module; the finder itself adds
    // one more module than the number of transitions crossed.
    let modules_wide = (top_transitions + 2).max(8);
    let modules_high = (right_transitions + 2).max(8);

    let module_space_quad = Quadrilateral::new(
        PointF::new(0.0, 0.0),
        PointF::new(modules_wide as f64, 0.0),
        PointF::new(modules_wide as f64, modules_high as f64),
        PointF::new(0.0, modules_high as f64),
    );
    let transform = PerspectiveTransform::from_quads(&module_space_quad, &quad);
    if !transform.is_valid() {
        return Err(format_err!("Data Matrix quiet-zone quadrilateral did not yield a valid perspective transform"));
    }

    trace!("Data Matrix detection: modules_wide={modules_wide} modules_high={modules_high}");

    Ok(Detection {
        position: quad,
        modules_wide,
        modules_high,
        transform,
    })
}

/// Sample the full symbol matrix (finder border, clock track and data
/// regions) given a detected transform and module dimensions.
pub fn sample_symbol(matrix: &BitMatrix, detection: &Detection) -> BitMatrix {
    let mut out = BitMatrix::new(detection.modules_wide as i32, detection.modules_high as i32);
    for y in 0..detection.modules_high {
        for x in 0..detection.modules_wide {
            let module_offset = PointF::new(x as f64 + 0.5, y as f64 + 0.5);
            let pixel = detection.transform.apply(module_offset).round();
            out.set(x as i32, y as i32, matrix.get(pixel.x, pixel.y));
        }
    }
    out
}

/// Resolve the [`SymbolInfo`] matching a detected symbol's full module size.
pub fn symbol_info_for_detection(detection: &Detection) -> Result<&'static SymbolInfo, Error> {
    crate::symbol_info::SYMBOLS
        .iter()
        .find(|s| s.symbol_width() == detection.modules_wide && s.symbol_height() == detection.modules_high)
        .ok_or_else(|| {
            format_err!(
                "no Data Matrix symbol size matches the detected {}x{} module grid",
                detection.modules_wide,
                detection.modules_high
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_info_lookup_matches_known_size() {
        let symbol = lookup(8, SymbolShape::None, None, None, None, None).unwrap();
        let detection = Detection {
            position: Quadrilateral::new(
                PointF::new(0.0, 0.0),
                PointF::new(1.0, 0.0),
                PointF::new(1.0, 1.0),
                PointF::new(0.0, 1.0),
            ),
            modules_wide: symbol.symbol_width(),
            modules_high: symbol.symbol_height(),
            transform: PerspectiveTransform::from_quads(
                &Quadrilateral::new(
                    PointF::new(0.0, 0.0),
                    PointF::new(1.0, 0.0),
                    PointF::new(1.0, 1.0),
                    PointF::new(0.0, 1.0),
                ),
                &Quadrilateral::new(
                    PointF::new(0.0, 0.0),
                    PointF::new(1.0, 0.0),
                    PointF::new(1.0, 1.0),
                    PointF::new(0.0, 1.0),
                ),
            ),
        };
        let found = symbol_info_for_detection(&detection).unwrap();
        assert_eq!(found.data_capacity, symbol.data_capacity);
    }
}
