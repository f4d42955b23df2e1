//! `GridSampler`: resampling a perspective-warped module grid (spec §4.2).

use tessera_common::{BitMatrix, PerspectiveTransform, PointF, Quadrilateral};

/// The result of sampling a detected symbol's module grid: the recovered bits
/// and the quadrilateral the destination grid's corners project to in source
/// pixel space.
#[derive(Debug, Clone)]
pub struct DetectorResult {
    /// The sampled module grid.
    pub bits: BitMatrix,
    /// The four destination-grid corners, projected back into source pixel
    /// space.
    pub position: Quadrilateral<PointF>,
}

fn inside(image_width: u32, image_height: u32, p: PointF) -> bool {
    p.x.is_finite()
        && p.y.is_finite()
        && p.x >= 0.0
        && p.y >= 0.0
        && p.x < image_width as f64
        && p.y < image_height as f64
}

/// Sample a `width x height` module grid from `source`, where `transform` maps
/// destination module coordinates to source pixel coordinates.
///
/// Before sampling, every boundary point of the destination grid's perimeter is
/// checked to project inside `source`; if any does not, `None` is returned (this
/// catches the numerical-instability cases that would otherwise yield a partial
/// grid, per spec.md §4.2).
pub fn sample_grid(
    source: &BitMatrix,
    width: u32,
    height: u32,
    transform: &PerspectiveTransform,
) -> Option<DetectorResult> {
    if !transform.is_valid() {
        return None;
    }

    let src_w = source.width();
    let src_h = source.height();

    for x in 0..width {
        for &y in &[0u32, height.saturating_sub(1)] {
            let p = transform.apply(PointF::new(x as f64 + 0.5, y as f64 + 0.5));
            if !inside(src_w, src_h, p) {
                return None;
            }
        }
    }
    for y in 0..height {
        for &x in &[0u32, width.saturating_sub(1)] {
            let p = transform.apply(PointF::new(x as f64 + 0.5, y as f64 + 0.5));
            if !inside(src_w, src_h, p) {
                return None;
            }
        }
    }

    let mut bits = BitMatrix::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let p = transform.apply(PointF::new(x as f64 + 0.5, y as f64 + 0.5));
            let rounded = p.round();
            let set = rounded.x >= 0
                && rounded.y >= 0
                && (rounded.x as u32) < src_w
                && (rounded.y as u32) < src_h
                && source.get(rounded.x, rounded.y);
            bits.set(x as i32, y as i32, set);
        }
    }

    let corner = |x: u32, y: u32| transform.apply(PointF::new(x as f64, y as f64));
    let position = Quadrilateral::new(
        corner(0, 0),
        corner(width, 0),
        corner(width, height),
        corner(0, height),
    );

    Some(DetectorResult { bits, position })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_samples_directly() {
        let mut source = BitMatrix::new(4, 4);
        source.set(1, 1, true);
        source.set(2, 2, true);

        let src_quad = Quadrilateral::new(
            PointF::new(0.0, 0.0),
            PointF::new(4.0, 0.0),
            PointF::new(4.0, 4.0),
            PointF::new(0.0, 4.0),
        );
        let dst_quad = src_quad;
        let transform = PerspectiveTransform::from_quads(&dst_quad, &src_quad);

        let result = sample_grid(&source, 4, 4, &transform).unwrap();
        assert!(result.bits.get(1, 1));
        assert!(result.bits.get(2, 2));
        assert!(!result.bits.get(0, 0));
    }

    #[test]
    fn out_of_bounds_projection_yields_none() {
        let source = BitMatrix::new(4, 4);
        let transform = PerspectiveTransform::invalid();
        assert!(sample_grid(&source, 4, 4, &transform).is_none());
    }
}
