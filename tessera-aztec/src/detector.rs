//! Aztec symbol location: bullseye search, mode-message read, orientation
//! correction and full-grid sampling (spec §4.4 "Detector").

use log::trace;
use tessera_binarize::{detect_white_rect, find_concentric_pattern_corners, locate_concentric_pattern};
use tessera_common::{format_err, BitMatrix, Error, PerspectiveTransform, PointF, Quadrilateral};

use crate::{data, mode_ring, parameter};

/// Geometry and decoded mode-message fields for a located Aztec symbol.
pub struct Detection {
    /// Whether this is a compact (small) or full-size Aztec symbol.
    pub compact: bool,
    /// Decoded mode message.
    pub mode: parameter::ModeMessage,
    /// The transform from module-offset-from-centre space into source pixels.
    pub transform: PerspectiveTransform,
    /// The symbol's four outer corners in pixel space, for `Barcode::position`.
    pub position: Quadrilateral<PointF>,
}

fn seed_point(matrix: &BitMatrix, is_pure: bool) -> PointF {
    if is_pure {
        if let Some(((min_x, min_y), (max_x, max_y))) = matrix.bounding_box_of_set() {
            return PointF::new((min_x + max_x) as f64 / 2.0, (min_y + max_y) as f64 / 2.0);
        }
    }
    PointF::new(matrix.width() as f64 / 2.0, matrix.height() as f64 / 2.0)
}

/// Try to locate and read an Aztec symbol's mode message in `matrix`.
pub fn detect(matrix: &BitMatrix, is_pure: bool) -> Result<Detection, Error> {
    let seed = seed_point(matrix, is_pure);
    let rect = detect_white_rect(matrix, seed.x.round() as i32, seed.y.round() as i32)
        .ok_or_else(|| format_err!("no white quiet zone found around the candidate Aztec symbol"))?;
    let tentative_center = rect.center();
    let module_hint = ((rect.top_right - rect.top_left).length() / 15.0).max(1.0);

    let candidate = locate_concentric_pattern(matrix, tentative_center, module_hint)
        .ok_or_else(|| format_err!("no bull's-eye pattern found near the candidate centre"))?;

    for compact in [true, false] {
        if let Some(detection) = try_decode_mode(matrix, candidate.center, candidate.module_size, compact) {
            return Ok(detection);
        }
    }

    Err(format_err!("Aztec bull's-eye mode message did not decode for either compact or full size"))
}

fn try_decode_mode(matrix: &BitMatrix, center: PointF, module_size: f64, compact: bool) -> Option<Detection> {
    let bullseye_half = data::bullseye_size(compact) as f64 / 2.0;
    let ring_index = (bullseye_half - 1.5).max(0.0) as u32;
    let corners = find_concentric_pattern_corners(matrix, center, module_size, ring_index)?;

    let unit = bullseye_half;
    let module_space_quad = Quadrilateral::new(
        PointF::new(-unit, -unit),
        PointF::new(unit, -unit),
        PointF::new(unit, unit),
        PointF::new(-unit, unit),
    );
    let transform = PerspectiveTransform::from_quads(&module_space_quad, &corners);
    if !transform.is_valid() {
        return None;
    }

    let raw_sides = mode_ring::sides(compact);
    let (orientation_points, _) = mode_ring::split_orientation_and_data(&raw_sides);
    let orientation_bits = sample_bits(matrix, &transform, &orientation_points);
    let orientation_value = orientation_bits.iter().fold(0u16, |acc, &b| (acc << 1) | u16::from(b));
    let rotation = parameter::match_orientation(orientation_value)?;

    let rotated_sides = mode_ring::rotate_sides(raw_sides, rotation);
    let (_, data_points) = mode_ring::split_orientation_and_data(&rotated_sides);
    let data_bits = sample_bits(matrix, &transform, &data_points);

    let codeword_size = 4u32;
    let codewords: Vec<u16> = data_bits
        .chunks(codeword_size as usize)
        .filter(|c| c.len() == codeword_size as usize)
        .map(|c| c.iter().fold(0u16, |acc, &b| (acc << 1) | u16::from(b)))
        .collect();

    let mode = parameter::decode_mode_data(&codewords, compact).ok()?;
    trace!(
        "Aztec mode message decoded: compact={compact} layers={} data_blocks={}",
        mode.layers, mode.data_blocks
    );

    let position = Quadrilateral::new(
        transform.apply(PointF::new(-unit, -unit)),
        transform.apply(PointF::new(unit, -unit)),
        transform.apply(PointF::new(unit, unit)),
        transform.apply(PointF::new(-unit, unit)),
    );

    Some(Detection {
        compact,
        mode,
        transform,
        position,
    })
}

fn sample_bits(matrix: &BitMatrix, transform: &PerspectiveTransform, points: &[PointF]) -> Vec<bool> {
    points
        .iter()
        .map(|&p| {
            let pixel = transform.apply(p).round();
            matrix.get(pixel.x, pixel.y)
        })
        .collect()
}

/// Sample the full symbol matrix (bullseye + all data rings) given a detected
/// transform and layer count, for [`data::decode_data_bits`] to read.
pub fn sample_symbol(matrix: &BitMatrix, detection: &Detection) -> BitMatrix {
    let size = data::matrix_size(detection.mode.layers, detection.compact);
    let mut out = BitMatrix::new(size, size);
    let half = size as f64 / 2.0;

    for y in 0..size {
        for x in 0..size {
            let module_offset = PointF::new(x as f64 - half + 0.5, y as f64 - half + 0.5);
            let pixel = detection.transform.apply(module_offset).round();
            out.set(x as i32, y as i32, matrix.get(pixel.x, pixel.y));
        }
    }

    out
}
