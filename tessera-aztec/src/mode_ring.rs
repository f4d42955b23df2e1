//! The mode-message ring: orientation corner triplets plus the mode-data bits,
//! laid out on a square one module outside the bullseye (spec §4.4 "Parameter
//! decoding").

use tessera_common::PointF;

/// One side's sample points, in ring order: the first three are the
/// orientation-corner bits for that corner, the rest are mode-data bits.
pub type Side = Vec<PointF>;

/// Total mode-message bits (orientation + data) for compact/full Aztec.
pub fn total_bits(compact: bool) -> u32 {
    if compact {
        40
    } else {
        52
    }
}

/// Mode-data bits alone (after the 12 orientation bits are removed).
pub fn data_bits(compact: bool) -> u32 {
    total_bits(compact) - 12
}

/// Generate the four sides of mode-ring sample points, in module-offset space
/// (origin at the bullseye centre), clockwise starting at the top-left corner.
pub fn sides(compact: bool) -> [Side; 4] {
    let per_side = total_bits(compact) / 4;
    let half = crate::data::bullseye_size(compact) as f64 / 2.0 + 1.0;

    let corners = [
        PointF::new(-half, -half),
        PointF::new(half, -half),
        PointF::new(half, half),
        PointF::new(-half, half),
    ];

    std::array::from_fn(|i| {
        let start = corners[i];
        let end = corners[(i + 1) % 4];
        (0..per_side)
            .map(|k| {
                let t = k as f64 / per_side as f64;
                PointF::new(start.x + (end.x - start.x) * t, start.y + (end.y - start.y) * t)
            })
            .collect()
    })
}

/// Split each side into its 3 orientation points and its data points.
pub fn split_orientation_and_data(sides: &[Side; 4]) -> ([PointF; 4 * 3], Vec<PointF>) {
    let mut orientation = Vec::with_capacity(12);
    let mut data = Vec::new();
    for side in sides {
        orientation.extend_from_slice(&side[..3.min(side.len())]);
        data.extend_from_slice(&side[3.min(side.len())..]);
    }
    (orientation.try_into().unwrap_or([PointF::new(0.0, 0.0); 12]), data)
}

/// Rotate the four sides by `rotation` quarter turns (matching
/// [`crate::parameter::match_orientation`]'s rotation index).
pub fn rotate_sides(sides: [Side; 4], rotation: u8) -> [Side; 4] {
    let r = (rotation % 4) as usize;
    std::array::from_fn(|i| sides[(i + r) % 4].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_sides_sum_to_total_bits() {
        let s = sides(true);
        let count: usize = s.iter().map(|side| side.len()).sum();
        assert_eq!(count as u32, total_bits(true));
    }

    #[test]
    fn rotation_is_a_cyclic_permutation() {
        let s = sides(false);
        let rotated = rotate_sides(s.clone(), 1);
        assert_eq!(rotated[0], s[1]);
        assert_eq!(rotated[3], s[0]);
    }
}
