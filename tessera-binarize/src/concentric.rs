//! Concentric finder / bull's-eye pattern location and corner fitting (spec
//! §4.3), shared by Aztec's bull's-eye centre search and QR's finder patterns.

use tessera_common::{BitMatrix, PointF, Quadrilateral, RegressionLine};

use crate::cursor::BitMatrixCursor;

/// The five run widths of a `b:w:B:w:b` = `1:1:3:1:1` finder pattern, along one
/// scan direction.
#[derive(Debug, Clone, Copy)]
struct RunRatio {
    widths: [u32; 5],
}

impl RunRatio {
    /// Whether the five run widths are consistent with the 1:1:3:1:1 ratio,
    /// within the usual one-module tolerance.
    fn matches(&self) -> bool {
        let total: u32 = self.widths.iter().sum();
        if total < 7 {
            return false;
        }
        let unit = total as f64 / 7.0;
        let tolerance = (unit * 0.6).max(1.0);
        let expected = [1.0, 1.0, 3.0, 1.0, 1.0];
        self.widths
            .iter()
            .zip(expected.iter())
            .all(|(&w, &e)| (w as f64 - e * unit).abs() <= tolerance * e.max(1.0))
    }

    fn module_size(&self) -> f64 {
        self.widths.iter().sum::<u32>() as f64 / 7.0
    }
}

/// Slide a 5-run window across `row`, collecting candidate centre x-coordinates
/// wherever the ratio matches.
fn scan_row_for_finder_candidates(row: &[bool]) -> Vec<(f64, f64)> {
    let mut candidates = Vec::new();
    let mut runs: Vec<(bool, u32)> = Vec::new();
    let mut last = row.first().copied().unwrap_or(false);
    let mut count = 0u32;
    for &bit in row {
        if bit == last {
            count += 1;
        } else {
            runs.push((last, count));
            last = bit;
            count = 1;
        }
    }
    runs.push((last, count));

    if runs.len() < 5 {
        return candidates;
    }

    let mut offset = 0u32;
    for window in runs.windows(5) {
        // Finder runs alternate black/white/black/white/black starting black.
        if window[0].0 && !window[1].0 && window[2].0 && !window[3].0 && window[4].0 {
            let widths = [window[0].1, window[1].1, window[2].1, window[3].1, window[4].1];
            let ratio = RunRatio { widths };
            if ratio.matches() {
                let centre_offset = offset + widths[0] + widths[1] + widths[2] / 2;
                candidates.push((centre_offset as f64, ratio.module_size()));
            }
        }
        offset += window[0].1;
    }

    candidates
}

/// A located finder/bull's-eye centre with its estimated module size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderCandidate {
    /// The refined centre point.
    pub center: PointF,
    /// Estimated module size (average bar/space width) at the centre.
    pub module_size: f64,
}

/// Scan every `row_skip`-th row of `matrix` for 1:1:3:1:1 finder candidates,
/// de-duplicating results that fall within half a module of an existing
/// candidate.
pub fn find_finder_patterns(matrix: &BitMatrix, row_skip: u32) -> Vec<FinderCandidate> {
    let mut found: Vec<FinderCandidate> = Vec::new();
    let row_skip = row_skip.max(1);

    for y in (0..matrix.height()).step_by(row_skip as usize) {
        let row: Vec<bool> = matrix.row(y).collect();
        for (x, module_size) in scan_row_for_finder_candidates(&row) {
            let centre = PointF::new(x, y as f64);
            if let Some(refined) = locate_concentric_pattern(matrix, centre, module_size) {
                let dedup_radius = refined.module_size * 0.5;
                if !found
                    .iter()
                    .any(|c| (c.center - refined.center).length() < dedup_radius.max(1.0))
                {
                    found.push(refined);
                }
            }
        }
    }

    found
}

/// From a tentative centre, verify the eight-direction ray pattern and refine
/// the centre via ring-tracing / corner-fit / double-cross averaging, in that
/// order of preference (spec.md §4.3).
pub fn locate_concentric_pattern(
    matrix: &BitMatrix,
    tentative: PointF,
    module_size_hint: f64,
) -> Option<FinderCandidate> {
    const DIRECTIONS: [(f64, f64); 8] = [
        (1.0, 0.0),
        (-1.0, 0.0),
        (0.0, 1.0),
        (0.0, -1.0),
        (1.0, 1.0),
        (1.0, -1.0),
        (-1.0, 1.0),
        (-1.0, -1.0),
    ];

    let range = (module_size_hint * 8.0).max(8.0) as u32;
    let mut spreads = Vec::with_capacity(8);

    for &(dx, dy) in &DIRECTIONS {
        let norm = (dx * dx + dy * dy).sqrt();
        let dir = PointF::new(dx / norm, dy / norm);
        let mut cursor = BitMatrixCursor::new(matrix, tentative, dir);
        let widths = cursor.read_pattern(5, range)?;
        let ratio = RunRatio {
            widths: [widths[0], widths[1], widths[2], widths[3], widths[4]],
        };
        if !ratio.matches() {
            return None;
        }
        spreads.push(widths.iter().sum::<u32>() as f64);
    }

    let max = spreads.iter().cloned().fold(f64::MIN, f64::max);
    let min = spreads.iter().cloned().fold(f64::MAX, f64::min);
    if min <= 0.0 || max / min > 5.0 {
        return None;
    }

    let module_size = spreads.iter().sum::<f64>() / (spreads.len() as f64 * 7.0);

    let center = center_of_rings(matrix, tentative, module_size)
        .or_else(|| fit_square_to_points(matrix, tentative, module_size).map(|q| q.center()))
        .or_else(|| center_of_double_cross(matrix, tentative, module_size));

    center.map(|center| FinderCandidate { center, module_size })
}

/// Walk the innermost ring to trace a closed loop around `tentative`; succeeds
/// if all eight compass neighbours of the averaged centre are visited.
fn center_of_rings(matrix: &BitMatrix, tentative: PointF, module_size: f64) -> Option<PointF> {
    let radius = module_size * 1.5;
    let mut points = Vec::new();
    let mut visited_mask = 0u32;

    for step in 0..16 {
        let angle = step as f64 / 16.0 * std::f64::consts::TAU;
        let p = PointF::new(tentative.x + angle.cos() * radius, tentative.y + angle.sin() * radius);
        let rounded = p.round();
        if rounded.x < 0 || rounded.y < 0 {
            continue;
        }
        if !matrix.get(rounded.x, rounded.y) {
            continue;
        }
        points.push(p);
        let octant = ((angle / (std::f64::consts::TAU / 8.0)).round() as i32).rem_euclid(8);
        visited_mask |= 1 << octant;
    }

    if visited_mask != 0b1111_1111 || points.is_empty() {
        return None;
    }

    let sum = points.iter().fold(PointF::new(0.0, 0.0), |acc, &p| acc + p);
    let avg = sum * (1.0 / points.len() as f64);
    matrix
        .get(avg.round().x, avg.round().y)
        .then_some(avg)
}

/// Fit a four-corner quadrilateral to the ring at `tentative`, via
/// [`find_concentric_pattern_corners`].
fn fit_square_to_points(
    matrix: &BitMatrix,
    tentative: PointF,
    module_size: f64,
) -> Option<Quadrilateral<PointF>> {
    find_concentric_pattern_corners(matrix, tentative, module_size, 1)
}

/// Average the edge midpoints found by walking the four diagonal directions
/// outward until the black/white edge is crossed.
fn center_of_double_cross(matrix: &BitMatrix, tentative: PointF, module_size: f64) -> Option<PointF> {
    const DIAGONALS: [(f64, f64); 4] = [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)];
    let range = (module_size * 8.0).max(8.0) as u32;

    let mut midpoints = Vec::new();
    for &(dx, dy) in &DIAGONALS {
        let norm = (dx * dx + dy * dy).sqrt();
        let dir = PointF::new(dx / norm, dy / norm);
        let mut cursor = BitMatrixCursor::new(matrix, tentative, dir);
        let steps = cursor.step_to_edge(1, range, true);
        if steps == 0 {
            return None;
        }
        midpoints.push(cursor.position());
    }

    let sum = midpoints.iter().fold(PointF::new(0.0, 0.0), |acc, &p| acc + p);
    Some(sum * (1.0 / midpoints.len() as f64))
}

/// Walk both the inner and outer edges of the ring at `ring_index` module radii
/// from `centre`, find the four corners of each edge's point cloud, and blend
/// them into one quadrilateral.
///
/// Corner selection: the farthest point from the centre is corner 0; farthest
/// from corner 0 is corner 2; the remaining two corners are the points farthest
/// from the long diagonal on either side.
pub fn find_concentric_pattern_corners(
    matrix: &BitMatrix,
    centre: PointF,
    module_size: f64,
    ring_index: u32,
) -> Option<Quadrilateral<PointF>> {
    let inner_quad = trace_ring_corners(matrix, centre, module_size * (ring_index as f64 + 0.5))?;
    let outer_quad = trace_ring_corners(matrix, centre, module_size * (ring_index as f64 + 1.5))?;
    Some(inner_quad.blend(&outer_quad))
}

fn trace_ring_corners(matrix: &BitMatrix, centre: PointF, radius: f64) -> Option<Quadrilateral<PointF>> {
    let samples = 64;
    let mut cloud = Vec::with_capacity(samples);
    for step in 0..samples {
        let angle = step as f64 / samples as f64 * std::f64::consts::TAU;
        let p = PointF::new(centre.x + angle.cos() * radius, centre.y + angle.sin() * radius);
        let rounded = p.round();
        if rounded.x < 0 || rounded.y < 0 {
            continue;
        }
        if matrix.get(rounded.x, rounded.y) {
            cloud.push(p);
        }
    }

    if cloud.len() < 4 {
        return None;
    }

    let dist2 = |a: PointF, b: PointF| {
        let d = a - b;
        d.x * d.x + d.y * d.y
    };

    let corner0 = *cloud
        .iter()
        .max_by(|a, b| dist2(centre, **a).total_cmp(&dist2(centre, **b)))?;
    let corner2 = *cloud
        .iter()
        .max_by(|a, b| dist2(corner0, **a).total_cmp(&dist2(corner0, **b)))?;

    let mut line = RegressionLine::new();
    line.add(corner0);
    line.add(corner2);
    line.fit();

    let mut on_plus_side = Vec::new();
    let mut on_minus_side = Vec::new();
    for &p in &cloud {
        if let Some(d) = line.clone().signed_distance(p) {
            if d >= 0.0 {
                on_plus_side.push(p);
            } else {
                on_minus_side.push(p);
            }
        }
    }

    let farthest = |side: &mut [PointF], mut line: RegressionLine| {
        side.iter()
            .copied()
            .max_by(|a, b| {
                line.signed_distance(*a)
                    .unwrap_or(0.0)
                    .abs()
                    .total_cmp(&line.signed_distance(*b).unwrap_or(0.0).abs())
            })
    };

    let corner1 = farthest(&mut on_plus_side, line.clone())?;
    let corner3 = farthest(&mut on_minus_side, line.clone())?;

    Some(Quadrilateral::new(corner0, corner1, corner2, corner3))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_target(size: u32) -> BitMatrix {
        // A simple nested bull's-eye-like square target for smoke testing.
        let mut m = BitMatrix::new(size, size);
        let c = size as i32 / 2;
        for radius in [2, 6, 10] {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() == radius || dy.abs() == radius {
                        m.set(c + dx, c + dy, true);
                    }
                }
            }
        }
        m.set(c, c, true);
        m
    }

    #[test]
    fn find_concentric_pattern_corners_returns_a_quad() {
        let m = square_target(40);
        let centre = PointF::new(20.0, 20.0);
        let quad = find_concentric_pattern_corners(&m, centre, 2.0, 1);
        assert!(quad.is_some());
    }

    #[test]
    fn run_ratio_matches_ideal_pattern() {
        let ratio = RunRatio { widths: [2, 2, 6, 2, 2] };
        assert!(ratio.matches());
    }

    #[test]
    fn run_ratio_rejects_uneven_pattern() {
        let ratio = RunRatio { widths: [1, 1, 1, 1, 1] };
        assert!(!ratio.matches());
    }
}
