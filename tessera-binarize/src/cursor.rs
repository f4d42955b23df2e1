//! `BitMatrixCursor`: position-and-direction pixel walking (spec §4.2).

use smallvec::SmallVec;
use tessera_common::{BitMatrix, PointF, PointI};

/// The result of sampling a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
    /// Outside the image.
    Invalid,
    /// An unset (background) pixel.
    White,
    /// A set (foreground) pixel.
    Black,
}

impl Pixel {
    fn from_bit(bit: bool) -> Self {
        if bit {
            Self::Black
        } else {
            Self::White
        }
    }
}

/// A position and direction, walking a [`BitMatrix`] one pixel step at a time.
///
/// Coordinates are floating-point so a cursor can be advanced along a direction
/// estimated to sub-pixel precision (e.g. from a finder-pattern centre) while
/// still sampling discrete pixels.
#[derive(Debug, Clone, Copy)]
pub struct BitMatrixCursor<'a> {
    matrix: &'a BitMatrix,
    p: PointF,
    d: PointF,
}

impl<'a> BitMatrixCursor<'a> {
    /// Start a cursor at `p` heading in direction `d` (not required to be unit
    /// length; each `step` moves by exactly one `d`).
    pub fn new(matrix: &'a BitMatrix, p: PointF, d: PointF) -> Self {
        Self { matrix, p, d }
    }

    /// Current position.
    pub fn position(&self) -> PointF {
        self.p
    }

    /// Current direction.
    pub fn direction(&self) -> PointF {
        self.d
    }

    /// Advance the position by `n` steps of the current direction.
    pub fn step(&mut self, n: f64) {
        self.p = self.p + self.d * n;
    }

    /// Rotate the direction 90 degrees counter-clockwise.
    pub fn turn_left(&mut self) {
        self.d = self.d.perp();
    }

    /// Rotate the direction 90 degrees clockwise.
    pub fn turn_right(&mut self) {
        self.d = self.d.perp() * -1.0;
    }

    /// Rotate the direction 180 degrees.
    pub fn turn_back(&mut self) {
        self.d = self.d * -1.0;
    }

    /// Sample the matrix at `q`, rounding to the nearest pixel.
    pub fn test_at(&self, q: PointF) -> Pixel {
        let rounded: PointI = q.round();
        if rounded.x < 0 || rounded.y < 0 {
            return Pixel::Invalid;
        }
        if rounded.x as u32 >= self.matrix.width() || rounded.y as u32 >= self.matrix.height() {
            return Pixel::Invalid;
        }
        Pixel::from_bit(self.matrix.get(rounded.x, rounded.y))
    }

    /// Sample at the current position.
    pub fn test_here(&self) -> Pixel {
        self.test_at(self.p)
    }

    /// Walk forward, one step of `d` at a time, until `n` colour transitions have
    /// been seen, `range` steps have been exhausted, or the image boundary is
    /// reached. Returns the number of steps actually taken (0 on failure). If
    /// `backup` is set, steps back one pixel so the cursor rests on the last
    /// pixel before the transition rather than on the far side of it.
    pub fn step_to_edge(&mut self, n: u32, range: u32, backup: bool) -> u32 {
        let mut transitions = 0u32;
        let mut last = self.test_here();
        let mut steps = 0u32;

        while transitions < n && steps < range {
            self.step(1.0);
            steps += 1;
            let current = self.test_here();
            if current == Pixel::Invalid {
                // Roll back the failed step before reporting failure.
                self.step(-1.0);
                return 0;
            }
            if current != last {
                transitions += 1;
                last = current;
            }
        }

        if transitions < n {
            self.step(-(steps as f64));
            return 0;
        }

        if backup {
            self.step(-1.0);
            steps -= 1;
        }

        steps
    }

    /// Read a fixed-length run-length tuple by calling [`step_to_edge`] `n` times,
    /// each with `backup = false`.
    pub fn read_pattern(&mut self, n: usize, range: u32) -> Option<SmallVec<[u32; 16]>> {
        let mut widths = SmallVec::new();
        for _ in 0..n {
            let steps = self.step_to_edge(1, range, false);
            if steps == 0 {
                return None;
            }
            widths.push(steps);
        }
        Some(widths)
    }

    /// Which side the contour-following walk keeps the colour boundary on.
    pub fn step_along_edge(&mut self, keep_left: bool, skip_corner: bool) -> bool {
        let forward = self.test_at(self.p + self.d);
        let side_dir = if keep_left { self.d.perp() } else { self.d.perp() * -1.0 };
        let diagonal = self.test_at(self.p + self.d + side_dir);
        let lateral = self.test_at(self.p + side_dir);

        match (forward, lateral) {
            // Straight edge: forward pixel keeps the same colour relationship, walk on.
            (Pixel::Black, Pixel::White) | (Pixel::White, Pixel::Black) => {
                self.step(1.0);
                true
            }
            // Inside corner: the boundary turns toward the tracked side.
            (Pixel::Black, Pixel::Black) | (Pixel::White, Pixel::White) if diagonal != forward => {
                self.step(1.0);
                if keep_left {
                    self.turn_right();
                } else {
                    self.turn_left();
                }
                if !skip_corner {
                    self.step(1.0);
                }
                true
            }
            // Outside corner: back off and turn away from the tracked side.
            _ => {
                if keep_left {
                    self.turn_left();
                } else {
                    self.turn_right();
                }
                self.test_here() != Pixel::Invalid
            }
        }
    }
}

/// An axis-aligned fast path for [`BitMatrixCursor::step_to_edge`]-style counting,
/// used on the hot inner loop of horizontal/vertical scanning where the direction
/// is a unit cardinal vector. Walks a byte-stride linear view instead of the
/// general floating-point cursor.
pub struct FastEdgeToEdgeCounter<'a> {
    row: Vec<bool>,
    pos: usize,
    _matrix: &'a BitMatrix,
}

impl<'a> FastEdgeToEdgeCounter<'a> {
    /// A counter scanning row `y` of `matrix` left to right, starting at column
    /// `start_x`.
    pub fn new_row(matrix: &'a BitMatrix, y: u32, start_x: u32) -> Self {
        Self {
            row: matrix.row(y).collect(),
            pos: start_x as usize,
            _matrix: matrix,
        }
    }

    /// Count forward until `n` colour transitions are seen or the row ends.
    /// Returns the number of pixels advanced, or 0 on failure.
    pub fn count_to_edge(&mut self, n: u32) -> u32 {
        if self.pos >= self.row.len() {
            return 0;
        }
        let mut transitions = 0u32;
        let mut last = self.row[self.pos];
        let start = self.pos;

        while transitions < n {
            self.pos += 1;
            if self.pos >= self.row.len() {
                self.pos = start;
                return 0;
            }
            if self.row[self.pos] != last {
                transitions += 1;
                last = self.row[self.pos];
            }
        }

        (self.pos - start) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> BitMatrix {
        // B B W W W B B  (width 7)
        let mut m = BitMatrix::new(7, 1);
        for x in [0, 1, 5, 6] {
            m.set(x, 0, true);
        }
        m
    }

    #[test]
    fn step_to_edge_counts_transitions() {
        let m = sample_matrix();
        let mut cursor = BitMatrixCursor::new(&m, PointF::new(0.0, 0.0), PointF::new(1.0, 0.0));
        let steps = cursor.step_to_edge(1, 10, false);
        assert_eq!(steps, 2); // first transition at x=2 (black->white)
    }

    #[test]
    fn turn_left_right_back_rotate_direction() {
        let m = sample_matrix();
        let mut cursor = BitMatrixCursor::new(&m, PointF::new(0.0, 0.0), PointF::new(1.0, 0.0));
        cursor.turn_left();
        assert!((cursor.direction().x).abs() < 1e-9);
        assert!((cursor.direction().y - 1.0).abs() < 1e-9);
        cursor.turn_back();
        assert!((cursor.direction().y + 1.0).abs() < 1e-9);
    }

    #[test]
    fn read_pattern_collects_run_widths() {
        let m = sample_matrix();
        let mut cursor = BitMatrixCursor::new(&m, PointF::new(0.0, 0.0), PointF::new(1.0, 0.0));
        let widths = cursor.read_pattern(3, 10).unwrap();
        assert_eq!(&widths[..], &[2, 3, 2]);
    }

    #[test]
    fn fast_counter_matches_cursor_result() {
        let m = sample_matrix();
        let mut fast = FastEdgeToEdgeCounter::new_row(&m, 0, 0);
        assert_eq!(fast.count_to_edge(1), 2);
    }
}
