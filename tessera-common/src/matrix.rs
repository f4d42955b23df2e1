//! `BitMatrix` and the generic `Matrix<T>` (spec §3).

/// A generic dense 2-D array, row-major, used for intermediate numeric work such
/// as per-block binarizer thresholds.
#[derive(Debug, Clone)]
pub struct Matrix<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Clone + Default> Matrix<T> {
    /// A matrix of the given size, filled with `T::default()`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); (width as usize) * (height as usize)],
        }
    }
}

impl<T> Matrix<T> {
    /// Width in columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read a cell. Panics if out of bounds (callers are expected to stay within
    /// `width`/`height`; this mirrors the teacher's unchecked-by-default indexing
    /// with explicit bounds-checked variants reserved for boundary code).
    pub fn get(&self, x: u32, y: u32) -> &T {
        &self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Write a cell.
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.data[idx] = value;
    }

    /// Iterate over a row.
    pub fn row(&self, y: u32) -> &[T] {
        let start = (y as usize) * (self.width as usize);
        &self.data[start..start + self.width as usize]
    }
}

/// A dense packed binary image, byte-valued so the same storage can be read either
/// as booleans or as raw bytes by a vectorized threshold loop.
///
/// `SET`/`UNSET` satisfy `bool::from(SET) && !bool::from(UNSET)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BitMatrix {
    /// The "on"/black cell value.
    pub const SET: u8 = 0xFF;
    /// The "off"/white cell value.
    pub const UNSET: u8 = 0x00;

    /// A matrix of the given size, all cells unset.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![Self::UNSET; (width as usize) * (height as usize)],
        }
    }

    /// Width in modules/pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in modules/pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw byte storage, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Whether the cell at `(x, y)` is set. Out-of-bounds reads return `false`.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        self.data[(y as usize) * (self.width as usize) + (x as usize)] == Self::SET
    }

    /// Set or unset a single cell. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: bool) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.data[idx] = if value { Self::SET } else { Self::UNSET };
    }

    /// Flip a single cell.
    #[inline]
    pub fn flip(&mut self, x: i32, y: i32) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.data[idx] = if self.data[idx] == Self::SET {
            Self::UNSET
        } else {
            Self::SET
        };
    }

    /// Set every cell in `[x, x+w) x [y, y+h)` to `value`, clipped to the matrix
    /// bounds.
    pub fn set_region(&mut self, x: i32, y: i32, w: u32, h: u32, value: bool) {
        let byte = if value { Self::SET } else { Self::UNSET };
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w as i32).min(self.width as i32);
        let y1 = (y + h as i32).min(self.height as i32);
        for row in y0..y1 {
            for col in x0..x1 {
                let idx = (row as usize) * (self.width as usize) + (col as usize);
                self.data[idx] = byte;
            }
        }
    }

    /// Flip every cell in `[x, x+w) x [y, y+h)`, clipped to the matrix bounds.
    pub fn flip_region(&mut self, x: i32, y: i32, w: u32, h: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w as i32).min(self.width as i32);
        let y1 = (y + h as i32).min(self.height as i32);
        for row in y0..y1 {
            for col in x0..x1 {
                self.flip(col, row);
            }
        }
    }

    /// Rotate the matrix 90 degrees clockwise.
    #[must_use]
    pub fn rotated_90(&self) -> Self {
        let mut out = Self::new(self.height, self.width);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                // (x, y) in source -> (height-1-y, x) in destination.
                out.set(self.height as i32 - 1 - y, x, self.get(x, y));
            }
        }
        out
    }

    /// Rotate the matrix 180 degrees.
    #[must_use]
    pub fn rotated_180(&self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                out.set(
                    self.width as i32 - 1 - x,
                    self.height as i32 - 1 - y,
                    self.get(x, y),
                );
            }
        }
        out
    }

    /// Mirror across the main diagonal (transpose).
    #[must_use]
    pub fn mirrored_diagonal(&self) -> Self {
        let mut out = Self::new(self.height, self.width);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                out.set(y, x, self.get(x, y));
            }
        }
        out
    }

    /// The axis-aligned bounding box of set pixels, as `(min, max)` inclusive, or
    /// `None` if no pixel is set.
    pub fn bounding_box_of_set(&self) -> Option<((u32, u32), (u32, u32))> {
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        let mut found = false;

        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x as i32, y as i32) {
                    found = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        found.then_some(((min_x, min_y), (max_x, max_y)))
    }

    /// The complement: every set cell unset and vice versa. Used to try the
    /// opposite reflectance polarity when a capture's black/white sense is
    /// unknown.
    #[must_use]
    pub fn inverted(&self) -> Self {
        let data = self.data.iter().map(|&b| if b == Self::SET { Self::UNSET } else { Self::SET }).collect();
        Self { width: self.width, height: self.height, data }
    }

    /// An iterator over one row's cells as booleans.
    pub fn row(&self, y: u32) -> impl Iterator<Item = bool> + '_ {
        (0..self.width).map(move |x| self.get(x as i32, y as i32))
    }

    /// An iterator over one column's cells as booleans (uses a strided cursor so
    /// callers don't need a transposed copy just to scan a column).
    pub fn column(&self, x: u32) -> impl Iterator<Item = bool> + '_ {
        (0..self.height).map(move |y| self.get(x as i32, y as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let mut m = BitMatrix::new(5, 5);
        m.set(2, 3, true);
        assert!(m.get(2, 3));
        assert!(!m.get(2, 2));
        assert!(!m.get(-1, 0));
        assert!(!m.get(0, 10));
    }

    #[test]
    fn flip_toggles() {
        let mut m = BitMatrix::new(3, 3);
        m.flip(1, 1);
        assert!(m.get(1, 1));
        m.flip(1, 1);
        assert!(!m.get(1, 1));
    }

    #[test]
    fn region_ops_clip_to_bounds() {
        let mut m = BitMatrix::new(4, 4);
        m.set_region(-2, -2, 4, 4, true);
        assert!(m.get(0, 0));
        assert!(!m.get(3, 3));
    }

    #[test]
    fn rotate_90_matches_manual_transform() {
        let mut m = BitMatrix::new(2, 3);
        m.set(0, 0, true); // top-left
        let r = m.rotated_90();
        assert_eq!(r.width(), 3);
        assert_eq!(r.height(), 2);
        assert!(r.get(2, 0));
    }

    #[test]
    fn rotate_180_is_involution() {
        let mut m = BitMatrix::new(4, 3);
        m.set(0, 0, true);
        m.set(3, 2, true);
        let back = m.rotated_180().rotated_180();
        assert_eq!(back, m);
    }

    #[test]
    fn bounding_box_of_set_pixels() {
        let mut m = BitMatrix::new(10, 10);
        m.set(2, 3, true);
        m.set(7, 8, true);
        let (min, max) = m.bounding_box_of_set().unwrap();
        assert_eq!(min, (2, 3));
        assert_eq!(max, (7, 8));
    }

    #[test]
    fn bounding_box_none_when_empty() {
        let m = BitMatrix::new(4, 4);
        assert!(m.bounding_box_of_set().is_none());
    }

    #[test]
    fn inverted_flips_every_cell() {
        let mut m = BitMatrix::new(2, 2);
        m.set(0, 0, true);
        let inv = m.inverted();
        assert!(!inv.get(0, 0));
        assert!(inv.get(1, 0));
        assert!(inv.get(0, 1));
        assert!(inv.get(1, 1));
        assert_eq!(inv.inverted(), m);
    }

    #[test]
    fn row_and_column_iterate_as_booleans() {
        let mut m = BitMatrix::new(3, 3);
        m.set(1, 0, true);
        m.set(1, 1, true);
        m.set(1, 2, true);
        assert_eq!(m.row(0).collect::<Vec<_>>(), [false, true, false]);
        assert_eq!(m.column(1).collect::<Vec<_>>(), [true, true, true]);
    }
}
