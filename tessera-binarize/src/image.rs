//! A borrowed view over externally-owned pixel storage (spec §3 "ImageView").

/// Supported pixel layouts. Channel order matches the name; `Lum`/`LumA` are
/// single/dual-channel greyscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single-channel luminance.
    Lum,
    /// Luminance plus alpha.
    LumA,
    /// 24-bit RGB.
    Rgb,
    /// 24-bit BGR.
    Bgr,
    /// 32-bit RGBA.
    Rgba,
    /// 32-bit ARGB.
    Argb,
    /// 32-bit BGRA.
    Bgra,
    /// 32-bit ABGR.
    Abgr,
}

impl PixelFormat {
    /// Bytes per pixel for this format.
    pub fn pixel_stride(self) -> usize {
        match self {
            Self::Lum => 1,
            Self::LumA => 2,
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Argb | Self::Bgra | Self::Abgr => 4,
        }
    }

    /// Byte offset of the red (or sole luminance) channel within one pixel.
    fn luminance_weights_offset(self) -> (usize, usize, usize) {
        match self {
            Self::Lum | Self::LumA => (0, 0, 0),
            Self::Rgb | Self::Rgba => (0, 1, 2),
            Self::Bgr | Self::Bgra => (2, 1, 0),
            Self::Argb => (1, 2, 3),
            Self::Abgr => (3, 2, 1),
        }
    }
}

/// A read-only reference to externally-owned pixel storage: base pointer (as a
/// borrowed slice), dimensions, pixel format, row stride, and pixel stride, all
/// in bytes.
///
/// Invariant: `row_stride >= width * pixel_stride` and the implied byte region
/// fits within `data`.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    row_stride: usize,
    pixel_stride: usize,
    /// When set, columns are read back-to-front (used by 90/270-degree rotation
    /// without a data copy).
    x_reversed: bool,
    /// When set, rows are read back-to-front (used by 180-degree rotation).
    y_reversed: bool,
    /// When set, the logical `(x, y)` addresses the transposed pixel `(y, x)`
    /// (used by 90/270-degree rotation).
    transposed: bool,
    /// Logical pixels are spaced this many raw pixels apart in each axis
    /// (used by [`Self::downscaled`]); `1` means no downscaling.
    downscale: u32,
}

impl<'a> ImageView<'a> {
    /// Construct a view over `data`, with `pixel_stride` defaulting to the
    /// format's natural size if `None`.
    ///
    /// # Panics
    /// Panics if the implied byte region does not fit in `data`, matching the
    /// invariant the spec places on `ImageView` construction.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        row_stride: Option<usize>,
        pixel_stride: Option<usize>,
    ) -> Self {
        let pixel_stride = pixel_stride.unwrap_or_else(|| format.pixel_stride());
        let row_stride = row_stride.unwrap_or(width as usize * pixel_stride);
        assert!(row_stride >= width as usize * pixel_stride, "row_stride too small for width");
        assert!(
            data.len() >= row_stride * height.saturating_sub(1) as usize + width as usize * pixel_stride,
            "backing storage too small for the declared image extents"
        );

        Self {
            data,
            width,
            height,
            format,
            row_stride,
            pixel_stride,
            x_reversed: false,
            y_reversed: false,
            transposed: false,
            downscale: 1,
        }
    }

    /// Width in pixels, accounting for any applied rotation and downscaling.
    pub fn width(&self) -> u32 {
        let raw = if self.transposed { self.height } else { self.width };
        (raw / self.downscale).max(1)
    }

    /// Height in pixels, accounting for any applied rotation and downscaling.
    pub fn height(&self) -> u32 {
        let raw = if self.transposed { self.width } else { self.height };
        (raw / self.downscale).max(1)
    }

    /// Produce a new view sampling every `factor`-th pixel in each axis,
    /// without copying pixel data. Composes with an existing downscale, so
    /// `view.downscaled(2).downscaled(2)` samples every 4th pixel.
    ///
    /// # Panics
    /// Panics if `factor` is zero.
    #[must_use]
    pub fn downscaled(&self, factor: u32) -> Self {
        assert!(factor >= 1, "downscale factor must be at least 1");
        Self { downscale: self.downscale * factor, ..*self }
    }

    /// The pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Produce a new view rotated 90 degrees clockwise, without copying pixel
    /// data -- only the addressing logic changes.
    #[must_use]
    pub fn rotated_90(&self) -> Self {
        Self {
            transposed: !self.transposed,
            x_reversed: self.y_reversed,
            y_reversed: !self.x_reversed,
            ..*self
        }
    }

    /// Produce a new view rotated 180 degrees, without copying pixel data.
    #[must_use]
    pub fn rotated_180(&self) -> Self {
        Self {
            x_reversed: !self.x_reversed,
            y_reversed: !self.y_reversed,
            ..*self
        }
    }

    /// Produce a new view rotated 270 degrees clockwise (90 counter-clockwise),
    /// without copying pixel data.
    #[must_use]
    pub fn rotated_270(&self) -> Self {
        self.rotated_90().rotated_180()
    }

    fn map_coords(&self, x: u32, y: u32) -> (usize, usize) {
        let (x, y) = (x * self.downscale, y * self.downscale);
        let (mut sx, mut sy) = if self.transposed { (y, x) } else { (x, y) };
        if self.x_reversed {
            sx = self.width - 1 - sx;
        }
        if self.y_reversed {
            sy = self.height - 1 - sy;
        }
        (sx as usize, sy as usize)
    }

    /// Compute the 8-bit luminance of the pixel at `(x, y)` (logical coordinates,
    /// after any rotation), using the standard per-channel averaging the teacher
    /// uses for greyscale conversion.
    #[inline]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let (sx, sy) = self.map_coords(x, y);
        let offset = sy * self.row_stride + sx * self.pixel_stride;
        let px = &self.data[offset..offset + self.pixel_stride];

        match self.format {
            PixelFormat::Lum | PixelFormat::LumA => px[0],
            _ => {
                let (r_off, g_off, b_off) = self.format.luminance_weights_offset();
                let r = px[r_off] as u32;
                let g = px[g_off] as u32;
                let b = px[b_off] as u32;
                ((r * 306 + g * 601 + b * 117) / 1024) as u8
            }
        }
    }

    /// Read an entire row's luminance values into `out`.
    pub fn luminance_row(&self, y: u32, out: &mut Vec<u8>) {
        out.clear();
        out.extend((0..self.width()).map(|x| self.luminance(x, y)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_reads_single_channel() {
        let data = [10u8, 20, 30, 40];
        let view = ImageView::new(&data, 4, 1, PixelFormat::Lum, None, None);
        assert_eq!(view.luminance(2, 0), 30);
    }

    #[test]
    fn rotated_90_swaps_dimensions_and_addressing() {
        // 2x1 image: pixels [A, B] left to right.
        let data = [1u8, 2];
        let view = ImageView::new(&data, 2, 1, PixelFormat::Lum, None, None);
        let rotated = view.rotated_90();
        assert_eq!(rotated.width(), 1);
        assert_eq!(rotated.height(), 2);
        assert_eq!(rotated.luminance(0, 0), 1);
        assert_eq!(rotated.luminance(0, 1), 2);
    }

    #[test]
    fn rotated_180_reverses_both_axes() {
        let data = [1u8, 2, 3, 4];
        let view = ImageView::new(&data, 4, 1, PixelFormat::Lum, None, None);
        let rotated = view.rotated_180();
        assert_eq!(rotated.luminance(0, 0), 4);
        assert_eq!(rotated.luminance(3, 0), 1);
    }

    #[test]
    fn downscaled_samples_every_nth_pixel() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let view = ImageView::new(&data, 8, 1, PixelFormat::Lum, None, None);
        let half = view.downscaled(2);
        assert_eq!(half.width(), 4);
        assert_eq!(half.luminance(0, 0), 1);
        assert_eq!(half.luminance(1, 0), 3);
        assert_eq!(half.luminance(3, 0), 7);
    }

    #[test]
    fn downscaled_composes() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let view = ImageView::new(&data, 8, 1, PixelFormat::Lum, None, None);
        let quarter = view.downscaled(2).downscaled(2);
        assert_eq!(quarter.width(), 2);
        assert_eq!(quarter.luminance(1, 0), 5);
    }

    #[test]
    fn rgb_luminance_matches_weighted_average() {
        let data = [255u8, 0, 0]; // pure red
        let view = ImageView::new(&data, 1, 1, PixelFormat::Rgb, None, None);
        let l = view.luminance(0, 0);
        assert!((l as i32 - 76).abs() <= 1);
    }
}
