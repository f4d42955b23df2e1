//! Turning a created [`tessera_common::Barcode`] back into pixels or SVG
//! (spec §6: `write_barcode_to_image`/`write_barcode_to_svg`, the minimal PBM
//! header, and the one-path-per-module SVG shape).

use tessera_common::{format_err, BitMatrix, Error};

/// A dense 8-bit greyscale raster, `0` black / `255` white.
pub struct GreyscaleImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major pixel data, one byte per pixel.
    pub data: Vec<u8>,
}

impl GreyscaleImage {
    /// Encode as a minimal binary PBM-family image: `P5 <w> <h> 255` header
    /// followed by raw greyscale bytes.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P5\n{} {}\n255\n", self.width, self.height).into_bytes();
        out.extend_from_slice(&self.data);
        out
    }
}

/// Options for [`write_barcode_to_image`].
#[derive(Debug, Clone, Copy)]
pub struct ImageWriteOptions {
    /// Pixels per module.
    pub scale: u32,
    /// Human-readable text rendered beneath the symbol. Not implemented by
    /// this rasterizer; accepted for API parity.
    pub add_hrt: bool,
    /// Number of quiet-zone modules of white border to add on each side.
    pub add_quiet_zones: bool,
}

impl Default for ImageWriteOptions {
    fn default() -> Self {
        Self { scale: 1, add_hrt: false, add_quiet_zones: true }
    }
}

/// Rasterize `matrix` (one module per cell) into a scaled greyscale buffer,
/// optionally padded with a 4-module quiet zone.
pub fn write_barcode_to_image(matrix: &BitMatrix, options: ImageWriteOptions) -> Result<GreyscaleImage, Error> {
    if options.scale == 0 {
        return Err(format_err!("image scale must be at least 1"));
    }

    let quiet = if options.add_quiet_zones { 4 } else { 0 };
    let modules_w = matrix.width() + quiet * 2;
    let modules_h = matrix.height() + quiet * 2;
    let width = modules_w * options.scale;
    let height = modules_h * options.scale;

    let mut data = vec![0xFFu8; (width * height) as usize];
    for y in 0..matrix.height() {
        for x in 0..matrix.width() {
            if !matrix.get(x as i32, y as i32) {
                continue;
            }
            let px0 = (x + quiet) * options.scale;
            let py0 = (y + quiet) * options.scale;
            for dy in 0..options.scale {
                for dx in 0..options.scale {
                    let idx = (py0 + dy) * width + (px0 + dx);
                    data[idx as usize] = 0x00;
                }
            }
        }
    }

    Ok(GreyscaleImage { width, height, data })
}

/// Render `matrix` as an SVG document: one `<path>` whose `d` attribute
/// concatenates a `M<x>,<y>h1v1h-1z` unit square per set module.
pub fn write_barcode_to_svg(matrix: &BitMatrix, add_quiet_zones: bool) -> String {
    let quiet = if add_quiet_zones { 4 } else { 0 };
    let w = matrix.width() + quiet * 2;
    let h = matrix.height() + quiet * 2;

    let mut path = String::new();
    for y in 0..matrix.height() {
        for x in 0..matrix.width() {
            if matrix.get(x as i32, y as i32) {
                path.push_str(&format!("M{},{}h1v1h-1z", x + quiet, y + quiet));
            }
        }
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" shape-rendering=\"crispEdges\">\
<rect width=\"{w}\" height=\"{h}\" fill=\"#fff\"/>\
<path d=\"{path}\" fill=\"#000\"/>\
</svg>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(size: u32) -> BitMatrix {
        let mut m = BitMatrix::new(size, size);
        for y in 0..size {
            for x in 0..size {
                m.set(x as i32, y as i32, (x + y) % 2 == 0);
            }
        }
        m
    }

    #[test]
    fn image_scale_and_quiet_zone_affect_dimensions() {
        let matrix = checkerboard(5);
        let image = write_barcode_to_image(&matrix, ImageWriteOptions { scale: 2, add_hrt: false, add_quiet_zones: true }).unwrap();
        assert_eq!(image.width, (5 + 8) * 2);
        assert_eq!(image.height, (5 + 8) * 2);
    }

    #[test]
    fn zero_scale_is_rejected() {
        let matrix = checkerboard(5);
        assert!(write_barcode_to_image(&matrix, ImageWriteOptions { scale: 0, ..Default::default() }).is_err());
    }

    #[test]
    fn svg_contains_one_path_command_per_set_module() {
        let matrix = checkerboard(3);
        let svg = write_barcode_to_svg(&matrix, false);
        let set_modules = (0..3).flat_map(|y| (0..3).map(move |x| (x, y))).filter(|&(x, y)| (x + y) % 2 == 0).count();
        assert_eq!(svg.matches('M').count(), set_modules);
    }

    #[test]
    fn pbm_header_matches_dimensions() {
        let matrix = checkerboard(2);
        let image = write_barcode_to_image(&matrix, ImageWriteOptions { scale: 1, add_hrt: false, add_quiet_zones: false }).unwrap();
        let pbm = image.to_pbm();
        assert!(pbm.starts_with(b"P5\n2 2\n255\n"));
    }
}
