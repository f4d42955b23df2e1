//! The `Hybrid` (local-average) binarizer (spec §4.1).

use tessera_common::{BitMatrix, Matrix};

use crate::global_histogram;
use crate::image::ImageView;

const BLOCK: u32 = 8;
const MIN_DYNAMIC_RANGE: i32 = 24;

/// Per-block mean luminance and dynamic range, before the neighbour-aware
/// correction and the 5x5 smoothing pass.
fn block_stats(image: &ImageView<'_>, blocks_x: u32, blocks_y: u32) -> (Matrix<i32>, Matrix<i32>) {
    let mut means = Matrix::new(blocks_x, blocks_y);
    let mut ranges = Matrix::new(blocks_x, blocks_y);
    let width = image.width();
    let height = image.height();

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let x0 = bx * BLOCK;
            let y0 = by * BLOCK;
            let x1 = (x0 + BLOCK).min(width);
            let y1 = (y0 + BLOCK).min(height);

            let (mut sum, mut count, mut min, mut max) = (0i32, 0i32, 255i32, 0i32);
            for y in y0..y1 {
                for x in x0..x1 {
                    let v = image.luminance(x, y) as i32;
                    sum += v;
                    count += 1;
                    min = min.min(v);
                    max = max.max(v);
                }
            }

            means.set(bx, by, if count > 0 { sum / count } else { 128 });
            ranges.set(bx, by, max - min);
        }
    }

    (means, ranges)
}

/// Apply the dynamic-range fallback and neighbour-aware correction described in
/// spec.md §4.1, producing per-block thresholds (pre-smoothing).
fn corrected_thresholds(means: &Matrix<i32>, ranges: &Matrix<i32>) -> Matrix<i32> {
    let (bw, bh) = (means.width(), means.height());
    let mut thresholds = Matrix::new(bw, bh);

    for by in 0..bh {
        for bx in 0..bw {
            let mean = *means.get(bx, by);
            let range = *ranges.get(bx, by);

            let threshold = if range >= MIN_DYNAMIC_RANGE {
                mean
            } else {
                let min = mean - range / 2;
                let fallback = min / 2;

                if bx > 0 && by > 0 {
                    let up = *means.get(bx, by - 1);
                    let left = *means.get(bx - 1, by);
                    let up_left = *means.get(bx - 1, by - 1);
                    let neighbour_avg = (up + 2 * left + up_left) / 4;
                    if min < neighbour_avg {
                        neighbour_avg
                    } else {
                        fallback
                    }
                } else {
                    fallback
                }
            };

            thresholds.set(bx, by, threshold);
        }
    }

    thresholds
}

/// Smooth each block's threshold over its centred 5x5 neighbourhood, clamped at
/// the block-grid edges.
fn smooth_thresholds(raw: &Matrix<i32>) -> Matrix<i32> {
    let (bw, bh) = (raw.width(), raw.height());
    let mut smoothed = Matrix::new(bw, bh);

    for by in 0..bh as i32 {
        for bx in 0..bw as i32 {
            let mut sum = 0i32;
            let mut count = 0i32;
            for dy in -2..=2 {
                for dx in -2..=2 {
                    let x = bx + dx;
                    let y = by + dy;
                    if x >= 0 && y >= 0 && (x as u32) < bw && (y as u32) < bh {
                        sum += *raw.get(x as u32, y as u32);
                        count += 1;
                    }
                }
            }
            smoothed.set(bx as u32, by as u32, sum / count.max(1));
        }
    }

    smoothed
}

/// Binarize an image using 8x8-block local-average thresholds. Images smaller
/// than 40x40 fall back to [`global_histogram::binarize`], per spec.md §4.1.
pub fn binarize(image: &ImageView<'_>) -> Option<BitMatrix> {
    let width = image.width();
    let height = image.height();
    if width < 40 || height < 40 {
        return global_histogram::binarize(image);
    }

    let blocks_x = width.div_ceil(BLOCK);
    let blocks_y = height.div_ceil(BLOCK);

    let (means, ranges) = block_stats(image, blocks_x, blocks_y);
    let raw = corrected_thresholds(&means, &ranges);
    let smoothed = smooth_thresholds(&raw);

    let mut matrix = BitMatrix::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let threshold = *smoothed.get(x / BLOCK, y / BLOCK);
            let set = (image.luminance(x, y) as i32) <= threshold;
            matrix.set(x as i32, y as i32, set);
        }
    }

    Some(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    fn checkerboard(size: u32) -> Vec<u8> {
        let mut data = vec![0u8; (size * size) as usize];
        for y in 0..size {
            for x in 0..size {
                let block = (x / 8 + y / 8) % 2;
                data[(y * size + x) as usize] = if block == 0 { 20 } else { 220 };
            }
        }
        data
    }

    #[test]
    fn small_images_fall_back_to_global_histogram() {
        let data = vec![10u8, 200, 10, 200];
        let view = ImageView::new(&data, 2, 2, PixelFormat::Lum, None, None);
        assert!(binarize(&view).is_some());
    }

    #[test]
    fn separates_checkerboard_blocks() {
        let size = 48;
        let data = checkerboard(size);
        let view = ImageView::new(&data, size, size, PixelFormat::Lum, None, None);
        let matrix = binarize(&view).unwrap();
        assert!(matrix.get(0, 0));
        assert!(!matrix.get(10, 0));
    }
}
