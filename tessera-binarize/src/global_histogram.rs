//! The `GlobalHistogram` binarizer (spec §4.1).

use tessera_common::{BitMatrix, PatternRow};

use crate::image::ImageView;

const BUCKETS: usize = 32;

/// Build the 32-bucket luminance histogram (upper 5 bits of each pixel) for one
/// row of luminance values.
fn histogram(row: &[u8]) -> [u32; BUCKETS] {
    let mut buckets = [0u32; BUCKETS];
    for &v in row {
        buckets[(v >> 3) as usize] += 1;
    }
    buckets
}

/// Find the black/white peak pair and the valley threshold between them, per
/// spec.md §4.1. Returns `None` if the row has insufficient contrast.
fn find_threshold(buckets: &[u32; BUCKETS]) -> Option<u8> {
    let (first_peak, _) = buckets
        .iter()
        .enumerate()
        .max_by_key(|&(_, &count)| count)
        .unwrap();

    let (second_peak, _) = buckets
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != first_peak)
        .max_by_key(|&(i, &count)| {
            let dist = (i as i64 - first_peak as i64).unsigned_abs();
            count as u64 * dist * dist
        })?;

    let (black_peak, white_peak) = if first_peak <= second_peak {
        (first_peak, second_peak)
    } else {
        (second_peak, first_peak)
    };

    if white_peak - black_peak <= BUCKETS / 16 {
        return None;
    }

    let max_count = buckets[black_peak..=white_peak].iter().copied().max().unwrap_or(1);
    let valley = (black_peak + 1..white_peak)
        .min_by_key(|&i| {
            let from_first = (i - black_peak) as u64;
            let to_second = (white_peak - i) as u64;
            from_first * from_first * to_second * (max_count as u64 - buckets[i] as u64)
        })
        .unwrap_or(black_peak);

    Some(((valley as u32) << 3) as u8)
}

/// Apply the `-1, 4, -1` unsharp-mask pre-filter and threshold to produce one
/// bit row: `out[i] = (-in[i-1] + 4 in[i] - in[i+1]) / 2 <= threshold`.
fn threshold_row(row: &[u8], threshold: u8) -> Vec<bool> {
    let n = row.len();
    let mut out = vec![false; n];
    for i in 0..n {
        let left = if i == 0 { row[i] as i32 } else { row[i - 1] as i32 };
        let right = if i + 1 == n { row[i] as i32 } else { row[i + 1] as i32 };
        let sharpened = (-left + 4 * row[i] as i32 - right) / 2;
        out[i] = sharpened <= threshold as i32;
    }
    out
}

/// Binarize an entire image with a per-row global histogram threshold.
pub fn binarize(image: &ImageView<'_>) -> Option<BitMatrix> {
    let width = image.width();
    let height = image.height();
    let mut matrix = BitMatrix::new(width, height);
    let mut row_buf = Vec::with_capacity(width as usize);

    for y in 0..height {
        image.luminance_row(y, &mut row_buf);
        let hist = histogram(&row_buf);
        let Some(threshold) = find_threshold(&hist) else {
            continue;
        };
        let bits = threshold_row(&row_buf, threshold);
        for (x, &bit) in bits.iter().enumerate() {
            matrix.set(x as i32, y as i32, bit);
        }
    }

    Some(matrix)
}

/// Extract a single [`PatternRow`] (run-length scanline) at row `y`, thresholding
/// with that row's own histogram. Used by 1-D-style scanning passes that don't
/// need the whole matrix.
pub fn pattern_row(image: &ImageView<'_>, y: u32) -> Option<PatternRow> {
    let mut row_buf = Vec::with_capacity(image.width() as usize);
    image.luminance_row(y, &mut row_buf);
    let hist = histogram(&row_buf);
    let threshold = find_threshold(&hist)?;
    let bits = threshold_row(&row_buf, threshold);
    Some(PatternRow::from_scanline(bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    #[test]
    fn high_contrast_row_finds_a_threshold() {
        let mut row = vec![20u8; 16];
        row.extend(vec![220u8; 16]);
        let hist = histogram(&row);
        assert!(find_threshold(&hist).is_some());
    }

    #[test]
    fn low_contrast_row_is_rejected() {
        let row = vec![128u8; 32];
        let hist = histogram(&row);
        assert!(find_threshold(&hist).is_none());
    }

    #[test]
    fn binarize_produces_black_and_white_regions() {
        let mut data = vec![20u8; 16];
        data.extend(vec![220u8; 16]);
        let view = ImageView::new(&data, 32, 1, PixelFormat::Lum, None, None);
        let matrix = binarize(&view).unwrap();
        assert!(matrix.get(2, 0));
        assert!(!matrix.get(30, 0));
    }
}
