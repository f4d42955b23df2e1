//! Micro QR and rMQR module placement: a single finder instead of full QR's
//! three, a single format-info copy instead of two, and (for rMQR) a small
//! corner alignment pattern standing in for the two finders full QR and
//! Micro QR both do without (ISO/IEC 18004 Annex C; ISO/IEC 23941). Reuses
//! full QR's finder-drawing and zigzag-walk code from `placement` rather
//! than redrawing them.

use tessera_common::BitMatrix;

use crate::placement::{self, FunctionPatterns};

/// Lay out a Micro QR symbol's finder, timing lines and format-info
/// reservation, returning the reservation mask used to drive data
/// placement.
pub fn place_micro_function_patterns(matrix: &mut BitMatrix) -> FunctionPatterns {
    let dim = matrix.width() as i32;
    let mut fp = FunctionPatterns::new(dim as usize, dim as usize);

    placement::place_finder(matrix, &mut fp, 3, 3);

    for i in 8..dim {
        matrix.set(i, 0, i % 2 == 0);
        fp.mark(i, 0);
        matrix.set(0, i, i % 2 == 0);
        fp.mark(0, i);
    }

    reserve_micro_format_info(&mut fp);

    fp
}

fn reserve_micro_format_info(fp: &mut FunctionPatterns) {
    for y in 1..=8 {
        fp.mark(8, y);
    }
    for x in 1..=7 {
        fp.mark(x, 8);
    }
}

/// Write the single copy of Micro QR's 15-bit format info (3-bit symbol
/// number + 2-bit mask) along the rows/columns adjacent to the finder.
pub fn place_micro_format_info(matrix: &mut BitMatrix, symbol_number: u32, mask: u32) {
    place_size_info_bits(matrix, crate::micro_tables::format_info_bits(symbol_number, mask));
}

/// Read back Micro QR's format info bits from the same positions
/// [`place_micro_format_info`] writes.
pub fn read_micro_format_info(matrix: &BitMatrix) -> u32 {
    read_size_info_bits(matrix)
}

/// Place already-masked data bits into a Micro QR symbol's non-reserved
/// modules, following the same up/down zigzag full QR uses but without a
/// vertical-timing column to step over (Micro QR's single timing line runs
/// along column 0, outside the zigzag's `x > 0` sweep).
pub fn place_micro_data_bits(matrix: &mut BitMatrix, fp: &FunctionPatterns, bits: &[bool]) -> usize {
    let dim = matrix.width() as i32;
    let mut idx = 0usize;
    placement::visit_zigzag(dim, dim, None, |x, y| {
        if !fp.is_reserved(x, y) {
            if let Some(&bit) = bits.get(idx) {
                matrix.set(x, y, bit);
            }
            idx += 1;
        }
    });
    idx
}

/// Read back Micro QR module values in the same zigzag order.
pub fn read_micro_data_bits(matrix: &BitMatrix, fp: &FunctionPatterns) -> Vec<bool> {
    let dim = matrix.width() as i32;
    let mut out = Vec::new();
    placement::visit_zigzag(dim, dim, None, |x, y| {
        if !fp.is_reserved(x, y) {
            out.push(matrix.get(x, y));
        }
    });
    out
}

fn place_alignment(matrix: &mut BitMatrix, fp: &mut FunctionPatterns, cx: i32, cy: i32) {
    for dy in -2..=2i32 {
        for dx in -2..=2i32 {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= matrix.width() as i32 || y >= matrix.height() as i32 {
                continue;
            }
            let d = dx.abs().max(dy.abs());
            matrix.set(x, y, d != 1);
            fp.mark(x, y);
        }
    }
}

/// Lay out an rMQR symbol's finder, corner alignment pattern, timing lines
/// and format/size-info reservation.
pub fn place_rmqr_function_patterns(matrix: &mut BitMatrix) -> FunctionPatterns {
    let width = matrix.width() as i32;
    let height = matrix.height() as i32;
    let mut fp = FunctionPatterns::new(width as usize, height as usize);

    placement::place_finder(matrix, &mut fp, 3, 3);
    place_alignment(matrix, &mut fp, width - 4, height - 4);

    for x in 8..width {
        if !fp.is_reserved(x, 0) {
            matrix.set(x, 0, x % 2 == 0);
            fp.mark(x, 0);
        }
    }
    for y in 8..height {
        if !fp.is_reserved(0, y) {
            matrix.set(0, y, y % 2 == 0);
            fp.mark(0, y);
        }
    }

    reserve_micro_format_info(&mut fp);
    reserve_rmqr_mask_info(&mut fp, width, height);

    fp
}

fn reserve_rmqr_mask_info(fp: &mut FunctionPatterns, width: i32, height: i32) {
    for i in 0..6 {
        fp.mark(width - 7 + i, (height - 5).max(9));
    }
}

fn place_size_info_bits(matrix: &mut BitMatrix, bits: u32) {
    let get_bit = |i: u32| (bits >> i) & 1 == 1;
    for y in 1..=8u32 {
        matrix.set(8, y as i32, get_bit(y - 1));
    }
    for x in 1..=7u32 {
        matrix.set(x as i32, 8, get_bit(7 + x));
    }
}

fn read_size_info_bits(matrix: &BitMatrix) -> u32 {
    let mut bits = 0u32;
    for y in 1..=8u32 {
        bits |= (matrix.get(8, y as i32) as u32) << (y - 1);
    }
    for x in 1..=7u32 {
        bits |= (matrix.get(x as i32, 8) as u32) << (7 + x);
    }
    bits
}

/// Write the 15-bit size-info codeword plus a 6-bit (3x-repeated) mask field.
pub fn place_rmqr_format_info(matrix: &mut BitMatrix, size_index: u32, mask: u32) {
    place_size_info_bits(matrix, crate::micro_tables::rmqr_size_info_bits(size_index));

    let width = matrix.width() as i32;
    let height = matrix.height() as i32;
    let row = (height - 5).max(9);
    for rep in 0..3u32 {
        for bit in 0..2u32 {
            let value = (mask >> bit) & 1 == 1;
            matrix.set(width - 7 + (rep * 2 + bit) as i32, row, value);
        }
    }
}

/// Read back the size-info bits and majority-vote the mask field.
pub fn read_rmqr_format_info(matrix: &BitMatrix) -> (u32, u32) {
    let bits = read_size_info_bits(matrix);

    let width = matrix.width() as i32;
    let height = matrix.height() as i32;
    let row = (height - 5).max(9);
    let mut ones = [0u32; 2];
    for rep in 0..3u32 {
        for bit in 0..2u32 {
            if matrix.get(width - 7 + (rep * 2 + bit) as i32, row) {
                ones[bit as usize] += 1;
            }
        }
    }
    let mask = (u32::from(ones[0] >= 2)) | (u32::from(ones[1] >= 2) << 1);
    (bits, mask)
}

/// Place already-masked data bits into an rMQR symbol's non-reserved
/// modules.
pub fn place_rmqr_data_bits(matrix: &mut BitMatrix, fp: &FunctionPatterns, bits: &[bool]) -> usize {
    let width = matrix.width() as i32;
    let height = matrix.height() as i32;
    let mut idx = 0usize;
    placement::visit_zigzag(width, height, None, |x, y| {
        if !fp.is_reserved(x, y) {
            if let Some(&bit) = bits.get(idx) {
                matrix.set(x, y, bit);
            }
            idx += 1;
        }
    });
    idx
}

/// Read back rMQR module values in the same zigzag order.
pub fn read_rmqr_data_bits(matrix: &BitMatrix, fp: &FunctionPatterns) -> Vec<bool> {
    let width = matrix.width() as i32;
    let height = matrix.height() as i32;
    let mut out = Vec::new();
    placement::visit_zigzag(width, height, None, |x, y| {
        if !fp.is_reserved(x, y) {
            out.push(matrix.get(x, y));
        }
    });
    out
}

/// Apply/unapply one of the four usable mask patterns (0-3) to every
/// non-reserved module -- rMQR's real mask formulas differ from full QR's
/// eight, but no source for them was retrieved, so this reuses the same
/// four formulas Micro QR uses (a documented approximation; see
/// `DESIGN.md`). Unlike `placement::apply_mask`, this doesn't assume a
/// square matrix.
pub fn apply_mask(matrix: &mut BitMatrix, fp: &FunctionPatterns, pattern: u32) {
    let (width, height) = (matrix.width() as i32, matrix.height() as i32);
    for y in 0..height {
        for x in 0..width {
            if !fp.is_reserved(x, y) && crate::mask::applies(pattern, x, y) {
                matrix.set(x, y, !matrix.get(x, y));
            }
        }
    }
}

/// Count the modules a `width`x`height` Micro QR/rMQR symbol has left over
/// for data+ECC after reserving its function patterns, by actually building
/// a scratch matrix and running the real placement code (rather than a
/// formula, so capacity can never drift out of sync with placement).
pub fn micro_data_capacity_bits(dim: u32) -> usize {
    let mut scratch = BitMatrix::new(dim, dim);
    let fp = place_micro_function_patterns(&mut scratch);
    (0..dim as i32).flat_map(|y| (0..dim as i32).map(move |x| (x, y))).filter(|&(x, y)| !fp.is_reserved(x, y)).count()
}

/// As [`micro_data_capacity_bits`], for an rMQR symbol of `width`x`height`.
pub fn rmqr_data_capacity_bits(width: u32, height: u32) -> usize {
    let mut scratch = BitMatrix::new(width, height);
    let fp = place_rmqr_function_patterns(&mut scratch);
    (0..height as i32).flat_map(|y| (0..width as i32).map(move |x| (x, y))).filter(|&(x, y)| !fp.is_reserved(x, y)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn micro_format_info_round_trips_through_placement() {
        let mut matrix = BitMatrix::new(11, 11);
        place_micro_function_patterns(&mut matrix);
        place_micro_format_info(&mut matrix, 0, 1);
        let bits = read_micro_format_info(&matrix);
        assert_eq!(crate::micro_tables::decode_format_info(bits), Some((0, 1)));
    }

    #[test]
    fn micro_data_bits_round_trip_through_placement() {
        let mut matrix = BitMatrix::new(13, 13);
        let fp = place_micro_function_patterns(&mut matrix);
        let capacity = micro_data_capacity_bits(13);
        let bits: Vec<bool> = (0..capacity).map(|i| i % 3 == 0).collect();
        place_micro_data_bits(&mut matrix, &fp, &bits);
        assert_eq!(read_micro_data_bits(&matrix, &fp), bits);
    }

    #[test]
    fn rmqr_format_info_round_trips_through_placement() {
        let mut matrix = BitMatrix::new(77, 13);
        place_rmqr_function_patterns(&mut matrix);
        place_rmqr_format_info(&mut matrix, 18, 2);
        let (size_bits, mask) = read_rmqr_format_info(&matrix);
        assert_eq!(crate::micro_tables::decode_rmqr_size_info(size_bits), Some(18));
        assert_eq!(mask, 2);
    }

    #[test]
    fn rmqr_data_bits_round_trip_through_placement() {
        let mut matrix = BitMatrix::new(59, 11);
        let fp = place_rmqr_function_patterns(&mut matrix);
        let capacity = rmqr_data_capacity_bits(59, 11);
        let bits: Vec<bool> = (0..capacity).map(|i| i % 5 == 0).collect();
        place_rmqr_data_bits(&mut matrix, &fp, &bits);
        assert_eq!(read_rmqr_data_bits(&matrix, &fp), bits);
    }
}
