//! Aztec data-region layout: ring traversal over the sampled symbol matrix, and
//! the stuff-bit rule that turns codewords into/from a contiguous bit stream
//! (spec §4.4 "Data extraction", §4.8).

use smallvec::SmallVec;
use tessera_common::{format_err, BitMatrix, Error};
use tessera_rs as rs;

/// Total matrix size (including the bullseye) for `layers` data rings.
pub fn matrix_size(layers: u32, compact: bool) -> u32 {
    let base = if compact { 11 } else { 14 };
    base + layers * 4
}

/// Width, in modules, of the central bullseye (finder) pattern.
pub fn bullseye_size(compact: bool) -> u32 {
    if compact {
        5
    } else {
        7
    }
}

/// Codeword size in bits for a given layer count (spec: 6/8/10/12 bits for
/// 1-2/3-8/9-22/23+ layers).
pub fn codeword_bits(layers: u32) -> u32 {
    match layers {
        1..=2 => 6,
        3..=8 => 8,
        9..=22 => 10,
        _ => 12,
    }
}

/// The Reed-Solomon field for a given codeword bit width.
pub fn field_for_codeword_bits(bits: u32) -> tessera_rs::GaloisField {
    match bits {
        6 => rs::aztec_data_field_6(),
        8 => rs::aztec_data_field_8(),
        10 => rs::aztec_data_field_10(),
        _ => rs::aztec_data_field_12(),
    }
}

/// Clockwise trace of a square ring at `margin` modules from the matrix edge.
/// Most rings fit comfortably within 64 points before spilling to the heap.
fn trace_ring(size: i32, margin: i32) -> SmallVec<[(i32, i32); 64]> {
    let lo = margin;
    let hi = size - 1 - margin;
    let mut pts = SmallVec::new();
    if lo > hi {
        return pts;
    }
    if lo == hi {
        pts.push((lo, lo));
        return pts;
    }
    for x in lo..=hi {
        pts.push((x, lo));
    }
    for y in (lo + 1)..=hi {
        pts.push((hi, y));
    }
    for x in (lo..hi).rev() {
        pts.push((x, hi));
    }
    for y in (lo + 1..hi).rev() {
        pts.push((lo, y));
    }
    pts
}

/// The module coordinates making up data ring `r` (0 = outermost), two tracks
/// deep, within a matrix of `layers` total rings.
fn ring_coordinates(layers: u32, compact: bool, r: u32) -> Vec<(i32, i32)> {
    let size = matrix_size(layers, compact) as i32;
    let outer_margin = 2 * r as i32;
    let mut pts = trace_ring(size, outer_margin);
    pts.extend(trace_ring(size, outer_margin + 1));
    pts.into_vec()
}

/// Read the raw data bit stream (all layers, outermost first) from a sampled
/// symbol matrix.
pub fn extract_bits(matrix: &BitMatrix, layers: u32, compact: bool) -> Vec<bool> {
    let mut bits = Vec::new();
    for r in 0..layers {
        for (x, y) in ring_coordinates(layers, compact, r) {
            bits.push(matrix.get(x, y));
        }
    }
    bits
}

/// Write `bits` onto `matrix` in the same ring order `extract_bits` reads them
/// in (used by the encoder).
pub fn place_bits(matrix: &mut BitMatrix, layers: u32, compact: bool, bits: &[bool]) {
    let mut i = 0;
    for r in 0..layers {
        for (x, y) in ring_coordinates(layers, compact, r) {
            if i >= bits.len() {
                return;
            }
            matrix.set(x, y, bits[i]);
            i += 1;
        }
    }
}

/// Split a flat bit stream into `codeword_bits`-wide codewords.
fn to_codewords(bits: &[bool], codeword_bits: u32) -> Vec<u16> {
    bits.chunks(codeword_bits as usize)
        .filter(|chunk| chunk.len() == codeword_bits as usize)
        .map(|chunk| chunk.iter().fold(0u16, |acc, &b| (acc << 1) | u16::from(b)))
        .collect()
}

fn from_codewords(codewords: &[u16], codeword_bits: u32) -> Vec<bool> {
    let mut bits = Vec::with_capacity(codewords.len() * codeword_bits as usize);
    for &cw in codewords {
        for i in (0..codeword_bits).rev() {
            bits.push((cw >> i) & 1 == 1);
        }
    }
    bits
}

/// Reverse the stuff-bit rule: a codeword of value 1 unpacks to `size-1` zeros, a
/// codeword of value `(1<<size)-2` unpacks to `size-1` ones; codewords `0` and
/// `(1<<size)-1` terminate the stream (filler, dropped).
fn unstuff(codewords: &[u16], codeword_bits: u32) -> Vec<bool> {
    let all_ones = (1u16 << codeword_bits) - 1;
    let all_ones_minus_one = all_ones - 1;
    let size_minus_one = codeword_bits - 1;

    let mut bits = Vec::with_capacity(codewords.len() * codeword_bits as usize);
    for &cw in codewords {
        if cw == 0 || cw == all_ones {
            break;
        }
        if cw == 1 {
            bits.extend(std::iter::repeat(false).take(size_minus_one as usize));
        } else if cw == all_ones_minus_one {
            bits.extend(std::iter::repeat(true).take(size_minus_one as usize));
        } else {
            for i in (0..codeword_bits).rev() {
                bits.push((cw >> i) & 1 == 1);
            }
        }
    }
    bits
}

/// Apply the stuff-bit rule going the other way (encoder): insert a
/// complementary bit before any codeword that would otherwise be all-ones or
/// all-zeros.
fn stuff(bits: &[bool], codeword_bits: u32) -> Vec<u16> {
    let mut codewords = Vec::new();
    let mut i = 0;
    while i < bits.len() {
        let take = (codeword_bits as usize - 1).min(bits.len() - i);
        let chunk = &bits[i..i + take];
        let all_true = chunk.iter().all(|&b| b) && chunk.len() == codeword_bits as usize - 1;
        let all_false = chunk.iter().all(|&b| !b) && chunk.len() == codeword_bits as usize - 1;

        let mut word_bits: Vec<bool> = chunk.to_vec();
        if all_true {
            word_bits.push(false);
        } else if all_false {
            word_bits.push(true);
        } else {
            // Pad the final short chunk with the complementary bit too, so every
            // emitted codeword is exactly `codeword_bits` wide.
            while word_bits.len() < codeword_bits as usize {
                word_bits.push(!word_bits.last().copied().unwrap_or(false));
            }
        }

        let cw = word_bits.iter().fold(0u16, |acc, &b| (acc << 1) | u16::from(b));
        codewords.push(cw);
        i += take;
    }
    codewords
}

/// Full data-path decode: extract ring bits, split into codewords, Reed-Solomon
/// correct, then unstuff into the character bit stream.
pub fn decode_data_bits(matrix: &BitMatrix, layers: u32, compact: bool, data_blocks: u32) -> Result<Vec<bool>, Error> {
    let bits = extract_bits(matrix, layers, compact);
    let cw_bits = codeword_bits(layers);
    let mut codewords = to_codewords(&bits, cw_bits);

    if codewords.len() < data_blocks as usize {
        return Err(format_err!("Aztec data region shorter than the declared data-block count"));
    }

    let field = field_for_codeword_bits(cw_bits);
    let ecc_len = codewords.len() - data_blocks as usize;
    rs::decode(&field, &mut codewords, ecc_len).map_err(|e| format_err!("Aztec data Reed-Solomon failed: {e}"))?;

    Ok(unstuff(&codewords[..data_blocks as usize], cw_bits))
}

/// Full data-path encode: stuff `bits` into codewords, append Reed-Solomon
/// parity, then lay them out into the ring bit stream for `place_bits`.
pub fn encode_data_bits(bits: &[bool], layers: u32, compact: bool) -> Vec<bool> {
    let cw_bits = codeword_bits(layers);
    let data_codewords = stuff(bits, cw_bits);
    let field = field_for_codeword_bits(cw_bits);

    let capacity_bits = ring_capacity_bits(layers, compact);
    let ecc_len = (capacity_bits / cw_bits) as usize - data_codewords.len();

    let ecc = rs::encode(&field, &data_codewords, ecc_len);
    let mut all = data_codewords;
    all.extend(ecc);
    from_codewords(&all, cw_bits)
}

/// Total data-region bit capacity, `((compact?88:112)+16*layers)*layers`.
pub fn ring_capacity_bits(layers: u32, compact: bool) -> u32 {
    (if compact { 88 } else { 112 } + 16 * layers) * layers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stuff_then_unstuff_round_trips_arbitrary_bits() {
        let bits: Vec<bool> = (0..60).map(|i| i % 3 == 0).collect();
        let codewords = stuff(&bits, 6);
        let recovered = unstuff(&codewords, 6);
        assert!(recovered.len() >= bits.len());
        assert_eq!(&recovered[..bits.len()], &bits[..]);
    }

    #[test]
    fn stuff_avoids_all_ones_and_all_zeros_codewords() {
        let bits = vec![true; 5]; // all-ones of width codeword_bits-1 = 5 for 6-bit codewords
        let codewords = stuff(&bits, 6);
        assert_eq!(codewords.len(), 1);
        assert_ne!(codewords[0], 0b111111);
        assert_ne!(codewords[0], 0);
    }

    #[test]
    fn ring_coordinates_cover_expected_bit_count() {
        let coords = ring_coordinates(2, true, 0);
        assert!(!coords.is_empty());
        let size = matrix_size(2, true) as i32;
        for (x, y) in &coords {
            assert!(*x >= 0 && *x < size && *y >= 0 && *y < size);
        }
    }

    #[test]
    fn extract_and_place_round_trip() {
        let layers = 2;
        let compact = true;
        let size = matrix_size(layers, compact);
        let total_bits: usize = (0..layers).map(|r| ring_coordinates(layers, compact, r).len()).sum();
        let pattern: Vec<bool> = (0..total_bits).map(|i| i % 2 == 0).collect();

        let mut matrix = BitMatrix::new(size, size);
        place_bits(&mut matrix, layers, compact, &pattern);
        let read_back = extract_bits(&matrix, layers, compact);
        assert_eq!(read_back, pattern);
    }
}
