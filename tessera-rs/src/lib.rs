//! Generic `GF(2^n)` Reed-Solomon encoding and decoding (spec §4.6).
//!
//! Shared by all three 2-D symbologies, each of which parameterises
//! [`GaloisField`] with its own bit width and primitive polynomial (see the
//! `aztec_*`/`data_matrix`/`qr` constructors below).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod field;

pub use field::{GaloisField, GfPoly};

use log::trace;

/// Reed-Solomon failed to decode: too many errors, or a correction would fall
/// outside the codeword range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reed-Solomon decode failed: {}", self.message)
    }
}

impl std::error::Error for DecodeError {}

fn err(message: impl Into<String>) -> DecodeError {
    DecodeError { message: message.into() }
}

/// Build the generator polynomial `prod_{i=0}^{ecc_len-1} (x - g^(generator_base+i))`.
fn generator_polynomial(field: &GaloisField, ecc_len: usize) -> GfPoly {
    let mut generator = GfPoly::new(vec![1]);
    for i in 0..ecc_len {
        let root = field.exp(field.generator_base() as i32 + i as i32);
        let term = GfPoly::new(vec![1, root]);
        generator = generator.mul(field, &term);
    }
    generator
}

/// Compute `ecc_len` parity codewords for `data`: the remainder of
/// `data(x) * x^ecc_len` modulo the generator polynomial.
pub fn encode(field: &GaloisField, data: &[u16], ecc_len: usize) -> Vec<u16> {
    let generator = generator_polynomial(field, ecc_len);
    let shifted = GfPoly::new(data.to_vec()).mul_monomial(field, 1, ecc_len);
    let (_, remainder) = shifted.divide(field, &generator);

    let mut ecc = remainder.coefficients().to_vec();
    if ecc.len() < ecc_len {
        let mut padded = vec![0u16; ecc_len - ecc.len()];
        padded.extend(ecc);
        ecc = padded;
    }
    ecc
}

/// Compute the syndromes of `received` (data followed by ecc codewords) for the
/// `ecc_len` roots `g^(generator_base)..g^(generator_base+ecc_len-1)`.
fn syndromes(field: &GaloisField, received: &[u16], ecc_len: usize) -> Vec<u16> {
    let poly = GfPoly::new(received.to_vec());
    (0..ecc_len)
        .map(|i| poly.evaluate(field, field.exp(field.generator_base() as i32 + i as i32)))
        .collect()
}

/// Berlekamp-Massey: find the shortest linear feedback shift register (error
/// locator polynomial) that generates `syndromes`.
fn berlekamp_massey(field: &GaloisField, syndromes: &[u16]) -> GfPoly {
    let mut error_locator = GfPoly::new(vec![1]);
    let mut previous_locator = GfPoly::new(vec![1]);
    let mut shift = 1usize;
    let mut last_discrepancy_locator = GfPoly::new(vec![1]);
    let mut last_discrepancy = 1u16;

    for (n, _) in syndromes.iter().enumerate() {
        let mut discrepancy = syndromes[n];
        for i in 1..=error_locator.degree() {
            discrepancy = field.add(
                discrepancy,
                field.mul(error_locator.coefficient(i), syndromes[n - i]),
            );
        }

        if discrepancy == 0 {
            shift += 1;
        } else if 2 * (error_locator.degree()) <= n {
            let scale = field.div(discrepancy, last_discrepancy);
            let correction = previous_locator.mul_monomial(field, scale, shift);
            let new_locator = error_locator.add(field, &correction);

            previous_locator = error_locator;
            last_discrepancy_locator = previous_locator.clone();
            last_discrepancy = discrepancy;
            error_locator = new_locator;
            shift = 1;
        } else {
            let scale = field.div(discrepancy, last_discrepancy);
            let correction = last_discrepancy_locator.mul_monomial(field, scale, shift);
            error_locator = error_locator.add(field, &correction);
            shift += 1;
        }
    }

    error_locator
}

/// Chien search: evaluate the error-locator polynomial at every non-zero field
/// element to find its roots, returning the corresponding error *positions*
/// (indices from the end of the codeword array, i.e. the power of `x` each root
/// corresponds to).
fn chien_search(field: &GaloisField, error_locator: &GfPoly, codeword_len: usize) -> Option<Vec<usize>> {
    let degree = error_locator.degree();
    if degree == 0 {
        return Some(Vec::new());
    }

    let mut positions = Vec::with_capacity(degree);
    for i in 0..field.size() - 1 {
        let x_inv = field.exp(-(i as i32));
        if error_locator.evaluate(field, x_inv) == 0 {
            let position = field.size() as i32 - 1 - i as i32;
            let position = ((position % (field.size() as i32 - 1)) + (field.size() as i32 - 1))
                % (field.size() as i32 - 1);
            if position as usize >= codeword_len {
                return None;
            }
            positions.push(position as usize);
        }
    }

    (positions.len() == degree).then_some(positions)
}

/// Forney's formula: compute the error magnitude at each located position from
/// the error-locator and error-evaluator polynomials.
fn forney_magnitudes(
    field: &GaloisField,
    error_locator: &GfPoly,
    syndromes_poly: &GfPoly,
    positions: &[usize],
    codeword_len: usize,
) -> Vec<u16> {
    let error_evaluator = syndromes_poly.mul(field, error_locator);

    positions
        .iter()
        .map(|&position| {
            let xi_inv = field.exp(-(codeword_len as i32 - 1 - position as i32));

            // Formal derivative of the error locator, odd-degree terms only.
            let mut derivative = 0u16;
            for j in (1..=error_locator.degree()).step_by(2) {
                derivative = field.add(derivative, field.mul(error_locator.coefficient(j), pow(field, xi_inv, j - 1)));
            }

            let numerator = error_evaluator.evaluate(field, xi_inv);
            let denominator = derivative;
            if denominator == 0 {
                0
            } else {
                field.div(numerator, denominator)
            }
        })
        .collect()
}

fn pow(field: &GaloisField, base: u16, exponent: usize) -> u16 {
    if base == 0 {
        return if exponent == 0 { 1 } else { 0 };
    }
    field.exp(field.log(base) as i32 * exponent as i32)
}

/// Decode `received` (data followed by `ecc_len` parity codewords) in place,
/// correcting up to `ecc_len / 2` errors. On success, `received`'s data portion
/// is corrected; on failure, `received` is left unmodified and an error is
/// returned.
pub fn decode(field: &GaloisField, received: &mut [u16], ecc_len: usize) -> Result<usize, DecodeError> {
    let syndrome_values = syndromes(field, received, ecc_len);
    if syndrome_values.iter().all(|&s| s == 0) {
        return Ok(0);
    }

    // Syndromes are naturally in ascending-root order; GfPoly expects
    // highest-degree-first, so reverse before treating them as a polynomial.
    let mut reversed_syndromes = syndrome_values.clone();
    reversed_syndromes.reverse();
    let syndrome_poly = GfPoly::new(reversed_syndromes);

    let error_locator = berlekamp_massey(field, &syndrome_values);
    let max_errors = ecc_len / 2;
    if error_locator.degree() > max_errors {
        return Err(err(format!(
            "error locator degree {} exceeds correction capacity {}",
            error_locator.degree(),
            max_errors
        )));
    }

    let positions = chien_search(field, &error_locator, received.len())
        .ok_or_else(|| err("Chien search found a root outside the codeword range"))?;
    if positions.len() != error_locator.degree() {
        return Err(err("Chien search found fewer roots than the error locator's degree"));
    }

    let magnitudes = forney_magnitudes(field, &error_locator, &syndrome_poly, &positions, received.len());

    for (&position, &magnitude) in positions.iter().zip(magnitudes.iter()) {
        let index = received.len() - 1 - position;
        received[index] = field.add(received[index], magnitude);
    }

    let verify = syndromes(field, received, ecc_len);
    if !verify.iter().all(|&s| s == 0) {
        return Err(err("correction did not reproduce zero syndromes"));
    }

    trace!("Reed-Solomon corrected {} error(s)", positions.len());
    Ok(positions.len())
}

/// `GF(16)`, primitive `0x13`, for Aztec's mode-message (parameter) ECC.
pub fn aztec_parameter_field() -> GaloisField {
    GaloisField::new(4, 0x13, 1)
}

/// `GF(64)`, Aztec's 1-2 layer data ECC.
pub fn aztec_data_field_6() -> GaloisField {
    GaloisField::new(6, 0x43, 1)
}

/// `GF(256)`, Aztec's 3-8 layer data ECC.
pub fn aztec_data_field_8() -> GaloisField {
    GaloisField::new(8, 0x12D, 1)
}

/// `GF(1024)`, Aztec's 9-22 layer data ECC.
pub fn aztec_data_field_10() -> GaloisField {
    GaloisField::new(10, 0x409, 1)
}

/// `GF(4096)`, Aztec's 23+ layer data ECC.
pub fn aztec_data_field_12() -> GaloisField {
    GaloisField::new(12, 0x1069, 1)
}

/// `GF(256)`, primitive `0x12D`, for Data Matrix.
pub fn data_matrix_field() -> GaloisField {
    GaloisField::new(8, 0x12D, 1)
}

/// `GF(256)`, primitive `0x11D`, for QR Code.
pub fn qr_field() -> GaloisField {
    GaloisField::new(8, 0x11D, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_with_no_errors() {
        let field = qr_field();
        let data = [32u16, 65, 205, 69, 41, 220, 46, 128, 236];
        let ecc = encode(&field, &data, 17);
        let mut codeword: Vec<u16> = data.iter().chain(ecc.iter()).copied().collect();
        let corrections = decode(&field, &mut codeword, 17).unwrap();
        assert_eq!(corrections, 0);
        assert_eq!(&codeword[..data.len()], &data[..]);
    }

    #[test]
    fn corrects_errors_within_capacity() {
        let field = qr_field();
        let data = [32u16, 65, 205, 69, 41, 220, 46, 128, 236];
        let ecc = encode(&field, &data, 17);
        let mut codeword: Vec<u16> = data.iter().chain(ecc.iter()).copied().collect();

        codeword[0] ^= 0xFF;
        codeword[5] ^= 0x55;

        let corrections = decode(&field, &mut codeword, 17).unwrap();
        assert_eq!(corrections, 2);
        assert_eq!(&codeword[..data.len()], &data[..]);
    }

    #[test]
    fn fails_when_errors_exceed_capacity() {
        let field = qr_field();
        let data = [1u16, 2, 3, 4];
        let ecc = encode(&field, &data, 4);
        let mut codeword: Vec<u16> = data.iter().chain(ecc.iter()).copied().collect();

        for c in codeword.iter_mut() {
            *c ^= 0xFF;
        }

        assert!(decode(&field, &mut codeword, 4).is_err());
    }

    #[test]
    fn small_field_round_trips() {
        let field = aztec_parameter_field();
        let data = [5u16, 9];
        let ecc = encode(&field, &data, 4);
        let mut codeword: Vec<u16> = data.iter().chain(ecc.iter()).copied().collect();
        codeword[1] ^= 0x3;
        let corrections = decode(&field, &mut codeword, 4).unwrap();
        assert_eq!(corrections, 1);
        assert_eq!(&codeword[..data.len()], &data[..]);
    }
}
