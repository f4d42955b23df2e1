//! ECC200 error correction: splitting the message codewords into interleaved
//! Reed-Solomon blocks, correcting/encoding each block independently, and
//! weaving the result back into a single codeword stream (spec §4.6, ECC200
//! interleaving rule).

use smallvec::SmallVec;
use tessera_common::{format_err, Error};
use tessera_rs as rs;

use crate::symbol_info::SymbolInfo;

/// Codewords for a single interleaved Reed-Solomon block; 24 covers every
/// non-interleaved symbol and most interleaved blocks without spilling.
type BlockCodewords = SmallVec<[u16; 24]>;

/// De-interleave `codewords` into `symbol`'s Reed-Solomon blocks, error
/// correct each one, and re-concatenate the data portions in original
/// (non-interleaved) message order.
pub fn decode_ecc200(codewords: &[u8], symbol: &SymbolInfo) -> Result<Vec<u8>, Error> {
    let block_count = symbol.interleaved_block_count();
    let field = rs::data_matrix_field();

    let mut data_blocks: Vec<BlockCodewords> = vec![SmallVec::new(); block_count as usize];
    let mut ecc_blocks: Vec<BlockCodewords> = vec![SmallVec::new(); block_count as usize];
    let error_len = symbol.error_length_for_interleaved_block();

    // Interleaving reads one codeword per block, round-robin, for the data
    // section and then again for the error section.
    let mut reader = codewords.iter().copied();
    let max_data_len = (0..block_count).map(|i| symbol.data_length_for_interleaved_block(i)).max().unwrap_or(0);
    for round in 0..max_data_len {
        for (i, block) in data_blocks.iter_mut().enumerate() {
            if round < symbol.data_length_for_interleaved_block(i as u32) {
                let cw = reader.next().ok_or_else(|| format_err!("Data Matrix codeword stream too short"))?;
                block.push(cw as u16);
            }
        }
    }
    for round in 0..error_len {
        for block in ecc_blocks.iter_mut() {
            let _ = round;
            let cw = reader.next().ok_or_else(|| format_err!("Data Matrix codeword stream too short"))?;
            block.push(cw as u16);
        }
    }

    let mut message = Vec::with_capacity(symbol.data_capacity as usize);
    for i in 0..block_count as usize {
        let mut combined = data_blocks[i].clone();
        combined.extend(ecc_blocks[i].iter().copied());
        let ecc_len = ecc_blocks[i].len();
        rs::decode(&field, &mut combined, ecc_len).map_err(|e| format_err!("Data Matrix Reed-Solomon failed: {e}"))?;
        message.extend(combined[..data_blocks[i].len()].iter().map(|&w| w as u8));
    }

    Ok(message)
}

/// Interleave `data` (already padded to `symbol.data_capacity`) into
/// Reed-Solomon blocks, append per-block parity, and weave everything back
/// into the wire codeword order (round-robin data, then round-robin parity).
pub fn encode_ecc200(data: &[u8], symbol: &SymbolInfo) -> Vec<u8> {
    let block_count = symbol.interleaved_block_count() as usize;
    let field = rs::data_matrix_field();
    let error_len = symbol.error_length_for_interleaved_block() as usize;

    let mut data_blocks: Vec<BlockCodewords> = vec![SmallVec::new(); block_count];
    for (i, &byte) in data.iter().enumerate() {
        data_blocks[i % block_count].push(byte as u16);
    }

    let ecc_blocks: Vec<Vec<u16>> = data_blocks.iter().map(|block| rs::encode(&field, block, error_len)).collect();

    let max_data_len = data_blocks.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Vec::with_capacity(data.len() + block_count * error_len);
    for round in 0..max_data_len {
        for block in &data_blocks {
            if let Some(&cw) = block.get(round) {
                out.push(cw as u8);
            }
        }
    }
    for round in 0..error_len {
        for block in &ecc_blocks {
            out.push(block[round] as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol_info::{lookup, SymbolShape};

    #[test]
    fn round_trips_through_ecc200() {
        let symbol = lookup(8, SymbolShape::None, None, None, None, None).unwrap();
        let data: Vec<u8> = (0..symbol.data_capacity).map(|i| (i * 7 + 3) as u8).collect();
        let encoded = encode_ecc200(&data, symbol);
        assert_eq!(encoded.len(), symbol.codeword_count() as usize);

        let recovered = decode_ecc200(&encoded, symbol).unwrap();
        assert_eq!(recovered, data);
    }

    #[test]
    fn corrects_a_single_corrupted_codeword() {
        let symbol = lookup(8, SymbolShape::None, None, None, None, None).unwrap();
        let data: Vec<u8> = (0..symbol.data_capacity).map(|i| (i * 11 + 1) as u8).collect();
        let mut encoded = encode_ecc200(&data, symbol);
        encoded[0] ^= 0xff;

        let recovered = decode_ecc200(&encoded, symbol).unwrap();
        assert_eq!(recovered, data);
    }
}
