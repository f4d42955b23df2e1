//! QR Reed-Solomon error correction: splitting the data codeword stream
//! into the version/level's block groups, encoding/correcting each block,
//! and interleaving the result into wire order (ISO/IEC 18004 §7.5-§7.6).

use smallvec::SmallVec;
use tessera_common::{format_err, Error};
use tessera_rs as rs;

use crate::tables::{self, EcLevel};

type BlockCodewords = SmallVec<[u16; 128]>;

/// Split `data` into this (version, level)'s block groups, RS-encode each
/// one, and interleave data and parity codewords into wire order.
pub fn encode(data: &[u8], version: u32, level: EcLevel) -> Vec<u8> {
    let layout = tables::ec_blocks(version, level);
    let field = rs::qr_field();

    let mut blocks: Vec<BlockCodewords> = Vec::new();
    let mut pos = 0usize;
    for (count, size) in [layout.group1, layout.group2] {
        for _ in 0..count {
            blocks.push(data[pos..pos + size as usize].iter().map(|&b| b as u16).collect());
            pos += size as usize;
        }
    }

    let ecc_blocks: Vec<Vec<u16>> = blocks.iter().map(|b| rs::encode(&field, b, layout.ec_per_block as usize)).collect();

    let max_data_len = blocks.iter().map(SmallVec::len).max().unwrap_or(0);
    let mut out = Vec::with_capacity(tables::total_codewords(version) as usize);
    for round in 0..max_data_len {
        for block in &blocks {
            if let Some(&cw) = block.get(round) {
                out.push(cw as u8);
            }
        }
    }
    for round in 0..layout.ec_per_block as usize {
        for block in &ecc_blocks {
            out.push(block[round] as u8);
        }
    }
    out
}

/// De-interleave `codewords` (one per symbol module byte, wire order),
/// error-correct each block, and re-concatenate the data portions in
/// message order.
pub fn decode(codewords: &[u8], version: u32, level: EcLevel) -> Result<Vec<u8>, Error> {
    let layout = tables::ec_blocks(version, level);
    let field = rs::qr_field();
    let block_count = layout.block_count() as usize;

    let sizes: Vec<usize> = [layout.group1, layout.group2]
        .iter()
        .flat_map(|&(count, size)| std::iter::repeat(size as usize).take(count as usize))
        .collect();

    let mut data_blocks: Vec<BlockCodewords> = vec![SmallVec::new(); block_count];
    let mut ecc_blocks: Vec<BlockCodewords> = vec![SmallVec::new(); block_count];

    let mut reader = codewords.iter().copied();
    let max_data_len = sizes.iter().copied().max().unwrap_or(0);
    for round in 0..max_data_len {
        for (i, block) in data_blocks.iter_mut().enumerate() {
            if round < sizes[i] {
                let cw = reader.next().ok_or_else(|| format_err!("QR codeword stream too short"))?;
                block.push(cw as u16);
            }
        }
    }
    for _ in 0..layout.ec_per_block as usize {
        for block in ecc_blocks.iter_mut() {
            let cw = reader.next().ok_or_else(|| format_err!("QR codeword stream too short"))?;
            block.push(cw as u16);
        }
    }

    let mut message = Vec::with_capacity(layout.total_data_codewords() as usize);
    for i in 0..block_count {
        let mut combined = data_blocks[i].clone();
        combined.extend(ecc_blocks[i].iter().copied());
        let ecc_len = ecc_blocks[i].len();
        rs::decode(&field, &mut combined, ecc_len).map_err(|e| format_err!("QR Reed-Solomon failed: {e}"))?;
        message.extend(combined[..data_blocks[i].len()].iter().map(|&w| w as u8));
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_qr_ecc() {
        let layout = tables::ec_blocks(5, EcLevel::M);
        let data: Vec<u8> = (0..layout.total_data_codewords()).map(|i| (i * 13 + 5) as u8).collect();
        let encoded = encode(&data, 5, EcLevel::M);
        assert_eq!(encoded.len(), tables::total_codewords(5) as usize);

        let recovered = decode(&encoded, 5, EcLevel::M).unwrap();
        assert_eq!(recovered, data);
    }

    #[test]
    fn corrects_a_corrupted_codeword() {
        let layout = tables::ec_blocks(1, EcLevel::H);
        let data: Vec<u8> = (0..layout.total_data_codewords()).map(|i| (i * 7 + 2) as u8).collect();
        let mut encoded = encode(&data, 1, EcLevel::H);
        encoded[0] ^= 0xff;

        let recovered = decode(&encoded, 1, EcLevel::H).unwrap();
        assert_eq!(recovered, data);
    }
}
