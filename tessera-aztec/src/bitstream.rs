//! Aztec bit-stream-to-text decoding: table switching, binary shift, FLG(n)
//! and the Structured Append prefix (spec §4.4).

use tessera_common::{format_err, Content, Error, StructuredAppendInfo};

use crate::tables::{self, Entry, Table};

struct BitReader<'a> {
    bits: &'a [bool],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bits: &'a [bool]) -> Self {
        Self { bits, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    fn read(&mut self, n: u32) -> Option<u32> {
        if self.remaining() < n as usize {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..n {
            value = (value << 1) | u32::from(self.bits[self.pos]);
            self.pos += 1;
        }
        Some(value)
    }
}

/// Decode a reversed-stuff-bit character stream into `content`, handling table
/// latches/shifts, binary-shift blocks and the FLG(n) ECI/FNC1 escape.
///
/// Returns the Structured Append info parsed from a leading `ML UL` prefix, if
/// present (spec: "If the first two codewords decode to ML UL...").
pub fn decode(bits: &[bool], content: &mut Content) -> Result<StructuredAppendInfo, Error> {
    let mut reader = BitReader::new(bits);
    let mut latch_table = Table::Upper;
    let mut structured_append = StructuredAppendInfo::default();
    let mut first_tokens = true;
    let mut saw_latch_mixed = false;

    loop {
        if reader.remaining() == 0 {
            break;
        }

        let active_table = latch_table;
        let bits_needed = tables::bits_for(active_table);
        let Some(code) = reader.read(bits_needed) else {
            break;
        };

        if active_table == Table::Punct && code == tables::PUNCT_CRLF_INDEX as u32 {
            content.append(b"\r\n");
            continue;
        }

        let entry = tables::lookup(active_table, code);

        // Structured Append detection: the very first two tokens are ML then UL.
        if first_tokens {
            if !saw_latch_mixed && matches!(entry, Entry::LatchMixed) {
                saw_latch_mixed = true;
                latch_table = Table::Mixed;
                continue;
            }
            if saw_latch_mixed && matches!(entry, Entry::LatchUpper) {
                latch_table = Table::Upper;
                structured_append = read_structured_append(&mut reader)?;
                first_tokens = false;
                continue;
            }
        }
        first_tokens = false;

        match entry {
            Entry::Char(ch) => {
                let mut buf = [0u8; 4];
                content.append(ch.encode_utf8(&mut buf).as_bytes());
            }
            Entry::Flag => {
                handle_flag(&mut reader, content)?;
            }
            Entry::ShiftPunct => {
                decode_one_shifted(&mut reader, Table::Punct, content)?;
            }
            Entry::ShiftUpper => {
                decode_one_shifted(&mut reader, Table::Upper, content)?;
            }
            Entry::LatchUpper => latch_table = Table::Upper,
            Entry::LatchLower => latch_table = Table::Lower,
            Entry::LatchMixed => latch_table = Table::Mixed,
            Entry::LatchDigit => latch_table = Table::Digit,
            Entry::BinaryShift => decode_binary_shift(&mut reader, content)?,
        }
    }

    Ok(structured_append)
}

fn decode_one_shifted(reader: &mut BitReader<'_>, table: Table, content: &mut Content) -> Result<(), Error> {
    let bits_needed = tables::bits_for(table);
    let Some(code) = reader.read(bits_needed) else {
        return Err(format_err!("truncated Aztec bit stream during a shift"));
    };
    if table == Table::Punct && code == tables::PUNCT_CRLF_INDEX as u32 {
        content.append(b"\r\n");
        return Ok(());
    }
    match tables::lookup(table, code) {
        Entry::Char(ch) => {
            let mut buf = [0u8; 4];
            content.append(ch.encode_utf8(&mut buf).as_bytes());
            Ok(())
        }
        Entry::Flag => handle_flag(reader, content),
        _ => Err(format_err!("unexpected control code inside a shift")),
    }
}

fn handle_flag(reader: &mut BitReader<'_>, content: &mut Content) -> Result<(), Error> {
    let Some(n) = reader.read(3) else {
        return Err(format_err!("truncated Aztec bit stream reading FLG(n)"));
    };
    if n == 0 {
        // FNC1: emit the GS1 application-separator byte.
        content.append(&[0x1D]);
        return Ok(());
    }
    if n > 6 {
        return Err(format_err!("FLG({n}) is reserved"));
    }
    let mut eci = 0u32;
    for _ in 0..n {
        let Some(digit) = reader.read(4) else {
            return Err(format_err!("truncated Aztec bit stream reading an FLG(n) ECI digit"));
        };
        if digit > 9 {
            return Err(format_err!("FLG(n) ECI digit {digit} out of range"));
        }
        eci = eci * 10 + digit;
    }
    content.switch_encoding_eci(eci);
    Ok(())
}

fn decode_binary_shift(reader: &mut BitReader<'_>, content: &mut Content) -> Result<(), Error> {
    let Some(short_len) = reader.read(5) else {
        return Err(format_err!("truncated Aztec bit stream reading a binary-shift length"));
    };
    let len = if short_len == 0 {
        let Some(long_len) = reader.read(11) else {
            return Err(format_err!("truncated Aztec bit stream reading a long binary-shift length"));
        };
        long_len + 31
    } else {
        short_len
    };

    let mut bytes = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let Some(byte) = reader.read(8) else {
            return Err(format_err!("truncated Aztec bit stream in a binary-shift block"));
        };
        bytes.push(byte as u8);
    }
    content.append(&bytes);
    Ok(())
}

fn read_structured_append(reader: &mut BitReader<'_>) -> Result<StructuredAppendInfo, Error> {
    // An optional space-delimited ID, read as Upper-table characters up to a
    // literal space, followed by two 5-bit words for index and count.
    let mut id = String::new();
    loop {
        let Some(code) = reader.read(5) else {
            return Err(format_err!("truncated Aztec Structured Append header"));
        };
        match tables::lookup(Table::Upper, code) {
            Entry::Char(' ') => break,
            Entry::Char(ch) => id.push(ch),
            _ => {
                // Not an ID after all; this symbol has no Structured Append ID.
                break;
            }
        }
        if id.len() > 32 {
            return Err(format_err!("Aztec Structured Append ID too long"));
        }
    }

    let Some(index_code) = reader.read(5) else {
        return Err(format_err!("truncated Aztec Structured Append index"));
    };
    let Some(count_code) = reader.read(5) else {
        return Err(format_err!("truncated Aztec Structured Append count"));
    };

    Ok(StructuredAppendInfo {
        index: index_code as i32,
        count: count_code as i32 + 1,
        id: (!id.is_empty()).then_some(id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_common::CharacterSet;

    fn bits_from_codes(codes: &[(u32, u32)]) -> Vec<bool> {
        let mut bits = Vec::new();
        for &(value, width) in codes {
            for i in (0..width).rev() {
                bits.push((value >> i) & 1 == 1);
            }
        }
        bits
    }

    #[test]
    fn decodes_plain_upper_text() {
        // "HI" in Upper table: H=9, I=10 (5 bits each).
        let bits = bits_from_codes(&[(9, 5), (10, 5)]);
        let mut content = Content::new(CharacterSet::Unknown);
        decode(&bits, &mut content).unwrap();
        assert_eq!(content.utf8(), "HI");
    }

    #[test]
    fn decodes_digit_latch() {
        // Latch to Digit (UPPER index 30), then digit '1' (DIGIT index 3).
        let bits = bits_from_codes(&[(30, 5), (3, 4)]);
        let mut content = Content::new(CharacterSet::Unknown);
        decode(&bits, &mut content).unwrap();
        assert_eq!(content.utf8(), "1");
    }

    #[test]
    fn binary_shift_round_trips_raw_bytes() {
        // BinaryShift (UPPER index 31), length=2, then two raw bytes.
        let bits = bits_from_codes(&[(31, 5), (2, 5), (0x41, 8), (0x42, 8)]);
        let mut content = Content::new(CharacterSet::Unknown);
        decode(&bits, &mut content).unwrap();
        assert_eq!(content.bytes(), b"AB");
    }
}
