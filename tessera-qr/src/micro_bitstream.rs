//! Micro QR / rMQR data segments: the same four modes full QR uses (Numeric,
//! Alphanumeric, Byte, Kanji) plus an ECI designator segment, but with
//! version-dependent mode-indicator and character-count widths that are
//! *narrower* than full QR's fixed 4-bit indicator (ISO/IEC 18004 Annex C
//! Tables 7-8; ISO/IEC 23941 gives rMQR the same four data modes with a
//! full-width 3-bit indicator, wide enough to also carry ECI designators,
//! which Micro QR's own narrower versions below M4 cannot). Reuses full QR's
//! `BitWriter`/`BitReader`, alphanumeric character table and ECI designator
//! codec rather than redefining them.

use tessera_common::{format_err, CharacterSet, Content, Error};

use crate::bitstream::{alphanumeric_value, BitReader, BitWriter, ALPHANUMERIC_CHARS};
use crate::micro_tables::MicroVersion;

/// Which symbol family a bit stream is being segmented for: a specific Micro
/// QR version, or rMQR (which always gets the widest, M4-equivalent
/// indicator/count tier, and alone among the two supports ECI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentContext {
    /// A Micro QR symbol of the given version.
    Micro(MicroVersion),
    /// An rMQR symbol (any size).
    Rmqr,
}

impl SegmentContext {
    fn mode_indicator_bits(self) -> u32 {
        match self {
            SegmentContext::Micro(v) => v.mode_indicator_bits(),
            SegmentContext::Rmqr => 3,
        }
    }

    fn count_tier(self) -> u32 {
        match self {
            SegmentContext::Micro(v) => v.mode_indicator_bits(),
            SegmentContext::Rmqr => 3,
        }
    }

    fn supports_eci(self) -> bool {
        matches!(self, SegmentContext::Rmqr)
    }

    fn terminator_bits(self) -> u32 {
        match self {
            SegmentContext::Micro(v) => v.terminator_bits(),
            SegmentContext::Rmqr => 0,
        }
    }
}

/// The four Micro QR/rMQR data modes, plus ECI (rMQR only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
    Eci,
}

impl Mode {
    /// All modes a given context's indicator field can name, in indicator
    /// order (M1 supports Numeric only, with no indicator at all).
    fn supported(ctx: SegmentContext) -> &'static [Mode] {
        match ctx {
            SegmentContext::Micro(MicroVersion::M1) => &[Mode::Numeric],
            SegmentContext::Micro(MicroVersion::M2) => &[Mode::Numeric, Mode::Alphanumeric],
            SegmentContext::Micro(MicroVersion::M3 | MicroVersion::M4) => &[Mode::Numeric, Mode::Alphanumeric, Mode::Byte, Mode::Kanji],
            SegmentContext::Rmqr => &[Mode::Numeric, Mode::Alphanumeric, Mode::Byte, Mode::Kanji, Mode::Eci],
        }
    }

    fn indicator(self, ctx: SegmentContext) -> u32 {
        Self::supported(ctx).iter().position(|&m| m == self).expect("mode must be supported by its own context") as u32
    }

    fn from_indicator(bits: u32, ctx: SegmentContext) -> Option<Mode> {
        Self::supported(ctx).get(bits as usize).copied()
    }

    /// Character-count field width for this mode at `ctx`'s tier
    /// (ISO/IEC 18004 Table 8).
    fn count_bits(self, ctx: SegmentContext) -> u32 {
        let tier = ctx.count_tier();
        match self {
            Mode::Numeric => 3 + tier,
            Mode::Alphanumeric => 2 + tier,
            Mode::Byte => 1 + tier + 2,
            Mode::Kanji => tier + 2,
            Mode::Eci => 0,
        }
    }
}

/// Encode `text` as the tightest-fitting single segment this `ctx` can
/// carry: a run of digits becomes Numeric, the 45-character alphanumeric set
/// becomes Alphanumeric, anything else becomes Byte (M1/M2 reject non-numeric
/// or non-alphanumeric text outright, matching their restricted mode sets).
/// When `eci` is given and `ctx` supports it, an ECI designator segment is
/// emitted first.
pub fn encode_segments(writer: &mut BitWriter, text: &[u8], ctx: SegmentContext, eci: Option<u32>) -> Result<(), Error> {
    if let Some(designator) = eci {
        if !ctx.supports_eci() {
            return Err(format_err!("this Micro QR version cannot carry an ECI designator"));
        }
        writer.push_bits(Mode::Eci.indicator(ctx), ctx.mode_indicator_bits());
        write_eci_designator(writer, designator);
    }

    let supported = Mode::supported(ctx);
    let is_numeric = text.iter().all(u8::is_ascii_digit);
    let is_alphanumeric = text.iter().all(|&b| alphanumeric_value(b).is_some());

    let mode = if is_numeric {
        Mode::Numeric
    } else if is_alphanumeric && supported.contains(&Mode::Alphanumeric) {
        Mode::Alphanumeric
    } else if supported.contains(&Mode::Byte) {
        Mode::Byte
    } else {
        return Err(format_err!("text does not fit this Micro QR version's supported modes"));
    };

    if ctx.mode_indicator_bits() > 0 {
        writer.push_bits(mode.indicator(ctx), ctx.mode_indicator_bits());
    }
    writer.push_bits(text.len() as u32, mode.count_bits(ctx));

    match mode {
        Mode::Numeric => {
            for group in text.chunks(3) {
                let value: u32 = group.iter().fold(0, |acc, &d| acc * 10 + (d - b'0') as u32);
                let bits = match group.len() {
                    3 => 10,
                    2 => 7,
                    _ => 4,
                };
                writer.push_bits(value, bits);
            }
        }
        Mode::Alphanumeric => {
            for pair in text.chunks(2) {
                if pair.len() == 2 {
                    let value = alphanumeric_value(pair[0]).unwrap() * 45 + alphanumeric_value(pair[1]).unwrap();
                    writer.push_bits(value, 11);
                } else {
                    writer.push_bits(alphanumeric_value(pair[0]).unwrap(), 6);
                }
            }
        }
        Mode::Byte => {
            for &b in text {
                writer.push_bits(b as u32, 8);
            }
        }
        Mode::Kanji | Mode::Eci => unreachable!("encode_segments never selects Kanji or a second ECI segment here"),
    }

    Ok(())
}

fn write_eci_designator(writer: &mut BitWriter, designator: u32) {
    if designator < 128 {
        writer.push_bits(designator, 8);
    } else if designator < 16384 {
        writer.push_bits(0x80 << 8 | designator, 16);
    } else {
        writer.push_bits(0xC0 << 16 | designator, 24);
    }
}

/// Append the context-dependent terminator and byte-pad to `data_capacity`.
pub fn finish_and_pad(writer: BitWriter, ctx: SegmentContext, data_capacity: usize) -> Vec<u8> {
    let mut bits = writer;
    let terminator_bits = ctx.terminator_bits().min((data_capacity * 8).saturating_sub(bits.len()) as u32);
    bits.push_bits(0, terminator_bits);
    let mut bytes = bits.into_bytes();
    let mut toggle = true;
    while bytes.len() < data_capacity {
        bytes.push(if toggle { 0xEC } else { 0x11 });
        toggle = !toggle;
    }
    bytes.truncate(data_capacity);
    bytes
}

/// Decode a flat data-codeword bit stream into `content`.
pub fn decode_segments(bits: &[bool], ctx: SegmentContext, content: &mut Content) -> Result<(), Error> {
    let mut reader = BitReader::new(bits);
    let indicator_bits = ctx.mode_indicator_bits();

    loop {
        let indicator = if indicator_bits == 0 {
            if reader.remaining() < 3 {
                break;
            }
            0
        } else {
            let Some(bits) = reader.read_bits(indicator_bits) else { break };
            bits
        };

        // M1's implicit terminator is "fewer than a count field's worth of
        // bits remain"; versions with a real indicator use an all-zero
        // indicator only as padding, which `count_bits` below will reject by
        // running out of bits.
        let Some(mode) = Mode::from_indicator(indicator, ctx) else { break };

        if mode == Mode::Eci {
            let designator = read_eci_designator(&mut reader).ok_or_else(|| format_err!("truncated ECI designator"))?;
            content.switch_encoding_eci(designator);
            continue;
        }

        let count = mode.count_bits(ctx);
        let Some(len) = reader.read_bits(count) else { break };

        match mode {
            Mode::Numeric => decode_numeric(&mut reader, len as usize, content)?,
            Mode::Alphanumeric => decode_alphanumeric(&mut reader, len as usize, content)?,
            Mode::Byte => decode_byte(&mut reader, len as usize, content)?,
            Mode::Kanji => return Err(format_err!("Kanji mode decoding is not implemented for Micro QR")),
            Mode::Eci => unreachable!("handled by the continue above"),
        }

        if indicator_bits == 0 {
            break; // M1 carries exactly one Numeric segment.
        }
    }

    Ok(())
}

fn read_eci_designator(reader: &mut BitReader) -> Option<u32> {
    let first = reader.read_bits(8)?;
    if first & 0x80 == 0 {
        Some(first)
    } else if first & 0xC0 == 0x80 {
        let rest = reader.read_bits(8)?;
        Some(((first & 0x3f) << 8) | rest)
    } else {
        let rest = reader.read_bits(16)?;
        Some(((first & 0x1f) << 16) | rest)
    }
}

fn decode_numeric(reader: &mut BitReader, count: usize, content: &mut Content) -> Result<(), Error> {
    let mut remaining = count;
    let mut out = Vec::with_capacity(count);
    while remaining > 0 {
        let bits = match remaining {
            1 => 4,
            2 => 7,
            _ => 10,
        };
        let value = reader.read_bits(bits).ok_or_else(|| format_err!("truncated Micro QR numeric group"))?;
        let digits = remaining.min(3);
        out.extend_from_slice(format!("{:0width$}", value, width = digits).as_bytes());
        remaining -= digits;
    }
    content.append(&out);
    Ok(())
}

fn decode_alphanumeric(reader: &mut BitReader, count: usize, content: &mut Content) -> Result<(), Error> {
    let mut remaining = count;
    let mut out = Vec::with_capacity(count);
    while remaining >= 2 {
        let value = reader.read_bits(11).ok_or_else(|| format_err!("truncated Micro QR alphanumeric pair"))?;
        out.push(ALPHANUMERIC_CHARS[(value / 45) as usize]);
        out.push(ALPHANUMERIC_CHARS[(value % 45) as usize]);
        remaining -= 2;
    }
    if remaining == 1 {
        let value = reader.read_bits(6).ok_or_else(|| format_err!("truncated Micro QR alphanumeric tail"))?;
        out.push(ALPHANUMERIC_CHARS[value as usize]);
    }
    content.append(&out);
    Ok(())
}

fn decode_byte(reader: &mut BitReader, count: usize, content: &mut Content) -> Result<(), Error> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(reader.read_bits(8).ok_or_else(|| format_err!("truncated Micro QR byte segment"))? as u8);
    }
    content.append(&out);
    Ok(())
}

/// Check whether `text` fits within the modes `ctx` supports at all (used by
/// the encoder's version/size search).
pub fn fits(text: &[u8], ctx: SegmentContext) -> bool {
    let supported = Mode::supported(ctx);
    let is_numeric = text.iter().all(u8::is_ascii_digit);
    let is_alphanumeric = text.iter().all(|&b| alphanumeric_value(b).is_some());
    is_numeric || (is_alphanumeric && supported.contains(&Mode::Alphanumeric)) || supported.contains(&Mode::Byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(bytes: &[u8]) -> Vec<bool> {
        bytes.iter().flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1 == 1)).collect()
    }

    #[test]
    fn numeric_segment_round_trips_on_m1() {
        let mut writer = BitWriter::new();
        let ctx = SegmentContext::Micro(MicroVersion::M1);
        encode_segments(&mut writer, b"123", ctx, None).unwrap();
        let bytes = finish_and_pad(writer, ctx, 2);
        let mut content = Content::new(CharacterSet::Unknown);
        decode_segments(&bits_of(&bytes), ctx, &mut content).unwrap();
        assert_eq!(content.bytes(), b"123");
    }

    #[test]
    fn alphanumeric_segment_round_trips_on_m4() {
        let mut writer = BitWriter::new();
        let ctx = SegmentContext::Micro(MicroVersion::M4);
        encode_segments(&mut writer, b"AB-12", ctx, None).unwrap();
        let bytes = finish_and_pad(writer, ctx, 6);
        let mut content = Content::new(CharacterSet::Unknown);
        decode_segments(&bits_of(&bytes), ctx, &mut content).unwrap();
        assert_eq!(content.bytes(), b"AB-12");
    }

    #[test]
    fn byte_text_is_rejected_on_m1_and_m2() {
        assert!(!fits(b"hi!", SegmentContext::Micro(MicroVersion::M1)));
        assert!(!fits(b"hi!", SegmentContext::Micro(MicroVersion::M2)));
        assert!(fits(b"hi!", SegmentContext::Micro(MicroVersion::M3)));
    }

    #[test]
    fn rmqr_carries_an_eci_designator() {
        let mut writer = BitWriter::new();
        encode_segments(&mut writer, b"hi", SegmentContext::Rmqr, Some(20)).unwrap();
        let bytes = finish_and_pad(writer, SegmentContext::Rmqr, 8);
        let mut content = Content::new(CharacterSet::Unknown);
        decode_segments(&bits_of(&bytes), SegmentContext::Rmqr, &mut content).unwrap();
        assert_eq!(content.bytes(), b"hi");
    }

    #[test]
    fn micro_qr_rejects_an_eci_designator() {
        let mut writer = BitWriter::new();
        let ctx = SegmentContext::Micro(MicroVersion::M4);
        assert!(encode_segments(&mut writer, b"hi", ctx, Some(20)).is_err());
    }
}
