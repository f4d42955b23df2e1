//! Data Matrix high-level encoding: the six text-compaction modes (ASCII,
//! C40, Text, X12, EDIFACT, Base256) and the look-ahead heuristic that picks
//! between them codeword-by-codeword (spec §4.8, ECC200 high-level encoder).

use crate::symbol_info::{lookup, SymbolInfo, SymbolShape};

const PAD: u8 = 129;
const UPPER_SHIFT: u8 = 235;
const MACRO_05: u8 = 236;
const MACRO_06: u8 = 237;
const C40_UNLATCH: u8 = 254;
const X12_UNLATCH: u8 = 254;

/// Latch codeword for entering each non-ASCII mode, indexed by [`Mode`] minus
/// [`Mode::Ascii`]. ASCII itself has no latch (0 is unused).
const LATCHES: [u8; 6] = [0, 230, 239, 238, 240, 231];

/// One of the six ECC200 text-compaction schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Default mode: one codeword per byte (with C40-style digit pairing).
    Ascii,
    /// Three characters packed into two codewords from a 40-symbol alphabet.
    C40,
    /// Like C40 but with a different basic-set character mapping.
    Text,
    /// Like C40 but for ANSI X12 EDI data.
    X12,
    /// Four characters packed into three bytes, ASCII-range only.
    Edifact,
    /// Raw bytes, randomized to avoid accidental finder-pattern collisions.
    Base256,
}

impl Mode {
    fn latch(self) -> u8 {
        LATCHES[self as usize]
    }
}

/// Tracks the codeword buffer and the symbol-size constraint while encoding.
struct EncoderContext<'a> {
    text: &'a [u8],
    /// Exclusive upper bound on `pos`; shorter than `text.len()` when a macro
    /// trailer has been carved off the end.
    end: usize,
    pos: usize,
    codewords: Vec<u8>,
    shape: SymbolShape,
    max_size: Option<(u32, u32)>,
    symbol: Option<&'static SymbolInfo>,
}

impl<'a> EncoderContext<'a> {
    fn new(text: &'a [u8], shape: SymbolShape, max_size: Option<(u32, u32)>) -> Self {
        Self {
            text,
            end: text.len(),
            pos: 0,
            codewords: Vec::new(),
            shape,
            max_size,
            symbol: None,
        }
    }

    fn has_more_characters(&self) -> bool {
        self.pos < self.end
    }

    fn remaining(&self) -> usize {
        self.end - self.pos
    }

    fn current_char(&self) -> u8 {
        self.text[self.pos]
    }

    fn char_at(&self, offset: usize) -> Option<u8> {
        if self.pos + offset >= self.end {
            return None;
        }
        self.text.get(self.pos + offset).copied()
    }

    fn write_codewords(&mut self, words: &[u8]) {
        self.codewords.extend_from_slice(words);
    }

    /// Re-resolve the symbol size for the codewords written so far, honouring
    /// `skip_at_end` extra codewords that will still be appended (unlatch +
    /// padding, counted so the lookup doesn't undershoot).
    fn update_symbol_info(&mut self, skip_at_end: usize) -> Result<(), tessera_common::Error> {
        let needed = self.codewords.len() + skip_at_end;
        let (min_w, min_h, max_w, max_h) = match self.max_size {
            Some((w, h)) => (None, None, Some(w), Some(h)),
            None => (None, None, None, None),
        };
        self.symbol = lookup(needed as u32, self.shape, min_w, min_h, max_w, max_h);
        if self.symbol.is_none() {
            return Err(tessera_common::format_err!("Data Matrix message too large for any available symbol size"));
        }
        Ok(())
    }
}

const MACRO_05_HEADER: &[u8] = b"[)>\x1E05\x1D";
const MACRO_06_HEADER: &[u8] = b"[)>\x1E06\x1D";
const MACRO_TRAILER: &[u8] = b"\x1E\x04";

/// Encode `text` as a Data Matrix high-level bit/codeword stream, returning
/// the codewords (unpadded, without ECC) and the chosen symbol size.
///
/// A message that carries one of the two well-known macro headers (used by
/// the 05/06 reader-programming protocol) is replaced by a single codeword
/// and the header/trailer are stripped from the stream.
pub fn encode_high_level(
    text: &[u8],
    shape: SymbolShape,
    max_size: Option<(u32, u32)>,
) -> Result<(Vec<u8>, &'static SymbolInfo), tessera_common::Error> {
    let mut ctx = EncoderContext::new(text, shape, max_size);
    let mut mode = Mode::Ascii;
    let mut skip_at_end = 0usize;

    if text.starts_with(MACRO_05_HEADER) && text.ends_with(MACRO_TRAILER) {
        ctx.write_codewords(&[MACRO_05]);
        ctx.pos = MACRO_05_HEADER.len();
        skip_at_end = MACRO_TRAILER.len();
    } else if text.starts_with(MACRO_06_HEADER) && text.ends_with(MACRO_TRAILER) {
        ctx.write_codewords(&[MACRO_06]);
        ctx.pos = MACRO_06_HEADER.len();
        skip_at_end = MACRO_TRAILER.len();
    }
    ctx.end = text.len() - skip_at_end;

    while ctx.has_more_characters() {
        mode = match mode {
            Mode::Ascii => encode_ascii(&mut ctx)?,
            Mode::C40 => encode_c40(&mut ctx)?,
            Mode::Text => encode_text(&mut ctx)?,
            Mode::X12 => encode_x12(&mut ctx)?,
            Mode::Edifact => encode_edifact(&mut ctx)?,
            Mode::Base256 => encode_base256(&mut ctx)?,
        };
    }

    let len = ctx.codewords.len();
    ctx.update_symbol_info(0)?;
    let symbol = ctx.symbol.unwrap();

    // A message that ends cleanly on a C40/Text/X12 triple boundary leaves
    // that mode latched; unlatch back to ASCII if there's still room.
    if (len as u32) < symbol.data_capacity && matches!(mode, Mode::C40 | Mode::Text | Mode::X12) {
        ctx.write_codewords(&[C40_UNLATCH]);
    }

    let len = ctx.codewords.len();
    pad_remaining_codewords(&mut ctx.codewords, symbol, len);
    Ok((ctx.codewords, symbol))
}

fn pad_remaining_codewords(codewords: &mut Vec<u8>, symbol: &SymbolInfo, mut pos: usize) {
    let capacity = symbol.data_capacity as usize;
    if pos < capacity {
        codewords.push(PAD);
        pos += 1;
    }
    while pos < capacity {
        codewords.push(randomize_253_state(PAD, pos as u32 + 1));
        pos += 1;
    }
}

fn randomize_253_state(ch: u8, codeword_position: u32) -> u8 {
    let pseudo_random = ((149 * codeword_position) % 253) + 1;
    let temp = ch as u32 + pseudo_random;
    if temp <= 254 {
        temp as u8
    } else {
        (temp - 254) as u8
    }
}

/// Cost, in "codeword units" (a float so partial progress toward a 2-for-3 or
/// 3-for-2 compaction ratio can accumulate), of encoding the next
/// `char_counts` characters in each of the six modes. Mirrors the original
/// look-ahead test: advance character-by-character, update every mode's
/// running cost, and stop as soon as one mode is unambiguously cheapest.
struct CharCounts {
    ascii: f64,
    c40: f64,
    text: f64,
    x12: f64,
    edifact: f64,
    base256: f64,
}

impl CharCounts {
    fn new(current_mode: Mode) -> Self {
        let mut counts = Self {
            ascii: 1.0,
            c40: 2.0,
            text: 2.0,
            x12: 2.0,
            edifact: 2.0,
            base256: 2.0,
        };
        match current_mode {
            Mode::Ascii => counts.ascii = 0.0,
            Mode::C40 => counts.c40 = 0.0,
            Mode::Text => counts.text = 0.0,
            Mode::X12 => counts.x12 = 0.0,
            Mode::Edifact => counts.edifact = 0.0,
            Mode::Base256 => counts.base256 = 0.0,
        }
        counts
    }
}

/// Pick the best mode to switch to, looking ahead from `ctx.pos` (spec's
/// `LookAheadTest` / `FindMinimums` pair).
fn look_ahead_test(ctx: &EncoderContext, current_mode: Mode) -> Mode {
    let mut counts = CharCounts::new(current_mode);
    let mut char_counts_processed = 0usize;
    let remaining = ctx.remaining();

    for i in 0..remaining.min(64) {
        let ch = ctx.char_at(i).unwrap();
        char_counts_processed += 1;

        counts.ascii += if is_extended_ascii(ch) { 2.0 } else { 1.0 };
        if ch.is_ascii_digit() {
            counts.ascii -= 0.5;
        }

        counts.c40 += c40_cost(ch);
        counts.text += text_cost(ch);
        counts.x12 += x12_cost(ch);
        counts.edifact += edifact_cost(ch);
        counts.base256 += 1.0;

        if char_counts_processed >= 4 {
            let min = [counts.ascii, counts.c40, counts.text, counts.x12, counts.edifact, counts.base256]
                .into_iter()
                .fold(f64::INFINITY, f64::min);

            if counts.ascii <= min {
                return Mode::Ascii;
            }
            if counts.c40 <= min && counts.c40 < counts.text && counts.c40 < counts.x12 && counts.c40 < counts.edifact {
                return Mode::C40;
            }
            if counts.text <= min {
                return Mode::Text;
            }
            if counts.x12 <= min {
                return Mode::X12;
            }
            if counts.edifact <= min {
                return Mode::Edifact;
            }
            if counts.base256 <= min {
                return Mode::Base256;
            }
        }
    }
    find_minimum(&counts, current_mode)
}

fn find_minimum(counts: &CharCounts, _current_mode: Mode) -> Mode {
    let candidates = [
        (Mode::Ascii, counts.ascii),
        (Mode::C40, counts.c40),
        (Mode::Text, counts.text),
        (Mode::X12, counts.x12),
        (Mode::Edifact, counts.edifact),
        (Mode::Base256, counts.base256),
    ];
    candidates
        .into_iter()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(m, _)| m)
        .unwrap_or(Mode::Ascii)
}

fn is_extended_ascii(ch: u8) -> bool {
    ch >= 128
}

fn c40_cost(ch: u8) -> f64 {
    if c40_basic_set(ch).is_some() {
        2.0 / 3.0
    } else if ch >= 128 {
        8.0 / 3.0
    } else {
        4.0 / 3.0
    }
}

fn text_cost(ch: u8) -> f64 {
    if text_basic_set(ch).is_some() {
        2.0 / 3.0
    } else if ch >= 128 {
        8.0 / 3.0
    } else {
        4.0 / 3.0
    }
}

fn x12_cost(ch: u8) -> f64 {
    if x12_value(ch).is_some() {
        2.0 / 3.0
    } else {
        13.0 / 3.0
    }
}

fn edifact_cost(ch: u8) -> f64 {
    if (32..=94).contains(&ch) {
        3.0 / 4.0
    } else {
        13.0 / 4.0
    }
}

fn encode_ascii(ctx: &mut EncoderContext) -> Result<Mode, tessera_common::Error> {
    if !ascii_looks_best(ctx) {
        let next = look_ahead_test(ctx, Mode::Ascii);
        if next != Mode::Ascii {
            ctx.write_codewords(&[next.latch()]);
            return Ok(next);
        }
    }

    let ch = ctx.current_char();
    if ch.is_ascii_digit() && ctx.char_at(1).is_some_and(|c| c.is_ascii_digit()) {
        let n1 = (ch - b'0') as u16;
        let n2 = (ctx.char_at(1).unwrap() - b'0') as u16;
        ctx.write_codewords(&[(n1 * 10 + n2 + 130) as u8]);
        ctx.pos += 2;
    } else if ch >= 128 {
        ctx.write_codewords(&[UPPER_SHIFT, ch - 128 + 1]);
        ctx.pos += 1;
    } else {
        ctx.write_codewords(&[ch + 1]);
        ctx.pos += 1;
    }
    Ok(Mode::Ascii)
}

fn ascii_looks_best(ctx: &EncoderContext) -> bool {
    if !ctx.has_more_characters() {
        return true;
    }
    let ch = ctx.current_char();
    if ch.is_ascii_digit() && ctx.char_at(1).is_some_and(|c| c.is_ascii_digit()) {
        return true;
    }
    false
}

fn c40_basic_set(ch: u8) -> Option<u8> {
    match ch {
        b' ' => Some(3),
        b'0'..=b'9' => Some(ch - b'0' + 4),
        b'A'..=b'Z' => Some(ch - b'A' + 14),
        _ => None,
    }
}

fn text_basic_set(ch: u8) -> Option<u8> {
    match ch {
        b' ' => Some(3),
        b'0'..=b'9' => Some(ch - b'0' + 4),
        b'a'..=b'z' => Some(ch - b'a' + 14),
        _ => None,
    }
}

fn shift2_value(ch: u8) -> u8 {
    match ch {
        b'!'..=b'/' => ch - b'!',
        b':'..=b'@' => ch - b':' + 15,
        b'['..=b'`' => ch - b'[' + 22,
        b'{'..=0x7f => ch - b'{' + 28,
        _ => 0,
    }
}

fn encode_c40(ctx: &mut EncoderContext) -> Result<Mode, tessera_common::Error> {
    encode_c40_like(ctx, c40_basic_set, Mode::C40)
}

fn encode_text(ctx: &mut EncoderContext) -> Result<Mode, tessera_common::Error> {
    encode_c40_like(ctx, text_basic_set, Mode::Text)
}

fn encode_c40_like(
    ctx: &mut EncoderContext,
    basic_set: fn(u8) -> Option<u8>,
    mode: Mode,
) -> Result<Mode, tessera_common::Error> {
    // Accumulate whole triples, advancing ctx.pos for real after each one, so
    // the look-ahead test between triples sees accurate remaining input.
    loop {
        let mut values = Vec::new();
        let mut consumed = 0usize;
        while ctx.pos + consumed < ctx.end && values.len() < 3 {
            let ch = ctx.text[ctx.pos + consumed];
            if ch >= 128 {
                values.push(1);
                values.push(30); // upper-shift escape inside the value stream
                values.push(ch - 128);
            } else if let Some(v) = basic_set(ch) {
                values.push(v);
            } else if ch < 32 {
                values.push(0);
                values.push(ch);
            } else {
                values.push(1);
                values.push(shift2_value(ch));
            }
            consumed += 1;
        }

        if values.len() % 3 != 0 {
            // Trailing partial triple: pad with shift-1 nulls and unlatch.
            while values.len() % 3 != 0 {
                values.push(0);
            }
            emit_c40_triples(ctx, &values);
            ctx.pos += consumed;
            ctx.write_codewords(&[C40_UNLATCH]);
            return Ok(Mode::Ascii);
        }

        emit_c40_triples(ctx, &values);
        ctx.pos += consumed;

        if !ctx.has_more_characters() {
            // Text ended on a clean triple boundary; leave the mode latched
            // and let the caller decide whether a final unlatch is needed.
            return Ok(mode);
        }

        let next = look_ahead_test(ctx, mode);
        if next != mode {
            ctx.write_codewords(&[C40_UNLATCH]);
            return Ok(next);
        }
    }
}

fn emit_c40_triples(ctx: &mut EncoderContext, values: &[u8]) {
    for triple in values.chunks(3) {
        let packed = 1600 * triple[0] as u16 + 40 * triple[1] as u16 + triple[2] as u16 + 1;
        ctx.write_codewords(&[(packed / 256) as u8, (packed % 256) as u8]);
    }
}

fn x12_value(ch: u8) -> Option<u8> {
    match ch {
        0x0D => Some(0),
        b'*' => Some(1),
        b'>' => Some(2),
        b' ' => Some(3),
        b'0'..=b'9' => Some(ch - b'0' + 4),
        b'A'..=b'Z' => Some(ch - b'A' + 14),
        _ => None,
    }
}

fn encode_x12(ctx: &mut EncoderContext) -> Result<Mode, tessera_common::Error> {
    let mut values = Vec::new();
    let mut consumed = 0usize;

    while ctx.pos + consumed < ctx.end && values.len() < 3 {
        let ch = ctx.text[ctx.pos + consumed];
        let Some(v) = x12_value(ch) else { break };
        values.push(v);
        consumed += 1;
    }

    if values.len() % 3 != 0 {
        // Incomplete triple: bail back to ASCII for the remainder, as X12 has
        // no shift/pad escape of its own.
        ctx.pos += consumed - (values.len() % 3);
        ctx.write_codewords(&[X12_UNLATCH]);
        return Ok(Mode::Ascii);
    }

    for triple in values.chunks(3) {
        let packed = 1600 * triple[0] as u16 + 40 * triple[1] as u16 + triple[2] as u16 + 1;
        ctx.write_codewords(&[(packed / 256) as u8, (packed % 256) as u8]);
    }
    ctx.pos += consumed;

    let next = look_ahead_test(ctx, Mode::X12);
    if next != Mode::X12 {
        ctx.write_codewords(&[X12_UNLATCH]);
        return Ok(next);
    }
    Ok(Mode::X12)
}

fn encode_edifact(ctx: &mut EncoderContext) -> Result<Mode, tessera_common::Error> {
    let mut sixbit = Vec::new();

    while ctx.has_more_characters() && sixbit.len() < 4 {
        let ch = ctx.current_char();
        if !(32..=94).contains(&ch) {
            break;
        }
        sixbit.push(ch & 0x3f);
        ctx.pos += 1;
    }

    let unlatch_now = sixbit.len() < 4;
    if unlatch_now {
        sixbit.push(0x1f); // EDIFACT unlatch value, packed with whatever's pending
    }

    for quad in sixbit.chunks(4) {
        let mut bytes = [0u8; 3];
        let b0 = *quad.first().unwrap_or(&0);
        let b1 = *quad.get(1).unwrap_or(&0);
        let b2 = *quad.get(2).unwrap_or(&0);
        let b3 = *quad.get(3).unwrap_or(&0);
        bytes[0] = (b0 << 2) | (b1 >> 4);
        bytes[1] = (b1 << 4) | (b2 >> 2);
        bytes[2] = (b2 << 6) | b3;
        let emit = quad.len().min(3);
        ctx.write_codewords(&bytes[..emit.max(1)]);
    }

    if unlatch_now {
        return Ok(Mode::Ascii);
    }
    let next = look_ahead_test(ctx, Mode::Edifact);
    if next != Mode::Edifact {
        return encode_edifact_force_unlatch(ctx, next);
    }
    Ok(Mode::Edifact)
}

fn encode_edifact_force_unlatch(ctx: &mut EncoderContext, next: Mode) -> Result<Mode, tessera_common::Error> {
    ctx.write_codewords(&[(0x1fu8) << 2]);
    Ok(next)
}

fn encode_base256(ctx: &mut EncoderContext) -> Result<Mode, tessera_common::Error> {
    let start = ctx.codewords.len();
    ctx.write_codewords(&[0]); // length placeholder, patched below

    let mut consumed = 0usize;
    while ctx.has_more_characters() {
        let next = look_ahead_test(ctx, Mode::Base256);
        if next != Mode::Base256 && consumed > 0 {
            break;
        }
        let byte = ctx.current_char();
        let randomized = randomize_255_state(byte, ctx.codewords.len() + 1);
        ctx.write_codewords(&[randomized]);
        ctx.pos += 1;
        consumed += 1;
        if next != Mode::Base256 {
            break;
        }
    }

    let len_codeword = randomize_255_state(consumed as u8, start + 1);
    ctx.codewords[start] = len_codeword;

    let next = look_ahead_test(ctx, Mode::Base256);
    Ok(next)
}

fn randomize_255_state(byte: u8, position: usize) -> u8 {
    let pseudo_random = ((149 * position as u32) % 255) + 1;
    let temp = byte as u32 + pseudo_random;
    if temp <= 255 {
        temp as u8
    } else {
        (temp - 256) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_digit_pairs_pack_into_one_codeword() {
        let (codewords, symbol) = encode_high_level(b"12", SymbolShape::None, None).unwrap();
        assert_eq!(codewords[0], 142);
        assert!(codewords.len() <= symbol.data_capacity as usize);
    }

    #[test]
    fn ascii_digit_pairs_match_scenario_five() {
        let (codewords, _) = encode_high_level(b"123456", SymbolShape::None, None).unwrap();
        assert_eq!(&codewords[..3], &[142, 164, 186]);
    }

    #[test]
    fn plain_ascii_letters_offset_by_one() {
        let (codewords, _) = encode_high_level(b"A", SymbolShape::None, None).unwrap();
        assert_eq!(codewords[0], b'A' + 1);
    }

    #[test]
    fn padding_fills_remaining_capacity() {
        let (codewords, symbol) = encode_high_level(b"A", SymbolShape::None, None).unwrap();
        assert_eq!(codewords.len(), symbol.data_capacity as usize);
        if codewords.len() > 1 {
            assert_eq!(codewords[1], PAD);
        }
    }

    #[test]
    fn base256_randomization_is_involutive_with_position() {
        let a = randomize_255_state(42, 5);
        let back = if a as u32 >= ((149 * 5) % 255) + 1 {
            a - (((149 * 5) % 255) + 1) as u8
        } else {
            (a as u32 + 256 - (((149 * 5) % 255) + 1)) as u8
        };
        assert_eq!(back, 42);
    }
}
