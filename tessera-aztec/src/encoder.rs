//! The Aztec high-level encoder: character-to-table routing, binary-shift
//! fallback, stuff-bit insertion and layer sizing (spec §4.8).

use std::collections::{HashSet, VecDeque};

use crate::{data, parameter, tables::{self, Entry, Table}};

fn table_len(t: Table) -> u32 {
    if t == Table::Digit {
        16
    } else {
        32
    }
}

fn direct_latches(t: Table) -> Vec<(u32, Table)> {
    (0..table_len(t))
        .filter_map(|code| match tables::lookup(t, code) {
            Entry::LatchUpper => Some((code, Table::Upper)),
            Entry::LatchLower => Some((code, Table::Lower)),
            Entry::LatchMixed => Some((code, Table::Mixed)),
            Entry::LatchDigit => Some((code, Table::Digit)),
            _ => None,
        })
        .collect()
}

fn push_bits(out: &mut Vec<bool>, value: u32, width: u32) {
    for i in (0..width).rev() {
        out.push((value >> i) & 1 == 1);
    }
}

/// Emit latch control codewords to move from `*current` to `target`, updating
/// `*current` as each hop lands (breadth-first over the four non-Punct tables'
/// direct latch controls).
fn emit_latch_path(out: &mut Vec<bool>, current: &mut Table, target: Table) {
    if *current == target {
        return;
    }

    let mut visited = HashSet::new();
    visited.insert(*current);
    let mut queue = VecDeque::new();
    queue.push_back((*current, Vec::<(Table, u32)>::new()));

    let path = loop {
        let Some((cur, path)) = queue.pop_front() else {
            return; // Unreachable: the four-table latch graph is fully connected.
        };
        let mut found = None;
        for (code, next) in direct_latches(cur) {
            let mut extended = path.clone();
            extended.push((cur, code));
            if next == target {
                found = Some(extended);
                break;
            }
            if visited.insert(next) {
                queue.push_back((next, extended));
            }
        }
        if let Some(p) = found {
            break p;
        }
    };

    for (from_table, code) in path {
        push_bits(out, code, tables::bits_for(from_table));
    }
    *current = target;
}

/// Which of the four latchable tables plus Punct a character belongs to,
/// Upper/Lower/Mixed/Digit first (preferring to stay on a latchable table),
/// then Punct (shift-only). Ignores `current`; callers that care whether
/// `ch` already fits the table they're in should check that first.
fn locate_char(ch: char) -> Option<(Table, u32)> {
    for t in [Table::Upper, Table::Lower, Table::Mixed, Table::Digit, Table::Punct] {
        if let Some(code) = tables::find_char(t, ch) {
            return Some((t, code));
        }
    }
    None
}

const LATCHABLE: [Table; 4] = [Table::Upper, Table::Lower, Table::Mixed, Table::Digit];

/// Shift-to-Upper control code, available without a full latch from Lower
/// (index 28) and Digit (index 15); `None` from Upper/Mixed/Punct.
fn shift_upper_code(table: Table) -> Option<u32> {
    match table {
        Table::Lower => Some(28),
        Table::Digit => Some(15),
        _ => None,
    }
}

/// Whether `ch` forces a table other than `current`, and that table can only
/// be reached from `current` by a dedicated Upper shift.
fn needs_upper_shift(ch: char, current: Table) -> bool {
    shift_upper_code(current).is_some() && tables::find_char(current, ch).is_none() && tables::find_char(Table::Upper, ch).is_some()
}

/// Look ahead from `chars[from..]` and, mirroring the Data Matrix high-level
/// encoder's look-ahead mode test, score each latchable table by how many of
/// the next characters it can hold before hitting one it can't. Characters
/// shared by several tables (space) extend every surviving candidate's run
/// instead of breaking any of them; Punct-only characters are skipped since
/// they're reached by a shift regardless of which table is latched. Returns
/// the table with the longest surviving run, so a latch lands on whichever
/// table the upcoming text will actually stay in.
fn best_latch_target(chars: &[char], from: usize, current: Table) -> Table {
    const WINDOW: usize = 16;
    let mut alive = [true; 4];
    let mut run = [0u32; 4];

    for &ch in chars.iter().skip(from).take(WINDOW) {
        let mut touched = false;
        for (idx, &table) in LATCHABLE.iter().enumerate() {
            if !alive[idx] {
                continue;
            }
            if tables::find_char(table, ch).is_some() {
                run[idx] += 1;
                touched = true;
            } else if tables::find_char(Table::Punct, ch).is_none() {
                alive[idx] = false;
            }
        }
        if !touched && alive.iter().all(|&a| !a) {
            break;
        }
        if alive.iter().filter(|&&a| a).count() <= 1 {
            break;
        }
    }

    LATCHABLE
        .into_iter()
        .enumerate()
        .max_by_key(|&(idx, _)| (alive[idx], run[idx]))
        .map(|(_, t)| t)
        .unwrap_or(current)
}

/// High-level-encode `text` into the Aztec character bit stream (before
/// stuff-bit insertion), starting and ending in Upper latch.
pub fn encode_text(text: &str) -> Vec<bool> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut current = Table::Upper;
    let mut binary_run: Vec<u8> = Vec::new();

    let flush_binary = |out: &mut Vec<bool>, current: &mut Table, run: &mut Vec<u8>| {
        if run.is_empty() {
            return;
        }
        if *current == Table::Digit || *current == Table::Punct {
            emit_latch_path(out, current, Table::Upper);
        }
        push_bits(out, table_len(*current) - 1, tables::bits_for(*current)); // BinaryShift is the last entry
        if run.len() < 32 {
            push_bits(out, run.len() as u32, 5);
        } else {
            push_bits(out, 0, 5);
            push_bits(out, run.len() as u32 - 31, 11);
        }
        for &byte in run.iter() {
            push_bits(out, byte as u32, 8);
        }
        run.clear();
    };

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match locate_char(ch) {
            Some((Table::Punct, code)) if tables::find_char(current, ch).is_none() => {
                flush_binary(&mut out, &mut current, &mut binary_run);
                push_bits(&mut out, 0, tables::bits_for(current)); // ShiftPunct is always index 0
                push_bits(&mut out, code, tables::bits_for(Table::Punct));
                i += 1;
            }
            Some(_) => {
                flush_binary(&mut out, &mut current, &mut binary_run);

                if tables::find_char(current, ch).is_none() {
                    // A single interrupting uppercase letter is cheaper as a
                    // one-character shift than a round-trip latch.
                    let lone = needs_upper_shift(ch, current)
                        && !chars.get(i + 1).is_some_and(|&next| needs_upper_shift(next, current));
                    if lone {
                        push_bits(&mut out, shift_upper_code(current).unwrap(), tables::bits_for(current));
                        let code = tables::find_char(Table::Upper, ch).unwrap();
                        push_bits(&mut out, code, tables::bits_for(Table::Upper));
                        i += 1;
                        continue;
                    }

                    let target = best_latch_target(&chars, i, current);
                    emit_latch_path(&mut out, &mut current, target);
                }

                let code = tables::find_char(current, ch).unwrap();
                push_bits(&mut out, code, tables::bits_for(current));
                i += 1;
            }
            None => {
                let mut buf = [0u8; 4];
                binary_run.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                i += 1;
            }
        }
    }
    flush_binary(&mut out, &mut current, &mut binary_run);

    out
}

/// Minimum layer count (1..32 full, 1..4 compact) whose capacity fits
/// `bit_count` plus the mode-message/ECC overhead, honouring a minimum EC
/// fraction if requested.
pub fn choose_layers(bit_count: u32, compact: bool, min_ec_fraction: f64) -> Option<u32> {
    let max_layers = if compact { 4 } else { 32 };
    for layers in 1..=max_layers {
        let capacity = data::ring_capacity_bits(layers, compact);
        let cw_bits = data::codeword_bits(layers);
        let data_codewords = bit_count.div_ceil(cw_bits - 1).max(1); // stuffing can cost one extra bit per codeword
        let total_codewords = capacity / cw_bits;
        if data_codewords >= total_codewords {
            continue;
        }
        let ecc_codewords = total_codewords - data_codewords;
        let ec_fraction = ecc_codewords as f64 / total_codewords as f64;
        if ec_fraction >= min_ec_fraction {
            return Some(layers);
        }
    }
    None
}

/// Build the mode-message codewords (with ECC) for an encoded symbol.
pub fn build_mode_message(layers: u32, data_blocks: u32, reader_init: bool, compact: bool) -> Vec<u16> {
    let data_codewords = parameter::encode_mode_data(layers, data_blocks, reader_init, compact);
    parameter::append_mode_ecc(&data_codewords, compact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::decode;
    use tessera_common::{CharacterSet, Content};

    #[test]
    fn round_trips_plain_text_through_bitstream_decoder() {
        let bits = encode_text("HELLO 123");
        let mut content = Content::new(CharacterSet::Unknown);
        decode(&bits, &mut content).unwrap();
        assert_eq!(content.utf8(), "HELLO 123");
    }

    #[test]
    fn round_trips_mixed_case_and_punctuation() {
        let bits = encode_text("Hello, World!");
        let mut content = Content::new(CharacterSet::Unknown);
        decode(&bits, &mut content).unwrap();
        assert_eq!(content.utf8(), "Hello, World!");
    }

    #[test]
    fn lone_uppercase_letter_in_lowercase_run_round_trips() {
        let bits = encode_text("helloWorld");
        let mut content = Content::new(CharacterSet::Unknown);
        decode(&bits, &mut content).unwrap();
        assert_eq!(content.utf8(), "helloWorld");
    }

    #[test]
    fn lone_uppercase_letter_in_digit_run_round_trips() {
        let bits = encode_text("12345X67890");
        let mut content = Content::new(CharacterSet::Unknown);
        decode(&bits, &mut content).unwrap();
        assert_eq!(content.utf8(), "12345X67890");
    }

    #[test]
    fn lone_uppercase_letter_uses_shift_not_a_double_latch() {
        // Latch Upper->Lower (5 bits), four Lower letters (4*5), a 5-bit
        // ShiftUpper plus the Upper-table code for 'X' (5+5), then four more
        // Lower letters (4*5): 55 bits in total. The alternative of latching
        // all the way back to Upper and then back to Lower again has no
        // direct Lower->Upper latch control (Lower only latches to Mixed or
        // Digit) and would cost twice that through the Mixed table.
        let bits = encode_text("aaaaXaaaa");
        assert_eq!(bits.len(), 55);
    }

    #[test]
    fn best_latch_target_looks_past_a_shared_character_to_the_table_that_survives() {
        // A leading space fits all four tables and doesn't narrow the field;
        // the digit that follows it does, leaving Digit as the only survivor.
        let chars: Vec<char> = " 1111111111111111".chars().collect();
        assert_eq!(best_latch_target(&chars, 0, Table::Mixed), Table::Digit);
    }

    #[test]
    fn choose_layers_picks_smallest_fit() {
        let layers = choose_layers(100, true, 0.0).unwrap();
        assert!(layers >= 1 && layers <= 4);
    }
}
