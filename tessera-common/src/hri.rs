//! GS1 Application Identifier human-readable-interpretation formatting (spec
//! §4.7).

use rustc_hash::FxHashMap;
use std::sync::OnceLock;

use crate::symbology::GS;

/// Length rule for one GS1 Application Identifier's field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldLength {
    /// Fixed-width field; the value occupies exactly this many bytes and is
    /// never GS-terminated.
    Fixed(usize),
    /// Variable-width field, terminated by the next GS or end of input.
    Variable,
}

/// A representative subset of the GS1 General Specifications AI table (the full
/// table carries 132 entries; this covers the identifiers exercised by the
/// invariants in spec.md §8 plus the most common logistics/retail AIs).
fn ai_table() -> &'static FxHashMap<&'static str, FieldLength> {
    static TABLE: OnceLock<FxHashMap<&'static str, FieldLength>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use FieldLength::{Fixed, Variable};
        [
            ("00", Fixed(18)),
            ("01", Fixed(14)),
            ("02", Fixed(14)),
            ("10", Variable),
            ("11", Fixed(6)),
            ("12", Fixed(6)),
            ("13", Fixed(6)),
            ("15", Fixed(6)),
            ("16", Fixed(6)),
            ("17", Fixed(6)),
            ("20", Fixed(2)),
            ("21", Variable),
            ("22", Variable),
            ("23", Variable),
            ("240", Variable),
            ("241", Variable),
            ("242", Variable),
            ("250", Variable),
            ("251", Variable),
            ("253", Variable),
            ("254", Variable),
            ("255", Variable),
            ("30", Variable),
            ("37", Variable),
            ("400", Variable),
            ("401", Variable),
            ("402", Fixed(17)),
            ("403", Variable),
            ("410", Fixed(13)),
            ("411", Fixed(13)),
            ("412", Fixed(13)),
            ("413", Fixed(13)),
            ("414", Fixed(13)),
            ("415", Fixed(13)),
            ("420", Variable),
            ("421", Variable),
            ("422", Fixed(3)),
            ("423", Variable),
            ("424", Fixed(3)),
            ("425", Variable),
            ("426", Fixed(3)),
            ("7001", Fixed(13)),
            ("7002", Variable),
            ("7003", Fixed(10)),
            ("8001", Fixed(14)),
            ("8002", Variable),
            ("8003", Variable),
            ("8004", Variable),
            ("8005", Fixed(6)),
            ("8006", Fixed(18)),
            ("8007", Variable),
            ("8008", Variable),
            ("8018", Fixed(18)),
            ("8020", Variable),
            ("90", Variable),
            ("91", Variable),
            ("92", Variable),
            ("93", Variable),
            ("94", Variable),
            ("95", Variable),
            ("96", Variable),
            ("97", Variable),
            ("98", Variable),
            ("99", Variable),
        ]
        .into_iter()
        .collect()
    })
}

/// Look up the longest matching AI prefix (2-4 digits) at the start of `field`,
/// returning the prefix and its length rule.
fn match_ai_prefix(field: &[u8]) -> Option<(&'static str, FieldLength)> {
    let table = ai_table();
    for len in (2..=4).rev() {
        if field.len() < len {
            continue;
        }
        if let Ok(prefix) = std::str::from_utf8(&field[..len]) {
            if let Some(&rule) = table.get(prefix) {
                return Some((
                    table.get_key_value(prefix).map(|(k, _)| *k).unwrap_or(prefix),
                    rule,
                ));
            }
        }
    }
    None
}

/// Format a GS1-flagged byte stream as `(AI)value(AI)value...`, splitting on GS
/// (0x1D) and consulting the AI length table for fixed-vs-variable fields.
///
/// A post-field run of separator bytes is tolerated rather than treated as an
/// empty field, per ISO/IEC 24724 §7.8.6.3.
pub fn format_gs1_hri(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut rest = bytes;

    while !rest.is_empty() {
        rest = rest.trim_ascii_leading_gs();

        let Some((ai, rule)) = match_ai_prefix(rest) else {
            // Unrecognised AI: emit the remainder verbatim and stop, rather than
            // guess at a boundary.
            out.push_str(&String::from_utf8_lossy(rest));
            break;
        };

        let field_start = ai.len();
        let (value, remainder) = match rule {
            FieldLength::Fixed(n) => {
                let end = (field_start + n).min(rest.len());
                (&rest[field_start..end], &rest[end..])
            }
            FieldLength::Variable => {
                let gs_pos = rest[field_start..].iter().position(|&b| b == GS);
                match gs_pos {
                    Some(p) => (&rest[field_start..field_start + p], &rest[field_start + p..]),
                    None => (&rest[field_start..], &rest[rest.len()..]),
                }
            }
        };

        out.push('(');
        out.push_str(ai);
        out.push(')');
        out.push_str(&String::from_utf8_lossy(value));
        rest = remainder;
    }

    out
}

trait TrimLeadingGs {
    fn trim_ascii_leading_gs(&self) -> &Self;
}

impl TrimLeadingGs for [u8] {
    fn trim_ascii_leading_gs(&self) -> &Self {
        let mut i = 0;
        while i < self.len() && self[i] == GS {
            i += 1;
        }
        &self[i..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_fixed_and_variable_fields() {
        let mut bytes = b"01095240000591".to_vec();
        bytes.push(GS);
        bytes.extend_from_slice(b"211234567890123456789012345");
        let hri = format_gs1_hri(&bytes);
        assert!(hri.starts_with("(01)09524000059"));
        assert!(hri.contains("(21)"));
    }

    #[test]
    fn tolerates_separator_runs_between_fields() {
        let mut bytes = b"90ABC".to_vec();
        bytes.push(GS);
        bytes.push(GS);
        bytes.extend_from_slice(b"95123");
        let hri = format_gs1_hri(&bytes);
        assert!(hri.contains("(90)ABC"));
        assert!(hri.contains("(95)123"));
    }

    #[test]
    fn unrecognised_ai_falls_through_verbatim() {
        let hri = format_gs1_hri(b"zzznotanai");
        assert_eq!(hri, "zzznotanai");
    }
}
