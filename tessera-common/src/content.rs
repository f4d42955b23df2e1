//! The `Content` model: bytes plus ECI segment break-points (spec §3, §4.7).

use crate::charset::{guess_encoding, transcode, CharacterSet, Iso8859Mode};
use crate::symbology::SymbologyIdentifier;

/// One run of bytes sharing a single ECI / character set, starting at `start`
/// (an offset into the content's byte buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    eci: u32,
    start: usize,
}

/// How the decoded text should be rendered back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Transcode each segment under its character set and concatenate.
    #[default]
    Plain,
    /// Like `Plain`, but prefix each segment with a `\XXXXXX` ECI escape.
    Eci,
    /// GS1 AI or ISO-15434 human-readable formatting; falls back to `Plain`.
    Hri,
    /// Raw bytes rendered as uppercase hex.
    Hex,
    /// Non-graphical bytes replaced by `<NAME>` or `<U+XXXX>` escapes.
    Escaped,
}

/// Ordered byte sequence plus ECI break-points, a hinted fallback character set,
/// and the symbology identifier assigned by the decoder (spec §3).
///
/// Invariant: segment start offsets are strictly non-decreasing and the first
/// segment (if any) starts at 0. Calling [`Content::switch_encoding`] again with
/// the byte buffer unchanged since the last switch replaces the previous segment
/// rather than creating a zero-length one.
#[derive(Debug, Clone, Default)]
pub struct Content {
    bytes: Vec<u8>,
    segments: Vec<Segment>,
    has_eci: bool,
    hinted_charset: CharacterSet,
    symbology: SymbologyIdentifier,
}

impl Content {
    /// An empty content buffer with the given fallback character set.
    pub fn new(hinted_charset: CharacterSet) -> Self {
        Self {
            bytes: Vec::new(),
            segments: Vec::new(),
            has_eci: false,
            hinted_charset,
            symbology: SymbologyIdentifier::default(),
        }
    }

    /// The raw byte buffer, spanning all segments.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether an ECI has ever been explicitly set (sticky once set).
    pub fn has_eci(&self) -> bool {
        self.has_eci
    }

    /// The symbology identifier assigned to this content.
    pub fn symbology(&self) -> SymbologyIdentifier {
        self.symbology
    }

    /// Set the symbology identifier (assigned by the decoder once the format and
    /// any GS1/AIM markers are known).
    pub fn set_symbology(&mut self, symbology: SymbologyIdentifier) {
        self.symbology = symbology;
    }

    /// Append raw bytes under the currently active character set.
    pub fn append(&mut self, bytes: &[u8]) {
        if self.segments.is_empty() {
            self.segments.push(Segment {
                eci: self.hinted_charset.eci().unwrap_or(0),
                start: 0,
            });
        }
        self.bytes.extend_from_slice(bytes);
    }

    /// Begin a new segment under `charset`, applying from the current end of the
    /// buffer onward. If no bytes have been appended since the previous switch,
    /// replaces that segment's ECI instead of inserting a zero-length one.
    pub fn switch_encoding(&mut self, charset: CharacterSet) {
        let eci = charset.eci().unwrap_or(899);
        self.has_eci = true;
        match self.segments.last_mut() {
            Some(last) if last.start == self.bytes.len() => last.eci = eci,
            _ => self.segments.push(Segment {
                eci,
                start: self.bytes.len(),
            }),
        }
    }

    /// Begin a new segment under a raw numeric ECI value, as read from a decoded
    /// bit stream.
    pub fn switch_encoding_eci(&mut self, eci: u32) {
        self.has_eci = true;
        match self.segments.last_mut() {
            Some(last) if last.start == self.bytes.len() => last.eci = eci,
            _ => self.segments.push(Segment {
                eci,
                start: self.bytes.len(),
            }),
        }
    }

    /// The transcoded segments as `(eci, str)` pairs, for the `Eci` text mode and
    /// for testing. Returns `None` if any segment fails to transcode.
    fn transcoded_segments(&self, iso8859_mode: Iso8859Mode) -> Option<Vec<(u32, String)>> {
        if self.segments.is_empty() {
            let guessed = guess_encoding(&self.bytes, self.hinted_charset);
            let text = transcode(&self.bytes, guessed, iso8859_mode)?;
            return Some(vec![(guessed.eci().unwrap_or(0), text)]);
        }

        let mut out = Vec::with_capacity(self.segments.len());
        for (i, seg) in self.segments.iter().enumerate() {
            let end = self.segments.get(i + 1).map_or(self.bytes.len(), |s| s.start);
            let slice = &self.bytes[seg.start..end];
            let charset = CharacterSet::from_eci(seg.eci).unwrap_or(CharacterSet::Unknown);
            let text = transcode(slice, charset, iso8859_mode)?;
            out.push((seg.eci, text));
        }
        Some(out)
    }

    /// The content rendered as a single UTF-8 string, transcoding each segment
    /// under its own character set and concatenating (`TextMode::Plain`).
    pub fn utf8(&self) -> String {
        self.utf8_with_mode(Iso8859Mode::StraightThrough)
    }

    fn utf8_with_mode(&self, iso8859_mode: Iso8859Mode) -> String {
        self.transcoded_segments(iso8859_mode)
            .map(|segs| segs.into_iter().map(|(_, s)| s).collect())
            .unwrap_or_default()
    }

    /// Render the content under the requested [`TextMode`].
    pub fn text_view(&self, mode: TextMode) -> String {
        match mode {
            TextMode::Plain => self.utf8(),
            TextMode::Eci => self
                .transcoded_segments(Iso8859Mode::StraightThrough)
                .map(|segs| {
                    segs.into_iter()
                        .map(|(eci, text)| format!("\\{eci:06}{text}"))
                        .collect()
                })
                .unwrap_or_default(),
            TextMode::Hri => {
                if self.symbology.ai_flag() == crate::symbology::AiFlag::Gs1 {
                    crate::hri::format_gs1_hri(&self.bytes)
                } else {
                    self.utf8()
                }
            }
            TextMode::Hex => self.bytes.iter().map(|b| format!("{b:02X}")).collect(),
            TextMode::Escaped => escape_non_graphical(&self.bytes),
        }
    }
}

fn escape_non_graphical(bytes: &[u8]) -> String {
    const NAMED: [(u8, &str); 3] = [(0x1D, "<GS>"), (0x1E, "<RS>"), (0x04, "<EOT>")];

    let mut out = String::new();
    for &b in bytes {
        if let Some(&(_, name)) = NAMED.iter().find(|&&(code, _)| code == b) {
            out.push_str(name);
        } else if (0x20..0x7F).contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("<U+{b:04X}>"));
        }
    }
    out
}

/// Describes one piece of a multi-symbol sequence (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredAppendInfo {
    /// Zero-based index of this symbol within the sequence.
    pub index: i32,
    /// Total number of symbols in the sequence.
    pub count: i32,
    /// Optional sequence identifier shared by all symbols in the group.
    pub id: Option<String>,
}

impl StructuredAppendInfo {
    /// Whether this symbol is not part of any structured-append sequence.
    pub fn is_none(&self) -> bool {
        self.count <= 1
    }
}

impl Default for StructuredAppendInfo {
    fn default() -> Self {
        Self {
            index: -1,
            count: -1,
            id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_switch_then_append_round_trips() {
        let mut c = Content::new(CharacterSet::Iso8859(1));
        c.append(b"AB");
        c.switch_encoding(CharacterSet::Utf8);
        c.append("C".as_bytes());
        let s = c.utf8();
        assert_eq!(s, "ABC");
    }

    #[test]
    fn consecutive_switch_encoding_replaces_not_appends() {
        let mut c = Content::new(CharacterSet::Ascii);
        c.switch_encoding(CharacterSet::Utf8);
        c.switch_encoding(CharacterSet::Iso8859(1));
        c.append(b"x");
        assert!(c.has_eci());
        assert_eq!(c.utf8(), "x");
    }

    #[test]
    fn eci_text_mode_emits_escapes() {
        let mut c = Content::new(CharacterSet::Ascii);
        c.append(b"A");
        c.switch_encoding(CharacterSet::Utf8);
        c.append(b"B");
        let view = c.text_view(TextMode::Eci);
        assert!(view.starts_with("\\000027A"));
    }

    #[test]
    fn hex_mode_renders_uppercase() {
        let mut c = Content::new(CharacterSet::Binary);
        c.append(&[0xAB, 0x01]);
        assert_eq!(c.text_view(TextMode::Hex), "AB01");
    }

    #[test]
    fn structured_append_default_is_none() {
        assert!(StructuredAppendInfo::default().is_none());
    }
}
