//! The `Barcode` result record (spec §3, §4.10, §7).

use std::sync::Arc;

use crate::content::{Content, StructuredAppendInfo};
use crate::error::Error;
use crate::geometry::{PointF, Quadrilateral};
use crate::matrix::BitMatrix;
use crate::symbology::BarcodeFormat;

/// An immutable decode (or encode) result.
///
/// On a decode failure the detector stage never reaches this type (spec §7: "no
/// finder pattern" etc. produce an empty `Option`, not a `Barcode`); once a
/// symbol outline has been found, every subsequent failure is represented as a
/// `Barcode` whose `error` is non-`None`, so the pipeline is total from that
/// point on.
#[derive(Debug, Clone)]
pub struct Barcode {
    format: BarcodeFormat,
    content: Content,
    position: Quadrilateral<PointF>,
    orientation: i32,
    line_count: u32,
    mirrored: bool,
    reader_init: bool,
    error: Error,
    ec_level: String,
    version: String,
    structured_append: StructuredAppendInfo,
    bits: Option<Arc<BitMatrix>>,
}

impl Barcode {
    /// A successfully decoded barcode.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        format: BarcodeFormat,
        content: Content,
        position: Quadrilateral<PointF>,
        orientation: i32,
        ec_level: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            format,
            content,
            position,
            orientation,
            line_count: 1,
            mirrored: false,
            reader_init: false,
            error: Error::none(),
            ec_level: ec_level.into(),
            version: version.into(),
            structured_append: StructuredAppendInfo::default(),
            bits: None,
        }
    }

    /// A failed decode that nonetheless located a symbol outline, per spec §7's
    /// policy that decoder failures (as opposed to detector failures) still carry
    /// a position.
    pub fn failed(format: BarcodeFormat, position: Quadrilateral<PointF>, error: Error) -> Self {
        Self {
            format,
            content: Content::default(),
            position,
            orientation: 0,
            line_count: 1,
            mirrored: false,
            reader_init: false,
            error,
            ec_level: String::new(),
            version: String::new(),
            structured_append: StructuredAppendInfo::default(),
            bits: None,
        }
    }

    /// The recognised symbology.
    pub fn format(&self) -> BarcodeFormat {
        self.format
    }

    /// The decoded content.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// The quadrilateral outline of the symbol in source-image pixel space.
    pub fn position(&self) -> &Quadrilateral<PointF> {
        &self.position
    }

    /// Orientation in degrees, quantised to the nearest multiple the symbology's
    /// rotational symmetry allows.
    pub fn orientation(&self) -> i32 {
        self.orientation
    }

    /// Number of stacked rows; always 1 for a 2-D matrix symbol.
    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    /// Whether the symbol was read from a mirror-reflected image.
    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Whether the symbol's reader-initialisation flag was set.
    pub fn is_reader_init(&self) -> bool {
        self.reader_init
    }

    /// The decode error, if any (`Error::is_none()` on success).
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Whether this result represents a successful decode.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Error-correction level label (e.g. `"M"`, `"25%"`).
    pub fn ec_level(&self) -> &str {
        &self.ec_level
    }

    /// Symbol version/size label (e.g. `"4"`, `"rMQR R13x99"`).
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Structured-append sequence membership, if any.
    pub fn structured_append(&self) -> StructuredAppendInfo {
        self.structured_append
    }

    /// The recovered module grid, for matrix symbologies that retain it.
    pub fn bit_matrix(&self) -> Option<&BitMatrix> {
        self.bits.as_deref()
    }

    /// Attach the recovered module grid.
    #[must_use]
    pub fn with_bit_matrix(mut self, bits: BitMatrix) -> Self {
        self.bits = Some(Arc::new(bits));
        self
    }

    /// Mark mirrored / reader-init flags (set by the detector once orientation is
    /// known).
    #[must_use]
    pub fn with_flags(mut self, mirrored: bool, reader_init: bool) -> Self {
        self.mirrored = mirrored;
        self.reader_init = reader_init;
        self
    }

    /// Attach structured-append sequence info.
    #[must_use]
    pub fn with_structured_append(mut self, info: StructuredAppendInfo) -> Self {
        self.structured_append = info;
        self
    }

    /// Set the number of stacked lines (for formats where that varies).
    #[must_use]
    pub fn with_line_count(mut self, line_count: u32) -> Self {
        self.line_count = line_count;
        self
    }
}

/// Merge a sequence of structured-append pieces, in index order, into one
/// logical `Barcode` whose content is the concatenation of all pieces' bytes.
///
/// Returns a `Format`-error `Barcode` (per spec §7) if the pieces don't form a
/// complete, consistently-sized, same-format sequence.
pub fn merge_structured_append_sequence(pieces: &[Barcode]) -> Barcode {
    if pieces.is_empty() {
        let zero = PointF::new(0.0, 0.0);
        return Barcode::failed(
            BarcodeFormat::None,
            Quadrilateral::new(zero, zero, zero, zero),
            crate::format_err!("empty structured-append sequence"),
        );
    }

    let format = pieces[0].format;
    let count = pieces[0].structured_append.count;
    if pieces.len() as i32 != count
        || pieces.iter().any(|p| p.format != format || p.structured_append.count != count)
    {
        return Barcode::failed(
            format,
            pieces[0].position.clone(),
            crate::format_err!("structured-append sequence is incomplete or inconsistent"),
        );
    }

    let mut ordered: Vec<&Barcode> = pieces.iter().collect();
    ordered.sort_by_key(|p| p.structured_append.index);

    let mut merged_content = ordered[0].content.clone();
    for piece in &ordered[1..] {
        merged_content.append(piece.content.bytes());
    }

    let mut barcode = Barcode::new(
        format,
        merged_content,
        ordered[0].position.clone(),
        ordered[0].orientation,
        ordered[0].ec_level.clone(),
        ordered[0].version.clone(),
    );
    barcode.structured_append = StructuredAppendInfo {
        index: -1,
        count: -1,
        id: ordered[0].structured_append.id.clone(),
    };
    barcode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::CharacterSet;

    fn dummy_quad() -> Quadrilateral<PointF> {
        Quadrilateral::new(
            PointF::new(0.0, 0.0),
            PointF::new(1.0, 0.0),
            PointF::new(1.0, 1.0),
            PointF::new(0.0, 1.0),
        )
    }

    #[test]
    fn new_barcode_has_no_error() {
        let content = Content::new(CharacterSet::Ascii);
        let b = Barcode::new(BarcodeFormat::QrCode, content, dummy_quad(), 0, "M", "4");
        assert!(b.is_valid());
    }

    #[test]
    fn merge_structured_append_concatenates_in_index_order() {
        let make = |index, bytes: &[u8]| {
            let mut content = Content::new(CharacterSet::Ascii);
            content.append(bytes);
            Barcode::new(BarcodeFormat::Aztec, content, dummy_quad(), 0, "23%", "")
                .with_structured_append(StructuredAppendInfo {
                    index,
                    count: 2,
                    id: None,
                })
        };
        let pieces = [make(1, b"B"), make(0, b"A")];
        let merged = merge_structured_append_sequence(&pieces);
        assert!(merged.is_valid());
        assert_eq!(merged.content().utf8(), "AB");
        assert_eq!(merged.structured_append().index, -1);
    }

    #[test]
    fn merge_rejects_inconsistent_counts() {
        let make = |index, count| {
            Barcode::new(
                BarcodeFormat::Aztec,
                Content::new(CharacterSet::Ascii),
                dummy_quad(),
                0,
                "",
                "",
            )
            .with_structured_append(StructuredAppendInfo { index, count, id: None })
        };
        let pieces = [make(0, 2), make(1, 3)];
        let merged = merge_structured_append_sequence(&pieces);
        assert!(!merged.is_valid());
    }
}
