//! Symbology identifiers (AIM `]cm` escape sequences) and the barcode format
//! enumeration (spec §3, §4.4, §4.7).

/// The ASCII Group Separator, used both as the GS1 field separator and as the
/// marker stripped during symbology identifier assignment.
pub const GS: u8 = 0x1D;

/// Which application-indicator convention, if any, was recognised in the leading
/// bytes of a decoded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiFlag {
    /// No leading application indicator.
    #[default]
    None,
    /// Leading GS marks a GS1 (FNC1-in-first-position) message.
    Gs1,
    /// Leading single letter or two digits followed by GS marks an AIM
    /// application indicator.
    Aim,
}

/// The `]cm` identifier AIM symbologies prefix to decoded text: a code letter, a
/// modifier (digit or letter), an offset applied to the modifier when an ECI is
/// present, and the recognised application-indicator flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbologyIdentifier {
    /// The AIM code character identifying the symbology family (e.g. `z` for
    /// Aztec, `d` for Data Matrix, `Q` for QR).
    pub code: char,
    /// The base modifier digit, before any ECI/structured-append offset.
    pub modifier: char,
    /// Added to `modifier` when the content carries an explicit ECI.
    pub eci_modifier_offset: u8,
    /// The application-indicator flavour found in the content, if any.
    pub ai_flag: AiFlag,
}

impl Default for SymbologyIdentifier {
    fn default() -> Self {
        Self {
            code: '\0',
            modifier: '0',
            eci_modifier_offset: 0,
            ai_flag: AiFlag::None,
        }
    }
}

impl SymbologyIdentifier {
    /// The AI flag carried by this identifier.
    pub fn ai_flag(&self) -> AiFlag {
        self.ai_flag
    }

    /// Render the `]code modifier` escape sequence, adjusting the modifier by
    /// `eci_modifier_offset` when `has_eci` is set.
    pub fn render(&self, has_eci: bool) -> String {
        let modifier = if has_eci {
            char::from_digit(
                self.modifier.to_digit(10).unwrap_or(0) + self.eci_modifier_offset as u32,
                10,
            )
            .unwrap_or(self.modifier)
        } else {
            self.modifier
        };
        format!("]{}{}", self.code, modifier)
    }
}

/// Inspect a content's leading bytes for a GS1 or AIM application indicator,
/// strip the marker bytes, and return the resulting identifier.
///
/// `base_modifier` is the symbology's plain modifier digit (e.g. `'0'`); if the
/// content is structured-append, add 6 to it per spec.md §4.4 before calling this,
/// or pass `structured_append_addend = 6`.
pub fn assign_identifier(
    code: char,
    base_modifier: char,
    structured_append_addend: u8,
    bytes: &mut Vec<u8>,
) -> SymbologyIdentifier {
    let mut modifier = base_modifier;
    let mut ai_flag = AiFlag::None;

    if bytes.first() == Some(&GS) {
        modifier = '1';
        ai_flag = AiFlag::Gs1;
        bytes.remove(0);
    } else if bytes.len() >= 2 && bytes[0].is_ascii_uppercase() && bytes[1] == GS {
        modifier = '2';
        ai_flag = AiFlag::Aim;
        bytes.remove(1);
    } else if bytes.len() >= 3
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == GS
    {
        modifier = '2';
        ai_flag = AiFlag::Aim;
        bytes.remove(2);
    }

    let modifier_digit = modifier.to_digit(10).unwrap_or(0) + structured_append_addend as u32;
    let modifier = char::from_digit(modifier_digit, 10).unwrap_or(modifier);

    SymbologyIdentifier {
        code,
        modifier,
        eci_modifier_offset: 0,
        ai_flag,
    }
}

/// Which 2-D symbology produced (or should produce) a [`crate::Barcode`].
///
/// Only the families this crate implements are listed; the wider AIM symbology
/// space (linear codes, PDF417, etc.) is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BarcodeFormat {
    /// No symbology recognised.
    #[default]
    None,
    /// ISO/IEC 24778 Aztec Code.
    Aztec,
    /// ISO/IEC 16022 Data Matrix.
    DataMatrix,
    /// ISO/IEC 18004 QR Code.
    QrCode,
    /// ISO/IEC 18004 Micro QR Code.
    MicroQrCode,
    /// Rectangular Micro QR Code (rMQR), ISO/IEC 23941.
    RectangularMicroQrCode,
}

impl BarcodeFormat {
    /// The AIM code letter conventionally used in the `]cm` identifier for this
    /// format.
    pub fn aim_code(self) -> char {
        match self {
            Self::None => '\0',
            Self::Aztec => 'z',
            Self::DataMatrix => 'd',
            Self::QrCode | Self::MicroQrCode | Self::RectangularMicroQrCode => 'Q',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_content_gets_no_ai_flag() {
        let mut bytes = b"HELLO".to_vec();
        let id = assign_identifier('z', '0', 0, &mut bytes);
        assert_eq!(id.ai_flag, AiFlag::None);
        assert_eq!(bytes, b"HELLO");
    }

    #[test]
    fn leading_gs_marks_gs1() {
        let mut bytes = vec![GS, b'H', b'I'];
        let id = assign_identifier('z', '0', 0, &mut bytes);
        assert_eq!(id.ai_flag, AiFlag::Gs1);
        assert_eq!(id.modifier, '1');
        assert_eq!(bytes, b"HI");
    }

    #[test]
    fn letter_then_gs_marks_aim_and_keeps_letter() {
        let mut bytes = vec![b'A', GS, b'X'];
        let id = assign_identifier('z', '0', 0, &mut bytes);
        assert_eq!(id.ai_flag, AiFlag::Aim);
        assert_eq!(id.modifier, '2');
        assert_eq!(bytes, b"AX");
    }

    #[test]
    fn two_digits_then_gs_marks_aim() {
        let mut bytes = vec![b'0', b'5', GS, b'X'];
        let id = assign_identifier('z', '0', 0, &mut bytes);
        assert_eq!(id.ai_flag, AiFlag::Aim);
        assert_eq!(bytes, b"05X");
    }

    #[test]
    fn structured_append_adds_six() {
        let mut bytes = b"X".to_vec();
        let id = assign_identifier('z', '0', 6, &mut bytes);
        assert_eq!(id.modifier, '6');
    }

    #[test]
    fn render_applies_eci_offset() {
        let id = SymbologyIdentifier {
            code: 'd',
            modifier: '0',
            eci_modifier_offset: 3,
            ai_flag: AiFlag::None,
        };
        assert_eq!(id.render(false), "]d0");
        assert_eq!(id.render(true), "]d3");
    }
}
