//! The public error taxonomy (spec §3, §7).
//!
//! Every decode attempt is total: a failure never unwinds across a pipeline
//! boundary, it becomes an [`Error`] carried on the resulting [`crate::Barcode`].
//! Detector-internal failures (no finder pattern found, a non-convex quadrilateral,
//! a grid sampler landing outside the source image) are not represented here at
//! all -- those stay `Option`/empty-result returns inside `tessera-binarize` and the
//! symbology crates so that another rotation or downscale can be tried.

use std::fmt;

/// The four error kinds a decode can end in.
///
/// `None` is success; it exists as a variant (rather than wrapping in
/// `Option<Error>`) because [`Error`] carries a message and location that are
/// useful to keep attached to a successfully-located-but-unreadable symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    /// No error.
    #[default]
    None,
    /// The symbol's bit pattern does not conform to its symbology: invalid mode,
    /// invalid mode switch, truncated stream, unknown ECI.
    Format,
    /// Reed-Solomon could not recover the codewords, or a symbology-specific
    /// checksum failed.
    Checksum,
    /// A recognised but deliberately unimplemented feature (ECI > 899, unknown
    /// content modifier).
    Unsupported,
}

/// A decode or encode error: a kind, a human-readable message, and optionally the
/// source location that raised it (for diagnostics only, not part of equality's
/// semantic meaning beyond exact reproduction).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    location: Option<(&'static str, u32)>,
}

impl Error {
    /// Construct the success value.
    pub fn none() -> Self {
        Self::default()
    }

    /// Construct a new error of the given kind with a message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Attach a source location, e.g. `err.with_location(file!(), line!())`.
    #[must_use]
    pub fn with_location(mut self, file: &'static str, line: u32) -> Self {
        self.location = Some((file, line));
        self
    }

    /// The error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The source location, if one was attached.
    pub fn location(&self) -> Option<(&'static str, u32)> {
        self.location
    }

    /// Whether this represents success.
    pub fn is_none(&self) -> bool {
        self.kind == ErrorKind::None
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::None => write!(f, "no error"),
            ErrorKind::Format => write!(f, "format error: {}", self.message),
            ErrorKind::Checksum => write!(f, "checksum error: {}", self.message),
            ErrorKind::Unsupported => write!(f, "unsupported: {}", self.message),
        }
    }
}

impl std::error::Error for Error {}

/// Construct a [`Format`](ErrorKind::Format) error at the call site, with location.
#[macro_export]
macro_rules! format_err {
    ($($arg:tt)*) => {
        $crate::Error::new($crate::ErrorKind::Format, ::std::format!($($arg)*))
            .with_location(file!(), line!())
    };
}

/// Construct a [`Checksum`](ErrorKind::Checksum) error at the call site, with location.
#[macro_export]
macro_rules! checksum_err {
    ($($arg:tt)*) => {
        $crate::Error::new($crate::ErrorKind::Checksum, ::std::format!($($arg)*))
            .with_location(file!(), line!())
    };
}

/// Construct an [`Unsupported`](ErrorKind::Unsupported) error at the call site, with location.
#[macro_export]
macro_rules! unsupported_err {
    ($($arg:tt)*) => {
        $crate::Error::new($crate::ErrorKind::Unsupported, ::std::format!($($arg)*))
            .with_location(file!(), line!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_none() {
        assert!(Error::default().is_none());
        assert_eq!(Error::none().kind(), ErrorKind::None);
    }

    #[test]
    fn equality_compares_all_fields() {
        let a = format_err!("bad mode {}", 3);
        let b = Error::new(ErrorKind::Format, "bad mode 3").with_location(file!(), line!());
        assert_ne!(a, b, "line numbers differ so these must not compare equal");
        let b2 = Error::new(ErrorKind::Format, "bad mode 3").with_location(a.location().unwrap().0, a.location().unwrap().1);
        assert_eq!(a, b2);
    }

    #[test]
    fn display_formats_message() {
        let e = checksum_err!("{} errors exceeds capacity {}", 9, 8);
        assert_eq!(e.to_string(), "checksum error: 9 errors exceeds capacity 8");
    }
}
