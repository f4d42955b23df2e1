//! `ReaderOptions`/`CreatorOptions` (spec §6): plain builder-style structs, no
//! process-wide mutable state.

use tessera_binarize::BinarizerKind;
use tessera_common::{BarcodeFormat, CharacterSet, TextMode};

/// Options controlling [`crate::read_barcodes`].
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Restrict the search to these formats; empty means "try all".
    pub formats: Vec<BarcodeFormat>,
    /// Also try the image rotated 90/180/270 degrees.
    pub try_rotate: bool,
    /// Also try downscaled copies of the image (1/2, 1/3, 1/4).
    pub try_downscale: bool,
    /// Also try the inverted (black/white swapped) reflectance.
    pub try_invert: bool,
    /// Which binarizer strategy to apply before detection.
    pub binarizer: BinarizerKind,
    /// How decoded content is rendered back to text.
    pub text_mode: TextMode,
    /// Fallback character set used when a symbol carries no ECI designator.
    pub character_set: CharacterSet,
    /// Assume the image is a single aligned symbol with no surrounding quiet
    /// noise (skips the full multi-rotation/downscale search).
    pub is_pure: bool,
    /// Stop once this many symbols have been read.
    pub max_number_of_symbols: u8,
    /// Include failed-but-located symbols (non-`None` `Error`) in the result.
    pub return_errors: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            formats: Vec::new(),
            try_rotate: true,
            try_downscale: false,
            try_invert: false,
            binarizer: BinarizerKind::default(),
            text_mode: TextMode::Plain,
            character_set: CharacterSet::Unknown,
            is_pure: false,
            max_number_of_symbols: u8::MAX,
            return_errors: false,
        }
    }
}

impl ReaderOptions {
    /// Restrict the search to exactly these formats.
    #[must_use]
    pub fn with_formats(mut self, formats: Vec<BarcodeFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// Set whether rotated copies of the image are also tried.
    #[must_use]
    pub fn with_try_rotate(mut self, try_rotate: bool) -> Self {
        self.try_rotate = try_rotate;
        self
    }

    /// Set whether downscaled copies of the image are also tried.
    #[must_use]
    pub fn with_try_downscale(mut self, try_downscale: bool) -> Self {
        self.try_downscale = try_downscale;
        self
    }

    /// Set whether the inverted reflectance is also tried.
    #[must_use]
    pub fn with_try_invert(mut self, try_invert: bool) -> Self {
        self.try_invert = try_invert;
        self
    }

    /// Select the binarizer strategy.
    #[must_use]
    pub fn with_binarizer(mut self, binarizer: BinarizerKind) -> Self {
        self.binarizer = binarizer;
        self
    }

    /// Select the text rendering mode.
    #[must_use]
    pub fn with_text_mode(mut self, text_mode: TextMode) -> Self {
        self.text_mode = text_mode;
        self
    }

    /// Assume the image holds a single aligned symbol.
    #[must_use]
    pub fn with_is_pure(mut self, is_pure: bool) -> Self {
        self.is_pure = is_pure;
        self
    }

    /// Stop the search once this many symbols are read.
    #[must_use]
    pub fn with_max_number_of_symbols(mut self, max: u8) -> Self {
        self.max_number_of_symbols = max;
        self
    }
}

/// Options controlling [`crate::create_barcode`].
#[derive(Debug, Clone, Default)]
pub struct CreatorOptions {
    /// Error-correction level, as a symbology-specific label ("L"/"M"/"Q"/"H"
    /// for QR, a numeric percentage for Aztec).
    pub ec_level: Option<String>,
    /// Force a specific symbol version/size rather than the smallest fit.
    pub version: Option<u32>,
    /// Force a square (rather than rectangular) symbol shape where the
    /// symbology allows a choice.
    pub force_square: bool,
}

impl CreatorOptions {
    /// Request a specific error-correction level.
    #[must_use]
    pub fn with_ec_level(mut self, ec_level: impl Into<String>) -> Self {
        self.ec_level = Some(ec_level.into());
        self
    }

    /// Request a specific symbol version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Force a square symbol shape.
    #[must_use]
    pub fn with_force_square(mut self, force_square: bool) -> Self {
        self.force_square = force_square;
        self
    }
}
