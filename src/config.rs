//! Configuration types for PDF splitting.
//!
//! All splitting behaviour is controlled through [`SplitConfig`], built via
//! its [`SplitConfigBuilder`]. One struct holds every knob so a config can be
//! shared with a blocking worker thread, logged, or compared between runs.

use crate::error::SplitError;
use crate::pipeline::identifier::{IdentifierMatcher, PatternPreset, PatternTier};
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Placeholder prefix for pages without an identifier (`SEM_PROCESSO_PAG_<n>`).
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "SEM_PROCESSO_PAG_";

/// Default upload size limit: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Largest accepted render edge, in pixels.
pub const MAX_RENDERED_PIXELS: u32 = 16_384;

/// Configuration for a split job.
///
/// Built via [`SplitConfig::builder()`] or using [`SplitConfig::default()`].
///
/// # Example
/// ```rust
/// use procsplit::{PatternPreset, SplitConfig};
///
/// let config = SplitConfig::builder()
///     .ocr_language("por")
///     .dpi(200)
///     .patterns(PatternPreset::Strict)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SplitConfig {
    /// Tesseract language code(s) used for OCR, e.g. `por` or `por+eng`.
    /// Default: `por`.
    pub ocr_language: String,

    /// Run OCR on pages without a text layer. Default: true.
    ///
    /// With OCR disabled such pages fall straight through to their
    /// placeholder name.
    pub ocr_enabled: bool,

    /// Pre-constructed OCR engine. Takes precedence over `tesseract_binary`.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Path or name of the `tesseract` executable. Default: `tesseract`.
    pub tesseract_binary: PathBuf,

    /// Rendering DPI for OCR rasterisation. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels.
    /// Default: 4000.
    ///
    /// Caps memory on oversized pages independent of DPI.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library.
    pub pdfium_library: Option<PathBuf>,

    /// Identifier tiers, tried in order. Default: [`PatternPreset::Combined`].
    pub patterns: Vec<PatternTier>,

    /// Prefix for placeholder names. Default: `SEM_PROCESSO_PAG_`.
    pub placeholder_prefix: String,

    /// Root under which each job's upload directory is created.
    /// Default: `uploads`.
    pub uploads_root: PathBuf,

    /// Root under which each job's output directory is created.
    /// Default: `outputs`.
    pub outputs_root: PathBuf,

    /// Largest accepted input, in bytes. Default: 20 MiB.
    pub max_upload_bytes: u64,

    /// Receives per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            ocr_language: "por".to_string(),
            ocr_enabled: true,
            ocr_engine: None,
            tesseract_binary: PathBuf::from("tesseract"),
            dpi: 200,
            max_rendered_pixels: 4000,
            password: None,
            pdfium_library: None,
            patterns: PatternPreset::default().tiers(),
            placeholder_prefix: DEFAULT_PLACEHOLDER_PREFIX.to_string(),
            uploads_root: PathBuf::from("uploads"),
            outputs_root: PathBuf::from("outputs"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfig")
            .field("ocr_language", &self.ocr_language)
            .field("ocr_enabled", &self.ocr_enabled)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("tesseract_binary", &self.tesseract_binary)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("pdfium_library", &self.pdfium_library)
            .field("patterns", &self.patterns)
            .field("placeholder_prefix", &self.placeholder_prefix)
            .field("uploads_root", &self.uploads_root)
            .field("outputs_root", &self.outputs_root)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl SplitConfig {
    /// Create a new builder for `SplitConfig`.
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder {
            config: Self::default(),
        }
    }

    /// Matcher over the configured tier list.
    pub fn matcher(&self) -> IdentifierMatcher {
        IdentifierMatcher::new(self.patterns.clone())
    }

    /// Logical name for a page without an identifier (1-based `page_num`).
    pub fn placeholder_name(&self, page_num: usize) -> String {
        format!("{}{}", self.placeholder_prefix, page_num)
    }
}

/// Builder for [`SplitConfig`].
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl fmt::Debug for SplitConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl SplitConfigBuilder {
    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.config.ocr_enabled = v;
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn tesseract_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_binary = path.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(100, MAX_RENDERED_PIXELS);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn patterns(mut self, preset: PatternPreset) -> Self {
        self.config.patterns = preset.tiers();
        self
    }

    pub fn pattern_tiers(mut self, tiers: Vec<PatternTier>) -> Self {
        self.config.patterns = tiers;
        self
    }

    pub fn placeholder_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.placeholder_prefix = prefix.into();
        self
    }

    pub fn uploads_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.uploads_root = path.into();
        self
    }

    pub fn outputs_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.outputs_root = path.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    /// Upload limit in MiB. Saturates instead of overflowing.
    pub fn max_upload_mib(self, mib: u64) -> Self {
        self.max_upload_bytes(mib.saturating_mul(1024 * 1024))
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SplitConfig, SplitError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(SplitError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.ocr_enabled && c.ocr_engine.is_none() && c.ocr_language.trim().is_empty() {
            return Err(SplitError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.placeholder_prefix.is_empty() {
            return Err(SplitError::InvalidConfig(
                "Placeholder prefix must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(SplitError::InvalidConfig(
                "Upload size limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}
