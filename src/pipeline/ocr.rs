//! OCR seam: recognise text in a rendered page image.
//!
//! The pipeline only needs "image in, text out" for one language, so OCR is a
//! small trait with two implementations:
//!
//! * [`TesseractCli`] pipes a PNG of the page through the `tesseract`
//!   executable (`tesseract stdin stdout -l <lang>`). Nothing touches disk.
//! * [`FixedTextOcr`] returns a fixed string. Tests use it to stay hermetic,
//!   and an empty one stands in when OCR is switched off.

use crate::config::SplitConfig;
use crate::pipeline::encode::encode_png;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failure inside an OCR engine. Callers downgrade this to a
/// [`crate::error::PageIssue::OcrFailed`].
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to encode page image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("could not run '{binary}': {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O with OCR process failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("tesseract exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Recognise text in a page image.
pub trait OcrEngine: Send + Sync {
    /// Return the text found in `image` for `language` (Tesseract codes,
    /// e.g. `por` or `por+eng`). An image without text yields `Ok("")`.
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError>;
}

/// Runs the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            tessdata_dir: None,
        }
    }

    /// Use traineddata from `dir` instead of Tesseract's built-in search path.
    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, language: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["stdin", "stdout", "-l", language]);
        if let Some(ref dir) = self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        let _span = tracing::debug_span!("ocr.tesseract", lang = language).entered();
        let png = encode_png(image)?;

        let mut child = self
            .command(language)
            .spawn()
            .map_err(|source| OcrError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a chatty stderr can't deadlock us.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("tesseract stdin was not captured"))?;
        let feeder = std::thread::spawn(move || stdin.write_all(&png));

        let output = child.wait_with_output()?;
        let fed = feeder
            .join()
            .map_err(|_| std::io::Error::other("stdin feeder thread panicked"))?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed?;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("tesseract returned {} chars", text.len());
        Ok(text)
    }
}

/// Returns the same text for every image.
#[derive(Debug, Clone, Default)]
pub struct FixedTextOcr {
    text: String,
}

impl FixedTextOcr {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// An engine that never finds text.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl OcrEngine for FixedTextOcr {
    fn recognize(&self, _image: &DynamicImage, _language: &str) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

/// Pick the engine a config asks for: `None` when OCR is disabled, else the
/// injected engine, else `tesseract` at the configured path.
pub fn engine_from_config(config: &SplitConfig) -> Option<Arc<dyn OcrEngine>> {
    if !config.ocr_enabled {
        return None;
    }
    if let Some(ref engine) = config.ocr_engine {
        return Some(Arc::clone(engine));
    }
    Some(Arc::new(TesseractCli::new(config.tesseract_binary.clone())))
}
