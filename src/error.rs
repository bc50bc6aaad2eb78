//! Error types for the procsplit library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SplitError`]: **Fatal**: the job cannot proceed (bad input file,
//!   wrong password, output directory not writable). Returned as
//!   `Err(SplitError)` from [`crate::split::process_pdf`] and friends. The
//!   caller owns cleanup of the job's directories.
//!
//! * [`PageIssue`]: **Non-fatal**: text extraction or OCR degraded for a
//!   single page. The page still produces an artifact (usually under its
//!   placeholder name) and the issue is stored on
//!   [`crate::output::PageArtifact`] so it can be told apart from a page
//!   that was genuinely blank.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the procsplit library.
#[derive(Debug, Error)]
pub enum SplitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Upload exceeds the configured size limit.
    #[error("Input is too large: {size} bytes (limit {max} bytes)")]
    InputTooLarge { size: u64, max: u64 },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// A page index beyond the document was requested.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The single-page document could not be assembled or serialised.
    #[error("Failed to build single-page PDF for page {page}: {detail}")]
    PageBuildFailed { page: usize, detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create a job directory.
    #[error("Failed to create job directory '{path}': {source}")]
    JobDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A job id that does not name a single directory under a job root.
    #[error("Invalid job id '{job_id}'")]
    InvalidJobId { job_id: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Pass --pdfium-lib /path/to/libpdfium.\n\
  • Place libpdfium next to the procsplit executable.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SplitError {
    /// True for errors raised while opening or validating the input document.
    pub fn is_document_open_error(&self) -> bool {
        matches!(
            self,
            SplitError::FileNotFound { .. }
                | SplitError::PermissionDenied { .. }
                | SplitError::NotAPdf { .. }
                | SplitError::CorruptPdf { .. }
                | SplitError::PasswordRequired { .. }
                | SplitError::WrongPassword { .. }
        )
    }

    /// True for errors raised while persisting an output page.
    pub fn is_write_error(&self) -> bool {
        matches!(
            self,
            SplitError::PageBuildFailed { .. } | SplitError::OutputWriteFailed { .. }
        )
    }
}

/// A non-fatal extraction problem on a single page.
///
/// Pages carrying an issue still produce an artifact; the issue only
/// explains why no text (and therefore no identifier) was recovered.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageIssue {
    /// The document or page could not be read for direct text extraction.
    #[error("Page {page}: text layer unavailable: {detail}")]
    TextLayerUnavailable { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The renderer returned no image for the page.
    #[error("Page {page}: renderer produced no image")]
    NoImage { page: usize },

    /// The OCR engine failed on the rendered page.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

impl PageIssue {
    /// 1-based page number the issue refers to.
    pub fn page(&self) -> usize {
        match self {
            PageIssue::TextLayerUnavailable { page, .. }
            | PageIssue::RenderFailed { page, .. }
            | PageIssue::NoImage { page }
            | PageIssue::OcrFailed { page, .. } => *page,
        }
    }
}
