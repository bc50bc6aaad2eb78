//! # procsplit
//!
//! Split a multi-page PDF into one PDF per page, each named after the legal
//! process number found on that page.
//!
//! ## Why this crate?
//!
//! Scanned filings arrive as one long PDF where every page belongs to a
//! different process. Filing them means opening each page, reading the number
//! off the letterhead and saving the page under that name. This crate does
//! that: it reads each page's text layer (or OCRs the page when there is
//! none), finds the process number, and writes the page to
//! `<process number>.pdf`. Pages without a number get a placeholder name so
//! nothing is dropped.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Job       allocate <uploads>/<id>/ and <outputs>/<id>/, stage input.pdf
//!  ├─ 2. Input     validate %PDF magic and readability
//!  ├─ 3. Text      pdfium text layer, tesseract OCR when empty
//!  ├─ 4. Match     labelled → loose → broad identifier patterns
//!  ├─ 5. Name      identifier or SEM_PROCESSO_PAG_<n>, sanitized, de-duplicated
//!  └─ 6. Write     single-page PDF per source page + manifest
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use procsplit::{process_pdf, SplitConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SplitConfig::default();
//!     let output = process_pdf(Path::new("lote.pdf"), Path::new("out"), &config)?;
//!     for (name, path, size) in output.manifest() {
//!         println!("{name}\t{}\t{size}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `procsplit` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! procsplit = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! | Library | Needed for | Located via |
//! |---------|-----------|-------------|
//! | pdfium  | everything | `--pdfium-lib`, `PDFIUM_LIB_PATH`, next to the executable, system paths |
//! | tesseract (+ `por` traineddata) | OCR of pages without text | `PATH` or `tesseract_binary` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod split;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SplitConfig, SplitConfigBuilder};
pub use error::{PageIssue, SplitError};
pub use job::{
    job_output_dir, make_job_dirs, make_job_dirs_with, JobDirs, JobIdGenerator, SequentialJobIds,
    UuidJobIds,
};
pub use output::{scan_output_dir, PageArtifact, SplitOutput, SplitStats, StoredFile, TextSource};
pub use pipeline::document::{PdfBackend, PdfiumBackend, RenderOptions, SourceDocument};
pub use pipeline::identifier::{
    extract_identifier, normalize, IdentifierMatch, IdentifierMatcher, PatternPreset, PatternTier,
};
pub use pipeline::ocr::{FixedTextOcr, OcrEngine, OcrError, TesseractCli};
pub use pipeline::sanitize::sanitize;
pub use pipeline::text::{extract_page_text, PageText};
pub use progress::{NoopProgressCallback, ProgressCallback, SplitProgressCallback};
pub use split::{
    process_pdf, process_pdf_async, process_pdf_with, run_job, run_job_with, JobReport,
    NameRegistry,
};
