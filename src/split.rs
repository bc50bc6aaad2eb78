//! Page splitting: one named single-page PDF per source page.
//!
//! For every page, in order:
//!
//! ```text
//! text ──▶ identifier ──▶ logical name ──▶ sanitize ──▶ resolve collision ──▶ write
//!          (or SEM_PROCESSO_PAG_<n>)                     (_2, _3, ...)
//! ```
//!
//! Pages are processed sequentially. The collision registry lives for one
//! call, so names only have to be unique within a single output directory.
//!
//! ## Entry points
//!
//! * [`process_pdf`]: split a file already on disk, using pdfium.
//! * [`process_pdf_with`]: same, with a caller-supplied [`PdfBackend`].
//! * [`process_pdf_async`]: [`process_pdf`] on tokio's blocking pool.
//! * [`run_job`]: the full upload flow (size check, job directories, staging,
//!   split, cleanup on failure).

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::job::{make_job_dirs_with, JobDirs, JobIdGenerator, UuidJobIds};
use crate::output::{PageArtifact, SplitOutput};
use crate::pipeline::document::{PdfBackend, PdfiumBackend, SourceDocument};
use crate::pipeline::input::{check_size, validate_pdf};
use crate::pipeline::ocr::engine_from_config;
use crate::pipeline::sanitize::sanitize;
use crate::pipeline::text::{extract_from_document, render_options, OcrFallback};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Split the PDF at `input` into `output_dir`.
///
/// # Returns
/// One [`PageArtifact`] per source page, in page order, plus run statistics.
/// Pages whose extraction degraded still get an artifact.
///
/// # Errors
/// - Document-open errors when `input` is missing, unreadable or not a PDF
/// - [`SplitError::PdfiumBindingFailed`] when no pdfium library is found
/// - Write errors when a page cannot be built or stored
pub fn process_pdf(
    input: &Path,
    output_dir: &Path,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    // Reject bad input before paying for the pdfium binding.
    validate_pdf(input)?;
    let backend = PdfiumBackend::new(config.pdfium_library.as_deref())?;
    split_document(&backend, input, output_dir, config)
}

/// [`process_pdf`] with an explicit document backend.
pub fn process_pdf_with(
    backend: &dyn PdfBackend,
    input: &Path,
    output_dir: &Path,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    validate_pdf(input)?;
    split_document(backend, input, output_dir, config)
}

/// Run [`process_pdf`] on tokio's blocking thread pool.
pub async fn process_pdf_async(
    input: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
    config: SplitConfig,
) -> Result<SplitOutput, SplitError> {
    let input = input.into();
    let output_dir = output_dir.into();
    tokio::task::spawn_blocking(move || process_pdf(&input, &output_dir, &config))
        .await
        .map_err(|e| SplitError::Internal(format!("Split task panicked: {}", e)))?
}

fn split_document(
    backend: &dyn PdfBackend,
    input: &Path,
    output_dir: &Path,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    let start = Instant::now();
    std::fs::create_dir_all(output_dir).map_err(|source| SplitError::OutputWriteFailed {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let doc = backend.open(input, config.password.as_deref())?;
    let total_pages = doc.page_count();
    info!(
        "Splitting {} ({} pages) into {}",
        input.display(),
        total_pages,
        output_dir.display()
    );

    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_split_start(total_pages);
    }

    let matcher = config.matcher();
    let engine = engine_from_config(config);
    let fallback = engine.as_deref().map(|engine| OcrFallback {
        engine,
        language: &config.ocr_language,
        render: render_options(config),
    });

    let mut names = NameRegistry::default();
    let mut artifacts = Vec::with_capacity(total_pages);

    for page_index in 0..total_pages {
        let page_num = page_index + 1;
        if let Some(cb) = cb {
            cb.on_page_start(page_num, total_pages);
        }

        let page_text = extract_from_document(doc.as_ref(), page_index, fallback.as_ref());
        if let Some(cb) = cb {
            for issue in &page_text.issues {
                cb.on_page_degraded(total_pages, issue);
            }
        }

        let identifier = matcher.extract(&page_text.text);
        let identified = identifier.is_some();
        let logical_name = identifier.unwrap_or_else(|| config.placeholder_name(page_num));
        let fs_name = names.claim(&sanitize(&logical_name));
        let file_name = format!("{fs_name}.pdf");
        let path = output_dir.join(&file_name);

        let size_bytes = write_page(doc.as_ref(), page_index, &path)?;
        debug!(
            "Page {}/{}: '{}' → {} ({} bytes)",
            page_num, total_pages, logical_name, file_name, size_bytes
        );

        let artifact = PageArtifact {
            page_num,
            logical_name,
            file_name,
            path,
            size_bytes,
            identified,
            text_source: page_text.source,
            issues: page_text.issues,
        };
        if let Some(cb) = cb {
            cb.on_page_complete(total_pages, &artifact);
        }
        artifacts.push(artifact);
    }

    let output = SplitOutput::from_artifacts(artifacts, start.elapsed().as_millis() as u64);
    info!(
        "Split complete: {} pages, {} identified, {} placeholders, {} degraded, {}ms",
        output.stats.total_pages,
        output.stats.identified_pages,
        output.stats.placeholder_pages,
        output.stats.degraded_pages,
        output.stats.total_duration_ms
    );
    if let Some(cb) = cb {
        cb.on_split_complete(total_pages, output.stats.identified_pages);
    }
    Ok(output)
}

/// Build page `page_index` as its own document and store it at `path`.
///
/// Uses atomic write (temp file + rename) so an interrupted run never leaves
/// a truncated PDF under a final name.
fn write_page(doc: &dyn SourceDocument, page_index: usize, path: &Path) -> Result<u64, SplitError> {
    let bytes = doc.single_page_pdf(page_index)?;
    let write_failed = |source| SplitError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("pdf.tmp");
    if let Err(e) = std::fs::write(&tmp_path, &bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_failed(e));
    }
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_failed(e));
    }
    let size = std::fs::metadata(path).map_err(write_failed)?.len();
    Ok(size)
}

/// Run-scoped file name allocator.
///
/// The k-th claim of a base name gets `<base>_k`; the first is unchanged.
/// Candidates already handed out (for instance a page whose own identifier is
/// literally `X_2`) are skipped, so every returned name is unique.
#[derive(Debug, Default)]
pub struct NameRegistry {
    claims: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl NameRegistry {
    /// Claim a unique file-system name derived from `base`.
    pub fn claim(&mut self, base: &str) -> String {
        let count = self.claims.entry(base.to_string()).or_insert(0);
        *count += 1;

        let mut k = *count;
        let mut candidate = if k == 1 {
            base.to_string()
        } else {
            format!("{base}_{k}")
        };
        while self.taken.contains(&candidate) {
            k += 1;
            candidate = format!("{base}_{k}");
        }
        *count = k;

        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Result of [`run_job`]: the job's directories and the split output.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: JobDirs,
    pub output: SplitOutput,
}

/// Run the full upload flow on `bytes` with pdfium and UUID job ids.
///
/// The job's directories are created under `config.uploads_root` and
/// `config.outputs_root` and survive a successful run.
pub fn run_job(bytes: &[u8], config: &SplitConfig) -> Result<JobReport, SplitError> {
    check_size(bytes.len() as u64, config.max_upload_bytes)?;
    let backend = PdfiumBackend::new(config.pdfium_library.as_deref())?;
    run_job_with(&backend, &UuidJobIds, bytes, config)
}

/// [`run_job`] with an explicit backend and id generator.
///
/// On any failure after the directories are allocated, both are removed
/// before the error is returned.
pub fn run_job_with(
    backend: &dyn PdfBackend,
    ids: &dyn JobIdGenerator,
    bytes: &[u8],
    config: &SplitConfig,
) -> Result<JobReport, SplitError> {
    check_size(bytes.len() as u64, config.max_upload_bytes)?;
    let job = make_job_dirs_with(ids, &config.uploads_root, &config.outputs_root)?;
    info!(job_id = %job.job_id, "Job started ({} bytes)", bytes.len());

    let result = job
        .stage_input(bytes)
        .and_then(|input| process_pdf_with(backend, &input, &job.output_dir, config));

    match result {
        Ok(output) => Ok(JobReport { job, output }),
        Err(e) => {
            warn!(job_id = %job.job_id, "Job failed, removing its directories: {e}");
            job.cleanup();
            Err(e)
        }
    }
}
