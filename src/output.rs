//! Output types: per-page artifacts, the manifest and run statistics.

use crate::error::{PageIssue, SplitError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a page's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// The PDF's own text layer.
    TextLayer,
    /// OCR over the rendered page.
    Ocr,
    /// Neither produced any text.
    None,
}

/// The result of processing one source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageArtifact {
    /// 1-indexed source page number.
    pub page_num: usize,
    /// Recovered identifier, or the `SEM_PROCESSO_PAG_<n>` placeholder.
    pub logical_name: String,
    /// On-disk file name, sanitized and collision-resolved, with `.pdf`.
    pub file_name: String,
    /// Full path of the written single-page PDF.
    pub path: PathBuf,
    /// Size of the written file.
    pub size_bytes: u64,
    /// True when `logical_name` is a recovered identifier.
    pub identified: bool,
    pub text_source: TextSource,
    /// Non-fatal extraction problems for this page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<PageIssue>,
}

impl PageArtifact {
    /// File name without the `.pdf` extension.
    pub fn fs_name(&self) -> &str {
        self.file_name
            .strip_suffix(".pdf")
            .unwrap_or(&self.file_name)
    }

    /// True when extraction degraded on this page.
    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Aggregate statistics for one split run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStats {
    pub total_pages: usize,
    pub identified_pages: usize,
    pub placeholder_pages: usize,
    pub ocr_pages: usize,
    pub degraded_pages: usize,
    pub total_bytes: u64,
    pub total_duration_ms: u64,
}

/// Manifest plus statistics returned by a split run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOutput {
    /// One artifact per source page, in page order.
    pub artifacts: Vec<PageArtifact>,
    pub stats: SplitStats,
}

impl SplitOutput {
    pub(crate) fn from_artifacts(artifacts: Vec<PageArtifact>, total_duration_ms: u64) -> Self {
        let identified_pages = artifacts.iter().filter(|a| a.identified).count();
        let stats = SplitStats {
            total_pages: artifacts.len(),
            identified_pages,
            placeholder_pages: artifacts.len() - identified_pages,
            ocr_pages: artifacts
                .iter()
                .filter(|a| a.text_source == TextSource::Ocr)
                .count(),
            degraded_pages: artifacts.iter().filter(|a| a.is_degraded()).count(),
            total_bytes: artifacts.iter().map(|a| a.size_bytes).sum(),
            total_duration_ms,
        };
        Self { artifacts, stats }
    }

    /// `(logical_name, path, size)` triples, in page order.
    pub fn manifest(&self) -> Vec<(&str, &Path, u64)> {
        self.artifacts
            .iter()
            .map(|a| (a.logical_name.as_str(), a.path.as_path(), a.size_bytes))
            .collect()
    }
}

/// A PDF found in an output directory by [`scan_output_dir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// List the `.pdf` files of a job's output directory, sorted by name.
///
/// Page order and logical names are not recoverable from disk; this is the
/// view a download page has when only the job directory is known.
pub fn scan_output_dir(dir: &Path) -> Result<Vec<StoredFile>, SplitError> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SplitError::FileNotFound {
            path: dir.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => SplitError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => SplitError::Internal(format!("read_dir {}: {e}", dir.display())),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SplitError::Internal(format!("read_dir entry: {e}")))?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.ends_with(".pdf") {
            continue;
        }
        let meta = entry
            .metadata()
            .map_err(|e| SplitError::Internal(format!("metadata {}: {e}", path.display())))?;
        if !meta.is_file() {
            continue;
        }
        files.push(StoredFile {
            file_name: file_name.to_string(),
            size_bytes: meta.len(),
            path,
        });
    }
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}
