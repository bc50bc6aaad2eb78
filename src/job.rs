//! Job directory allocation.
//!
//! Every job gets a fresh id and two directories named after it:
//!
//! ```text
//! <uploads_root>/<job_id>/input.pdf
//! <outputs_root>/<job_id>/<fs_name>.pdf ...
//! ```
//!
//! Directories are never removed on success; [`JobDirs::cleanup`] is for
//! callers abandoning a failed job.

use crate::error::SplitError;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// File name the uploaded document is staged under.
pub const STAGED_INPUT_NAME: &str = "input.pdf";

/// Source of job ids.
pub trait JobIdGenerator: Send + Sync {
    /// A token not handed out before. Must be a single path component.
    fn next_id(&self) -> String;
}

/// Random UUID v4 ids (hyphenated, lowercase).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidJobIds;

impl JobIdGenerator for UuidJobIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `<prefix><n>` ids, counting from 1.
#[derive(Debug, Default)]
pub struct SequentialJobIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialJobIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl JobIdGenerator for SequentialJobIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{n}", self.prefix)
    }
}

/// The directories owned by one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDirs {
    pub job_id: String,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl JobDirs {
    /// Path the input document is staged at.
    pub fn input_path(&self) -> PathBuf {
        self.upload_dir.join(STAGED_INPUT_NAME)
    }

    /// Write the uploaded document to `input.pdf` in the upload directory.
    pub fn stage_input(&self, bytes: &[u8]) -> Result<PathBuf, SplitError> {
        let path = self.input_path();
        std::fs::write(&path, bytes).map_err(|source| SplitError::OutputWriteFailed {
            path: path.clone(),
            source,
        })?;
        debug!("Staged {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Remove both directories. Missing directories are not an error.
    pub fn cleanup(&self) {
        for dir in [&self.upload_dir, &self.output_dir] {
            match std::fs::remove_dir_all(dir) {
                Ok(()) => debug!("Removed {}", dir.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {e}", dir.display()),
            }
        }
    }
}

/// Allocate a job with a UUID v4 id.
pub fn make_job_dirs(upload_root: &Path, output_root: &Path) -> Result<JobDirs, SplitError> {
    make_job_dirs_with(&UuidJobIds, upload_root, output_root)
}

/// Allocate a job with an id from `ids`, creating both directories and any
/// missing parents.
pub fn make_job_dirs_with(
    ids: &dyn JobIdGenerator,
    upload_root: &Path,
    output_root: &Path,
) -> Result<JobDirs, SplitError> {
    let job_id = ids.next_id();
    let dirs = JobDirs {
        upload_dir: upload_root.join(&job_id),
        output_dir: output_root.join(&job_id),
        job_id,
    };
    for dir in [&dirs.upload_dir, &dirs.output_dir] {
        std::fs::create_dir_all(dir).map_err(|source| SplitError::JobDirFailed {
            path: dir.clone(),
            source,
        })?;
    }
    debug!(job_id = %dirs.job_id, "Allocated job directories");
    Ok(dirs)
}

/// Output directory of an existing job.
///
/// `job_id` must be one plain path component, so a lookup can never leave
/// `output_root`.
pub fn job_output_dir(output_root: &Path, job_id: &str) -> Result<PathBuf, SplitError> {
    let mut components = Path::new(job_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == job_id => Ok(output_root.join(job_id)),
        _ => Err(SplitError::InvalidJobId {
            job_id: job_id.to_string(),
        }),
    }
}
