//! Progress-callback trait for per-page split events.
//!
//! Inject an [`Arc<dyn SplitProgressCallback>`] via
//! [`crate::config::SplitConfigBuilder::progress_callback`] to receive events
//! as the pipeline processes each page. This is the reporting seam for hosts
//! (a progress bar, a job table, a web socket); the library itself only logs
//! through `tracing`.
//!
//! # Example
//!
//! ```rust
//! use procsplit::{PageArtifact, SplitConfig, SplitProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: Arc<AtomicUsize>,
//! }
//!
//! impl SplitProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, total_pages: usize, artifact: &PageArtifact) {
//!         let done = self.written.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total_pages}: {}", artifact.file_name);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     written: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = SplitConfig::builder()
//!     .progress_callback(counter as Arc<dyn SplitProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PageIssue;
use crate::output::PageArtifact;
use std::sync::Arc;

/// Called by the split pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in page order.
pub trait SplitProgressCallback: Send + Sync {
    /// Called once after the document is opened, before any page.
    fn on_split_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before text extraction for a page (`page_num` is 1-indexed).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when extraction for a page degraded (unreadable text layer,
    /// failed render, failed OCR). The page is still written.
    fn on_page_degraded(&self, total_pages: usize, issue: &PageIssue) {
        let _ = (total_pages, issue);
    }

    /// Called after a page's single-page PDF has been written.
    fn on_page_complete(&self, total_pages: usize, artifact: &PageArtifact) {
        let _ = (total_pages, artifact);
    }

    /// Called once after every page has been written.
    ///
    /// # Arguments
    /// * `total_pages`:      pages in the document
    /// * `identified_pages`: pages named by a recovered identifier
    fn on_split_complete(&self, total_pages: usize, identified_pages: usize) {
        let _ = (total_pages, identified_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SplitProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SplitConfig`].
pub type ProgressCallback = Arc<dyn SplitProgressCallback>;
