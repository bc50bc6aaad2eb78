//! Page text extraction: text layer first, OCR when the layer is empty.
//!
//! Extraction never fails. Anything that goes wrong (unreadable page, failed
//! render, OCR crash) is recorded as a [`PageIssue`] on the returned
//! [`PageText`] and the page is treated as having no text, which sends it down
//! the placeholder-name path. The issues are what tells a scanned page whose
//! OCR crashed apart from a page that really is blank.

use crate::config::SplitConfig;
use crate::error::PageIssue;
use crate::output::TextSource;
use crate::pipeline::document::{PdfBackend, RenderOptions, SourceDocument};
use crate::pipeline::ocr::{engine_from_config, OcrEngine};
use std::path::Path;
use tracing::{debug, warn};

/// Text recovered for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    pub source: TextSource,
    pub issues: Vec<PageIssue>,
}

impl PageText {
    fn empty(issues: Vec<PageIssue>) -> Self {
        Self {
            text: String::new(),
            source: TextSource::None,
            issues,
        }
    }
}

/// How to fall back to OCR for pages without a text layer.
pub struct OcrFallback<'a> {
    pub engine: &'a dyn OcrEngine,
    pub language: &'a str,
    pub render: RenderOptions,
}

/// Extract text for page `page_index` (0-based) of an open document.
pub fn extract_from_document(
    doc: &dyn SourceDocument,
    page_index: usize,
    ocr: Option<&OcrFallback<'_>>,
) -> PageText {
    let page_num = page_index + 1;
    let mut issues = Vec::new();

    match doc.page_text(page_index) {
        Ok(text) if !text.trim().is_empty() => {
            return PageText {
                text,
                source: TextSource::TextLayer,
                issues,
            };
        }
        Ok(_) => debug!("Page {page_num}: text layer is empty"),
        Err(issue) => {
            warn!("{issue}");
            issues.push(issue);
        }
    }

    let Some(ocr) = ocr else {
        return PageText::empty(issues);
    };

    let image = match doc.render_page(page_index, &ocr.render) {
        Ok(Some(image)) => image,
        Ok(None) => {
            let issue = PageIssue::NoImage { page: page_num };
            warn!("{issue}");
            issues.push(issue);
            return PageText::empty(issues);
        }
        Err(issue) => {
            warn!("{issue}");
            issues.push(issue);
            return PageText::empty(issues);
        }
    };

    match ocr.engine.recognize(&image, ocr.language) {
        Ok(text) if !text.trim().is_empty() => {
            debug!("Page {page_num}: OCR recovered {} chars", text.len());
            PageText {
                text,
                source: TextSource::Ocr,
                issues,
            }
        }
        Ok(_) => {
            debug!("Page {page_num}: OCR found no text");
            PageText::empty(issues)
        }
        Err(e) => {
            let issue = PageIssue::OcrFailed {
                page: page_num,
                detail: e.to_string(),
            };
            warn!("{issue}");
            issues.push(issue);
            PageText::empty(issues)
        }
    }
}

/// Extract text for page `page_index` (0-based) of the PDF at `pdf_path`.
///
/// Opens the document itself; a document that cannot be opened degrades to
/// empty text like any other extraction failure.
pub fn extract_page_text(
    backend: &dyn PdfBackend,
    pdf_path: &Path,
    page_index: usize,
    config: &SplitConfig,
) -> PageText {
    let page_num = page_index + 1;
    let doc = match backend.open(pdf_path, config.password.as_deref()) {
        Ok(doc) => doc,
        Err(e) => {
            let detail = e.to_string();
            warn!("Page {page_num}: could not open {}: {detail}", pdf_path.display());
            let mut issues = vec![PageIssue::TextLayerUnavailable {
                page: page_num,
                detail: detail.clone(),
            }];
            if config.ocr_enabled {
                issues.push(PageIssue::RenderFailed {
                    page: page_num,
                    detail,
                });
            }
            return PageText::empty(issues);
        }
    };

    let engine = engine_from_config(config);
    let fallback = engine.as_deref().map(|engine| OcrFallback {
        engine,
        language: &config.ocr_language,
        render: render_options(config),
    });
    extract_from_document(doc.as_ref(), page_index, fallback.as_ref())
}

pub(crate) fn render_options(config: &SplitConfig) -> RenderOptions {
    RenderOptions {
        dpi: config.dpi,
        max_pixels: config.max_rendered_pixels,
    }
}
