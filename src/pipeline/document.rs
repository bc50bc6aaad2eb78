//! Document reader/writer: page count, page text, page rendering and
//! single-page export.
//!
//! The pipeline talks to PDFs only through [`PdfBackend`] and
//! [`SourceDocument`], so tests can substitute an in-memory document and
//! alternative engines can be plugged in without touching the splitter.
//! [`PdfiumBackend`] is the production implementation.
//!
//! ## Why one `Pdfium` per backend?
//!
//! `PdfDocument` borrows the `Pdfium` instance that loaded it, so a document
//! can never outlive its backend. Binding the library is a `dlopen`, which the
//! OS caches, so creating a backend per job is cheap. The blocking pipeline
//! owns its backend for the whole run.

use crate::error::{PageIssue, SplitError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Env var naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Rasterisation parameters for OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub dpi: u32,
    /// Cap on either rendered edge, in pixels.
    pub max_pixels: u32,
}

impl RenderOptions {
    /// `max_pixels` as pdfium's signed edge limit.
    pub fn max_edge(&self) -> i32 {
        i32::try_from(self.max_pixels).unwrap_or(i32::MAX)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_pixels: 4000,
        }
    }
}

/// An opened source document.
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Text layer of one page (0-based). `Ok("")` for a page without text.
    fn page_text(&self, page_index: usize) -> Result<String, PageIssue>;

    /// Rasterise one page (0-based). `Ok(None)` when the renderer produced
    /// no image.
    fn render_page(
        &self,
        page_index: usize,
        options: &RenderOptions,
    ) -> Result<Option<DynamicImage>, PageIssue>;

    /// Serialise a new document containing only page `page_index`.
    fn single_page_pdf(&self, page_index: usize) -> Result<Vec<u8>, SplitError>;
}

/// Opens source documents.
pub trait PdfBackend {
    /// Open `path`, failing with a document-open error when it is not a
    /// readable PDF.
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn SourceDocument + 'a>, SplitError>;
}

/// PDFium-backed [`PdfBackend`].
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind to the pdfium library.
    ///
    /// Discovery order:
    /// 1. `library`, when given
    /// 2. `PDFIUM_LIB_PATH` env var
    /// 3. Alongside the running executable
    /// 4. System library search paths
    pub fn new(library: Option<&Path>) -> Result<Self, SplitError> {
        Ok(Self {
            pdfium: load_pdfium(library)?,
        })
    }
}

impl PdfBackend for PdfiumBackend {
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn SourceDocument + 'a>, SplitError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| map_load_error(path, password, e))?;
        info!("PDF loaded: {} pages", document.pages().len());
        Ok(Box::new(PdfiumDocument {
            pdfium: &self.pdfium,
            document,
        }))
    }
}

struct PdfiumDocument<'a> {
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, page_index: usize) -> Result<PdfPage<'_>, PdfiumError> {
        self.document.pages().get(page_index as PdfPageIndex)
    }
}

impl SourceDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, page_index: usize) -> Result<String, PageIssue> {
        let unavailable = |detail: String| PageIssue::TextLayerUnavailable {
            page: page_index + 1,
            detail,
        };
        let page = self.page(page_index).map_err(|e| unavailable(format!("{e:?}")))?;
        let text = page.text().map_err(|e| unavailable(format!("{e:?}")))?;
        Ok(text.all())
    }

    fn render_page(
        &self,
        page_index: usize,
        options: &RenderOptions,
    ) -> Result<Option<DynamicImage>, PageIssue> {
        let render_failed = |detail: String| PageIssue::RenderFailed {
            page: page_index + 1,
            detail,
        };
        let page = self
            .page(page_index)
            .map_err(|e| render_failed(format!("{e:?}")))?;

        let max_edge = options.max_edge();
        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(options.dpi as f32 / 72.0)
            .set_maximum_width(max_edge)
            .set_maximum_height(max_edge);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| render_failed(format!("{e:?}")))?;

        let image = bitmap.as_image();
        if image.width() == 0 || image.height() == 0 {
            return Ok(None);
        }
        debug!(
            "Rendered page {} → {}x{} px",
            page_index + 1,
            image.width(),
            image.height()
        );
        Ok(Some(image))
    }

    fn single_page_pdf(&self, page_index: usize) -> Result<Vec<u8>, SplitError> {
        let total = self.page_count();
        if page_index >= total {
            return Err(SplitError::PageOutOfRange {
                page: page_index + 1,
                total,
            });
        }
        let build_failed = |e: PdfiumError| SplitError::PageBuildFailed {
            page: page_index + 1,
            detail: format!("{e:?}"),
        };

        let mut single = self.pdfium.create_new_pdf().map_err(build_failed)?;
        single
            .pages_mut()
            .copy_page_from_document(&self.document, page_index as PdfPageIndex, 0)
            .map_err(build_failed)?;
        single.save_to_bytes().map_err(build_failed)
    }
}

/// Map PDF load errors, detecting encrypted PDFs.
fn map_load_error(path: &Path, password: Option<&str>, e: PdfiumError) -> SplitError {
    let err_str = format!("{e:?}");
    let lower = err_str.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        if password.is_some() {
            SplitError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            SplitError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        SplitError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

fn load_pdfium(library: Option<&Path>) -> Result<Pdfium, SplitError> {
    let explicit = library
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

    if let Some(path) = explicit {
        debug!(path = %path.display(), "Loading pdfium from explicit path");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            SplitError::PdfiumBindingFailed(format!("{}: {e:?}", path.display()))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        let lib_path =
            Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!(dir = %exe_dir.display(), "Loaded pdfium next to executable");
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| SplitError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_render_options() {
        let opts = RenderOptions::default();
        assert_eq!(opts.dpi, 200);
        assert_eq!(opts.max_pixels, 4000);
    }

    #[test]
    fn max_edge_never_goes_negative() {
        let opts = RenderOptions {
            dpi: 200,
            max_pixels: u32::MAX,
        };
        assert_eq!(opts.max_edge(), i32::MAX);
        assert_eq!(RenderOptions::default().max_edge(), 4000);
    }

    #[test]
    fn bad_explicit_library_is_binding_error() {
        let err = PdfiumBackend::new(Some(Path::new("/definitely/not/libpdfium.so")))
            .err()
            .expect("binding should fail");
        assert!(matches!(err, SplitError::PdfiumBindingFailed(_)));
        assert!(err.to_string().contains("PDFIUM_LIB_PATH"));
    }
}
