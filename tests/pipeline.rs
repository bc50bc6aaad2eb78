//! Hermetic pipeline tests.
//!
//! These run the real splitter, naming, collision and job logic against an
//! in-memory document backend and a fixed-text OCR engine, so they need
//! neither pdfium nor tesseract. See `tests/e2e.rs` for the real engines.

use image::{DynamicImage, Rgba, RgbaImage};
use procsplit::{
    process_pdf_with, run_job_with, sanitize, scan_output_dir, FixedTextOcr, NameRegistry,
    OcrEngine, OcrError, PageArtifact, PageIssue, PdfBackend, RenderOptions, SequentialJobIds,
    SourceDocument, SplitConfig, SplitError, SplitProgressCallback, TextSource,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test doubles ─────────────────────────────────────────────────────────────

#[derive(Clone)]
enum Page {
    Text(&'static str),
    Scanned,
    Unreadable,
}

/// Serves the same in-memory pages for any path it is asked to open.
struct MemoryBackend {
    pages: Vec<Page>,
    open_error: Option<fn(&Path) -> SplitError>,
}

impl MemoryBackend {
    fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            open_error: None,
        }
    }

    fn refusing(open_error: fn(&Path) -> SplitError) -> Self {
        Self {
            pages: Vec::new(),
            open_error: Some(open_error),
        }
    }
}

impl PdfBackend for MemoryBackend {
    fn open<'a>(
        &'a self,
        path: &Path,
        _password: Option<&str>,
    ) -> Result<Box<dyn SourceDocument + 'a>, SplitError> {
        if let Some(make_err) = self.open_error {
            return Err(make_err(path));
        }
        Ok(Box::new(MemoryDocument { pages: &self.pages }))
    }
}

struct MemoryDocument<'a> {
    pages: &'a [Page],
}

impl SourceDocument for MemoryDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_index: usize) -> Result<String, PageIssue> {
        match &self.pages[page_index] {
            Page::Text(t) => Ok(t.to_string()),
            Page::Scanned => Ok(String::new()),
            Page::Unreadable => Err(PageIssue::TextLayerUnavailable {
                page: page_index + 1,
                detail: "damaged content stream".into(),
            }),
        }
    }

    fn render_page(
        &self,
        _page_index: usize,
        _options: &RenderOptions,
    ) -> Result<Option<DynamicImage>, PageIssue> {
        Ok(Some(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            Rgba([255, 255, 255, 255]),
        ))))
    }

    fn single_page_pdf(&self, page_index: usize) -> Result<Vec<u8>, SplitError> {
        Ok(format!("%PDF-1.7\n% page {}\n%%EOF\n", page_index + 1).into_bytes())
    }
}

/// Counts calls and returns fixed text.
struct CountingOcr {
    text: &'static str,
    calls: AtomicUsize,
}

impl OcrEngine for CountingOcr {
    fn recognize(&self, _image: &DynamicImage, _language: &str) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.to_string())
    }
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl SplitProgressCallback for RecordingCallback {
    fn on_split_start(&self, total_pages: usize) {
        self.events.lock().unwrap().push(format!("start {total_pages}"));
    }

    fn on_page_degraded(&self, _total_pages: usize, issue: &PageIssue) {
        self.events
            .lock()
            .unwrap()
            .push(format!("degraded {}", issue.page()));
    }

    fn on_page_complete(&self, _total_pages: usize, artifact: &PageArtifact) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page {}", artifact.file_name));
    }

    fn on_split_complete(&self, total_pages: usize, identified_pages: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {identified_pages}/{total_pages}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config_with_ocr(ocr: Arc<dyn OcrEngine>) -> SplitConfig {
    SplitConfig::builder().ocr_engine(ocr).build().unwrap()
}

fn blank_ocr_config() -> SplitConfig {
    config_with_ocr(Arc::new(FixedTextOcr::empty()))
}

fn staged_input(dir: &Path) -> PathBuf {
    let path = dir.join("input.pdf");
    std::fs::write(&path, b"%PDF-1.7\n%%EOF\n").unwrap();
    path
}

fn file_names(artifacts: &[PageArtifact]) -> Vec<&str> {
    artifacts.iter().map(|a| a.file_name.as_str()).collect()
}

// ── Splitting ────────────────────────────────────────────────────────────────

#[test]
fn three_page_example() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let backend = MemoryBackend::new(vec![
        Page::Text("TRIBUNAL\nProcesso: 1234567/23.ABC\nAutor: Fulano"),
        Page::Scanned,
        Page::Text("Ref. 7654321/22.XYZ conforme despacho"),
    ]);

    let output = process_pdf_with(&backend, &input, &out, &blank_ocr_config()).unwrap();
    let manifest = output.manifest();

    let names: Vec<&str> = manifest.iter().map(|(name, _, _)| *name).collect();
    assert_eq!(
        names,
        vec!["1234567/23.ABC", "SEM_PROCESSO_PAG_2", "7654321/22.XYZ"]
    );
    let paths: Vec<PathBuf> = manifest.iter().map(|(_, p, _)| p.to_path_buf()).collect();
    assert_eq!(
        paths,
        vec![
            out.join("1234567_23.ABC.pdf"),
            out.join("SEM_PROCESSO_PAG_2.pdf"),
            out.join("7654321_22.XYZ.pdf"),
        ]
    );
    for (_, path, size) in &manifest {
        assert!(*size > 0);
        assert_eq!(std::fs::metadata(path).unwrap().len(), *size);
    }

    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.identified_pages, 2);
    assert_eq!(output.stats.placeholder_pages, 1);
    assert_eq!(output.stats.degraded_pages, 0);
}

#[test]
fn collision_example() {
    let mut names = NameRegistry::default();
    assert_eq!(names.claim(&sanitize("999/23.A")), "999_23.A");
    assert_eq!(names.claim(&sanitize("999/23.A")), "999_23.A_2");
}

#[test]
fn repeated_identifier_gets_counter_suffix() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let backend = MemoryBackend::new(vec![
        Page::Text("Processo: 9999/23.A"),
        Page::Text("Processo: 9999/23.A"),
        Page::Text("nº 9999/23.A"),
    ]);
    let out = tmp.path().join("out");
    let output = process_pdf_with(&backend, &input, &out, &blank_ocr_config()).unwrap();
    assert_eq!(
        file_names(&output.artifacts),
        vec!["9999_23.A.pdf", "9999_23.A_2.pdf", "9999_23.A_3.pdf"]
    );
    assert!(output
        .artifacts
        .iter()
        .all(|a| a.logical_name == "9999/23.A"));
}

#[test]
fn placeholder_pages_stay_distinct() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let backend = MemoryBackend::new(vec![Page::Scanned, Page::Scanned, Page::Scanned]);

    let output = process_pdf_with(&backend, &input, &out, &blank_ocr_config()).unwrap();
    assert_eq!(
        file_names(&output.artifacts),
        vec![
            "SEM_PROCESSO_PAG_1.pdf",
            "SEM_PROCESSO_PAG_2.pdf",
            "SEM_PROCESSO_PAG_3.pdf"
        ]
    );
    assert!(output.artifacts.iter().all(|a| !a.identified));
}

#[test]
fn one_file_per_page_in_output_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let backend = MemoryBackend::new(vec![
        Page::Text("Processo: 1111/20.A"),
        Page::Text("Processo: 1111/20.A"),
        Page::Scanned,
        Page::Text("Processo: 2222/21.B-1"),
        Page::Text("nada aqui"),
    ]);

    let output = process_pdf_with(&backend, &input, &out, &blank_ocr_config()).unwrap();
    assert_eq!(output.artifacts.len(), 5);
    let pages: Vec<usize> = output.artifacts.iter().map(|a| a.page_num).collect();
    assert_eq!(pages, vec![1, 2, 3, 4, 5]);

    let stored = scan_output_dir(&out).unwrap();
    assert_eq!(stored.len(), 5);
    let mut expected: Vec<String> = output.artifacts.iter().map(|a| a.file_name.clone()).collect();
    expected.sort();
    let listed: Vec<String> = stored.iter().map(|f| f.file_name.clone()).collect();
    assert_eq!(listed, expected);
}

#[test]
fn file_names_use_sanitized_alphabet() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let backend = MemoryBackend::new(vec![Page::Text("Processo: 0001234-56.2023.8.26.0100")]);

    let output = process_pdf_with(&backend, &input, &out, &blank_ocr_config()).unwrap();
    let artifact = &output.artifacts[0];
    assert!(artifact
        .fs_name()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')));
    assert_eq!(artifact.path.parent().unwrap(), out.as_path());
}

#[test]
fn empty_document_gives_empty_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let backend = MemoryBackend::new(Vec::new());

    let output = process_pdf_with(&backend, &input, &out, &blank_ocr_config()).unwrap();
    assert!(output.artifacts.is_empty());
    assert!(scan_output_dir(&out).unwrap().is_empty());
}

// ── Text source and OCR fallback ─────────────────────────────────────────────

#[test]
fn ocr_only_runs_for_pages_without_text() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let ocr = Arc::new(CountingOcr {
        text: "PROCESSO N.º 4321/19.C",
        calls: AtomicUsize::new(0),
    });
    let backend = MemoryBackend::new(vec![
        Page::Text("Processo: 1234/23.A"),
        Page::Scanned,
    ]);

    let output = process_pdf_with(&backend, &input, &out, &config_with_ocr(ocr.clone())).unwrap();
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    assert_eq!(output.artifacts[0].text_source, TextSource::TextLayer);
    assert_eq!(output.artifacts[1].text_source, TextSource::Ocr);
    assert_eq!(output.artifacts[1].logical_name, "4321/19.C");
    assert_eq!(output.stats.ocr_pages, 1);
}

#[test]
fn ocr_disabled_gives_placeholder() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let config = SplitConfig::builder().ocr_enabled(false).build().unwrap();
    let backend = MemoryBackend::new(vec![Page::Scanned]);

    let output = process_pdf_with(&backend, &input, &out, &config).unwrap();
    assert_eq!(output.artifacts[0].logical_name, "SEM_PROCESSO_PAG_1");
    assert_eq!(output.artifacts[0].text_source, TextSource::None);
}

#[test]
fn degraded_page_is_recorded_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let backend = MemoryBackend::new(vec![
        Page::Text("Processo: 1234/23.A"),
        Page::Unreadable,
    ]);

    let output = process_pdf_with(&backend, &input, &out, &blank_ocr_config()).unwrap();
    let degraded = &output.artifacts[1];
    assert_eq!(degraded.logical_name, "SEM_PROCESSO_PAG_2");
    assert!(degraded.is_degraded());
    assert!(matches!(
        degraded.issues.as_slice(),
        [PageIssue::TextLayerUnavailable { page: 2, .. }]
    ));
    assert_eq!(output.stats.degraded_pages, 1);
    assert!(!output.artifacts[0].is_degraded());
}

#[test]
fn progress_events_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let out = tmp.path().join("out");
    let cb = Arc::new(RecordingCallback::default());
    let config = SplitConfig::builder()
        .ocr_engine(Arc::new(FixedTextOcr::empty()))
        .progress_callback(cb.clone())
        .build()
        .unwrap();
    let backend = MemoryBackend::new(vec![
        Page::Text("Processo: 1234/23.A"),
        Page::Unreadable,
    ]);

    process_pdf_with(&backend, &input, &out, &config).unwrap();
    let events = cb.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 2",
            "page 1234_23.A.pdf",
            "degraded 2",
            "page SEM_PROCESSO_PAG_2.pdf",
            "done 1/2",
        ]
    );
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[test]
fn missing_input_is_open_error() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = MemoryBackend::new(vec![Page::Scanned]);
    let err = process_pdf_with(
        &backend,
        &tmp.path().join("missing.pdf"),
        &tmp.path().join("out"),
        &blank_ocr_config(),
    )
    .unwrap_err();
    assert!(err.is_document_open_error());
}

#[test]
fn non_pdf_input_is_open_error() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("input.pdf");
    std::fs::write(&input, b"GIF89a....").unwrap();
    let backend = MemoryBackend::new(vec![Page::Scanned]);

    let err =
        process_pdf_with(&backend, &input, &tmp.path().join("out"), &blank_ocr_config()).unwrap_err();
    assert!(matches!(err, SplitError::NotAPdf { .. }));
}

#[test]
fn backend_open_failure_is_propagated() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let backend = MemoryBackend::refusing(|path| SplitError::PasswordRequired {
        path: path.to_path_buf(),
    });

    let err =
        process_pdf_with(&backend, &input, &tmp.path().join("out"), &blank_ocr_config()).unwrap_err();
    assert!(matches!(err, SplitError::PasswordRequired { .. }));
    assert!(err.is_document_open_error());
}

#[test]
fn unwritable_output_is_write_error() {
    let tmp = tempfile::tempdir().unwrap();
    let input = staged_input(tmp.path());
    let blocker = tmp.path().join("out");
    std::fs::write(&blocker, b"a file, not a directory").unwrap();
    let backend = MemoryBackend::new(vec![Page::Text("Processo: 1234/23.A")]);

    let err = process_pdf_with(&backend, &input, &blocker, &blank_ocr_config()).unwrap_err();
    assert!(err.is_write_error(), "got {err:?}");
}

// ── Jobs ─────────────────────────────────────────────────────────────────────

fn job_config(root: &Path) -> SplitConfig {
    SplitConfig::builder()
        .ocr_engine(Arc::new(FixedTextOcr::empty()))
        .uploads_root(root.join("uploads"))
        .outputs_root(root.join("outputs"))
        .max_upload_bytes(1024)
        .build()
        .unwrap()
}

#[test]
fn job_stages_input_and_keeps_dirs() {
    let tmp = tempfile::tempdir().unwrap();
    let config = job_config(tmp.path());
    let ids = SequentialJobIds::new("job-");
    let backend = MemoryBackend::new(vec![Page::Text("Processo: 1234/23.A")]);

    let report = run_job_with(&backend, &ids, b"%PDF-1.7\n%%EOF\n", &config).unwrap();
    assert_eq!(report.job.job_id, "job-1");
    assert_eq!(report.job.upload_dir, tmp.path().join("uploads/job-1"));
    assert_eq!(report.job.output_dir, tmp.path().join("outputs/job-1"));
    assert!(report.job.upload_dir.join("input.pdf").is_file());
    assert!(report
        .job
        .output_dir
        .join("1234_23.A.pdf")
        .is_file());
    assert_eq!(report.output.artifacts.len(), 1);
}

#[test]
fn failed_job_removes_its_dirs() {
    let tmp = tempfile::tempdir().unwrap();
    let config = job_config(tmp.path());
    let ids = SequentialJobIds::new("job-");
    let backend = MemoryBackend::new(vec![Page::Scanned]);

    let err = run_job_with(&backend, &ids, b"not a pdf at all", &config).unwrap_err();
    assert!(matches!(err, SplitError::NotAPdf { .. }));
    assert!(!tmp.path().join("uploads/job-1").exists());
    assert!(!tmp.path().join("outputs/job-1").exists());
}

#[test]
fn oversized_upload_is_rejected_before_allocation() {
    let tmp = tempfile::tempdir().unwrap();
    let config = job_config(tmp.path());
    let ids = SequentialJobIds::new("job-");
    let backend = MemoryBackend::new(vec![Page::Scanned]);
    let mut big = b"%PDF-1.7\n".to_vec();
    big.resize(2048, b' ');

    let err = run_job_with(&backend, &ids, &big, &config).unwrap_err();
    assert!(matches!(
        err,
        SplitError::InputTooLarge {
            size: 2048,
            max: 1024
        }
    ));
    assert!(!tmp.path().join("uploads").exists());
}

#[test]
fn concurrent_jobs_do_not_interfere() {
    let tmp = tempfile::tempdir().unwrap();
    let config = job_config(tmp.path());
    let ids = Arc::new(SequentialJobIds::new("j"));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let config = config.clone();
            let ids = Arc::clone(&ids);
            std::thread::spawn(move || {
                let backend = MemoryBackend::new(vec![
                    Page::Text("Processo: 5555/24.Z"),
                    Page::Text("Processo: 5555/24.Z"),
                ]);
                run_job_with(&backend, ids.as_ref(), b"%PDF-1.7\n", &config).unwrap()
            })
        })
        .collect();

    let mut job_ids = Vec::new();
    for handle in handles {
        let report = handle.join().unwrap();
        assert_eq!(
            file_names(&report.output.artifacts),
            vec!["5555_24.Z.pdf", "5555_24.Z_2.pdf"]
        );
        job_ids.push(report.job.job_id);
    }
    job_ids.sort();
    job_ids.dedup();
    assert_eq!(job_ids.len(), 4);
}
