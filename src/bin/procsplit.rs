//! CLI binary for procsplit.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SplitConfig`, runs one job and prints the manifest.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use procsplit::pipeline::input::{check_size, has_pdf_extension};
use procsplit::{
    job_output_dir, run_job, scan_output_dir, JobReport, PageArtifact, PageIssue, PatternPreset,
    ProgressCallback, SplitConfig, SplitProgressCallback,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// written page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    degraded: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_split_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            degraded: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Splitting");
        self.bar.reset_eta();
    }

    fn elapsed_ms(&self, page_num: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl SplitProgressCallback for CliProgressCallback {
    fn on_split_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Splitting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_degraded(&self, _total: usize, issue: &PageIssue) {
        self.degraded.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!("  {} {}", yellow("!"), dim(&truncate(&issue.to_string(), 100))));
    }

    fn on_page_complete(&self, total: usize, artifact: &PageArtifact) {
        let elapsed_ms = self.elapsed_ms(artifact.page_num);
        let mark = if artifact.identified {
            green("✓")
        } else {
            yellow("–")
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<40}  {}",
            mark,
            artifact.page_num,
            total,
            artifact.file_name,
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_split_complete(&self, total_pages: usize, identified_pages: usize) {
        self.bar.finish_and_clear();
        let placeholders = total_pages.saturating_sub(identified_pages);
        eprintln!(
            "{} {} pages split  ({} identified, {} placeholders, {} extraction warnings)",
            green("✔"),
            bold(&total_pages.to_string()),
            identified_pages,
            placeholders,
            self.degraded.load(Ordering::SeqCst),
        );
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars - 1).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split a batch, one PDF per page named by process number
  procsplit lote.pdf

  # Scanned batch with English pages too
  procsplit --lang por+eng --dpi 300 lote.pdf

  # Only accept labelled numbers ("Processo nº 1234/23.A")
  procsplit --patterns strict lote.pdf

  # Machine-readable manifest
  procsplit --json lote.pdf > manifest.json

  # List the files of an earlier job
  procsplit --list 3f2b6c1e-9a7d-4e0b-8f5a-2c1d0e9b7a64

PATTERN PRESETS:
  strict     labelled, then unlabelled NNNN/YY.X numbers
  legacy     CNJ numbers (NNNNNNN-DD.AAAA.J.TR.OOOO) and digit runs
  combined   strict first, legacy as a last resort (default)

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium
  RUST_LOG                Override log filter (e.g. procsplit=debug)

SETUP:
  pdfium must be installed, placed next to the executable, or named with
  --pdfium-lib / PDFIUM_LIB_PATH. OCR needs the `tesseract` executable and
  the traineddata for the chosen language (`por` by default).
"#;

/// Split a PDF into one file per page, named by process number.
#[derive(Parser, Debug)]
#[command(
    name = "procsplit",
    version,
    about = "Split a PDF into one file per page, named by the process number on each page",
    long_about = "Split a multi-page PDF into single-page PDFs. Each page is named after the \
process number found in its text layer, or via OCR for scanned pages. Pages without a number \
are kept under a SEM_PROCESSO_PAG_<n> placeholder name.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file to split.
    #[arg(required_unless_present = "list")]
    input: Option<PathBuf>,

    /// Directory under which each job's upload directory is created.
    #[arg(long, env = "PROCSPLIT_UPLOADS_ROOT", default_value = "uploads")]
    uploads_root: PathBuf,

    /// Directory under which each job's output directory is created.
    #[arg(long, env = "PROCSPLIT_OUTPUTS_ROOT", default_value = "outputs")]
    outputs_root: PathBuf,

    /// Tesseract language(s) for OCR, e.g. por or por+eng.
    #[arg(long, env = "PROCSPLIT_LANG", default_value = "por")]
    lang: String,

    /// Rendering DPI for OCR (72–600).
    #[arg(long, env = "PROCSPLIT_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Identifier patterns: strict, legacy, combined.
    #[arg(long, env = "PROCSPLIT_PATTERNS", value_enum, default_value = "combined")]
    patterns: PatternArg,

    /// Never OCR; pages without a text layer get placeholder names.
    #[arg(long, env = "PROCSPLIT_NO_OCR")]
    no_ocr: bool,

    /// Path or name of the tesseract executable.
    #[arg(long, env = "PROCSPLIT_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PROCSPLIT_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PROCSPLIT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Largest accepted input in MiB.
    #[arg(long, env = "PROCSPLIT_MAX_MB", default_value_t = 20,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_mb: u64,

    /// Output the job report as JSON instead of a table.
    #[arg(long, env = "PROCSPLIT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PROCSPLIT_NO_PROGRESS")]
    no_progress: bool,

    /// List the PDFs of an existing job instead of splitting.
    #[arg(long, value_name = "JOB_ID", conflicts_with = "input")]
    list: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PROCSPLIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PROCSPLIT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    Strict,
    Legacy,
    Combined,
}

impl From<PatternArg> for PatternPreset {
    fn from(v: PatternArg) -> Self {
        match v {
            PatternArg::Strict => PatternPreset::Strict,
            PatternArg::Legacy => PatternPreset::Legacy,
            PatternArg::Combined => PatternPreset::Combined,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.list.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List mode ────────────────────────────────────────────────────────
    if let Some(ref job_id) = cli.list {
        return list_job(&cli, job_id);
    }

    let input = cli
        .input
        .clone()
        .context("An input PDF is required unless --list is given")?;
    if !has_pdf_extension(&input) {
        anyhow::bail!("Only .pdf files are accepted (got {})", input.display());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn SplitProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let size = tokio::fs::metadata(&input)
        .await
        .with_context(|| format!("Cannot read {}", input.display()))?
        .len();
    check_size(size, config.max_upload_bytes)?;
    let bytes = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    // ── Run job ──────────────────────────────────────────────────────────
    let report = tokio::task::spawn_blocking(move || run_job(&bytes, &config))
        .await
        .context("Split task panicked")?
        .context("Split failed")?;

    print_report(&cli, &report)
}

/// Map CLI args to `SplitConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
) -> Result<SplitConfig> {
    let mut builder = SplitConfig::builder()
        .ocr_language(cli.lang.clone())
        .ocr_enabled(!cli.no_ocr)
        .tesseract_binary(cli.tesseract.clone())
        .dpi(cli.dpi)
        .patterns(cli.patterns.into())
        .uploads_root(cli.uploads_root.clone())
        .outputs_root(cli.outputs_root.clone())
        .max_upload_mib(cli.max_mb);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_report(cli: &Cli, report: &JobReport) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    for artifact in &report.output.artifacts {
        println!(
            "{:<40}  {:>9}  {}",
            artifact.file_name,
            artifact.size_bytes,
            if artifact.identified {
                artifact.logical_name.clone()
            } else {
                dim(&artifact.logical_name)
            }
        );
    }

    if !cli.quiet {
        let stats = &report.output.stats;
        eprintln!(
            "{}  job {}  {} pages  {}ms  →  {}",
            if stats.degraded_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&report.job.job_id),
            stats.total_pages,
            stats.total_duration_ms,
            bold(&report.job.output_dir.display().to_string()),
        );
    }
    Ok(())
}

fn list_job(cli: &Cli, job_id: &str) -> Result<()> {
    let dir = job_output_dir(&cli.outputs_root, job_id)?;
    let files = scan_output_dir(&dir).with_context(|| format!("Cannot list job {job_id}"))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&files).context("Failed to serialise listing")?;
        println!("{json}");
    } else {
        for file in &files {
            println!("{:<40}  {:>9}", file.file_name, file.size_bytes);
        }
        if !cli.quiet {
            eprintln!("{} files in {}", files.len(), dir.display());
        }
    }
    Ok(())
}
