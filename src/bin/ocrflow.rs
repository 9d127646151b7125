//! CLI binary for ocrflow.
//!
//! A thin driver over the library crate: it walks the wizard through
//! upload → page selection → OCR against a backend URL and prints or
//! saves the result. UI callbacks are rendered as terminal output.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocrflow::{
    ApiAction,
    ClipboardSink, DownloadFormat, ErrorSlot, HttpDocumentService, PageRange, RangeField,
    ResultView, Screen, WizardConfig, WizardController, WizardError, WizardObserver,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── Terminal observer ────────────────────────────────────────────────────────

/// Renders wizard callbacks as terminal output: a spinner while a request
/// is in flight, red inline errors, dim status lines, and thumbnail files
/// when a directory was given.
struct CliObserver {
    quiet: bool,
    thumbnails_dir: Option<PathBuf>,
    /// The spinner for the currently in-flight request, if any.
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliObserver {
    fn new(quiet: bool, thumbnails_dir: Option<PathBuf>) -> Self {
        Self {
            quiet,
            thumbnails_dir,
            spinner: Mutex::new(None),
        }
    }

    fn println(&self, line: String) {
        if self.quiet {
            return;
        }
        match self.spinner.lock().unwrap().as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl WizardObserver for CliObserver {
    fn on_screen_changed(&self, screen: Screen) {
        let name = match screen {
            Screen::Upload => "Upload",
            Screen::Preview => "Preview",
            Screen::Results => "Results",
        };
        self.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Step {}/3 — {name}", screen.step()))
        ));
    }

    fn on_action_started(&self, action: ApiAction) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(match action {
            ApiAction::Upload => "Uploading…",
            ApiAction::Ocr => "Running OCR…",
            _ => "Working…",
        });
        bar.enable_steady_tick(Duration::from_millis(80));
        *self.spinner.lock().unwrap() = Some(bar);
    }

    fn on_action_finished(&self, _action: ApiAction) {
        if let Some(bar) = self.spinner.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }

    fn on_error(&self, _slot: ErrorSlot, message: &str) {
        // errors print even in quiet mode
        match self.spinner.lock().unwrap().as_ref() {
            Some(bar) => bar.println(format!("{} {}", red("✗"), red(message))),
            None => eprintln!("{} {}", red("✗"), red(message)),
        }
    }

    fn on_page_count_label(&self, label: &str) {
        self.println(format!("  {}", dim(label)));
    }

    fn on_ranges_changed(&self, ranges: &[PageRange]) {
        if ranges.is_empty() {
            return;
        }
        let rendered: Vec<String> = ranges
            .iter()
            .map(|r| format!("{}–{}", r.start, r.end))
            .collect();
        self.println(format!("  {}", dim(&format!("頁數範圍: {}", rendered.join(", ")))));
    }

    fn on_thumbnail_loaded(&self, page: u32, image: &[u8]) {
        let Some(dir) = &self.thumbnails_dir else {
            return;
        };
        let path = dir.join(format!("page-{page}.png"));
        match std::fs::write(&path, image) {
            Ok(()) => self.println(format!("  {}", dim(&format!("↓ {}", path.display())))),
            Err(e) => self.println(format!("{} thumbnail page {page}: {e}", red("✗"))),
        }
    }

    fn on_result_summary(&self, label: &str) {
        self.println(format!("{} {}", green("✓"), bold(label)));
    }

    fn on_copy_succeeded(&self) {
        self.println(format!("{} 已複製", green("✓")));
    }

    fn on_alert(&self, message: &str) {
        eprintln!("{} {}", red("!"), message);
    }
}

// ── Clipboard via arboard ────────────────────────────────────────────────────

/// System-clipboard sink. A fresh `arboard::Clipboard` per call keeps the
/// sink stateless (and `Send + Sync`); any failure surfaces as the
/// product's clipboard error and becomes an alert.
struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy_text(&self, text: &str) -> Result<(), WizardError> {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
            .map_err(|_| WizardError::ClipboardUnavailable)
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR a whole document, print raw Markdown to stdout
  ocrflow scan.pdf

  # Specific page ranges, write Markdown to a file
  ocrflow --pages 1-5,8-10 report.pdf -o report.md

  # Single image (page selection does not apply)
  ocrflow receipt.jpg

  # Save the backend-rendered download next to your files
  ocrflow contract.pdf --download md --download-dir ~/Documents

  # Rendered HTML view, plus preview thumbnails saved locally
  ocrflow --view rendered --thumbnails-dir ./thumbs book.pdf

  # JSON output for scripting
  ocrflow scan.pdf --json > result.json

SUPPORTED INPUT:
  PDF, JPG, JPEG, PNG — up to 25 MB (checked locally before upload).

ENVIRONMENT VARIABLES:
  OCRFLOW_SERVER     Backend base URL (default: http://127.0.0.1:8000)
  OCRFLOW_PAGES      Default page selection
  OCRFLOW_TIMEOUT    Per-request timeout in seconds (default: none)
"#;

/// Upload a document to an OCR backend, select pages, and fetch results.
#[derive(Parser, Debug)]
#[command(
    name = "ocrflow",
    version,
    about = "Document OCR wizard: upload a PDF or image, run server-side OCR, get Markdown",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF or image file to upload.
    input: PathBuf,

    /// OCR backend base URL.
    #[arg(short, long, env = "OCRFLOW_SERVER", default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Page selection for PDFs: 3, 1-5, or 1-5,8-10. Default: whole document.
    #[arg(long, env = "OCRFLOW_PAGES")]
    pages: Option<String>,

    /// Result view to print: rendered (HTML), raw (Markdown), txt.
    #[arg(long, value_enum, default_value = "raw")]
    view: ViewArg,

    /// Write the printed view to this file instead of stdout.
    #[arg(short, long, env = "OCRFLOW_OUTPUT")]
    output: Option<PathBuf>,

    /// Also save the backend-rendered download: md or txt.
    #[arg(long, value_enum)]
    download: Option<DownloadArg>,

    /// Directory for downloaded files.
    #[arg(long, default_value = ".")]
    download_dir: PathBuf,

    /// Save every preview thumbnail into this directory before OCR.
    #[arg(long)]
    thumbnails_dir: Option<PathBuf>,

    /// Copy the raw Markdown to the system clipboard after OCR.
    #[arg(long)]
    copy: bool,

    /// Print the OCR result as JSON instead of a view.
    #[arg(long)]
    json: bool,

    /// Per-request timeout in seconds. Default: none (OCR can take minutes).
    #[arg(long, env = "OCRFLOW_TIMEOUT")]
    timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCRFLOW_VERBOSE")]
    verbose: bool,

    /// Suppress status output (the printed view and errors still appear).
    #[arg(short, long, env = "OCRFLOW_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ViewArg {
    Rendered,
    Raw,
    Txt,
}

impl From<ViewArg> for ResultView {
    fn from(v: ViewArg) -> Self {
        match v {
            ViewArg::Rendered => ResultView::Rendered,
            ViewArg::Raw => ResultView::Raw,
            ViewArg::Txt => ResultView::PlainText,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DownloadArg {
    Md,
    Txt,
}

impl From<DownloadArg> for DownloadFormat {
    fn from(v: DownloadArg) -> Self {
        match v {
            DownloadArg::Md => DownloadFormat::Markdown,
            DownloadArg::Txt => DownloadFormat::PlainText,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The observer provides all the feedback that matters to the user;
    // library logs stay quiet unless --verbose.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build the wizard ─────────────────────────────────────────────────
    let mut builder = WizardConfig::builder().base_url(&cli.server);
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    let config = builder.build().context("Invalid configuration")?;

    let service = Arc::new(HttpDocumentService::new(&config).context("HTTP client")?);
    let observer = Arc::new(CliObserver::new(cli.quiet, cli.thumbnails_dir.clone()));

    let mut wizard = WizardController::new(config, service)
        .with_observer(observer as Arc<dyn WizardObserver>)
        .with_clipboard(Arc::new(SystemClipboard));

    // ── Upload ───────────────────────────────────────────────────────────
    wizard.upload_file(&cli.input).await?;
    let is_image = wizard.session().is_image();

    // ── Preview: thumbnails + page selection ─────────────────────────────
    if let Some(dir) = &cli.thumbnails_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let count = wizard.prefetch_thumbnails().await;
        if !cli.quiet {
            eprintln!("{} {count} thumbnails saved to {}", green("✓"), dir.display());
        }
    }

    if let Some(spec) = &cli.pages {
        if is_image {
            if !cli.quiet {
                eprintln!("{}", dim("image document — page selection ignored"));
            }
        } else {
            apply_page_selection(&mut wizard, spec)?;
        }
    }

    // ── OCR ──────────────────────────────────────────────────────────────
    // Image uploads go straight to OCR; no page selection applies.
    wizard.run_ocr().await?;

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let result = wizard
            .session()
            .result
            .as_ref()
            .context("OCR produced no result")?;
        println!(
            "{}",
            serde_json::to_string_pretty(result).context("Failed to serialise result")?
        );
    } else {
        wizard.switch_view(cli.view.into())?;
        let content = wizard
            .panels()
            .context("OCR produced no result")?
            .active_content()
            .to_string();

        if let Some(path) = &cli.output {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
            }
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
            if !content.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    // ── Download ─────────────────────────────────────────────────────────
    if let Some(fmt) = cli.download {
        let format: DownloadFormat = fmt.into();
        let bytes = wizard.download(format).await?;
        // the backend names downloads after the uploaded file's stem
        let stem = cli
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "result".to_string());
        let path = cli
            .download_dir
            .join(format!("{stem}.{}", format.as_str()));
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("{} bytes", bytes.len()))
            );
        }
    }

    // ── Clipboard ────────────────────────────────────────────────────────
    if cli.copy {
        // failure already alerted through the observer; the run still counts
        let _ = wizard.copy_markdown();
    }

    Ok(())
}

/// Replace the default whole-document range with the ranges from a
/// `--pages` spec like `3`, `1-5`, or `1-5,8-10`.
///
/// Only the shape is parsed here; ordering and bounds are the wizard's
/// submission-time validation, so `--pages 9-2` fails with the same
/// message the UI would show.
fn apply_page_selection(wizard: &mut WizardController, spec: &str) -> Result<()> {
    let mut parsed: Vec<(u32, u32)> = Vec::new();
    for segment in spec.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            bail!("Empty segment in --pages '{spec}'");
        }
        let (start, end) = match segment.split_once('-') {
            Some((a, b)) => (
                a.trim()
                    .parse::<u32>()
                    .with_context(|| format!("Invalid start page in '{segment}'"))?,
                b.trim()
                    .parse::<u32>()
                    .with_context(|| format!("Invalid end page in '{segment}'"))?,
            ),
            None => {
                let page = segment
                    .parse::<u32>()
                    .with_context(|| format!("Invalid page number '{segment}'"))?;
                (page, page)
            }
        };
        parsed.push((start, end));
    }

    // drop the default range, then build the list through the editor
    wizard.remove_range(0);
    for (i, (start, end)) in parsed.into_iter().enumerate() {
        wizard.add_range();
        wizard.set_range_field(i, RangeField::Start, &start.to_string());
        wizard.set_range_field(i, RangeField::End, &end.to_string());
    }
    Ok(())
}
