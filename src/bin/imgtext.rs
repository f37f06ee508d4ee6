//! CLI binary for imgtext.
//!
//! A thin shim over the library crate: stage a local image on a running
//! extraction server, print the extracted text, optionally download the
//! server-rendered exports, then clean up.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use imgtext::{
    Action, CameraDevice, ExportKind, HttpArtifactClient, ImageFile, MediaStream, Notification,
    NotificationSink, Preview, Severity, TextStats, Url, VideoConstraints, WorkflowConfig,
    WorkflowController, WorkflowError, WorkflowView,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── Terminal front end ───────────────────────────────────────────────────────

/// Renders controller commands on stderr: a spinner while a request is in
/// flight and one line per notification.
struct Terminal {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl Terminal {
    fn new(show_progress: bool, quiet: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar
        });
        Arc::new(Self { bar, quiet })
    }

    fn line(&self, msg: String) {
        match &self.bar {
            Some(bar) => bar.println(msg),
            None => eprintln!("{msg}"),
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl WorkflowView for Terminal {
    fn show_preview(&self, preview: Preview<'_>) {
        if let Preview::Remote(url) = preview {
            tracing::debug!("Preview at {}", url);
        }
    }

    fn set_busy(&self, action: Action, busy: bool) {
        let Some(bar) = &self.bar else { return };
        if busy {
            let msg = match action {
                Action::Upload => "Uploading image…",
                Action::Convert => "Extracting text…",
                Action::Capture => "Submitting capture…",
            };
            bar.set_message(msg);
            bar.enable_steady_tick(Duration::from_millis(80));
        } else {
            bar.disable_steady_tick();
            bar.set_message("");
        }
    }

    fn open_export(&self, kind: ExportKind, url: &Url) {
        if !self.quiet {
            self.line(format!("  {} {} export  {}", dim("→"), kind, dim(url.as_str())));
        }
    }
}

impl NotificationSink for Terminal {
    fn notify(&self, notification: &Notification) {
        let msg = &notification.message;
        match notification.severity {
            Severity::Error => self.line(format!("{} {}", red("✗"), red(msg))),
            _ if self.quiet => {}
            Severity::Warning => self.line(format!("{} {}", yellow("⚠"), msg)),
            Severity::Success => self.line(format!("{} {}", green("✔"), msg)),
        }
    }
}

/// Terminals have no camera stream to hand out.
struct NoCamera;

#[async_trait]
impl CameraDevice for NoCamera {
    async fn open(
        &self,
        _constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, WorkflowError> {
        Err(WorkflowError::DeviceUnavailable {
            detail: "camera capture is not supported from the command line".into(),
        })
    }
}

// ── Arguments ────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract text (stdout)
  imgtext receipt.png

  # Against a remote server, with all exports saved to ./out
  imgtext --server https://ocr.example.com --export pdf,json,xml -o out scan.jpg

  # JSON report with text statistics
  imgtext --json photo.png > report.json

  # Leave the uploaded file on the server
  imgtext --keep photo.png

ENVIRONMENT VARIABLES:
  IMGTEXT_SERVER     Server root URL (default http://127.0.0.1:5000)
  IMGTEXT_OUT_DIR    Directory for downloaded exports
  IMGTEXT_TIMEOUT    Per-request timeout in seconds
  RUST_LOG           Overrides the log filter
"#;

/// Extract text from an image through an image-to-text server.
#[derive(Parser, Debug)]
#[command(
    name = "imgtext",
    version,
    about = "Extract text from an image through an image-to-text server",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file to upload.
    input: PathBuf,

    /// Server root URL.
    #[arg(long, env = "IMGTEXT_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Exports to download: pdf, json, xml (comma-separated).
    #[arg(short, long, value_enum, value_delimiter = ',')]
    export: Vec<ExportArg>,

    /// Directory for downloaded exports.
    #[arg(short = 'o', long, env = "IMGTEXT_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Skip the server cleanup at the end.
    #[arg(long)]
    keep: bool,

    /// Print a JSON report instead of the bare text.
    #[arg(long)]
    json: bool,

    /// Per-request timeout in seconds (default: none).
    #[arg(long, env = "IMGTEXT_TIMEOUT")]
    timeout: Option<u64>,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportArg {
    Pdf,
    Json,
    Xml,
}

impl From<ExportArg> for ExportKind {
    fn from(v: ExportArg) -> Self {
        match v {
            ExportArg::Pdf => ExportKind::Pdf,
            ExportArg::Json => ExportKind::Json,
            ExportArg::Xml => ExportKind::Xml,
        }
    }
}

#[derive(Serialize)]
struct Report {
    filename: String,
    text: String,
    stats: TextStats,
    exports: Vec<SavedExport>,
}

#[derive(Serialize)]
struct SavedExport {
    kind: ExportKind,
    url: String,
    path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and notification lines carry the user-facing feedback;
    // library logs stay at WARN unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build controller ─────────────────────────────────────────────────
    let mut builder = WorkflowConfig::builder()
        .base_url(cli.server.clone())
        .notification_dismiss_ms(None);
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    let config = builder.build().context("Invalid configuration")?;

    let client =
        Arc::new(HttpArtifactClient::new(&config).context("Failed to build HTTP client")?);
    tracing::debug!("Using server {}", client.base_url());
    let terminal = Terminal::new(show_progress, cli.quiet);
    let controller = WorkflowController::new(config, client.clone(), Arc::new(NoCamera))
        .with_view(terminal.clone())
        .with_notifications(terminal.clone());

    // ── Run, then always clean up ────────────────────────────────────────
    let outcome = run(&cli, &controller, &client).await;
    if !cli.keep {
        controller.clear().await;
    }
    terminal.finish();
    let report = outcome?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else {
        println!("{}", report.text);
        if !cli.quiet {
            eprintln!(
                "{}",
                dim(&format!(
                    "{} chars · {} words · {} lines  ({})",
                    report.stats.character_count,
                    report.stats.word_count,
                    report.stats.line_count,
                    report.filename
                ))
            );
            for saved in &report.exports {
                eprintln!("{} {}", green("✔"), bold(&saved.path.display().to_string()));
            }
        }
    }

    Ok(())
}

async fn run(
    cli: &Cli,
    controller: &WorkflowController,
    client: &HttpArtifactClient,
) -> Result<Report> {
    let file = ImageFile::from_path(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let filename = controller.select_file(file).await.context("Upload failed")?;
    let text = controller.convert().await.context("Text extraction failed")?;

    let mut kinds: Vec<ExportKind> = Vec::new();
    for kind in cli.export.iter().copied().map(ExportKind::from) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    let mut exports = Vec::new();
    if !kinds.is_empty() {
        tokio::fs::create_dir_all(&cli.out_dir)
            .await
            .with_context(|| format!("Failed to create {}", cli.out_dir.display()))?;
        for kind in kinds {
            let url = controller
                .export(kind)
                .with_context(|| format!("Cannot export {kind}"))?;
            let path = cli.out_dir.join(kind.download_name(&filename));
            let bytes = client
                .fetch_export(kind, &filename)
                .await
                .with_context(|| format!("Failed to download {url}"))?;
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            exports.push(SavedExport {
                kind,
                url: url.to_string(),
                path,
            });
        }
    }

    Ok(Report {
        stats: TextStats::from_text(&text),
        filename,
        text,
        exports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_list() {
        let cli = Cli::try_parse_from(["imgtext", "--export", "pdf,xml", "a.png"]).unwrap();
        assert_eq!(cli.export, vec![ExportArg::Pdf, ExportArg::Xml]);
        assert_eq!(cli.input, PathBuf::from("a.png"));
        assert!(!cli.keep);
    }

    #[test]
    fn rejects_unknown_export() {
        assert!(Cli::try_parse_from(["imgtext", "--export", "docx", "a.png"]).is_err());
    }

    #[test]
    fn export_arg_maps_to_kind() {
        assert_eq!(ExportKind::from(ExportArg::Json), ExportKind::Json);
    }
}
