//! CLI binary for adviseme.
//!
//! A thin shim over the library crate: reads the two PDFs from disk, maps
//! flags to `AdvisorConfig`, streams the advice to stdout.

use adviseme::{
    AdviceProgressCallback, Advisor, AdvisorConfig, DocumentSlot, Render, TerminalRenderer,
    UploadedDocument,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
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
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Shows a spinner until the first streamed fragment arrives, then writes
/// fragments straight to stdout.
struct CliProgressCallback {
    /// `None` when progress output is disabled.
    bar: Option<ProgressBar>,
    /// Set once the first fragment has been written.
    streamed: AtomicBool,
}

impl CliProgressCallback {
    fn new(show_spinner: bool) -> Arc<Self> {
        let bar = show_spinner.then(|| {
            let bar = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Preparing");
            bar.set_message("Reading documents…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });

        Arc::new(Self {
            bar,
            streamed: AtomicBool::new(false),
        })
    }

    fn clear_bar(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl AdviceProgressCallback for CliProgressCallback {
    fn on_processing_start(&self, progress_name: &str, schedule_name: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_prefix("Analyzing");
            bar.set_message(format!("{progress_name} + {schedule_name}"));
        }
    }

    fn on_retry(&self, attempt: u32, max_retries: u32, backoff_ms: u64) {
        if let Some(ref bar) = self.bar {
            bar.println(format!(
                "  {} connection failed, retry {attempt}/{max_retries} in {backoff_ms}ms",
                cyan("⚠")
            ));
        }
    }

    fn on_fragment(&self, text: &str) {
        if !self.streamed.swap(true, Ordering::SeqCst) {
            self.clear_bar();
        }
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(text.as_bytes()).ok();
        handle.flush().ok();
    }

    fn on_processing_complete(&self, success: bool) {
        self.clear_bar();
        if self.streamed.load(Ordering::SeqCst) {
            println!();
        }
        if self.bar.is_some() && success {
            eprintln!("{} {}", green("✔"), dim("Analysis complete"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Use the default filenames in the current directory
  adviseme

  # Explicit files
  adviseme --progress transcript.pdf --schedule "Class_Schedule SPRING 2026.pdf"

  # Wait for the whole answer instead of streaming it
  adviseme --no-stream > advice.txt

  # Another model on another OpenAI-compatible endpoint
  adviseme --base-url https://api.openai.com/v1 --model gpt-4o

ENVIRONMENT VARIABLES:
  POE_API_KEY             API key for the chat-completion endpoint
  ADVISEME_BASE_URL       Endpoint base URL (default https://api.poe.com/v1)
  ADVISEME_MODEL          Model identifier (default Claude-Sonnet-4)
  ADVISEME_TIMEOUT_SECS   Whole-request timeout (default 300)
  ADVISEME_MAX_RETRIES    Retries after connection failures (default 0)

  A .env file in the current directory is loaded first.
"#;

/// Generate an academic advising email from a progress report and a course schedule.
#[derive(Parser, Debug)]
#[command(
    name = "adviseme",
    version,
    about = "Generate an academic advising email from a progress report and a course schedule",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Student academic progress PDF.
    #[arg(long, env = "ADVISEME_PROGRESS", default_value = DocumentSlot::Progress.default_path())]
    progress: PathBuf,

    /// Semester course schedule PDF.
    #[arg(long, env = "ADVISEME_SCHEDULE", default_value = DocumentSlot::Schedule.default_path())]
    schedule: PathBuf,

    /// API key for the chat-completion endpoint.
    #[arg(long, env = "POE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Endpoint base URL; `/chat/completions` is appended.
    #[arg(long, env = "ADVISEME_BASE_URL", default_value = adviseme::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Model identifier.
    #[arg(long, env = "ADVISEME_MODEL", default_value = adviseme::config::DEFAULT_MODEL)]
    model: String,

    /// Path to a text file containing a custom advisor prompt.
    #[arg(long, env = "ADVISEME_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "ADVISEME_TIMEOUT_SECS", default_value_t = 300)]
    timeout: u64,

    /// Retries after connection-level failures.
    #[arg(long, env = "ADVISEME_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Wait for the complete answer instead of streaming it.
    #[arg(long)]
    no_stream: bool,

    /// Disable the spinner.
    #[arg(long, env = "ADVISEME_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ADVISEME_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the advice and errors.
    #[arg(short, long, env = "ADVISEME_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides all the feedback that matters; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Intake ───────────────────────────────────────────────────────────
    // A missing file is fatal here: nothing is sent.
    let progress = match UploadedDocument::from_path(DocumentSlot::Progress, &cli.progress).await {
        Ok(doc) => doc,
        Err(e) => return Ok(fail(&e.to_string())),
    };
    let schedule = match UploadedDocument::from_path(DocumentSlot::Schedule, &cli.schedule).await {
        Ok(doc) => doc,
        Err(e) => return Ok(fail(&e.to_string())),
    };

    // ── Build advisor ────────────────────────────────────────────────────
    let config = build_config(&cli).await?;
    let streaming = !cli.no_stream;
    let callback = CliProgressCallback::new(show_progress);
    let advisor = match Advisor::new(&config) {
        Ok(a) => a.with_progress(callback).streaming(streaming),
        Err(e) => return Ok(fail(&e.to_string())),
    };

    if !cli.quiet {
        eprintln!(
            "{} Analyzing student's academic progress and generating course recommendations...\n",
            cyan("◆")
        );
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let state = advisor.advise(Some(&progress), Some(&schedule)).await;
    let out = TerminalRenderer {
        echo_advice: !streaming,
    }
    .render(&state);

    if !out.stdout.is_empty() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(out.stdout.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if out.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(fail(&out.stderr))
    }
}

/// Print a diagnostic and pick the failure exit code.
fn fail(message: &str) -> ExitCode {
    eprintln!("{} {}", red("Error:"), message);
    ExitCode::FAILURE
}

/// Map CLI args to `AdvisorConfig`.
async fn build_config(cli: &Cli) -> Result<AdvisorConfig> {
    let mut builder = AdvisorConfig::builder()
        .base_url(cli.base_url.clone())
        .model(cli.model.clone())
        .request_timeout_secs(cli.timeout)
        .max_retries(cli.max_retries);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt.trim().to_string());
    }

    builder.build().context("Invalid configuration")
}
