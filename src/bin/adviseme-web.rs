//! Web server binary for adviseme: serves the upload form.

use adviseme::web::{serve, WebConfig};
use adviseme::{Advisor, AdvisorConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Serve the AdviseMe upload form.
///
/// The advisor itself is configured from the environment (POE_API_KEY,
/// ADVISEME_MODEL, ADVISEME_BASE_URL, ADVISEME_TIMEOUT_SECS,
/// ADVISEME_MAX_RETRIES); a .env file is loaded first.
#[derive(Parser, Debug)]
#[command(name = "adviseme-web", version, about = "Serve the AdviseMe upload form")]
struct Cli {
    /// Listen address. Overrides ADVISEME_BIND.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Maximum multipart body size in bytes. Overrides ADVISEME_MAX_UPLOAD_BYTES.
    #[arg(long)]
    max_upload_bytes: Option<usize>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ADVISEME_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else {
        "info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let config = AdvisorConfig::from_env().context("Invalid advisor configuration")?;
    let mut web = WebConfig::from_env().context("Invalid web configuration")?;
    if let Some(bind) = cli.bind {
        web.bind = bind;
    }
    if let Some(max) = cli.max_upload_bytes {
        web.max_upload_bytes = max;
    }

    if web.gate.is_open() {
        tracing::warn!("No login configured; anyone who can reach {} can use the form", web.bind);
    }

    let advisor = Advisor::new(&config).context("Failed to create advisor")?;
    tracing::info!(?config, "Advisor ready");

    serve(Arc::new(advisor), web).await.context("Server failed")
}
