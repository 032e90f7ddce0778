//! pagerkit-report - render a rolling 30-day incident analytics report.
//!
//! Fetches every incident created in the window, enriches each with its
//! first-acknowledgement event, aggregates, and writes a self-contained HTML
//! document into the output directory.

use std::path::PathBuf;
use std::process::Command;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pagerkit::analytics::summarize;
use pagerkit::api::ApiClient;
use pagerkit::collect::{enrich_acknowledgments, fetch_incidents};
use pagerkit::config::ApiConfig;
use pagerkit::report::{REPORT_FILE_NAME, render_report};

/// Size of the report window in days.
const WINDOW_DAYS: i64 = 30;

#[derive(Debug, Parser)]
#[command(name = "pagerkit-report", about = "Generate an incident analytics report")]
struct Args {
    /// API token (falls back to PAGERKIT_API_TOKEN).
    #[arg(long)]
    token: Option<String>,

    /// Directory the report file is written into.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("pagerkit=info".parse()?))
        .init();

    let args = Args::parse();
    let config = ApiConfig::resolve(args.token.clone())?;
    let client = ApiClient::new(config);

    let until = Utc::now();
    let since = until - Duration::days(WINDOW_DAYS);
    info!(%since, %until, "fetching incident window");

    let mut incidents = fetch_incidents(&client, since, until).await;
    if incidents.is_empty() {
        warn!("no incidents found in the report window; nothing to report");
        std::process::exit(1);
    }

    enrich_acknowledgments(&client, &mut incidents).await;

    let summary = summarize(&incidents);
    let range_label = format!(
        "{} to {} ({} incidents)",
        since.format("%Y-%m-%d"),
        until.format("%Y-%m-%d"),
        summary.total_incidents
    );
    let html = render_report(&summary, "Incident Analytics Report", &range_label);

    let path = args.output_dir.join(REPORT_FILE_NAME);
    std::fs::write(&path, html)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    info!(path = %path.display(), "report written");

    if open_in_viewer(&path) {
        println!("Report opened: {}", path.display());
    } else {
        println!("Report written to: {}", path.display());
    }
    Ok(())
}

/// Best-effort launch of the platform's default viewer.
fn open_in_viewer(path: &std::path::Path) -> bool {
    let launcher = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };

    Command::new(launcher)
        .arg(path)
        .spawn()
        .map(|_| true)
        .unwrap_or(false)
}
