//! pagerkit-event - create a new incident via the event ingestion webhook.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pagerkit::events::{EventsClient, Severity, TriggerEvent};

#[derive(Debug, Parser)]
#[command(name = "pagerkit-event", about = "Create an incident via event ingestion")]
struct Args {
    /// Ingestion routing key.
    #[arg(long, env = "PAGERKIT_ROUTING_KEY")]
    routing_key: String,

    /// Incident summary (becomes the title).
    #[arg(long)]
    summary: String,

    /// Event severity.
    #[arg(long, value_enum, default_value_t = Severity::Error)]
    severity: Severity,

    /// Source label; defaults to the local host name.
    #[arg(long)]
    source: Option<String>,

    /// Custom detail entries as key=value, repeatable.
    #[arg(long = "detail", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    details: Vec<(String, String)>,

    /// Deduplication key; generated when absent.
    #[arg(long)]
    dedup_key: Option<String>,

    /// Component label.
    #[arg(long, default_value = "pagerkit")]
    component: String,

    /// Group label.
    #[arg(long, default_value = "soc")]
    group: String,

    /// Event timestamp override (RFC 3339).
    #[arg(long)]
    timestamp: Option<DateTime<Utc>>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("'{raw}' is not a key=value pair"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("pagerkit=info".parse()?))
        .init();

    let args = Args::parse();

    let mut event = TriggerEvent::new(&args.summary);
    event.severity = args.severity;
    if let Some(source) = args.source {
        event.source = source;
    }
    if let Some(dedup_key) = args.dedup_key {
        event.dedup_key = dedup_key;
    }
    if let Some(timestamp) = args.timestamp {
        event.timestamp = timestamp;
    }
    event.component = args.component;
    event.group = args.group;
    for (key, value) in &args.details {
        event = event.with_detail(key, value);
    }

    let client = EventsClient::new(&args.routing_key);
    let response = client
        .trigger(&event)
        .await
        .context("event submission failed")?;

    let dedup_key = response.dedup_key.unwrap_or(event.dedup_key);
    info!(status = %response.status, dedup_key = %dedup_key, "event accepted");
    println!("Incident event accepted (dedup key: {dedup_key})");
    Ok(())
}
