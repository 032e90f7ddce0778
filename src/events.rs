//! Client for the event ingestion webhook.
//!
//! Incident creation goes through a separate ingestion endpoint keyed by a
//! routing key, not the REST API token. The payload builder fills defaults
//! for everything the operator leaves out: severity, source host,
//! component/group labels, and a generated deduplication key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DEFAULT_EVENTS_URL;
use crate::error::ApiError;

/// Event severity accepted by the ingestion endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    #[default]
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Get the API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trigger event to submit to the ingestion endpoint.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    /// Human-readable summary (becomes the incident title).
    pub summary: String,

    /// Severity, defaulting to `error`.
    pub severity: Severity,

    /// Source label, defaulting to the local host name.
    pub source: String,

    /// Component label.
    pub component: String,

    /// Group label.
    pub group: String,

    /// Deduplication key; generated when absent.
    pub dedup_key: String,

    /// Event timestamp; defaults to submission time.
    pub timestamp: DateTime<Utc>,

    /// Arbitrary custom details, merged with the auto-populated fields.
    pub custom_details: Map<String, Value>,
}

impl TriggerEvent {
    /// Create an event with all defaults applied.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            severity: Severity::default(),
            source: default_source(),
            component: "pagerkit".to_string(),
            group: "soc".to_string(),
            dedup_key: generate_dedup_key(),
            timestamp: Utc::now(),
            custom_details: Map::new(),
        }
    }

    /// Add one custom detail entry.
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.custom_details
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Build the wire payload for the given routing key.
    ///
    /// The submission timestamp, operator identity, and detection-method
    /// label are always merged into the custom details; operator-supplied
    /// entries win on key collision.
    pub fn to_payload(&self, routing_key: &str) -> Value {
        let mut details = Map::new();
        details.insert(
            "submitted_at".to_string(),
            Value::String(self.timestamp.to_rfc3339()),
        );
        details.insert("reported_by".to_string(), Value::String(operator_identity()));
        details.insert(
            "detection_method".to_string(),
            Value::String("pagerkit-event".to_string()),
        );
        for (key, value) in &self.custom_details {
            details.insert(key.clone(), value.clone());
        }

        serde_json::json!({
            "routing_key": routing_key,
            "event_action": "trigger",
            "dedup_key": self.dedup_key,
            "payload": {
                "summary": self.summary,
                "severity": self.severity.as_str(),
                "source": self.source,
                "component": self.component,
                "group": self.group,
                "timestamp": self.timestamp.to_rfc3339(),
                "custom_details": details,
            }
        })
    }
}

/// Acceptance response from the ingestion endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventResponse {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub dedup_key: Option<String>,
}

/// Client for the event ingestion webhook.
#[derive(Clone)]
pub struct EventsClient {
    client: reqwest::Client,
    routing_key: String,
    endpoint: String,
}

impl EventsClient {
    /// Create a client against the production ingestion endpoint.
    pub fn new(routing_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            routing_key: routing_key.into(),
            endpoint: DEFAULT_EVENTS_URL.to_string(),
        }
    }

    /// Create a client with a custom endpoint (for testing).
    pub fn with_endpoint(routing_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            routing_key: routing_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Submit a trigger event.
    pub async fn trigger(&self, event: &TriggerEvent) -> Result<EventResponse, ApiError> {
        let payload = event.to_payload(&self.routing_key);
        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                code: None,
                message: if message.is_empty() {
                    format!("HTTP {}", status.as_u16())
                } else {
                    message
                },
            });
        }

        let body = response.json::<EventResponse>().await?;
        Ok(body)
    }
}

/// Generate a fresh deduplication key, distinct on every invocation.
pub fn generate_dedup_key() -> String {
    format!("pagerkit-{}", uuid::Uuid::new_v4())
}

/// Best-effort local host name for the default source label.
fn default_source() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Best-effort operator identity for the auto-populated details.
fn operator_identity() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
