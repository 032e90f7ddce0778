//! Data model for the incident management REST API.
//!
//! All response types deserialize defensively: every field the API may omit
//! carries `#[serde(default)]` so a sparse payload never fails a whole page.
//! Incidents are created and mutated by the external system; this tool only
//! reads them (and posts notes, which are immutable once created).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incident lifecycle status. The API exposes exactly these three values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    #[default]
    Triggered,
    Acknowledged,
    Resolved,
}

impl IncidentStatus {
    /// All statuses, in the order the listing endpoint is queried with.
    pub const ALL: [IncidentStatus; 3] = [
        IncidentStatus::Triggered,
        IncidentStatus::Acknowledged,
        IncidentStatus::Resolved,
    ];

    /// Get the API query-parameter form.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Triggered => "triggered",
            IncidentStatus::Acknowledged => "acknowledged",
            IncidentStatus::Resolved => "resolved",
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            IncidentStatus::Triggered => "Triggered",
            IncidentStatus::Acknowledged => "Acknowledged",
            IncidentStatus::Resolved => "Resolved",
        }
    }
}

/// Incident urgency. The API exposes exactly these two values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    High,
    Low,
}

impl Urgency {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Urgency::High => "High",
            Urgency::Low => "Low",
        }
    }
}

/// A reference to a related entity (service, user, escalation policy).
///
/// The API embeds these wherever a full record is not expanded inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reference {
    /// Entity ID.
    #[serde(default)]
    pub id: String,

    /// Display summary (usually the entity name).
    #[serde(default)]
    pub summary: String,

    /// Reference type discriminator.
    #[serde(default, rename = "type")]
    pub ref_type: String,
}

/// An assignment of an incident to a responder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assignment {
    /// When the assignment was made.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,

    /// The assigned responder.
    #[serde(default)]
    pub assignee: Option<Reference>,
}

/// An inline acknowledgement record from the listing endpoint.
///
/// The listing endpoint does not reliably expose the *first* acknowledgement
/// event; see [`crate::collect::enrich_acknowledgments`] for the authoritative
/// path via per-incident log entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// When the acknowledgement happened.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,

    /// The acknowledging responder.
    #[serde(default)]
    pub acknowledger: Option<Reference>,
}

/// Channel metadata on the first trigger log entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    /// Channel type (e.g. "api", "email").
    #[serde(default, rename = "type")]
    pub channel_type: String,

    /// Deduplication key carried by the triggering event, if any.
    #[serde(default)]
    pub dedup_key: Option<String>,
}

/// The log entry that originally triggered the incident.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirstTriggerLogEntry {
    /// Log entry ID.
    #[serde(default)]
    pub id: String,

    /// Trigger channel metadata.
    #[serde(default)]
    pub channel: Option<Channel>,
}

/// The first acknowledgement event discovered from an incident's activity log.
///
/// Attached locally by the enrichment step; never sent by the API in this
/// shape, hence skipped during deserialization of API payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckEvent {
    /// When the incident was first acknowledged.
    pub at: DateTime<Utc>,

    /// Display name of the acknowledging actor.
    pub actor: String,
}

/// A single incident record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Incident {
    /// Incident ID.
    #[serde(default)]
    pub id: String,

    /// Free-text title. Used for display and for best-effort client-name
    /// extraction; see [`crate::analytics::extract_client_name`].
    #[serde(default)]
    pub title: String,

    /// Current lifecycle status.
    #[serde(default)]
    pub status: IncidentStatus,

    /// Urgency level.
    #[serde(default)]
    pub urgency: Urgency,

    /// When the incident was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// When the incident was resolved, if it has been.
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,

    /// The service the incident fired on.
    #[serde(default)]
    pub service: Option<Reference>,

    /// Current assignments.
    #[serde(default)]
    pub assignments: Vec<Assignment>,

    /// Responders who have acknowledged (reference form).
    #[serde(default)]
    pub acknowledgers: Vec<Reference>,

    /// Assigned responders (reference form).
    #[serde(default)]
    pub assignees: Vec<Reference>,

    /// Inline acknowledgement records, when expanded.
    #[serde(default)]
    pub acknowledgements: Vec<Acknowledgement>,

    /// The log entry that triggered the incident, when expanded.
    #[serde(default)]
    pub first_trigger_log_entry: Option<FirstTriggerLogEntry>,

    /// First acknowledgement event, attached by the enrichment step.
    #[serde(skip)]
    pub first_ack: Option<AckEvent>,
}

impl Incident {
    /// Get the service name, if the service reference is present.
    pub fn service_name(&self) -> Option<&str> {
        self.service
            .as_ref()
            .map(|s| s.summary.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Get the deduplication key from the first trigger log entry, if any.
    pub fn dedup_key(&self) -> Option<&str> {
        self.first_trigger_log_entry
            .as_ref()
            .and_then(|e| e.channel.as_ref())
            .and_then(|c| c.dedup_key.as_deref())
            .filter(|k| !k.is_empty())
    }

    /// Get the best available first-acknowledgement time.
    ///
    /// Prefers the enriched value from the activity log, falling back to the
    /// earliest inline acknowledgement from the listing endpoint.
    pub fn ack_time(&self) -> Option<DateTime<Utc>> {
        if let Some(ack) = &self.first_ack {
            return Some(ack.at);
        }
        self.acknowledgements.iter().filter_map(|a| a.at).min()
    }
}

/// One page of the incident listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentsPage {
    /// Incidents on this page.
    #[serde(default)]
    pub incidents: Vec<Incident>,

    /// Page size the server applied.
    #[serde(default)]
    pub limit: u32,

    /// Offset of this page.
    #[serde(default)]
    pub offset: u32,

    /// Whether further pages exist.
    #[serde(default)]
    pub more: bool,
}

/// Single-incident response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentResponse {
    pub incident: Incident,
}

/// An entry in an incident's activity log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log entry ID.
    #[serde(default)]
    pub id: String,

    /// Entry type discriminator (e.g. "acknowledge_log_entry").
    #[serde(default, rename = "type")]
    pub entry_type: String,

    /// When the logged event happened.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// The actor behind the event.
    #[serde(default)]
    pub agent: Option<Reference>,
}

impl LogEntry {
    /// Whether this entry records an acknowledgement.
    pub fn is_acknowledgement(&self) -> bool {
        self.entry_type.starts_with("acknowledge")
    }
}

/// Response wrapper for the per-incident log entry listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogEntriesResponse {
    #[serde(default)]
    pub log_entries: Vec<LogEntry>,

    #[serde(default)]
    pub more: bool,
}

/// A note on an incident.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Note {
    /// Note ID.
    #[serde(default)]
    pub id: String,

    /// Note content.
    #[serde(default)]
    pub content: String,

    /// When the note was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Single-note response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteResponse {
    pub note: Note,
}

/// Response wrapper for the abilities endpoint, used for token validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbilitiesResponse {
    #[serde(default)]
    pub abilities: Vec<String>,
}

/// A user account in the external system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    #[serde(default)]
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Login email.
    #[serde(default)]
    pub email: String,
}

/// Response wrapper for the user listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}
