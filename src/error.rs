//! Error types for the API layer.
//!
//! Known external error codes get their own variants so the binaries can
//! print a remediation hint alongside the raw code. Everything else is
//! carried through as a status + message pair.

use thiserror::Error;

/// External error code the API returns when the note requester email does
/// not resolve to a valid account.
pub const REQUESTER_NOT_FOUND_CODE: u64 = 2100;

/// Errors from the incident management API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token failed validation against the abilities endpoint.
    #[error("invalid or unauthorized API token (HTTP {status})")]
    InvalidToken { status: u16 },

    /// The requester email on a note post does not name a valid account.
    #[error(
        "requester '{email}' not found (error code {REQUESTER_NOT_FOUND_CODE}); \
         check that the email matches a valid account in the incident system"
    )]
    RequesterNotFound { email: String },

    /// The API rejected the request with a structured error.
    #[error("API request failed with status {status}{}: {message}", format_code(.code))]
    Status {
        status: u16,
        code: Option<u64>,
        message: String,
    },

    /// Transport-level failure (connection, timeout, decode).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

fn format_code(code: &Option<u64>) -> String {
    match code {
        Some(c) => format!(" (error code {c})"),
        None => String::new(),
    }
}

/// Structured error body the API attaches to non-2xx responses.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: ApiErrorDetail,
}

/// The inner error object.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<u64>,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub errors: Vec<String>,
}
