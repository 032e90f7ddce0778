//! Configuration for the API clients.
//!
//! The token and base URL are explicit values passed into each collaborator,
//! never ambient globals. Binaries resolve them from CLI flags first, then
//! from the environment.

use std::env;

/// Environment variable holding the REST API token.
pub const TOKEN_ENV: &str = "PAGERKIT_API_TOKEN";

/// Environment variable overriding the REST API base URL.
pub const BASE_URL_ENV: &str = "PAGERKIT_BASE_URL";

/// Default base URL of the incident management REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.pagerduty.com";

/// Default URL of the event ingestion webhook.
pub const DEFAULT_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// Connection settings for the REST API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API token sent with every request.
    pub token: String,

    /// Base URL, overridable for tests against fake endpoints.
    pub base_url: String,
}

impl ApiConfig {
    /// Create a configuration against the production API.
    pub fn new(token: impl Into<String>) -> Self {
        let base_url = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            token: token.into(),
            base_url,
        }
    }

    /// Create a configuration with a custom base URL (for testing).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    /// Resolve the token from an optional CLI value, falling back to the
    /// environment.
    pub fn resolve(cli_token: Option<String>) -> anyhow::Result<Self> {
        let token = match cli_token {
            Some(t) if !t.is_empty() => t,
            _ => env::var(TOKEN_ENV).map_err(|_| {
                anyhow::anyhow!("no API token supplied; pass --token or set {TOKEN_ENV}")
            })?,
        };
        Ok(Self::new(token))
    }
}
