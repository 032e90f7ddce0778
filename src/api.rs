//! REST client for the incident management API.
//!
//! One method per endpoint, strictly sequential use: callers issue one
//! request at a time and await each response. The client carries an explicit
//! [`ApiConfig`] rather than reading ambient state, so tests can point it at
//! a fake endpoint.

use chrono::{DateTime, Utc};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiErrorBody, REQUESTER_NOT_FOUND_CODE};
use crate::model::{
    AbilitiesResponse, Incident, IncidentResponse, IncidentStatus, IncidentsPage, LogEntry,
    LogEntriesResponse, Note, NoteResponse, UsersResponse,
};

/// Related-entity expansions requested inline on the listing endpoint to
/// minimize follow-up calls.
const LIST_INCLUDES: [&str; 5] = [
    "services",
    "first_trigger_log_entries",
    "acknowledgers",
    "assignees",
    "acknowledgements",
];

/// Client for the incident management REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new client from a configuration.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Token token={}", self.config.token))
            .header("Accept", "application/vnd.pagerduty+json;version=2")
    }

    /// Validate the token against the abilities endpoint.
    ///
    /// Returns the account's ability list on success. A 401 or 403 maps to
    /// [`ApiError::InvalidToken`].
    pub async fn check_abilities(&self) -> Result<Vec<String>, ApiError> {
        let response = self.request(self.client.get(self.url("/abilities"))).send().await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ApiError::InvalidToken {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.json::<AbilitiesResponse>().await?;
        Ok(body.abilities)
    }

    /// Fetch a single incident by ID.
    pub async fn get_incident(&self, id: &str) -> Result<Incident, ApiError> {
        let url = self.url(&format!("/incidents/{}", urlencoding::encode(id)));
        let response = self.request(self.client.get(url)).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.json::<IncidentResponse>().await?;
        Ok(body.incident)
    }

    /// Fetch one page of incidents created in `[since, until]`.
    ///
    /// The status filter is sent as a query parameter but treated as a
    /// best-effort optimization only; callers that depend on a status
    /// constraint re-filter locally.
    pub async fn list_incidents_page(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        offset: u32,
        limit: u32,
        statuses: &[IncidentStatus],
    ) -> Result<IncidentsPage, ApiError> {
        let mut url = format!(
            "{}?since={}&until={}&offset={}&limit={}",
            self.url("/incidents"),
            urlencoding::encode(&since.to_rfc3339()),
            urlencoding::encode(&until.to_rfc3339()),
            offset,
            limit
        );

        for status in statuses {
            url.push_str(&format!("&statuses[]={}", status.as_str()));
        }
        for include in LIST_INCLUDES {
            url.push_str(&format!("&include[]={include}"));
        }

        let response = self.request(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let page = response.json::<IncidentsPage>().await?;
        Ok(page)
    }

    /// Fetch the activity log for one incident.
    pub async fn list_log_entries(&self, incident_id: &str) -> Result<Vec<LogEntry>, ApiError> {
        let url = format!(
            "{}?is_overview=false&limit=100",
            self.url(&format!(
                "/incidents/{}/log_entries",
                urlencoding::encode(incident_id)
            ))
        );

        let response = self.request(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.json::<LogEntriesResponse>().await?;
        Ok(body.log_entries)
    }

    /// Post a note to an incident on behalf of `from_email`.
    ///
    /// The API requires the `From` header to name a valid account; the
    /// documented "requester not found" error code is surfaced as
    /// [`ApiError::RequesterNotFound`] with the offending email.
    pub async fn post_note(
        &self,
        incident_id: &str,
        from_email: &str,
        content: &str,
    ) -> Result<Note, ApiError> {
        let url = self.url(&format!(
            "/incidents/{}/notes",
            urlencoding::encode(incident_id)
        ));

        let body = serde_json::json!({ "note": { "content": content } });
        let response = self
            .request(self.client.post(&url))
            .header("From", from_email)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            if let ApiError::Status {
                code: Some(REQUESTER_NOT_FOUND_CODE),
                ..
            } = err
            {
                return Err(ApiError::RequesterNotFound {
                    email: from_email.to_string(),
                });
            }
            return Err(err);
        }

        let body = response.json::<NoteResponse>().await?;
        Ok(body.note)
    }

    /// Look up a user account by email.
    pub async fn find_user(&self, email: &str) -> Result<Option<crate::model::User>, ApiError> {
        let url = format!("{}?query={}", self.url("/users"), urlencoding::encode(email));

        let response = self.request(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.json::<UsersResponse>().await?;
        Ok(body.users.into_iter().find(|u| u.email == email))
    }

    /// Verify that `email` names a valid account before posting on its
    /// behalf, so a typoed address fails up front instead of on the note
    /// request.
    pub async fn ensure_requester(&self, email: &str) -> Result<(), ApiError> {
        match self.find_user(email).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::RequesterNotFound {
                email: email.to_string(),
            }),
        }
    }
}

/// Build an [`ApiError`] from a non-success response, pulling the structured
/// error body when one is present.
async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.json::<ApiErrorBody>().await.unwrap_or_default();

    let message = if body.error.message.is_empty() {
        format!("HTTP {status}")
    } else if body.error.errors.is_empty() {
        body.error.message
    } else {
        format!("{}: {}", body.error.message, body.error.errors.join("; "))
    };

    ApiError::Status {
        status,
        code: body.error.code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(ApiConfig::with_base_url("test-token", server.base_url()))
    }

    #[tokio::test]
    async fn test_check_abilities_sends_token_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/abilities")
                .header("authorization", "Token token=test-token");
            then.status(200)
                .json_body(json!({ "abilities": ["read", "teams"] }));
        });

        let abilities = test_client(&server).check_abilities().await.unwrap();

        mock.assert();
        assert_eq!(abilities, vec!["read", "teams"]);
    }

    #[tokio::test]
    async fn test_check_abilities_invalid_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/abilities");
            then.status(401)
                .json_body(json!({ "error": { "message": "Unauthorized", "code": 2001 } }));
        });

        let err = test_client(&server).check_abilities().await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidToken { status: 401 }));
    }

    #[tokio::test]
    async fn test_list_incidents_page_query_params() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/incidents")
                .query_param("offset", "200")
                .query_param("limit", "100")
                .query_param("statuses[]", "triggered")
                .query_param("include[]", "services");
            then.status(200).json_body(json!({
                "incidents": [{ "id": "P1", "title": "t" }],
                "limit": 100,
                "offset": 200,
                "more": false
            }));
        });

        let now = Utc::now();
        let page = test_client(&server)
            .list_incidents_page(now - chrono::Duration::days(1), now, 200, 100, &IncidentStatus::ALL)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(page.incidents.len(), 1);
        assert!(!page.more);
    }

    #[tokio::test]
    async fn test_post_note_maps_requester_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/incidents/P1/notes")
                .header("from", "ghost@example.com");
            then.status(400).json_body(json!({
                "error": { "message": "Requester not found", "code": 2100 }
            }));
        });

        let err = test_client(&server)
            .post_note("P1", "ghost@example.com", "hello")
            .await
            .unwrap_err();

        match err {
            ApiError::RequesterNotFound { email } => assert_eq!(email, "ghost@example.com"),
            other => panic!("expected RequesterNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_post_note_success() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/incidents/P1/notes").json_body_includes(
                json!({ "note": { "content": "checked the logs" } }).to_string(),
            );
            then.status(201).json_body(json!({
                "note": { "id": "N1", "content": "checked the logs" }
            }));
        });

        let note = test_client(&server)
            .post_note("P1", "ops@example.com", "checked the logs")
            .await
            .unwrap();

        assert_eq!(note.id, "N1");
        assert_eq!(note.content, "checked the logs");
    }

    #[tokio::test]
    async fn test_find_user_exact_email_match() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users").query_param("query", "ada@example.com");
            then.status(200).json_body(json!({
                "users": [
                    { "id": "U1", "name": "Ada", "email": "ada@example.com" },
                    { "id": "U2", "name": "Adam", "email": "adam@example.com" }
                ]
            }));
        });

        let user = test_client(&server)
            .find_user("ada@example.com")
            .await
            .unwrap()
            .expect("user should be found");

        assert_eq!(user.id, "U1");
    }

    #[tokio::test]
    async fn test_ensure_requester_rejects_unknown_email() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users");
            then.status(200).json_body(json!({ "users": [] }));
        });

        let err = test_client(&server)
            .ensure_requester("ghost@example.com")
            .await
            .unwrap_err();

        match err {
            ApiError::RequesterNotFound { email } => assert_eq!(email, "ghost@example.com"),
            other => panic!("expected RequesterNotFound, got {other:?}"),
        }
    }
}
