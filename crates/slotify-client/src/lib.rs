//! HTTP client for the slotify server.
//!
//! Wraps the four endpoints the planner talks to:
//! - `GET /api/state` and `DELETE /api/state` for server-held calendar data
//! - `POST /api/upload`, a long-running streaming upload (see [`upload`])
//! - `POST /api/meeting-request` for slot searches

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use slotify_core::{MeetingRequest, ServerState, SlotSearchResult};

pub mod upload;

pub use upload::drive_stream;

/// Default timeout for the short request/response endpoints.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const STATE_PATH: &str = "/api/state";
const UPLOAD_PATH: &str = "/api/upload";
const MEETING_REQUEST_PATH: &str = "/api/meeting-request";

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured server URL is unusable.
    #[error("invalid server URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Server returned a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// slotify server client.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for the server at `base_url`.
    ///
    /// Only connection setup is bounded by a client-wide timeout. The
    /// request/response endpoints use `request_timeout`; the upload stream
    /// has no read timeout and ends only on completion, error or
    /// cancellation.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ClientError> {
        let url = base_url.into();
        let trimmed = url.trim().trim_end_matches('/');

        if trimmed.is_empty() {
            return Err(ClientError::InvalidBaseUrl {
                url,
                reason: "URL cannot be empty",
            });
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl {
                url,
                reason: "URL must start with http:// or https://",
            });
        }
        let base_url = trimmed.to_string();

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ClientError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetches server-held calendar data, used to restore state at startup.
    pub async fn load_state(&self) -> Result<ServerState, ClientError> {
        let response = self
            .http
            .get(self.url(STATE_PATH))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let body = checked_body(response).await?;
        let state: ServerState = serde_json::from_str(&body)
            .map_err(|err| ClientError::InvalidResponse(err.to_string()))?;
        debug!(
            has_data = state.has_data,
            participants = state.participants.len(),
            "loaded server state"
        );
        Ok(state)
    }

    /// Deletes server-held calendar data.
    pub async fn clear_state(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(STATE_PATH))
            .timeout(self.request_timeout)
            .send()
            .await?;
        checked_body(response).await?;
        debug!("cleared server state");
        Ok(())
    }

    /// Asks the server for meeting slots matching `request`.
    pub async fn find_slots(
        &self,
        request: &MeetingRequest,
    ) -> Result<SlotSearchResult, ClientError> {
        debug!(
            required = request.required.len(),
            optional = request.optional.len(),
            duration = request.duration_minutes,
            "searching for slots"
        );
        let response = self
            .http
            .post(self.url(MEETING_REQUEST_PATH))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;
        let body = checked_body(response).await?;
        serde_json::from_str(&body).map_err(|err| ClientError::InvalidResponse(err.to_string()))
    }
}

/// Reads the body, turning non-success statuses into [`ClientError::Api`].
async fn checked_body(response: reqwest::Response) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(parse_api_error(status.as_u16(), &body));
    }
    Ok(body)
}

fn parse_api_error(status: u16, body: &str) -> ClientError {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: String,
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .map_or_else(|_| format!("Server error: {status}"), |payload| payload.error);
    ClientError::Api { status, message }
}
