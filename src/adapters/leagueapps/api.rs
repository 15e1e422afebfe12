//! Transport contract used by the export loop
//!
//! The export loop never touches HTTP directly. It talks to an [`ExportApi`],
//! which the real [`LeagueAppsClient`](super::LeagueAppsClient) implements
//! over reqwest and tests implement with scripted responses.

use crate::domain::{AccessToken, Cursor, RecordType, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Parameters of one page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Record type being exported
    pub record_type: RecordType,

    /// Watermark sent as `last-updated` / `last-id`
    pub cursor: Cursor,
}

/// Raw answer of the export endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Canonical reason phrase (e.g. "Too Many Requests")
    pub reason: String,

    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Build a response, filling in the canonical reason phrase
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            status,
            reason,
            body: body.into(),
        }
    }
}

/// Outcome of issuing a page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    /// The server answered
    Completed(HttpResponse),

    /// No answer within the per-request timeout
    TimedOut(Duration),

    /// The server could not be reached
    ConnectionFailed(String),
}

/// Token exchange and page retrieval against the LeagueApps API
#[async_trait]
pub trait ExportApi: Send + Sync {
    /// Exchange a freshly signed assertion for a bearer token
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthFailure`](crate::domain::ApiError::AuthFailure)
    /// when the token endpoint answers anything but 200, or a connection error
    /// if it cannot be reached.
    async fn obtain_token(&self) -> Result<AccessToken>;

    /// Request one page of records
    ///
    /// Transport-level failures are reported as [`FetchResponse`] variants so
    /// the caller decides whether to retry.
    async fn fetch_page(&self, request: &PageRequest, token: &AccessToken) -> FetchResponse;
}
