//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting the result of
//! one export run.

use crate::adapters::output::PageArtifact;
use crate::domain::errors::TransientCause;
use crate::domain::{ApiError, Cursor, LappsError, RecordType, SiteId};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Why a request had to be repeated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// 401 from the export endpoint
    TokenExpired,
    /// 429, 5xx, timeout or unreachable server
    Transient(TransientCause),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryReason::TokenExpired => f.write_str("access token expired"),
            RetryReason::Transient(cause) => write!(f, "{cause}"),
        }
    }
}

impl From<&RetryReason> for ApiError {
    fn from(reason: &RetryReason) -> Self {
        match reason {
            RetryReason::TokenExpired => ApiError::TokenExpired,
            RetryReason::Transient(cause) => ApiError::TransientServerError(cause.clone()),
        }
    }
}

/// One non-progressing attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryEvent {
    /// Attempt counter after this failure
    pub attempt: u32,

    /// What went wrong
    pub reason: RetryReason,

    /// Backoff slept before the next request (None for an immediate retry)
    pub delay: Option<Duration>,
}

/// Summary of an export run
#[derive(Debug)]
pub struct ExportSummary {
    /// Identifier of this run (also recorded in manifest and checkpoint)
    pub run_id: Uuid,

    /// Site exported
    pub site_id: SiteId,

    /// Record type exported
    pub record_type: RecordType,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Cursor the run started from
    pub initial_cursor: Cursor,

    /// Cursor after the last persisted page
    pub final_cursor: Cursor,

    /// Pages persisted, in order
    pub pages: Vec<PageArtifact>,

    /// Records across all pages
    pub total_records: usize,

    /// Export requests issued
    pub requests_issued: u32,

    /// Token exchanges performed
    pub tokens_requested: u32,

    /// Failed attempts that were retried
    pub retries: Vec<RetryEvent>,

    /// Duration of the run
    pub duration: Duration,

    /// Pages were fetched but not written
    pub dry_run: bool,

    /// Manifest written at end-of-stream
    pub manifest_path: Option<std::path::PathBuf>,

    /// Error that aborted the run (None when the run reached end-of-stream)
    pub error: Option<LappsError>,
}

impl ExportSummary {
    /// Create a new empty summary for a run starting at `initial_cursor`
    pub fn new(site_id: SiteId, record_type: RecordType, initial_cursor: Cursor) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            site_id,
            record_type,
            started_at: Utc::now(),
            initial_cursor,
            final_cursor: initial_cursor,
            pages: Vec::new(),
            total_records: 0,
            requests_issued: 0,
            tokens_requested: 0,
            retries: Vec::new(),
            duration: Duration::ZERO,
            dry_run: false,
            manifest_path: None,
            error: None,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a persisted page
    pub fn add_page(&mut self, artifact: PageArtifact) {
        self.total_records += artifact.records;
        self.pages.push(artifact);
    }

    /// Record a retried attempt
    pub fn add_retry(&mut self, event: RetryEvent) {
        self.retries.push(event);
    }

    /// Whether the run reached end-of-stream
    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }

    /// Process exit code for this run (0 on success)
    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map_or(0, LappsError::exit_code)
    }

    /// Total time spent sleeping in backoff
    pub fn total_backoff(&self) -> Duration {
        self.retries.iter().filter_map(|r| r.delay).sum()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        match &self.error {
            None => tracing::info!(
                run_id = %self.run_id,
                site_id = %self.site_id,
                record_type = %self.record_type,
                pages = self.pages.len(),
                records = self.total_records,
                requests = self.requests_issued,
                retries = self.retries.len(),
                final_cursor = %self.final_cursor,
                duration_secs = self.duration.as_secs_f64(),
                "Export completed"
            ),
            Some(error) => tracing::error!(
                run_id = %self.run_id,
                site_id = %self.site_id,
                record_type = %self.record_type,
                pages = self.pages.len(),
                records = self.total_records,
                requests = self.requests_issued,
                retries = self.retries.len(),
                final_cursor = %self.final_cursor,
                error = %error,
                "Export aborted"
            ),
        }
    }
}
