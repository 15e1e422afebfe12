//! Export loop
//!
//! A single sequential state machine: obtain a token, fetch the page at the
//! current cursor, classify the answer, then advance, retry or stop. Every
//! transition is a method taking the current [`LoopState`] and returning the
//! next one, so the loop itself carries no hidden state.
//!
//! ```text
//! NeedToken -> HasToken -> AwaitingResponse -> AdvanceCursor     -> HasToken | Done
//!                                           -> RetryAfterBackoff -> HasToken
//!                                           -> RetryImmediately  -> NeedToken
//!                                           -> Done | Abort
//! ```

use super::summary::{ExportSummary, RetryEvent, RetryReason};
use crate::adapters::leagueapps::{ExportApi, FetchResponse, HttpResponse, PageRequest};
use crate::adapters::output::PageSink;
use crate::core::retry::{classify, Backoff, Classification, RetryPolicy};
use crate::core::state::{Checkpoint, CheckpointStore};
use crate::domain::errors::TransientCause;
use crate::domain::{
    AccessToken, ApiError, Cursor, LappsError, Page, Record, RecordType, SiteId,
};
use crate::{log_export_start, log_page_exported, log_retry_attempt};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Instant;
use uuid::Uuid;

/// What to export and how hard to try
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Site to export
    pub site_id: SiteId,

    /// Record type to export
    pub record_type: RecordType,

    /// Cursor of the first request
    pub initial_cursor: Cursor,

    /// Attempt ceiling and backoff parameters
    pub policy: RetryPolicy,

    /// Fetch and count pages without checkpointing
    pub dry_run: bool,
}

impl ExportOptions {
    /// Options starting from the zero cursor with the default policy
    pub fn new(site_id: SiteId, record_type: RecordType) -> Self {
        Self {
            site_id,
            record_type,
            initial_cursor: Cursor::default(),
            policy: RetryPolicy::default(),
            dry_run: false,
        }
    }

    /// Start from the given cursor
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.initial_cursor = cursor;
        self
    }

    /// Use the given retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Mutable state of one run
#[derive(Debug)]
struct ExportState {
    token: Option<AccessToken>,
    cursor: Cursor,
    attempts: u32,
    batch: u64,
}

/// States of the export loop
#[derive(Debug)]
enum LoopState {
    NeedToken,
    HasToken,
    AwaitingResponse(FetchResponse),
    AdvanceCursor(Vec<Record>),
    RetryAfterBackoff(TransientCause),
    RetryImmediately,
    Done,
    Abort(LappsError),
}

/// Drives one export run from the initial cursor to end-of-stream or abort
///
/// # Example
///
/// ```no_run
/// use lapps_export::adapters::leagueapps::LeagueAppsClient;
/// use lapps_export::adapters::output::NullSink;
/// use lapps_export::config::load_config;
/// use lapps_export::core::export::{ExportOptions, Exporter};
/// use lapps_export::domain::{RecordType, SiteId};
///
/// # async fn example() -> lapps_export::domain::Result<()> {
/// let config = load_config("lapps-export.toml")?;
/// let client = LeagueAppsClient::from_config(&config)?;
/// let options = ExportOptions::new(SiteId::new(42).unwrap(), RecordType::Members);
///
/// let summary = Exporter::new(client, NullSink, options).run().await;
/// println!("{} records", summary.total_records);
/// # Ok(())
/// # }
/// ```
pub struct Exporter<A, S, R: Rng = StdRng> {
    api: A,
    sink: S,
    backoff: Backoff<R>,
    options: ExportOptions,
    checkpoints: Option<CheckpointStore>,
    checkpoint: Option<Checkpoint>,
    state: ExportState,
    summary: ExportSummary,
}

impl<A: ExportApi, S: PageSink> Exporter<A, S, StdRng> {
    /// Exporter whose backoff draws from OS entropy
    pub fn new(api: A, sink: S, options: ExportOptions) -> Self {
        let backoff = Backoff::from_entropy(&options.policy);
        Self::with_backoff(api, sink, options, backoff)
    }
}

impl<A: ExportApi, S: PageSink, R: Rng> Exporter<A, S, R> {
    /// Exporter with an explicit backoff (e.g. seeded for tests)
    pub fn with_backoff(api: A, sink: S, options: ExportOptions, backoff: Backoff<R>) -> Self {
        let mut summary =
            ExportSummary::new(options.site_id, options.record_type, options.initial_cursor);
        summary.dry_run = options.dry_run;

        Self {
            api,
            sink,
            backoff,
            state: ExportState {
                token: None,
                cursor: options.initial_cursor,
                attempts: 0,
                batch: 0,
            },
            options,
            checkpoints: None,
            checkpoint: None,
            summary,
        }
    }

    /// Save progress to `store` after every persisted page
    ///
    /// Ignored for dry runs and unpaginated record types.
    pub fn with_checkpoints(mut self, store: CheckpointStore) -> Self {
        if !self.options.dry_run && self.options.record_type.is_paginated() {
            let mut checkpoint = Checkpoint::new(
                self.options.site_id,
                self.options.record_type,
                self.summary.run_id,
            );
            checkpoint.cursor = self.options.initial_cursor;
            self.checkpoint = Some(checkpoint);
            self.checkpoints = Some(store);
        }
        self
    }

    /// Identifier of the run this exporter will perform
    pub fn run_id(&self) -> Uuid {
        self.summary.run_id
    }

    /// Run the loop to completion
    ///
    /// Never fails: the outcome, including any aborting error, is reported
    /// in the returned summary.
    pub async fn run(mut self) -> ExportSummary {
        let started = Instant::now();
        log_export_start!(
            self.options.site_id,
            self.options.record_type,
            self.state.cursor
        );

        let mut state = LoopState::NeedToken;
        let error = loop {
            state = match state {
                LoopState::Done => break None,
                LoopState::Abort(error) => break Some(error),
                other => self.step(other).await,
            };
        };

        self.summary.final_cursor = self.state.cursor;
        self.summary.duration = started.elapsed();

        match error {
            None => {
                match self.sink.finish(&self.summary).await {
                    Ok(manifest) => self.summary.manifest_path = manifest,
                    Err(e) => tracing::warn!(error = %e, "Failed to write manifest"),
                }
                self.close_checkpoint(true).await;
            }
            Some(error) => {
                self.summary.error = Some(error);
                self.close_checkpoint(false).await;
            }
        }

        self.summary.log_summary();
        self.summary
    }

    async fn step(&mut self, state: LoopState) -> LoopState {
        match state {
            LoopState::NeedToken => self.acquire_token().await,
            LoopState::HasToken => self.request_page().await,
            LoopState::AwaitingResponse(response) => self.handle_response(response),
            LoopState::AdvanceCursor(records) => self.advance(records).await,
            LoopState::RetryAfterBackoff(cause) => self.back_off(cause).await,
            LoopState::RetryImmediately => self.retry_immediately(),
            terminal @ (LoopState::Done | LoopState::Abort(_)) => terminal,
        }
    }

    async fn acquire_token(&mut self) -> LoopState {
        self.summary.tokens_requested += 1;
        match self.api.obtain_token().await {
            Ok(token) => {
                self.state.token = Some(token);
                LoopState::HasToken
            }
            Err(e) => LoopState::Abort(e),
        }
    }

    async fn request_page(&mut self) -> LoopState {
        let Some(token) = self.state.token.as_ref() else {
            return LoopState::NeedToken;
        };

        let request = PageRequest {
            record_type: self.options.record_type,
            cursor: self.state.cursor,
        };
        self.summary.requests_issued += 1;

        LoopState::AwaitingResponse(self.api.fetch_page(&request, token).await)
    }

    fn handle_response(&mut self, response: FetchResponse) -> LoopState {
        let response = match response {
            FetchResponse::Completed(response) => response,
            FetchResponse::TimedOut(after) => {
                return self.transient_failure(TransientCause::Timeout(after))
            }
            FetchResponse::ConnectionFailed(msg) => {
                return self.transient_failure(TransientCause::Connect(msg))
            }
        };

        match classify(response.status) {
            Classification::Success => parse_page(&response),
            Classification::AuthExpired => {
                self.state.token = None;
                match self.count_failure(&RetryReason::TokenExpired) {
                    Some(exhausted) => LoopState::Abort(exhausted),
                    None => LoopState::RetryImmediately,
                }
            }
            Classification::Retryable => {
                self.transient_failure(TransientCause::Status(response.status))
            }
            Classification::Fatal => {
                tracing::error!(
                    status = response.status,
                    reason = %response.reason,
                    body = %response.body,
                    "Unexpected error from export endpoint"
                );
                LoopState::Abort(
                    ApiError::FatalClientError {
                        status: response.status,
                        reason: response.reason,
                    }
                    .into(),
                )
            }
        }
    }

    fn transient_failure(&mut self, cause: TransientCause) -> LoopState {
        match self.count_failure(&RetryReason::Transient(cause.clone())) {
            Some(exhausted) => LoopState::Abort(exhausted),
            None => LoopState::RetryAfterBackoff(cause),
        }
    }

    /// Count a non-progressing attempt; returns the abort error at the ceiling
    fn count_failure(&mut self, reason: &RetryReason) -> Option<LappsError> {
        self.state.attempts += 1;
        let error = ApiError::from(reason);
        tracing::debug!(attempts = self.state.attempts, error = %error, "Attempt failed");

        if self.state.attempts >= self.options.policy.max_attempts {
            tracing::error!(
                attempts = self.state.attempts,
                error = %error,
                "Attempt ceiling reached"
            );
            return Some(
                ApiError::RetryExhausted {
                    attempts: self.state.attempts,
                    last: Box::new(error),
                }
                .into(),
            );
        }
        None
    }

    async fn back_off(&mut self, cause: TransientCause) -> LoopState {
        let attempt = self.state.attempts;
        let delay = self.backoff.delay(attempt);

        log_retry_attempt!(attempt, self.options.policy.max_attempts, cause);
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Backing off");

        self.summary.add_retry(RetryEvent {
            attempt,
            reason: RetryReason::Transient(cause),
            delay: Some(delay),
        });

        tokio::time::sleep(delay).await;
        LoopState::HasToken
    }

    fn retry_immediately(&mut self) -> LoopState {
        let attempt = self.state.attempts;
        log_retry_attempt!(
            attempt,
            self.options.policy.max_attempts,
            RetryReason::TokenExpired
        );

        self.summary.add_retry(RetryEvent {
            attempt,
            reason: RetryReason::TokenExpired,
            delay: None,
        });
        LoopState::NeedToken
    }

    async fn advance(&mut self, records: Vec<Record>) -> LoopState {
        self.state.attempts = 0;

        let paginated = self.options.record_type.is_paginated();
        let mut next = self.state.cursor;
        if paginated {
            if let Err(e) = next.advance_from(&records) {
                return LoopState::Abort(e);
            }
        }

        self.state.batch += 1;
        let page = Page::new(self.state.batch, self.options.record_type, records);
        let artifact = match self.sink.write_page(&page).await {
            Ok(artifact) => artifact,
            Err(e) => return LoopState::Abort(e),
        };

        self.state.cursor = next;
        log_page_exported!(page.batch, page.len(), next);
        self.summary.add_page(artifact);
        self.summary.final_cursor = next;

        if !paginated {
            return LoopState::Done;
        }

        self.save_checkpoint(page.len()).await;
        LoopState::HasToken
    }

    async fn save_checkpoint(&mut self, records: usize) {
        if let (Some(store), Some(checkpoint)) = (&self.checkpoints, &mut self.checkpoint) {
            checkpoint.record_page(self.state.cursor, records);
            if let Err(e) = store.save(checkpoint).await {
                tracing::warn!(error = %e, "Failed to save checkpoint");
            }
        }
    }

    /// Final checkpoint write, skipped when the run persisted nothing
    async fn close_checkpoint(&mut self, completed: bool) {
        if let (Some(store), Some(checkpoint)) = (&self.checkpoints, &mut self.checkpoint) {
            if completed {
                checkpoint.mark_completed();
            } else if checkpoint.pages_exported > 0 {
                checkpoint.mark_failed();
            } else {
                return;
            }
            if let Err(e) = store.save(checkpoint).await {
                tracing::warn!(error = %e, "Failed to save checkpoint");
            }
        }
    }
}

fn parse_page(response: &HttpResponse) -> LoopState {
    match serde_json::from_str::<Vec<Record>>(&response.body) {
        Ok(records) if records.is_empty() => LoopState::Done,
        Ok(records) => LoopState::AdvanceCursor(records),
        Err(e) => LoopState::Abort(
            ApiError::InvalidResponse(format!("Page is not a JSON array of records: {e}")).into(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::output::{NullSink, PageArtifact};
    use crate::core::state::CheckpointStatus;
    use crate::domain::Result;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct ScriptedApi {
        pages: Mutex<VecDeque<FetchResponse>>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl ScriptedApi {
        fn new(pages: Vec<FetchResponse>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                requests: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl ExportApi for ScriptedApi {
        async fn obtain_token(&self) -> Result<AccessToken> {
            Ok(AccessToken::new("tok"))
        }

        async fn fetch_page(&self, request: &PageRequest, _token: &AccessToken) -> FetchResponse {
            self.requests.lock().unwrap().push(*request);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ok("[]"))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl PageSink for FailingSink {
        async fn write_page(&mut self, _page: &Page) -> Result<PageArtifact> {
            Err(LappsError::Io("disk full".to_string()))
        }

        async fn finish(&mut self, _summary: &ExportSummary) -> Result<Option<PathBuf>> {
            Ok(None)
        }
    }

    fn ok(body: &str) -> FetchResponse {
        FetchResponse::Completed(HttpResponse::new(200, body))
    }

    fn options(record_type: RecordType) -> ExportOptions {
        ExportOptions::new(SiteId::new(42).unwrap(), record_type).with_policy(RetryPolicy {
            max_attempts: 5,
            slot_time: Duration::from_millis(10),
            max_slots: 5,
        })
    }

    fn exporter<S: PageSink>(api: ScriptedApi, sink: S, record_type: RecordType) -> Exporter<ScriptedApi, S> {
        let options = options(record_type);
        let backoff = Backoff::seeded(&options.policy, 7);
        Exporter::with_backoff(api, sink, options, backoff)
    }

    #[tokio::test]
    async fn test_attempts_reset_after_progress() {
        // Four failures, a page, four more failures: never five in a row
        let mut script = vec![FetchResponse::Completed(HttpResponse::new(503, "")); 4];
        script.push(ok(r#"[{"id": 1, "lastUpdated": 10}]"#));
        script.extend(vec![FetchResponse::Completed(HttpResponse::new(429, "")); 4]);
        script.push(ok("[]"));

        let summary = exporter(ScriptedApi::new(script), NullSink, RecordType::Members)
            .run()
            .await;

        assert!(summary.is_successful(), "{:?}", summary.error);
        assert_eq!(summary.requests_issued, 10);
        assert_eq!(summary.retries.len(), 8);
        assert_eq!(summary.final_cursor, Cursor::new(10, 1));
    }

    #[tokio::test]
    async fn test_timeouts_and_connection_failures_back_off() {
        let script = vec![
            FetchResponse::TimedOut(Duration::from_secs(10)),
            FetchResponse::ConnectionFailed("refused".to_string()),
            ok("[]"),
        ];
        let summary = exporter(ScriptedApi::new(script), NullSink, RecordType::Members)
            .run()
            .await;

        assert!(summary.is_successful());
        assert_eq!(summary.retries.len(), 2);
        assert!(summary.retries.iter().all(|r| r.delay.is_some()));
        assert_eq!(
            summary.retries[0].reason,
            RetryReason::Transient(TransientCause::Timeout(Duration::from_secs(10)))
        );
    }

    #[tokio::test]
    async fn test_fatal_status_aborts_without_retry() {
        let script = vec![FetchResponse::Completed(HttpResponse::new(404, "no site"))];
        let api = ScriptedApi::new(script);
        let summary = exporter(api, NullSink, RecordType::Members).run().await;

        match &summary.error {
            Some(LappsError::Api(ApiError::FatalClientError { status, reason })) => {
                assert_eq!(*status, 404);
                assert_eq!(reason, "Not Found");
            }
            other => panic!("expected FatalClientError, got {other:?}"),
        }
        assert_eq!(summary.requests_issued, 1);
        assert_eq!(summary.exit_code(), 5);
    }

    #[tokio::test]
    async fn test_malformed_page_aborts_without_advancing() {
        let script = vec![ok(r#"{"not": "an array"}"#)];
        let summary = exporter(ScriptedApi::new(script), NullSink, RecordType::Members)
            .run()
            .await;

        assert!(matches!(
            summary.error,
            Some(LappsError::Api(ApiError::InvalidResponse(_)))
        ));
        assert_eq!(summary.final_cursor, Cursor::default());
        assert!(summary.pages.is_empty());
    }

    #[tokio::test]
    async fn test_record_without_pagination_fields_aborts() {
        let script = vec![ok(r#"[{"id": 1}]"#)];
        let summary = exporter(ScriptedApi::new(script), NullSink, RecordType::Registrations)
            .run()
            .await;

        assert!(matches!(summary.error, Some(LappsError::Serialization(_))));
        assert!(summary.pages.is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_cursor() {
        let script = vec![ok(r#"[{"id": 1, "lastUpdated": 10}]"#)];
        let summary = exporter(ScriptedApi::new(script), FailingSink, RecordType::Members)
            .run()
            .await;

        assert!(matches!(summary.error, Some(LappsError::Io(_))));
        assert_eq!(summary.final_cursor, Cursor::default());
    }

    #[tokio::test]
    async fn test_checkpoint_written_per_page_and_completed() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let script = vec![
            ok(r#"[{"id": 1, "lastUpdated": 10}, {"id": 2, "lastUpdated": 20}]"#),
            ok(r#"[{"id": 3, "lastUpdated": 30}]"#),
            ok("[]"),
        ];

        let exporter = exporter(ScriptedApi::new(script), NullSink, RecordType::Members)
            .with_checkpoints(store.clone());
        let run_id = exporter.run_id();
        let summary = exporter.run().await;
        assert!(summary.is_successful());

        let checkpoint = store
            .load(SiteId::new(42).unwrap(), RecordType::Members)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(checkpoint.cursor, Cursor::new(30, 3));
        assert_eq!(checkpoint.pages_exported, 2);
        assert_eq!(checkpoint.records_exported, 3);
        assert_eq!(checkpoint.status, CheckpointStatus::Completed);
        assert_eq!(checkpoint.last_run_id, run_id);
    }

    #[tokio::test]
    async fn test_no_checkpoint_when_nothing_persisted_on_abort() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let script = vec![FetchResponse::Completed(HttpResponse::new(400, ""))];

        let summary = exporter(ScriptedApi::new(script), NullSink, RecordType::Members)
            .with_checkpoints(store.clone())
            .run()
            .await;
        assert!(!summary.is_successful());

        let loaded = store
            .load(SiteId::new(42).unwrap(), RecordType::Members)
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_unpaginated_type_never_checkpoints() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let script = vec![ok(r#"[{"code": "A"}]"#)];

        let summary = exporter(ScriptedApi::new(script), NullSink, RecordType::AccountingCodes)
            .with_checkpoints(store.clone())
            .run()
            .await;
        assert!(summary.is_successful());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resumed_cursor_is_first_request() {
        let api = ScriptedApi::new(vec![ok("[]")]);
        let options = options(RecordType::Transactions).with_cursor(Cursor::new(500, 77));
        let backoff = Backoff::seeded(&options.policy, 1);
        let exporter = Exporter::with_backoff(api, NullSink, options, backoff);

        let summary = exporter.run().await;
        assert!(summary.is_successful());
        assert_eq!(summary.initial_cursor, Cursor::new(500, 77));
        assert_eq!(summary.final_cursor, Cursor::new(500, 77));
    }
}
