//! Integration tests for the export loop
//!
//! The loop is driven by a scripted [`ExportApi`] so every request it issues
//! can be inspected afterwards. Tests run on a paused tokio clock, so backoff
//! sleeps complete instantly while still advancing virtual time.

use async_trait::async_trait;
use lapps_export::adapters::leagueapps::{ExportApi, FetchResponse, HttpResponse, PageRequest};
use lapps_export::adapters::output::{NullSink, PageArtifact, PageSink};
use lapps_export::core::export::{
    ExportOptions, ExportSummary, Exporter, RetryReason,
};
use lapps_export::core::retry::{Backoff, RetryPolicy};
use lapps_export::domain::errors::TransientCause;
use lapps_export::domain::{
    AccessToken, ApiError, Cursor, LappsError, Page, RecordType, Result, SiteId,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const SLOT: Duration = Duration::from_millis(1420);

#[derive(Default)]
struct Script {
    tokens: Mutex<VecDeque<Result<AccessToken>>>,
    pages: Mutex<VecDeque<FetchResponse>>,
    token_calls: Mutex<u32>,
    requests: Mutex<Vec<(PageRequest, String, Instant)>>,
}

#[derive(Clone, Default)]
struct ScriptedApi(Arc<Script>);

impl ScriptedApi {
    fn with_pages(pages: Vec<FetchResponse>) -> Self {
        let api = Self::default();
        *api.0.pages.lock().unwrap() = pages.into();
        api
    }

    fn fail_token(self, error: LappsError) -> Self {
        self.0.tokens.lock().unwrap().push_back(Err(error));
        self
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.0.requests.lock().unwrap().iter().map(|r| r.0).collect()
    }

    fn request_tokens(&self) -> Vec<String> {
        self.0
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.1.clone())
            .collect()
    }

    fn request_times(&self) -> Vec<Instant> {
        self.0.requests.lock().unwrap().iter().map(|r| r.2).collect()
    }

    fn token_calls(&self) -> u32 {
        *self.0.token_calls.lock().unwrap()
    }
}

#[async_trait]
impl ExportApi for ScriptedApi {
    async fn obtain_token(&self) -> Result<AccessToken> {
        let mut calls = self.0.token_calls.lock().unwrap();
        *calls += 1;
        match self.0.tokens.lock().unwrap().pop_front() {
            Some(scripted) => scripted,
            None => Ok(AccessToken::new(format!("tok-{}", *calls))),
        }
    }

    async fn fetch_page(&self, request: &PageRequest, token: &AccessToken) -> FetchResponse {
        self.0.requests.lock().unwrap().push((
            *request,
            token.as_str().to_string(),
            Instant::now(),
        ));
        self.0
            .pages
            .lock()
            .unwrap()
            .pop_front()
            .expect("loop issued a request the script did not expect")
    }
}

/// Sink keeping every page in memory
#[derive(Clone, Default)]
struct MemorySink(Arc<Mutex<Vec<Page>>>);

impl MemorySink {
    fn pages(&self) -> Vec<Page> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSink for MemorySink {
    async fn write_page(&mut self, page: &Page) -> Result<PageArtifact> {
        self.0.lock().unwrap().push(page.clone());
        Ok(PageArtifact::unwritten(page))
    }

    async fn finish(&mut self, _summary: &ExportSummary) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

fn ok(body: &str) -> FetchResponse {
    FetchResponse::Completed(HttpResponse::new(200, body))
}

fn status(code: u16) -> FetchResponse {
    FetchResponse::Completed(HttpResponse::new(code, ""))
}

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        slot_time: SLOT,
        max_slots: 5,
    }
}

async fn run_with<S: PageSink>(
    api: &ScriptedApi,
    sink: S,
    record_type: RecordType,
    cursor: Cursor,
) -> ExportSummary {
    let options = ExportOptions::new(SiteId::new(42).unwrap(), record_type)
        .with_cursor(cursor)
        .with_policy(policy());
    let backoff = Backoff::seeded(&options.policy, 2024);
    Exporter::with_backoff(api.clone(), sink, options, backoff)
        .run()
        .await
}

async fn run(api: &ScriptedApi, record_type: RecordType) -> ExportSummary {
    run_with(api, NullSink, record_type, Cursor::default()).await
}

#[tokio::test(start_paused = true)]
async fn test_cursor_moves_to_last_record_of_page() {
    let api = ScriptedApi::with_pages(vec![
        ok(r#"[{"id": 1, "lastUpdated": 100}, {"id": 2, "lastUpdated": 150}]"#),
        ok("[]"),
    ]);
    let sink = MemorySink::default();

    let summary = run_with(&api, sink.clone(), RecordType::Members, Cursor::default()).await;

    assert!(summary.is_successful(), "{:?}", summary.error);
    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].cursor, Cursor::new(0, 0));
    assert_eq!(requests[1].cursor, Cursor::new(150, 2));
    assert_eq!(
        requests[1].cursor.to_string(),
        "last-updated=150&last-id=2"
    );
    assert_eq!(summary.final_cursor, Cursor::new(150, 2));

    let pages = sink.pages();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].batch, 1);
    assert_eq!(pages[0].len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_each_request_carries_previous_page_watermark() {
    let api = ScriptedApi::with_pages(vec![
        ok(r#"[{"id": 5, "lastUpdated": 10}, {"id": 9, "lastUpdated": 20}]"#),
        ok(r#"[{"id": 3, "lastUpdated": 30}]"#),
        ok(r#"[{"id": 4, "lastUpdated": 30}, {"id": 8, "lastUpdated": 45}]"#),
        ok("[]"),
    ]);

    let summary = run(&api, RecordType::Transactions).await;

    assert!(summary.is_successful());
    let cursors: Vec<Cursor> = api.requests().iter().map(|r| r.cursor).collect();
    assert_eq!(
        cursors,
        vec![
            Cursor::new(0, 0),
            Cursor::new(20, 9),
            Cursor::new(30, 3),
            Cursor::new(45, 8),
        ]
    );
    assert_eq!(summary.pages.len(), 3);
    assert_eq!(summary.total_records, 5);
    assert_eq!(summary.tokens_requested, 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_page_ends_run() {
    let api = ScriptedApi::with_pages(vec![ok("[]")]);

    let summary = run(&api, RecordType::Registrations).await;

    assert!(summary.is_successful());
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(api.requests().len(), 1);
    assert!(summary.pages.is_empty());
    assert_eq!(summary.final_cursor, Cursor::default());
}

#[tokio::test(start_paused = true)]
async fn test_five_retryable_responses_abort_without_sixth_request() {
    let api = ScriptedApi::with_pages(vec![
        status(503),
        status(429),
        status(500),
        FetchResponse::TimedOut(Duration::from_secs(10)),
        status(502),
    ]);

    let summary = run(&api, RecordType::Members).await;

    match &summary.error {
        Some(LappsError::Api(ApiError::RetryExhausted { attempts, last })) => {
            assert_eq!(*attempts, 5);
            assert!(matches!(
                **last,
                ApiError::TransientServerError(TransientCause::Status(502))
            ));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
    assert_eq!(summary.exit_code(), 4);
    assert_eq!(api.requests().len(), 5);
    // Four backoffs; the fifth failure aborts instead of sleeping
    assert_eq!(summary.retries.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_401_and_retryable_count_toward_ceiling() {
    let api = ScriptedApi::with_pages(vec![
        status(401),
        status(429),
        status(401),
        status(503),
        status(401),
    ]);

    let summary = run(&api, RecordType::Members).await;

    assert!(matches!(
        summary.error,
        Some(LappsError::Api(ApiError::RetryExhausted { attempts: 5, .. }))
    ));
    assert_eq!(api.requests().len(), 5);
    // Initial token plus one per retried 401; the final 401 aborts
    assert_eq!(api.token_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_always_401_halts_after_five_attempts() {
    let api = ScriptedApi::with_pages(vec![status(401); 5]);

    let summary = run(&api, RecordType::Members).await;

    assert_eq!(summary.exit_code(), 4);
    assert_eq!(api.requests().len(), 5);
    assert!(summary.retries.iter().all(|r| r.delay.is_none()));
    match &summary.error {
        Some(LappsError::Api(ApiError::RetryExhausted { last, .. })) => {
            assert!(matches!(**last, ApiError::TokenExpired));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_401_refreshes_token_without_sleeping() {
    let api = ScriptedApi::with_pages(vec![
        status(401),
        ok(r#"[{"id": 1, "lastUpdated": 100}]"#),
        ok("[]"),
    ]);

    let summary = run(&api, RecordType::Members).await;

    assert!(summary.is_successful());
    assert_eq!(summary.retries.len(), 1);
    assert_eq!(summary.retries[0].reason, RetryReason::TokenExpired);
    assert_eq!(summary.retries[0].delay, None);

    let times = api.request_times();
    assert_eq!(times[0], times[1], "virtual clock advanced across a 401 retry");

    let tokens = api.request_tokens();
    assert_eq!(tokens, vec!["tok-1", "tok-2", "tok-2"]);
    // The cursor did not move on the 401
    assert_eq!(api.requests()[1].cursor, Cursor::default());
}

#[tokio::test(start_paused = true)]
async fn test_retryable_responses_always_back_off() {
    let api = ScriptedApi::with_pages(vec![
        status(429),
        status(500),
        status(503),
        ok("[]"),
    ]);

    let summary = run(&api, RecordType::Members).await;

    assert!(summary.is_successful());
    assert_eq!(summary.retries.len(), 3);
    for (i, retry) in summary.retries.iter().enumerate() {
        let delay = retry.delay.expect("retryable status must back off");
        let attempt = (i + 1) as u32;
        assert_eq!(retry.attempt, attempt);
        assert!(delay <= SLOT * ((1 << attempt) - 1));
    }
    assert_eq!(
        summary.retries[0].reason,
        RetryReason::Transient(TransientCause::Status(429))
    );

    // Virtual time between requests matches the recorded backoff
    let times = api.request_times();
    for (i, retry) in summary.retries.iter().enumerate() {
        assert_eq!(times[i + 1] - times[i], retry.delay.unwrap());
    }
    // Same token throughout: backoff does not re-authenticate
    assert_eq!(api.token_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_never_exceeds_capped_maximum() {
    let ceiling = SLOT * 31;
    assert_eq!(policy().max_delay(), ceiling);

    let mut backoff = Backoff::seeded(&policy(), 77);
    for attempts in 0..=12 {
        for _ in 0..100 {
            assert!(backoff.delay(attempts) <= ceiling);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_token_rejection_aborts_before_any_export_request() {
    let api = ScriptedApi::with_pages(vec![]).fail_token(
        ApiError::AuthFailure {
            status: 403,
            body: "invalid_client".to_string(),
        }
        .into(),
    );

    let summary = run(&api, RecordType::Members).await;

    assert!(matches!(
        summary.error,
        Some(LappsError::Api(ApiError::AuthFailure { status: 403, .. }))
    ));
    assert_eq!(summary.exit_code(), 3);
    assert!(api.requests().is_empty());
    assert_eq!(summary.requests_issued, 0);
}

#[tokio::test(start_paused = true)]
async fn test_token_rejection_after_401_aborts() {
    let api = ScriptedApi::with_pages(vec![status(401)]);
    // First token succeeds, the refresh is refused
    api.0
        .tokens
        .lock()
        .unwrap()
        .extend([
            Ok(AccessToken::new("first")),
            Err(ApiError::AuthFailure {
                status: 400,
                body: "expired key".to_string(),
            }
            .into()),
        ]);

    let summary = run(&api, RecordType::Members).await;

    assert_eq!(summary.exit_code(), 3);
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unpaginated_type_stops_after_one_page() {
    // Records carry no pagination metadata, and the page is not empty
    let api = ScriptedApi::with_pages(vec![ok(
        r#"[{"code": "4000", "name": "Fees"}, {"code": "4100", "name": "Uniforms"}]"#,
    )]);
    let sink = MemorySink::default();
    let start = Cursor::new(7, 3);

    let summary = run_with(&api, sink.clone(), RecordType::AccountingCodes, start).await;

    assert!(summary.is_successful(), "{:?}", summary.error);
    assert_eq!(api.requests().len(), 1);
    assert_eq!(api.requests()[0].record_type, RecordType::AccountingCodes);
    assert_eq!(summary.final_cursor, start);
    assert_eq!(sink.pages().len(), 1);
    assert_eq!(summary.total_records, 2);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_client_error_aborts_immediately() {
    let api = ScriptedApi::with_pages(vec![
        ok(r#"[{"id": 1, "lastUpdated": 100}]"#),
        status(403),
    ]);

    let summary = run(&api, RecordType::Members).await;

    assert!(matches!(
        summary.error,
        Some(LappsError::Api(ApiError::FatalClientError { status: 403, .. }))
    ));
    assert_eq!(summary.exit_code(), 5);
    assert_eq!(api.requests().len(), 2);
    // The persisted page still counts and the cursor reflects it
    assert_eq!(summary.pages.len(), 1);
    assert_eq!(summary.final_cursor, Cursor::new(100, 1));
}

#[tokio::test(start_paused = true)]
async fn test_dry_run_counts_pages() {
    let api = ScriptedApi::with_pages(vec![
        ok(r#"[{"id": 1, "lastUpdated": 100}, {"id": 2, "lastUpdated": 150}]"#),
        ok("[]"),
    ]);
    let options = ExportOptions::new(SiteId::new(42).unwrap(), RecordType::Members)
        .with_policy(policy())
        .with_dry_run(true);
    let backoff = Backoff::seeded(&options.policy, 1);

    let summary = Exporter::with_backoff(api.clone(), NullSink, options, backoff)
        .run()
        .await;

    assert!(summary.is_successful());
    assert!(summary.dry_run);
    assert_eq!(summary.total_records, 2);
    assert!(summary.pages.iter().all(|p| p.path.is_none()));
}
