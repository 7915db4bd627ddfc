//! Unit tests for receipt workflow orchestration.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use url::Url;

use super::*;
use crate::domain::ports::{
    FileStorageError, MockFileStorage, MockInsightsCommand, MockReceiptCommand,
    MockReceiptRepository,
};
use crate::domain::{
    AnalysisType, ErrorCode, InsightReport, NewReceipt, ReceiptAnalysis, ReceiptStatus,
    StorageKey,
};

struct FixtureClock(DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 7, 15, 0)
        .single()
        .expect("valid timestamp")
}

#[derive(Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().expect("delays mutex").push(duration);
    }
}

struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

struct ExtractorStub {
    scripted: Mutex<VecDeque<Result<ExtractedReceiptData, ReceiptExtractionError>>>,
    calls: AtomicUsize,
}

impl ExtractorStub {
    fn scripted(scripted: Vec<Result<ExtractedReceiptData, ReceiptExtractionError>>) -> Self {
        Self {
            scripted: Mutex::new(scripted.into()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReceiptExtractor for ExtractorStub {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractedReceiptData, ReceiptExtractionError> {
        assert_eq!(request.mime_type, "application/pdf");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scripted
            .lock()
            .expect("script mutex")
            .pop_front()
            .unwrap_or_else(|| Err(ReceiptExtractionError::invalid_request("script exhausted")))
    }
}

fn processing_receipt() -> Receipt {
    Receipt::new_upload(
        NewReceipt {
            user_id: UserId::random(),
            storage_key: StorageKey::generate_pdf(),
            file_name: "fuel.pdf".to_owned(),
            size_bytes: 64,
            mime_type: "application/pdf".to_owned(),
        },
        fixed_now(),
    )
}

struct Harness {
    receipt: Receipt,
    receipts: MockReceiptRepository,
    storage: MockFileStorage,
    commands: MockReceiptCommand,
    insights: MockInsightsCommand,
    sleeper: Arc<RecordingSleeper>,
    config: ReceiptWorkflowConfig,
}

impl Harness {
    fn build(self, extractor: Arc<dyn ReceiptExtractor>) -> ReceiptWorkflow {
        ReceiptWorkflow::with_runtime(
            ReceiptWorkflowPorts {
                receipts: Arc::new(self.receipts),
                storage: Arc::new(self.storage),
                extractor,
                commands: Arc::new(self.commands),
                insights: Arc::new(self.insights),
            },
            Arc::new(FixtureClock(fixed_now())),
            ReceiptWorkflowRuntime {
                sleeper: self.sleeper,
                jitter: Arc::new(NoJitter),
            },
            self.config,
        )
    }
}

#[fixture]
fn harness() -> Harness {
    let receipt = processing_receipt();
    let mut receipts = MockReceiptRepository::new();
    let stored = receipt.clone();
    receipts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    let mut storage = MockFileStorage::new();
    storage
        .expect_get()
        .returning(|_| Ok(b"%PDF-1.7".to_vec()));
    Harness {
        receipt,
        receipts,
        storage,
        commands: MockReceiptCommand::new(),
        insights: MockInsightsCommand::new(),
        sleeper: Arc::new(RecordingSleeper::default()),
        config: ReceiptWorkflowConfig::default(),
    }
}

fn extract_event(receipt: &Receipt) -> WorkflowEvent {
    WorkflowEvent::ExtractReceipt {
        url: Url::parse("http://localhost:8080/files/a.pdf").expect("url"),
        receipt_id: receipt.id,
    }
}

fn shell_data() -> ExtractedReceiptData {
    ExtractedReceiptData {
        merchant_name: Some("Shell".to_owned()),
        transaction_amount: Some(48.2),
        ..ExtractedReceiptData::default()
    }
}

#[rstest]
#[tokio::test]
async fn retries_transient_failures_then_applies(mut harness: Harness) {
    let completed = harness.receipt.clone();
    harness
        .commands
        .expect_apply_extraction()
        .withf(|_, data| data.merchant_name.as_deref() == Some("Shell"))
        .times(1)
        .return_once(move |_, _| Ok(completed));
    harness.commands.expect_mark_failed().times(0);
    let event = extract_event(&harness.receipt);
    let sleeper = Arc::clone(&harness.sleeper);
    let extractor = Arc::new(ExtractorStub::scripted(vec![
        Err(ReceiptExtractionError::timeout("30s")),
        Ok(shell_data()),
    ]));
    let workflow = harness.build(extractor.clone());

    workflow.handle(event).await.expect("extraction succeeds");

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        *sleeper.delays.lock().expect("delays"),
        vec![Duration::from_millis(200)]
    );
}

#[rstest]
#[tokio::test]
async fn exhausted_retries_mark_receipt_failed(mut harness: Harness) {
    harness.commands.expect_apply_extraction().times(0);
    harness
        .commands
        .expect_mark_failed()
        .times(1)
        .returning(|_| Ok(()));
    let event = extract_event(&harness.receipt);
    let sleeper = Arc::clone(&harness.sleeper);
    let extractor = Arc::new(ExtractorStub::scripted(vec![
        Err(ReceiptExtractionError::transport("reset")),
        Err(ReceiptExtractionError::rate_limited("429")),
        Err(ReceiptExtractionError::transport("reset")),
    ]));
    let workflow = harness.build(extractor.clone());

    let error = workflow.handle(event).await.expect_err("exhausted");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        *sleeper.delays.lock().expect("delays"),
        vec![Duration::from_millis(200), Duration::from_millis(400)]
    );
}

#[rstest]
#[tokio::test]
async fn backoff_is_capped(mut harness: Harness) {
    harness.config = ReceiptWorkflowConfig {
        max_attempts: 4,
        initial_backoff: Duration::from_millis(200),
        max_backoff: Duration::from_millis(300),
    };
    harness.commands.expect_mark_failed().returning(|_| Ok(()));
    let event = extract_event(&harness.receipt);
    let sleeper = Arc::clone(&harness.sleeper);
    let extractor = Arc::new(ExtractorStub::scripted(vec![
        Err(ReceiptExtractionError::timeout("1")),
        Err(ReceiptExtractionError::timeout("2")),
        Err(ReceiptExtractionError::timeout("3")),
        Err(ReceiptExtractionError::timeout("4")),
    ]));
    let workflow = harness.build(extractor);

    workflow.handle(event).await.expect_err("exhausted");

    assert_eq!(
        *sleeper.delays.lock().expect("delays"),
        vec![
            Duration::from_millis(200),
            Duration::from_millis(300),
            Duration::from_millis(300),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn undecodable_output_fails_without_retry(mut harness: Harness) {
    harness
        .commands
        .expect_mark_failed()
        .times(1)
        .returning(|_| Ok(()));
    let event = extract_event(&harness.receipt);
    let sleeper = Arc::clone(&harness.sleeper);
    let extractor = Arc::new(ExtractorStub::scripted(vec![Err(
        ReceiptExtractionError::decode("not json"),
    )]));
    let workflow = harness.build(extractor.clone());

    let error = workflow.handle(event).await.expect_err("decode failure");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    assert!(sleeper.delays.lock().expect("delays").is_empty());
}

#[rstest]
#[tokio::test]
async fn unreadable_file_marks_receipt_failed(mut harness: Harness) {
    harness.storage = MockFileStorage::new();
    harness
        .storage
        .expect_get()
        .returning(|key| Err(FileStorageError::not_found(key.to_string())));
    harness
        .commands
        .expect_mark_failed()
        .times(1)
        .returning(|_| Ok(()));
    let event = extract_event(&harness.receipt);
    let extractor = Arc::new(ExtractorStub::scripted(Vec::new()));
    let workflow = harness.build(extractor.clone());

    workflow.handle(event).await.expect_err("no file");

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn unknown_receipt_is_not_found(mut harness: Harness) {
    harness.receipts = MockReceiptRepository::new();
    harness.receipts.expect_find_by_id().returning(|_| Ok(None));
    harness.commands.expect_mark_failed().times(0);
    let event = extract_event(&harness.receipt);
    let workflow = harness.build(Arc::new(ExtractorStub::scripted(Vec::new())));

    let error = workflow.handle(event).await.expect_err("missing");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

fn analysis_for(request: &AnalyzeReceiptRequest) -> ReceiptAnalysis {
    ReceiptAnalysis {
        report: InsightReport::default(),
        items: Vec::new(),
        analysis_type: AnalysisType::Fallback,
        status: ReceiptStatus::Completed,
        timestamp: fixed_now(),
        receipt_id: request.receipt_id,
        user_id: request.user_id.clone(),
        error: None,
    }
}

#[rstest]
#[case(ReceiptFacts::default(), false)]
#[case(ReceiptFacts { merchant_name: Some("CVS".to_owned()), ..ReceiptFacts::default() }, true)]
#[tokio::test]
async fn analysis_event_forwards_supplied_facts(
    mut harness: Harness,
    #[case] facts: ReceiptFacts,
    #[case] forwarded: bool,
) {
    harness
        .insights
        .expect_analyze_receipt()
        .withf(move |request| request.receipt_data.is_some() == forwarded)
        .times(1)
        .returning(|request| Ok(analysis_for(&request)));
    let event = WorkflowEvent::AnalyzeReceipt {
        receipt_id: harness.receipt.id,
        receipt_data: facts,
        user_id: harness.receipt.user_id.clone(),
    };
    let workflow = harness.build(Arc::new(ExtractorStub::scripted(Vec::new())));

    workflow.handle(event).await.expect("analysis runs");
}
