//! Background handler for receipt workflow events.
//!
//! Extraction reads the stored PDF, calls the extractor with jittered
//! exponential backoff for retryable failures, then either applies the result
//! or marks the receipt failed. Analysis events reuse the insight pipeline
//! without a quota gate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AnalyzeReceiptRequest, ExtractionRequest, FileStorage, InsightsCommand, ReceiptCommand,
    ReceiptExtractionError, ReceiptExtractor, ReceiptRepository, WorkflowEvent,
    WorkflowEventHandler,
};
use crate::domain::receipt_service::{RECEIPT_NOT_FOUND_MESSAGE, map_repository_error};
use crate::domain::{Error, ExtractedReceiptData, Receipt, ReceiptFacts, ReceiptId, UserId};

mod runtime;

pub use runtime::{EntropyJitter, ReceiptWorkflowPorts, ReceiptWorkflowRuntime, TokioSleeper};

/// Retry settings for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptWorkflowConfig {
    /// Maximum extractor calls per job, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single retry delay.
    pub max_backoff: Duration,
}

impl Default for ReceiptWorkflowConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Async sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use receipt_tracker::domain::receipt_workflow::BackoffJitter;
    /// use chrono::{TimeZone, Utc};
    /// use std::time::Duration;
    /// struct FixedJitter;
    /// impl BackoffJitter for FixedJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: chrono::DateTime<chrono::Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt) * 5)
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).single().expect("valid time");
    /// let delay = FixedJitter.jittered_delay(Duration::from_millis(100), 2, now);
    /// assert_eq!(delay, Duration::from_millis(110));
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Workflow handler for receipt extraction and analysis.
pub struct ReceiptWorkflow {
    receipts: Arc<dyn ReceiptRepository>,
    storage: Arc<dyn FileStorage>,
    extractor: Arc<dyn ReceiptExtractor>,
    commands: Arc<dyn ReceiptCommand>,
    insights: Arc<dyn InsightsCommand>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: ReceiptWorkflowConfig,
}

impl ReceiptWorkflow {
    /// Build a handler using the tokio sleeper and entropy jitter.
    pub fn new(
        ports: ReceiptWorkflowPorts,
        clock: Arc<dyn Clock>,
        config: ReceiptWorkflowConfig,
    ) -> Self {
        Self::with_runtime(ports, clock, ReceiptWorkflowRuntime::default(), config)
    }

    /// Build a handler with injected runtime abstractions.
    pub fn with_runtime(
        ports: ReceiptWorkflowPorts,
        clock: Arc<dyn Clock>,
        runtime: ReceiptWorkflowRuntime,
        config: ReceiptWorkflowConfig,
    ) -> Self {
        Self {
            receipts: ports.receipts,
            storage: ports.storage,
            extractor: ports.extractor,
            commands: ports.commands,
            insights: ports.insights,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config,
        }
    }

    async fn extract_receipt(&self, receipt_id: &ReceiptId) -> Result<(), Error> {
        let receipt = self
            .receipts
            .find_by_id(receipt_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(RECEIPT_NOT_FOUND_MESSAGE))?;

        let outcome = match self.storage.get(&receipt.storage_key).await {
            Ok(bytes) => self.extract_with_retry(&receipt, bytes).await,
            Err(error) => Err(Error::service_unavailable(format!(
                "receipt file unreadable: {error}"
            ))),
        };

        match outcome {
            Ok(data) => {
                self.commands.apply_extraction(receipt_id, data).await?;
                Ok(())
            }
            Err(error) => {
                warn!(%receipt_id, %error, "extraction failed; marking receipt failed");
                self.commands.mark_failed(receipt_id).await?;
                Err(error)
            }
        }
    }

    async fn extract_with_retry(
        &self,
        receipt: &Receipt,
        bytes: Vec<u8>,
    ) -> Result<ExtractedReceiptData, Error> {
        let request = ExtractionRequest {
            file_name: receipt.file_name.clone(),
            mime_type: receipt.mime_type.clone(),
            bytes,
        };
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.extractor.extract(&request).await {
                Ok(data) => {
                    info!(receipt_id = %receipt.id, attempt, "receipt extracted");
                    return Ok(data);
                }
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let base_delay = self.retry_base_delay(attempt);
                    let delay = self
                        .jitter
                        .jittered_delay(base_delay, attempt, self.clock.utc());
                    warn!(receipt_id = %receipt.id, attempt, %error, ?delay, "retrying extraction");
                    self.sleeper.sleep(delay).await;
                }
                Err(error) => return Err(map_extraction_error(error, attempt)),
            }
        }

        Err(Error::internal(
            "unreachable extraction control-flow state encountered",
        ))
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }

    async fn analyse_receipt(
        &self,
        receipt_id: ReceiptId,
        receipt_data: ReceiptFacts,
        user_id: UserId,
    ) -> Result<(), Error> {
        let receipt_data = (receipt_data != ReceiptFacts::default()).then_some(receipt_data);
        let analysis = self
            .insights
            .analyze_receipt(AnalyzeReceiptRequest {
                user_id,
                receipt_id,
                receipt_data,
            })
            .await?;
        info!(
            %receipt_id,
            analysis_type = ?analysis.analysis_type,
            "receipt analysis stored"
        );
        Ok(())
    }
}

fn map_extraction_error(error: ReceiptExtractionError, attempts: u32) -> Error {
    let message = format!("receipt extraction failed after {attempts} attempt(s): {error}");
    if error.is_retryable() {
        Error::service_unavailable(message)
    } else {
        Error::internal(message)
    }
}

#[async_trait]
impl WorkflowEventHandler for ReceiptWorkflow {
    async fn handle(&self, event: WorkflowEvent) -> Result<(), Error> {
        match event {
            WorkflowEvent::ExtractReceipt { url, receipt_id } => {
                info!(%receipt_id, %url, "extracting receipt");
                self.extract_receipt(&receipt_id).await
            }
            WorkflowEvent::AnalyzeReceipt {
                receipt_id,
                receipt_data,
                user_id,
            } => self.analyse_receipt(receipt_id, receipt_data, user_id).await,
        }
    }
}

#[cfg(test)]
mod tests;
