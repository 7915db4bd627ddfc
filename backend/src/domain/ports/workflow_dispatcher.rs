//! Driven port for handing background events to the workflow runtime.
//!
//! Events are serialised as `{ "name": ..., "data": ... }` envelopes so the
//! same payload can be queued in-process or posted to an external event API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{ReceiptFacts, ReceiptId, UserId};

use super::define_port_error;

/// Wire name of the extraction event.
pub const EXTRACT_RECEIPT_EVENT: &str = "extract_data_from_pdf_and_save_to_database";
/// Wire name of the analysis event.
pub const ANALYZE_RECEIPT_EVENT: &str = "ai/analyze-receipt";

/// Background event understood by the workflow handler.
///
/// # Examples
/// ```
/// use receipt_tracker::domain::ReceiptId;
/// use receipt_tracker::domain::ports::WorkflowEvent;
/// use url::Url;
///
/// let event = WorkflowEvent::ExtractReceipt {
///     url: Url::parse("http://localhost/files/a.pdf").expect("url"),
///     receipt_id: ReceiptId::random(),
/// };
/// let json = serde_json::to_value(&event).expect("serialise");
/// assert_eq!(json["name"], "extract_data_from_pdf_and_save_to_database");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data")]
pub enum WorkflowEvent {
    /// Extract structured data from an uploaded PDF and persist it.
    #[serde(rename = "extract_data_from_pdf_and_save_to_database")]
    ExtractReceipt {
        /// Public URL of the stored file.
        url: Url,
        /// Receipt to update.
        #[serde(rename = "receiptId")]
        receipt_id: ReceiptId,
    },
    /// Run AI analysis over already extracted receipt data.
    #[serde(rename = "ai/analyze-receipt")]
    AnalyzeReceipt {
        /// Receipt to update.
        #[serde(rename = "receiptId")]
        receipt_id: ReceiptId,
        /// Facts to analyse.
        #[serde(rename = "receiptData", default)]
        receipt_data: ReceiptFacts,
        /// Owner of the receipt.
        #[serde(rename = "userId")]
        user_id: UserId,
    },
}

impl WorkflowEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ExtractReceipt { .. } => EXTRACT_RECEIPT_EVENT,
            Self::AnalyzeReceipt { .. } => ANALYZE_RECEIPT_EVENT,
        }
    }

    /// Receipt the event concerns.
    #[must_use]
    pub const fn receipt_id(&self) -> &ReceiptId {
        match self {
            Self::ExtractReceipt { receipt_id, .. } | Self::AnalyzeReceipt { receipt_id, .. } => {
                receipt_id
            }
        }
    }
}

/// Acknowledgement returned once an event has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DispatchedEvent {
    /// Identifiers assigned by the workflow runtime.
    pub ids: Vec<String>,
}

define_port_error! {
    /// Errors raised while dispatching workflow events.
    pub enum WorkflowDispatchError {
        /// Workflow runtime is not accepting events.
        Unavailable { message: String } =>
            "workflow runtime unavailable: {message}",
        /// Network transport failed.
        Transport { message: String } =>
            "workflow transport failed: {message}",
        /// Workflow runtime rejected the event.
        Rejected { message: String } =>
            "workflow runtime rejected event: {message}",
    }
}

/// Port for enqueuing workflow events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    /// Hand `event` to the workflow runtime.
    async fn dispatch(&self, event: WorkflowEvent) -> Result<DispatchedEvent, WorkflowDispatchError>;
}

/// Fixture implementation that accepts and drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureWorkflowDispatcher;

#[async_trait]
impl WorkflowDispatcher for FixtureWorkflowDispatcher {
    async fn dispatch(&self, event: WorkflowEvent) -> Result<DispatchedEvent, WorkflowDispatchError> {
        Ok(DispatchedEvent {
            ids: vec![event.receipt_id().to_string()],
        })
    }
}
