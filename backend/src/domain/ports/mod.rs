//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod entitlement_provider;
mod file_storage;
mod insight_generator;
mod insights_command;
mod receipt_command;
mod receipt_extractor;
mod receipt_query;
mod receipt_repository;
mod usage_quota;
mod usage_repository;
mod workflow_dispatcher;
mod workflow_event_handler;

#[cfg(test)]
pub use entitlement_provider::MockEntitlementProvider;
pub use entitlement_provider::{
    ENTERPRISE_PLAN_FLAG, EntitlementProvider, EntitlementProviderError,
    FixtureEntitlementProvider, PRO_PLAN_FLAG, RECEIPT_SCAN_EVENT,
};
#[cfg(test)]
pub use file_storage::MockFileStorage;
pub use file_storage::{FileStorage, FileStorageError, FixtureFileStorage};
#[cfg(test)]
pub use insight_generator::MockInsightGenerator;
pub use insight_generator::{FixtureInsightGenerator, InsightGenerator, InsightGeneratorError};
#[cfg(test)]
pub use insights_command::MockInsightsCommand;
pub use insights_command::{AnalyzeReceiptRequest, InsightsCommand};
#[cfg(test)]
pub use receipt_command::MockReceiptCommand;
pub use receipt_command::{PDF_MIME_TYPE, ReceiptCommand, UploadReceiptRequest, UploadedReceipt};
#[cfg(test)]
pub use receipt_extractor::MockReceiptExtractor;
pub use receipt_extractor::{
    ExtractionRequest, FixtureReceiptExtractor, ReceiptExtractionError, ReceiptExtractor,
};
#[cfg(test)]
pub use receipt_query::MockReceiptQuery;
pub use receipt_query::ReceiptQuery;
#[cfg(test)]
pub use receipt_repository::MockReceiptRepository;
pub use receipt_repository::{
    FixtureReceiptRepository, ReceiptRepository, ReceiptRepositoryError,
};
#[cfg(test)]
pub use usage_quota::MockUsageQuota;
pub use usage_quota::{FixtureUsageQuota, UsageQuota};
#[cfg(test)]
pub use usage_repository::MockUsageRepository;
pub use usage_repository::{FixtureUsageRepository, UsageRepository, UsageRepositoryError};
#[cfg(test)]
pub use workflow_dispatcher::MockWorkflowDispatcher;
pub use workflow_dispatcher::{
    ANALYZE_RECEIPT_EVENT, DispatchedEvent, EXTRACT_RECEIPT_EVENT, FixtureWorkflowDispatcher,
    WorkflowDispatchError, WorkflowDispatcher, WorkflowEvent,
};
#[cfg(test)]
pub use workflow_event_handler::MockWorkflowEventHandler;
pub use workflow_event_handler::{FixtureWorkflowEventHandler, WorkflowEventHandler};
