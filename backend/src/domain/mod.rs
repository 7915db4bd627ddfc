//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed receipt and usage entities, the ports that
//! bound the hexagon, and the services that orchestrate them. Types document
//! their invariants and serialisation contracts (serde) in their Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - Receipt and UsageCheck — the aggregates exposed over HTTP.
//! - UsageQuotaService, ReceiptService, InsightsService, ReceiptWorkflow —
//!   driving port implementations wired by the server.

pub mod error;
pub mod insights;
mod insights_service;
pub mod plan;
pub mod ports;
pub mod receipt;
mod receipt_service;
pub mod receipt_workflow;
pub mod trace_id;
pub mod usage;
mod usage_quota_service;
pub mod user;

pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::insights::{
    AnalysisType, EnhancedItem, GeneratedInsights, InsightReport, ReceiptAnalysis, ReceiptFacts,
};
pub use self::insights_service::InsightsService;
pub use self::plan::{Feature, PlanParseError, PlanTier, UsageLimit};
pub use self::receipt::{
    ExtractedReceiptData, LineItem, NewReceipt, Receipt, ReceiptId, ReceiptStatus,
    ReceiptStatusParseError, StatusTransitionError, StorageKey, StorageKeyError,
};
pub use self::receipt_service::{
    INVALID_FILE_TYPE_MESSAGE, RECEIPT_NOT_FOUND_MESSAGE, ReceiptService, ReceiptServiceConfig,
    ReceiptServicePorts, UPLOAD_FAILED_MESSAGE, USAGE_LIMIT_EXCEEDED_MESSAGE,
};
pub use self::receipt_workflow::{
    ReceiptWorkflow, ReceiptWorkflowConfig, ReceiptWorkflowPorts, ReceiptWorkflowRuntime,
};
pub use self::trace_id::TraceId;
pub use self::usage::{FeatureUsage, UsageCheck, UsageRecord, UsageSummary};
pub use self::usage_quota_service::{UsageQuotaService, admit_use};
pub use self::user::{UserId, UserValidationError};

