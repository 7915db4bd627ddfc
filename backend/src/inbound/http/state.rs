//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FileStorage, InsightsCommand, ReceiptCommand, ReceiptQuery, UsageQuota, WorkflowDispatcher,
    WorkflowEventHandler,
};
use crate::inbound::http::debug::IntegrationStatus;
use crate::inbound::http::workflows::WorkflowSigningKey;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Receipt mutations.
    pub receipts: Arc<dyn ReceiptCommand>,
    /// Receipt reads.
    pub receipts_query: Arc<dyn ReceiptQuery>,
    /// AI analysis.
    pub insights: Arc<dyn InsightsCommand>,
    /// Usage quota gate and reporting.
    pub usage: Arc<dyn UsageQuota>,
    /// Stored receipt files.
    pub files: Arc<dyn FileStorage>,
    /// Handler for inbound workflow callbacks.
    pub workflow_events: Arc<dyn WorkflowEventHandler>,
    /// Dispatcher used by the debug send endpoint.
    pub dispatcher: Arc<dyn WorkflowDispatcher>,
}

/// Settings that are not ports: secrets checked at the edge and
/// configuration reported by the debug endpoint.
#[derive(Clone, Default)]
pub struct HttpStateExtras {
    /// Expected `X-Workflow-Signature`; callbacks are refused without one.
    pub workflow_signing_key: Option<WorkflowSigningKey>,
    /// Which integrations were configured at startup.
    pub integrations: IntegrationStatus,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Receipt mutations.
    pub receipts: Arc<dyn ReceiptCommand>,
    /// Receipt reads.
    pub receipts_query: Arc<dyn ReceiptQuery>,
    /// AI analysis.
    pub insights: Arc<dyn InsightsCommand>,
    /// Usage quota gate and reporting.
    pub usage: Arc<dyn UsageQuota>,
    /// Stored receipt files.
    pub files: Arc<dyn FileStorage>,
    /// Handler for inbound workflow callbacks.
    pub workflow_events: Arc<dyn WorkflowEventHandler>,
    /// Dispatcher used by the debug send endpoint.
    pub dispatcher: Arc<dyn WorkflowDispatcher>,
    /// Expected workflow callback signature.
    pub workflow_signing_key: Option<WorkflowSigningKey>,
    /// Integration configuration summary.
    pub integrations: IntegrationStatus,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from ports with no workflow signing key.
    #[must_use]
    pub fn new(ports: HttpStatePorts) -> Self {
        Self::new_with_extra(ports, HttpStateExtras::default())
    }

    /// Construct state from ports and edge settings.
    #[must_use]
    pub fn new_with_extra(ports: HttpStatePorts, extras: HttpStateExtras) -> Self {
        let HttpStatePorts {
            receipts,
            receipts_query,
            insights,
            usage,
            files,
            workflow_events,
            dispatcher,
        } = ports;
        let HttpStateExtras {
            workflow_signing_key,
            integrations,
        } = extras;
        Self {
            receipts,
            receipts_query,
            insights,
            usage,
            files,
            workflow_events,
            dispatcher,
            workflow_signing_key,
            integrations,
        }
    }
}
