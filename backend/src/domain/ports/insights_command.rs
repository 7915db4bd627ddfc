//! Driving port for AI receipt analysis.

use async_trait::async_trait;

use crate::domain::{Error, GeneratedInsights, ReceiptAnalysis, ReceiptFacts, ReceiptId, UserId};

/// Analysis request for one receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeReceiptRequest {
    /// Requesting user, who must own the receipt.
    pub user_id: UserId,
    /// Receipt to analyse.
    pub receipt_id: ReceiptId,
    /// Facts to analyse; the stored receipt's fields are used when absent.
    pub receipt_data: Option<ReceiptFacts>,
}

/// Driving port for insight generation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightsCommand: Send + Sync {
    /// Quota-gated analysis that also settles the receipt's status.
    async fn direct_analysis(&self, request: AnalyzeReceiptRequest)
    -> Result<ReceiptAnalysis, Error>;

    /// Quota-gated insight generation without status changes.
    async fn generate_insights(
        &self,
        request: AnalyzeReceiptRequest,
    ) -> Result<GeneratedInsights, Error>;

    /// Analysis triggered by a workflow event.
    ///
    /// The quota was charged when the event was accepted, so no gate applies.
    async fn analyze_receipt(&self, request: AnalyzeReceiptRequest)
    -> Result<ReceiptAnalysis, Error>;
}
