//! Insight service implementing [`InsightsCommand`].
//!
//! Both the direct analysis and the workflow-triggered analysis settle the
//! receipt as `completed`, even when the model could not be reached; the
//! template fallback stands in for the model's answer.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::insights::{
    AI_UNAVAILABLE_MESSAGE, categorize_spending, direct_analysis_fallback,
    direct_analysis_prompt, generated_insights_fallback, insights_prompt, parse_insight_report,
};
use crate::domain::ports::{
    AnalyzeReceiptRequest, InsightGenerator, InsightsCommand, ReceiptRepository, UsageQuota,
};
use crate::domain::receipt_service::{RECEIPT_NOT_FOUND_MESSAGE, map_repository_error};
use crate::domain::usage_quota_service::admit_use;
use crate::domain::{
    AnalysisType, EnhancedItem, Error, Feature, GeneratedInsights, InsightReport, Receipt,
    ReceiptAnalysis, ReceiptFacts, ReceiptId, ReceiptStatus, UserId,
};

/// Insight service backed by an [`InsightGenerator`].
#[derive(Clone)]
pub struct InsightsService {
    receipts: Arc<dyn ReceiptRepository>,
    quota: Arc<dyn UsageQuota>,
    generator: Arc<dyn InsightGenerator>,
    clock: Arc<dyn Clock>,
}

struct Answer {
    report: InsightReport,
    from_model: bool,
    error: Option<String>,
}

impl InsightsService {
    /// Create a new insight service.
    pub fn new(
        receipts: Arc<dyn ReceiptRepository>,
        quota: Arc<dyn UsageQuota>,
        generator: Arc<dyn InsightGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            receipts,
            quota,
            generator,
            clock,
        }
    }

    async fn owned_receipt(&self, request: &AnalyzeReceiptRequest) -> Result<Receipt, Error> {
        self.receipts
            .find_for_user(&request.user_id, &request.receipt_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(RECEIPT_NOT_FOUND_MESSAGE))
    }

    /// Check and charge the `ai-insights` quota.
    async fn charge_insight(&self, user_id: &UserId) -> Result<(), Error> {
        let plan = admit_use(self.quota.as_ref(), user_id, Feature::AiInsights).await?;
        self.quota
            .increment(user_id, Feature::AiInsights, plan)
            .await;
        Ok(())
    }

    async fn ask_for_analysis(&self, facts: &ReceiptFacts) -> Answer {
        match self.generator.generate(&direct_analysis_prompt(facts)).await {
            Ok(text) => match parse_insight_report(&text) {
                Some(report) => Answer {
                    report: with_category(report, facts),
                    from_model: true,
                    error: None,
                },
                None => {
                    debug!("model answer did not parse; using template analysis");
                    Answer {
                        report: direct_analysis_fallback(facts, true),
                        from_model: false,
                        error: None,
                    }
                }
            },
            Err(error) => {
                warn!(%error, "insight generator failed; using template analysis");
                Answer {
                    report: direct_analysis_fallback(facts, false),
                    from_model: false,
                    error: Some(AI_UNAVAILABLE_MESSAGE.to_owned()),
                }
            }
        }
    }

    /// Move the stored receipt from `from` to `to` without touching its data.
    ///
    /// Returns the status the receipt holds afterwards, which differs from
    /// `to` when another writer settled it first.
    async fn settle_status(
        &self,
        id: &ReceiptId,
        from: ReceiptStatus,
        to: ReceiptStatus,
    ) -> Result<ReceiptStatus, Error> {
        from.transition_to(to)
            .map_err(|error| Error::conflict(error.to_string()))?;
        let moved = self
            .receipts
            .set_status(id, from, to)
            .await
            .map_err(map_repository_error)?;
        if moved {
            return Ok(to);
        }
        let stored = self
            .receipts
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(RECEIPT_NOT_FOUND_MESSAGE))?;
        debug!(receipt_id = %id, status = %stored.status, "receipt status changed concurrently");
        Ok(stored.status)
    }

    async fn analyse(&self, receipt: Receipt, facts: ReceiptFacts) -> Result<ReceiptAnalysis, Error> {
        self.settle_status(&receipt.id, receipt.status, ReceiptStatus::Processing)
            .await?;
        let answer = self.ask_for_analysis(&facts).await;
        let status = self
            .settle_status(&receipt.id, ReceiptStatus::Processing, ReceiptStatus::Completed)
            .await?;

        Ok(ReceiptAnalysis {
            report: answer.report,
            items: facts.items.iter().map(EnhancedItem::from).collect(),
            analysis_type: if answer.from_model {
                AnalysisType::GeminiAi
            } else {
                AnalysisType::Fallback
            },
            status,
            timestamp: self.clock.utc(),
            receipt_id: receipt.id,
            user_id: receipt.user_id,
            error: answer.error,
        })
    }
}

fn with_category(mut report: InsightReport, facts: &ReceiptFacts) -> InsightReport {
    if report.category.trim().is_empty() {
        report.category = categorize_spending(facts.merchant_name.as_deref()).to_owned();
    }
    report
}

fn facts_for(request: &AnalyzeReceiptRequest, receipt: &Receipt) -> ReceiptFacts {
    request
        .receipt_data
        .clone()
        .unwrap_or_else(|| ReceiptFacts::from(receipt))
}

#[async_trait]
impl InsightsCommand for InsightsService {
    async fn direct_analysis(
        &self,
        request: AnalyzeReceiptRequest,
    ) -> Result<ReceiptAnalysis, Error> {
        let receipt = self.owned_receipt(&request).await?;
        self.charge_insight(&request.user_id).await?;
        let facts = facts_for(&request, &receipt);
        self.analyse(receipt, facts).await
    }

    async fn generate_insights(
        &self,
        request: AnalyzeReceiptRequest,
    ) -> Result<GeneratedInsights, Error> {
        let receipt = self.owned_receipt(&request).await?;
        self.charge_insight(&request.user_id).await?;
        let facts = facts_for(&request, &receipt);

        let parsed = match self.generator.generate(&insights_prompt(&facts)).await {
            Ok(text) => parse_insight_report(&text),
            Err(error) => {
                warn!(receipt_id = %receipt.id, %error, "insight generation failed");
                None
            }
        };
        let (report, ai_generated) = match parsed {
            Some(report) => (with_category(report, &facts), true),
            None => (generated_insights_fallback(&facts), false),
        };
        Ok(GeneratedInsights {
            success: true,
            report,
            ai_generated,
        })
    }

    async fn analyze_receipt(
        &self,
        request: AnalyzeReceiptRequest,
    ) -> Result<ReceiptAnalysis, Error> {
        let receipt = self.owned_receipt(&request).await?;
        let facts = facts_for(&request, &receipt);
        self.analyse(receipt, facts).await
    }
}

#[cfg(test)]
#[path = "insights_service_tests.rs"]
mod tests;
