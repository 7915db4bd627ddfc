//! Receipt insight payloads and the pure helpers that build them.
//!
//! The LLM is asked for a JSON object; when it cannot be reached or its
//! answer does not parse, the template builders in this module produce an
//! equivalent payload from the receipt facts alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LineItem, Receipt, ReceiptId, ReceiptStatus, UserId};

mod categorize;
mod parse;
mod prompts;
mod templates;

pub use categorize::{
    budget_impact, budget_impact_detail, categorize_item, categorize_spending, recommendation,
};
pub use parse::{extract_json_object, parse_insight_report};
pub use prompts::{direct_analysis_prompt, extraction_prompt, insights_prompt};
pub use templates::{direct_analysis_fallback, generated_insights_fallback};

/// Message attached to analyses produced without the model.
pub const AI_UNAVAILABLE_MESSAGE: &str = "AI service temporarily unavailable";

/// Receipt facts supplied for analysis.
///
/// Clients send the subset of a receipt they have on screen; any field may be
/// missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptFacts {
    /// Merchant name.
    pub merchant_name: Option<String>,
    /// Transaction total.
    pub transaction_amount: Option<f64>,
    /// Purchased lines.
    pub items: Vec<LineItem>,
}

impl From<&Receipt> for ReceiptFacts {
    fn from(receipt: &Receipt) -> Self {
        Self {
            merchant_name: receipt.merchant_name.clone(),
            transaction_amount: receipt.transaction_amount,
            items: receipt.items.clone(),
        }
    }
}

impl ReceiptFacts {
    /// Merchant name, or `fallback` when absent or blank.
    #[must_use]
    pub fn merchant_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.merchant_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(fallback)
    }

    /// Total formatted to two decimals, `0.00` when absent.
    #[must_use]
    pub fn amount_label(&self) -> String {
        format!("{:.2}", self.transaction_amount.unwrap_or(0.0))
    }
}

/// Insight content, either parsed from the model or built from templates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsightReport {
    /// One-line purchase summary.
    pub summary: String,
    /// Spending category.
    pub category: String,
    /// Budget impact assessment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_impact: Option<String>,
    /// Key observations.
    pub insights: Vec<String>,
    /// Suggested actions.
    pub recommendations: Vec<String>,
}

/// Line item annotated with a product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedItem {
    /// Item description.
    pub name: String,
    /// Quantity purchased.
    pub quantity: f64,
    /// Unit price, when known.
    pub price: Option<f64>,
    /// Product category from [`categorize_item`].
    pub category: String,
}

impl From<&LineItem> for EnhancedItem {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.unit_price,
            category: categorize_item(&item.name).to_owned(),
        }
    }
}

/// Source of an analysis payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisType {
    /// Parsed from the model's answer.
    #[serde(rename = "gemini-ai")]
    GeminiAi,
    /// Built from templates.
    #[serde(rename = "fallback")]
    Fallback,
}

/// Result of a direct receipt analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptAnalysis {
    /// Insight content.
    #[serde(flatten)]
    pub report: InsightReport,
    /// Categorised line items.
    pub items: Vec<EnhancedItem>,
    /// Whether the model produced the content.
    pub analysis_type: AnalysisType,
    /// Receipt status after analysis.
    pub status: ReceiptStatus,
    /// Completion time.
    pub timestamp: DateTime<Utc>,
    /// Analysed receipt.
    pub receipt_id: ReceiptId,
    /// Receipt owner.
    pub user_id: UserId,
    /// Reason the model was bypassed, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of insight generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedInsights {
    /// Always `true` for a completed request.
    pub success: bool,
    /// Insight content.
    #[serde(flatten)]
    pub report: InsightReport,
    /// Whether the model produced the content.
    pub ai_generated: bool,
}
