//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the structure of their corresponding domain
//! types but live in the inbound adapter layer where framework concerns belong.

#![expect(
    dead_code,
    reason = "Schema wrappers are only read by utoipa during OpenAPI generation"
)]

use chrono::{DateTime, Utc};
use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted, including exhausted quotas.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with the resource's current state.
    #[schema(rename = "conflict")]
    Conflict,
    /// The upload exceeds the accepted size.
    #[schema(rename = "payload_too_large")]
    PayloadTooLarge,
    /// A downstream dependency is unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Something went wrong")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "01HZY8B2W6X5Y7Z9ABCD1234")]
    trace_id: Option<String>,
    /// Supplementary error details, such as the `usageCheck` of a quota
    /// denial.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::ReceiptStatus`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ReceiptStatus)]
pub enum ReceiptStatusSchema {
    /// Extraction or analysis is in flight.
    #[schema(rename = "processing")]
    Processing,
    /// Extraction finished.
    #[schema(rename = "completed")]
    Completed,
    /// Extraction gave up.
    #[schema(rename = "failed")]
    Failed,
}

/// OpenAPI schema for [`crate::domain::LineItem`].
#[derive(ToSchema)]
#[schema(as = crate::domain::LineItem, rename_all = "camelCase")]
pub struct LineItemSchema {
    /// Item description as printed.
    #[schema(example = "Oat milk")]
    name: String,
    /// Quantity purchased.
    #[schema(example = 1.0)]
    quantity: f64,
    /// Price per unit.
    unit_price: Option<f64>,
    /// Line total.
    total_price: Option<f64>,
}

/// OpenAPI schema for [`crate::domain::Receipt`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Receipt, rename_all = "camelCase")]
pub struct ReceiptSchema {
    /// Receipt identifier.
    #[schema(value_type = String, format = Uuid)]
    id: String,
    /// Owning user.
    #[schema(example = "user_2bXk9QwErTy")]
    user_id: String,
    /// Location of the stored PDF.
    #[schema(example = "6f1c0d2e9a4b4c4f8e2a1b3c5d7e9f01.pdf")]
    storage_key: String,
    /// Display file name.
    #[schema(example = "Target Receipt")]
    file_name: String,
    /// File size in bytes.
    size_bytes: u64,
    /// Declared MIME type.
    #[schema(example = "application/pdf")]
    mime_type: String,
    /// Upload time.
    uploaded_at: DateTime<Utc>,
    /// Processing state.
    status: ReceiptStatusSchema,
    /// Merchant name.
    merchant_name: Option<String>,
    /// Merchant street address.
    merchant_address: Option<String>,
    /// Merchant phone number.
    merchant_phone: Option<String>,
    /// Merchant email address.
    merchant_email: Option<String>,
    /// Transaction date as printed.
    transaction_date: Option<String>,
    /// Transaction total.
    transaction_amount: Option<f64>,
    /// ISO currency code.
    transaction_currency: Option<String>,
    /// Human-readable summary.
    summary: Option<String>,
    /// Purchased lines.
    items: Vec<LineItemSchema>,
}

/// OpenAPI schema for [`crate::domain::UsageCheck`].
///
/// `limit` and `remaining` are numbers, or the string `"unbounded"`.
#[derive(ToSchema)]
#[schema(as = crate::domain::UsageCheck)]
pub struct UsageCheckSchema {
    /// Whether one more use is permitted.
    allowed: bool,
    /// Uses recorded so far.
    current: u64,
    /// Plan allowance.
    #[schema(value_type = Object, example = 5)]
    limit: serde_json::Value,
    /// Allowance left.
    #[schema(value_type = Object, example = 3)]
    remaining: serde_json::Value,
}

/// OpenAPI schema for [`crate::domain::FeatureUsage`].
#[derive(ToSchema)]
#[schema(as = crate::domain::FeatureUsage, rename_all = "camelCase")]
pub struct FeatureUsageSchema {
    /// Metered feature name.
    #[schema(example = "ai-scans")]
    feature: String,
    /// Uses recorded so far.
    current: u64,
    /// Plan allowance.
    #[schema(value_type = Object, example = 5)]
    limit: serde_json::Value,
    /// Allowance left.
    #[schema(value_type = Object, example = 3)]
    remaining: serde_json::Value,
    /// Most recent use.
    last_used_at: Option<DateTime<Utc>>,
}

/// OpenAPI schema for [`crate::domain::UsageSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::UsageSummary)]
pub struct UsageSummarySchema {
    /// Plan the limits were computed for.
    #[schema(example = "free")]
    plan: String,
    /// One entry per metered feature.
    features: Vec<FeatureUsageSchema>,
}

/// OpenAPI schema for [`crate::domain::EnhancedItem`].
#[derive(ToSchema)]
#[schema(as = crate::domain::EnhancedItem)]
pub struct EnhancedItemSchema {
    /// Item description.
    name: String,
    /// Quantity purchased.
    quantity: f64,
    /// Price per unit.
    price: Option<f64>,
    /// Spending category.
    #[schema(example = "Food & Dining")]
    category: String,
}

/// OpenAPI schema for [`crate::domain::ReceiptAnalysis`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ReceiptAnalysis, rename_all = "camelCase")]
pub struct ReceiptAnalysisSchema {
    /// One-paragraph summary.
    summary: String,
    /// Spending category.
    category: String,
    /// Budget impact note.
    budget_impact: Option<String>,
    /// Observations about the purchase.
    insights: Vec<String>,
    /// Suggested actions.
    recommendations: Vec<String>,
    /// Categorised line items.
    items: Vec<EnhancedItemSchema>,
    /// `gemini-ai` or `fallback`.
    #[schema(example = "gemini-ai")]
    analysis_type: String,
    /// Receipt status after analysis.
    status: ReceiptStatusSchema,
    /// Completion time.
    timestamp: DateTime<Utc>,
    /// Analysed receipt.
    #[schema(value_type = String, format = Uuid)]
    receipt_id: String,
    /// Receipt owner.
    user_id: String,
    /// Reason the model was bypassed.
    error: Option<String>,
}

/// OpenAPI schema for [`crate::domain::GeneratedInsights`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GeneratedInsights, rename_all = "camelCase")]
pub struct GeneratedInsightsSchema {
    /// Always `true`.
    success: bool,
    /// One-paragraph summary.
    summary: String,
    /// Spending category.
    category: String,
    /// Budget impact note.
    budget_impact: Option<String>,
    /// Observations about the purchase.
    insights: Vec<String>,
    /// Suggested actions.
    recommendations: Vec<String>,
    /// Whether the model produced the content.
    ai_generated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn error_code_schema_has_expected_name() {
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
    }

    #[test]
    fn error_schema_uses_wire_field_names() {
        let schema_json = schema_to_json::<ErrorSchema>();
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
        assert!(schema_json.contains("traceId"), "missing traceId");
    }

    #[rstest]
    #[case("invalid_request")]
    #[case("unauthorized")]
    #[case("forbidden")]
    #[case("not_found")]
    #[case("conflict")]
    #[case("payload_too_large")]
    #[case("service_unavailable")]
    #[case("internal_error")]
    fn error_code_schema_variants_match_domain(#[case] code: &str) {
        assert!(schema_to_json::<ErrorCodeSchema>().contains(code), "missing {code}");
    }

    #[test]
    fn receipt_schema_uses_camel_case() {
        let schema_json = schema_to_json::<ReceiptSchema>();
        assert!(schema_json.contains("merchantName"));
        assert!(schema_json.contains("uploadedAt"));
    }
}
