//! AI insight endpoints.
//!
//! ```text
//! POST /api/v1/insights/direct {"receiptId":"...","receiptData":{...}}
//! POST /api/v1/insights        {"receiptId":"...","receiptData":{...}}
//! ```
//!
//! Both are charged against the `ai-insights` quota. `receiptData` is
//! optional; the stored receipt supplies the facts when it is omitted.

use actix_web::{post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::ports::AnalyzeReceiptRequest;
use crate::domain::{Error, GeneratedInsights, ReceiptAnalysis, ReceiptFacts, ReceiptId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, GeneratedInsightsSchema, ReceiptAnalysisSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Request body for both insight endpoints.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeReceiptBody {
    /// Receipt to analyse.
    #[schema(format = Uuid)]
    pub receipt_id: String,
    /// Facts to analyse instead of the stored receipt fields.
    #[schema(value_type = Option<Object>)]
    #[serde(default)]
    pub receipt_data: Option<ReceiptFacts>,
}

impl AnalyzeReceiptBody {
    fn into_request(self, user_id: UserId) -> Result<AnalyzeReceiptRequest, Error> {
        let receipt_id = parse_uuid(self.receipt_id, FieldName::new("receiptId"))?;
        Ok(AnalyzeReceiptRequest {
            user_id,
            receipt_id: ReceiptId::from_uuid(receipt_id),
            receipt_data: self.receipt_data,
        })
    }
}

/// Analyse a receipt and settle its status.
#[utoipa::path(
    post,
    path = "/api/v1/insights/direct",
    request_body = AnalyzeReceiptBody,
    responses(
        (status = 200, description = "Analysis, from the model or templates", body = ReceiptAnalysisSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Insight quota exhausted", body = ErrorSchema),
        (status = 404, description = "Receipt not found", body = ErrorSchema)
    ),
    tags = ["insights"],
    operation_id = "directAnalysis",
    security(("SessionCookie" = []))
)]
#[post("/insights/direct")]
pub async fn direct_analysis(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AnalyzeReceiptBody>,
) -> ApiResult<web::Json<ReceiptAnalysis>> {
    let user_id = session.require_user()?;
    let request = payload.into_inner().into_request(user_id)?;
    let analysis = state.insights.direct_analysis(request).await?;
    Ok(web::Json(analysis))
}

/// Generate insights for a receipt.
#[utoipa::path(
    post,
    path = "/api/v1/insights",
    request_body = AnalyzeReceiptBody,
    responses(
        (status = 200, description = "Insights, from the model or templates", body = GeneratedInsightsSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Insight quota exhausted", body = ErrorSchema),
        (status = 404, description = "Receipt not found", body = ErrorSchema)
    ),
    tags = ["insights"],
    operation_id = "generateInsights",
    security(("SessionCookie" = []))
)]
#[post("/insights")]
pub async fn generate_insights(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AnalyzeReceiptBody>,
) -> ApiResult<web::Json<GeneratedInsights>> {
    let user_id = session.require_user()?;
    let request = payload.into_inner().into_request(user_id)?;
    let insights = state.insights.generate_insights(request).await?;
    Ok(web::Json(insights))
}
