//! Usage reporting endpoints.
//!
//! ```text
//! GET /api/v1/usage
//! GET /api/v1/usage/{feature}
//! ```

use actix_web::{get, web};

use crate::domain::{Feature, PlanParseError, UsageCheck, UsageSummary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, UsageCheckSchema, UsageSummarySchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error};

/// Usage of every metered feature on the caller's plan.
#[utoipa::path(
    get,
    path = "/api/v1/usage",
    responses(
        (status = 200, description = "Usage summary", body = UsageSummarySchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["usage"],
    operation_id = "getUsageSummary",
    security(("SessionCookie" = []))
)]
#[get("/usage")]
pub async fn usage_summary(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UsageSummary>> {
    let user_id = session.require_user()?;
    let plan = state.usage.resolve_plan(&user_id).await;
    Ok(web::Json(state.usage.usage_summary(&user_id, plan).await))
}

/// Quota check for one feature.
#[utoipa::path(
    get,
    path = "/api/v1/usage/{feature}",
    params(
        ("feature" = String, Path, description = "ai-scans, ai-insights, ai-summary or monthly-uploads")
    ),
    responses(
        (status = 200, description = "Quota decision", body = UsageCheckSchema),
        (status = 400, description = "Unknown feature", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["usage"],
    operation_id = "checkFeatureUsage",
    security(("SessionCookie" = []))
)]
#[get("/usage/{feature}")]
pub async fn feature_usage(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UsageCheck>> {
    let user_id = session.require_user()?;
    let raw = path.into_inner();
    let feature: Feature = raw.parse().map_err(|err: PlanParseError| {
        invalid_value_error(FieldName::new("feature"), err.to_string(), &raw)
    })?;
    let plan = state.usage.resolve_plan(&user_id).await;
    Ok(web::Json(
        state.usage.check_limit(&user_id, feature, plan).await,
    ))
}
