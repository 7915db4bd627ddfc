//! Developer endpoints for exercising the workflow pipeline.
//!
//! ```text
//! POST /api/v1/debug/workflow-events {"name":"...","data":{...}}
//! GET  /api/v1/debug/workflow-config
//! ```
//!
//! Both require a session and are only mounted in debug builds. A dispatched
//! event must name a receipt the caller owns, and it draws on the same usage
//! allowance as the production path. Configuration is reported as presence
//! flags only; secret values never leave the process.

use actix_web::{get, post, web};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::ports::{DispatchedEvent, ReceiptQuery, WorkflowEvent};
use crate::domain::{Error, Feature, UserId, admit_use};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Whether a setting was supplied at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub enum ConfigPresence {
    /// A value was configured.
    Set,
    /// No value was configured.
    #[default]
    #[serde(rename = "Not set")]
    NotSet,
}

impl From<bool> for ConfigPresence {
    fn from(present: bool) -> Self {
        if present { Self::Set } else { Self::NotSet }
    }
}

/// Startup configuration of external integrations.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    /// Key verifying inbound workflow callbacks.
    pub workflow_signing_key: ConfigPresence,
    /// Key for posting events to the hosted workflow runtime.
    pub workflow_event_key: ConfigPresence,
    /// Base URL of the hosted workflow runtime, if used.
    pub workflow_base_url: Option<String>,
    /// Gemini API key.
    pub gemini_api_key: ConfigPresence,
    /// Billing API key.
    pub billing_api_key: ConfigPresence,
}

/// Response body for the debug send endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct DebugDispatchResponse {
    /// Always `true`; failures use the error envelope.
    pub success: bool,
    /// Acknowledgement from the workflow runtime.
    #[schema(value_type = Object)]
    pub result: DispatchedEvent,
}

fn parse_event(payload: Value) -> Result<WorkflowEvent, Error> {
    let has_fields = payload.get("name").is_some_and(Value::is_string)
        && payload.get("data").is_some();
    if !has_fields {
        return Err(Error::invalid_request("Missing required fields (name, data)"));
    }
    serde_json::from_value(payload)
        .map_err(|err| Error::invalid_request(format!("invalid workflow event: {err}")))
}

/// Message returned when an event names another user.
pub const EVENT_USER_MISMATCH_MESSAGE: &str = "Event user does not match the signed-in user";

/// Check the caller may send `event` and return the feature it is charged to.
async fn authorize_event(
    event: &WorkflowEvent,
    user_id: &UserId,
    receipts: &dyn ReceiptQuery,
) -> Result<Feature, Error> {
    let feature = match event {
        WorkflowEvent::AnalyzeReceipt { user_id: owner, .. } => {
            if owner != user_id {
                return Err(Error::forbidden(EVENT_USER_MISMATCH_MESSAGE));
            }
            Feature::AiInsights
        }
        WorkflowEvent::ExtractReceipt { .. } => Feature::ReceiptScan,
    };
    receipts.get(user_id, event.receipt_id()).await?;
    Ok(feature)
}

/// Dispatch a workflow event for one of the caller's receipts.
#[utoipa::path(
    post,
    path = "/api/v1/debug/workflow-events",
    request_body(content = Object, description = "Workflow event envelope `{name, data}`"),
    responses(
        (status = 200, description = "Event dispatched", body = DebugDispatchResponse),
        (status = 400, description = "Missing fields or unknown event", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Foreign user or usage limit reached", body = ErrorSchema),
        (status = 404, description = "Receipt not found", body = ErrorSchema),
        (status = 503, description = "Workflow runtime unavailable", body = ErrorSchema)
    ),
    tags = ["debug"],
    operation_id = "debugDispatchWorkflowEvent",
    security(("SessionCookie" = []))
)]
#[post("/debug/workflow-events")]
pub async fn dispatch_workflow_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<Value>,
) -> ApiResult<web::Json<DebugDispatchResponse>> {
    let user_id = session.require_user()?;
    let event = parse_event(payload.into_inner())?;
    let feature = authorize_event(&event, &user_id, state.receipts_query.as_ref()).await?;
    let plan = admit_use(state.usage.as_ref(), &user_id, feature).await?;
    tracing::info!(event = event.name(), user_id = %user_id, "debug workflow dispatch");
    let result = state.dispatcher.dispatch(event).await.map_err(|err| {
        tracing::warn!(error = %err, "debug workflow dispatch failed");
        Error::service_unavailable(format!("Failed to send event: {err}"))
    })?;
    state.usage.increment(&user_id, feature, plan).await;
    Ok(web::Json(DebugDispatchResponse {
        success: true,
        result,
    }))
}

/// Report which integrations are configured.
#[utoipa::path(
    get,
    path = "/api/v1/debug/workflow-config",
    responses(
        (status = 200, description = "Integration configuration", body = IntegrationStatus),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["debug"],
    operation_id = "debugWorkflowConfig",
    security(("SessionCookie" = []))
)]
#[get("/debug/workflow-config")]
pub async fn workflow_config(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<IntegrationStatus>> {
    session.require_user()?;
    Ok(web::Json(state.integrations.clone()))
}
