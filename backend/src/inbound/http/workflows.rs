//! Workflow callback endpoint.
//!
//! ```text
//! POST /api/v1/workflows/events
//! X-Workflow-Signature: <signing key>
//! {"name":"ai/analyze-receipt","data":{...}}
//! ```
//!
//! The external workflow runtime delivers queued events here. Requests are
//! authenticated with a shared signing key rather than a user session.

use actix_web::{HttpRequest, post, web};
use serde::Serialize;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::ports::WorkflowEvent;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Header carrying the workflow signing key.
pub const WORKFLOW_SIGNATURE_HEADER: &str = "X-Workflow-Signature";

/// Shared secret expected on workflow callbacks.
///
/// Only the SHA-256 digest is retained so the raw key never sits in handler
/// state, and comparisons run over fixed-length digests.
#[derive(Clone)]
pub struct WorkflowSigningKey {
    digest: [u8; 32],
}

impl WorkflowSigningKey {
    /// Wrap a configured key; blank keys disable callbacks.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            digest: Sha256::digest(trimmed.as_bytes()).into(),
        })
    }

    /// Check a presented signature against the configured key.
    #[must_use]
    pub fn verify(&self, presented: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(presented.trim().as_bytes()).into();
        candidate
            .iter()
            .zip(self.digest.iter())
            .fold(0_u8, |acc, (left, right)| acc | (left ^ right))
            == 0
    }
}

/// Acknowledgement for a handled workflow event.
#[derive(Debug, Serialize, ToSchema)]
pub struct WorkflowEventAck {
    /// Always `true`; failures use the error envelope.
    pub success: bool,
    /// Wire name of the handled event.
    #[schema(example = "ai/analyze-receipt")]
    pub event: String,
}

fn authorise(state: &HttpState, request: &HttpRequest) -> Result<(), Error> {
    let Some(key) = state.workflow_signing_key.as_ref() else {
        return Err(Error::service_unavailable(
            "workflow callbacks are not configured",
        ));
    };
    let presented = request
        .headers()
        .get(WORKFLOW_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    match presented {
        Some(signature) if key.verify(signature) => Ok(()),
        Some(_) => Err(Error::unauthorized("workflow signature mismatch")),
        None => Err(Error::unauthorized("workflow signature required")),
    }
}

/// Run a workflow event delivered by the workflow runtime.
#[utoipa::path(
    post,
    path = "/api/v1/workflows/events",
    request_body(content = Object, description = "Workflow event envelope `{name, data}`"),
    params(
        ("X-Workflow-Signature" = String, Header, description = "Workflow signing key")
    ),
    responses(
        (status = 200, description = "Event handled", body = WorkflowEventAck),
        (status = 400, description = "Unknown or malformed event", body = ErrorSchema),
        (status = 401, description = "Missing or invalid signature", body = ErrorSchema),
        (status = 404, description = "Receipt not found", body = ErrorSchema),
        (status = 503, description = "Callbacks not configured", body = ErrorSchema)
    ),
    tags = ["workflows"],
    operation_id = "handleWorkflowEvent",
    security([])
)]
#[post("/workflows/events")]
pub async fn handle_workflow_event(
    state: web::Data<HttpState>,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<web::Json<WorkflowEventAck>> {
    authorise(&state, &request)?;
    let event: WorkflowEvent = serde_json::from_slice(&body)
        .map_err(|err| Error::invalid_request(format!("invalid workflow event: {err}")))?;
    let name = event.name();
    tracing::info!(event = name, receipt_id = %event.receipt_id(), "workflow event received");
    state.workflow_events.handle(event).await?;
    Ok(web::Json(WorkflowEventAck {
        success: true,
        event: name.to_owned(),
    }))
}
