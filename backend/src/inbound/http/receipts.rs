//! Receipt HTTP handlers.
//!
//! ```text
//! POST   /api/v1/receipts                      (raw PDF body, X-File-Name)
//! GET    /api/v1/receipts
//! GET    /api/v1/receipts/status?id=<uuid>
//! GET    /api/v1/receipts/{id}
//! GET    /api/v1/receipts/{id}/download-url
//! DELETE /api/v1/receipts/{id}
//! ```
//!
//! Uploads answer with a `{success, data | error}` envelope that clients poll
//! on; every other endpoint uses the shared error body.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, ResponseError, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{UploadReceiptRequest, UploadedReceipt};
use crate::domain::{
    Error, ErrorCode, Receipt, ReceiptId, ReceiptStatus, TRACE_ID_HEADER, UPLOAD_FAILED_MESSAGE,
    UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    ErrorSchema, ReceiptSchema, ReceiptStatusSchema, UsageCheckSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Header carrying the original file name of an upload.
pub const FILE_NAME_HEADER: &str = "X-File-Name";

const DEFAULT_FILE_NAME: &str = "receipt.pdf";
const RECEIPT_ID_REQUIRED_MESSAGE: &str = "Receipt ID is required";
const ID_FIELD: FieldName = FieldName::new("id");

/// Upload acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceiptData {
    /// Identifier of the new receipt.
    #[schema(value_type = String, format = Uuid)]
    pub receipt_id: String,
    /// Stored file name.
    #[schema(example = "lunch.pdf")]
    pub file_name: String,
}

impl From<UploadedReceipt> for UploadReceiptData {
    fn from(value: UploadedReceipt) -> Self {
        Self {
            receipt_id: value.receipt_id.to_string(),
            file_name: value.file_name,
        }
    }
}

/// Upload envelope.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceiptResponse {
    /// Whether the upload was accepted.
    pub success: bool,
    /// Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UploadReceiptData>,
    /// Present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Invalid file type. Please upload a PDF.")]
    pub error: Option<String>,
    /// Quota state when the upload was refused for usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<UsageCheckSchema>)]
    pub usage_check: Option<Value>,
}

impl UploadReceiptResponse {
    fn accepted(uploaded: UploadedReceipt) -> Self {
        Self {
            success: true,
            data: Some(uploaded.into()),
            error: None,
            usage_check: None,
        }
    }

    fn rejected(error: &Error) -> Self {
        let message = if matches!(error.code(), ErrorCode::InternalError) {
            UPLOAD_FAILED_MESSAGE.to_owned()
        } else {
            error.message().to_owned()
        };
        Self {
            success: false,
            data: None,
            error: Some(message),
            usage_check: error
                .details()
                .and_then(|details| details.get("usageCheck"))
                .cloned(),
        }
    }
}

/// Query for `GET /api/v1/receipts/status`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReceiptStatusQuery {
    /// Receipt identifier.
    pub id: Option<String>,
}

/// Status poll response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptStatusResponse {
    /// Current processing state.
    #[schema(value_type = ReceiptStatusSchema)]
    pub status: ReceiptStatus,
    /// Receipt identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
}

/// Download URL response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadUrlResponse {
    /// Public URL of the stored file.
    #[schema(example = "http://localhost:8080/files/6f1c0d2e.pdf")]
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ReceiptPath {
    id: String,
}

fn parse_receipt_id(raw: String) -> Result<ReceiptId, Error> {
    parse_uuid(raw, ID_FIELD).map(ReceiptId::from_uuid)
}

fn header_value<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn upload_request(user_id: UserId, request: &HttpRequest, body: web::Bytes) -> UploadReceiptRequest {
    let file_name = header_value(request, FILE_NAME_HEADER)
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_owned();
    let content_type = header_value(request, header::CONTENT_TYPE.as_str())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase());
    UploadReceiptRequest {
        user_id,
        file_name,
        content_type,
        bytes: body.into(),
    }
}

fn upload_failure(error: &Error) -> HttpResponse {
    let mut builder = HttpResponse::build(error.status_code());
    if let Some(id) = error.trace_id() {
        builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
    }
    builder.json(UploadReceiptResponse::rejected(error))
}

/// Upload a PDF receipt and queue it for extraction.
#[utoipa::path(
    post,
    path = "/api/v1/receipts",
    request_body(content = Vec<u8>, content_type = "application/pdf"),
    params(
        ("X-File-Name" = Option<String>, Header, description = "Original file name")
    ),
    responses(
        (status = 200, description = "Upload accepted", body = UploadReceiptResponse),
        (status = 400, description = "Not a PDF or empty", body = UploadReceiptResponse),
        (status = 401, description = "Unauthorised", body = UploadReceiptResponse),
        (status = 403, description = "Scan quota exhausted", body = UploadReceiptResponse),
        (status = 413, description = "File too large", body = UploadReceiptResponse),
        (status = 503, description = "Storage or workflow unavailable", body = UploadReceiptResponse)
    ),
    tags = ["receipts"],
    operation_id = "uploadReceipt",
    security(("SessionCookie" = []))
)]
#[post("/receipts")]
pub async fn upload_receipt(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let user_id = match session.require_user() {
        Ok(user_id) => user_id,
        Err(error) => return upload_failure(&error),
    };
    let upload = upload_request(user_id, &request, body);
    match state.receipts.upload(upload).await {
        Ok(uploaded) => HttpResponse::Ok().json(UploadReceiptResponse::accepted(uploaded)),
        Err(error) => {
            tracing::info!(code = ?error.code(), "receipt upload refused");
            upload_failure(&error)
        }
    }
}

/// List the caller's receipts, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/receipts",
    responses(
        (status = 200, description = "Receipts", body = [ReceiptSchema]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["receipts"],
    operation_id = "listReceipts",
    security(("SessionCookie" = []))
)]
#[get("/receipts")]
pub async fn list_receipts(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Receipt>>> {
    let user_id = session.require_user()?;
    let receipts = state.receipts_query.list(&user_id).await?;
    Ok(web::Json(receipts))
}

/// Poll a receipt's processing status.
#[utoipa::path(
    get,
    path = "/api/v1/receipts/status",
    params(ReceiptStatusQuery),
    responses(
        (status = 200, description = "Current status", body = ReceiptStatusResponse),
        (status = 400, description = "Missing or malformed id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Receipt not found", body = ErrorSchema)
    ),
    tags = ["receipts"],
    operation_id = "getReceiptStatus",
    security(("SessionCookie" = []))
)]
#[get("/receipts/status")]
pub async fn receipt_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ReceiptStatusQuery>,
) -> ApiResult<web::Json<ReceiptStatusResponse>> {
    let user_id = session.require_user()?;
    let Some(raw) = query.into_inner().id.filter(|id| !id.trim().is_empty()) else {
        return Err(Error::invalid_request(RECEIPT_ID_REQUIRED_MESSAGE)
            .with_details(json!({ "field": "id", "code": "missing_field" })));
    };
    let id = parse_receipt_id(raw)?;
    let status = state.receipts_query.status(&user_id, &id).await?;
    Ok(web::Json(ReceiptStatusResponse {
        status,
        id: id.to_string(),
    }))
}

/// Fetch one receipt.
#[utoipa::path(
    get,
    path = "/api/v1/receipts/{id}",
    params(("id" = String, Path, description = "Receipt identifier")),
    responses(
        (status = 200, description = "Receipt", body = ReceiptSchema),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Receipt not found", body = ErrorSchema)
    ),
    tags = ["receipts"],
    operation_id = "getReceipt",
    security(("SessionCookie" = []))
)]
#[get("/receipts/{id}")]
pub async fn get_receipt(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ReceiptPath>,
) -> ApiResult<web::Json<Receipt>> {
    let user_id = session.require_user()?;
    let id = parse_receipt_id(path.into_inner().id)?;
    let receipt = state.receipts_query.get(&user_id, &id).await?;
    Ok(web::Json(receipt))
}

/// Public URL of a receipt's stored file.
#[utoipa::path(
    get,
    path = "/api/v1/receipts/{id}/download-url",
    params(("id" = String, Path, description = "Receipt identifier")),
    responses(
        (status = 200, description = "Download URL", body = DownloadUrlResponse),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Receipt not found", body = ErrorSchema)
    ),
    tags = ["receipts"],
    operation_id = "getReceiptDownloadUrl",
    security(("SessionCookie" = []))
)]
#[get("/receipts/{id}/download-url")]
pub async fn receipt_download_url(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ReceiptPath>,
) -> ApiResult<web::Json<DownloadUrlResponse>> {
    let user_id = session.require_user()?;
    let id = parse_receipt_id(path.into_inner().id)?;
    let url = state.receipts_query.download_url(&user_id, &id).await?;
    Ok(web::Json(DownloadUrlResponse { url: url.into() }))
}

/// Delete a receipt and its stored file.
#[utoipa::path(
    delete,
    path = "/api/v1/receipts/{id}",
    params(("id" = String, Path, description = "Receipt identifier")),
    responses(
        (status = 204, description = "Receipt deleted"),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Receipt not found", body = ErrorSchema)
    ),
    tags = ["receipts"],
    operation_id = "deleteReceipt",
    security(("SessionCookie" = []))
)]
#[delete("/receipts/{id}")]
pub async fn delete_receipt(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ReceiptPath>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user()?;
    let id = parse_receipt_id(path.into_inner().id)?;
    state.receipts.delete(&user_id, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "receipts_tests.rs"]
mod tests;
