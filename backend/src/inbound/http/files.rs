//! Public download of stored receipt files.
//!
//! Storage keys are random, so the URL itself is the capability; the route
//! sits outside `/api/v1` and needs no session.

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};

use crate::domain::ports::{FileStorageError, PDF_MIME_TYPE};
use crate::domain::{Error, StorageKey};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

const FILE_NOT_FOUND_MESSAGE: &str = "File not found";

/// Download a stored receipt file.
#[utoipa::path(
    get,
    path = "/files/{key}",
    params(("key" = String, Path, description = "Storage key")),
    responses(
        (status = 200, description = "Stored PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "No such file", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["files"],
    operation_id = "downloadFile",
    security([])
)]
#[get("/files/{key}")]
pub async fn download_file(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = StorageKey::new(path.into_inner())
        .map_err(|_| Error::not_found(FILE_NOT_FOUND_MESSAGE))?;
    let bytes = state.files.get(&key).await.map_err(|err| match err {
        FileStorageError::NotFound { .. } => Error::not_found(FILE_NOT_FOUND_MESSAGE),
        other => {
            tracing::warn!(error = %other, key = %key, "stored file read failed");
            Error::service_unavailable("file storage unavailable")
        }
    })?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, PDF_MIME_TYPE))
        .insert_header((header::CACHE_CONTROL, "private, max-age=3600"))
        .body(bytes))
}
