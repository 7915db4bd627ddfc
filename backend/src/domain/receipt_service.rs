//! Receipt lifecycle service implementing [`ReceiptCommand`] and
//! [`ReceiptQuery`].
//!
//! Upload order matters: the quota gate runs before anything is stored, the
//! file is written before its row, and usage is charged only once the row
//! exists. Extraction is queued last; a dispatch failure marks the fresh
//! receipt failed rather than leaving it processing forever.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::ports::{
    EntitlementProvider, FileStorage, FileStorageError, PDF_MIME_TYPE, RECEIPT_SCAN_EVENT,
    ReceiptCommand, ReceiptQuery, ReceiptRepository, ReceiptRepositoryError,
    UploadReceiptRequest, UploadedReceipt, UsageQuota, WorkflowDispatcher, WorkflowEvent,
};
use crate::domain::usage_quota_service::admit_use;
use crate::domain::{
    Error, ExtractedReceiptData, Feature, NewReceipt, Receipt, ReceiptId, ReceiptStatus,
    StorageKey, UserId,
};

/// Message returned for non-PDF uploads.
pub const INVALID_FILE_TYPE_MESSAGE: &str = "Invalid file type. Please upload a PDF.";
/// Message returned when storage or dispatch fails during upload.
pub const UPLOAD_FAILED_MESSAGE: &str = "File upload failed. Please try again.";
/// Message returned for missing receipts.
pub const RECEIPT_NOT_FOUND_MESSAGE: &str = "Receipt not found";
/// Message returned when a quota gate denies a request.
pub const USAGE_LIMIT_EXCEEDED_MESSAGE: &str = "Usage limit exceeded";

/// Tunables for the receipt service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptServiceConfig {
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ReceiptServiceConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Port bundle required by the receipt service.
pub struct ReceiptServicePorts {
    /// Receipt persistence.
    pub receipts: Arc<dyn ReceiptRepository>,
    /// Uploaded file storage.
    pub storage: Arc<dyn FileStorage>,
    /// Usage quota gate.
    pub quota: Arc<dyn UsageQuota>,
    /// Background workflow dispatcher.
    pub dispatcher: Arc<dyn WorkflowDispatcher>,
    /// Billing event sink.
    pub entitlements: Arc<dyn EntitlementProvider>,
}

/// Receipt service implementing the receipt driving ports.
#[derive(Clone)]
pub struct ReceiptService {
    receipts: Arc<dyn ReceiptRepository>,
    storage: Arc<dyn FileStorage>,
    quota: Arc<dyn UsageQuota>,
    dispatcher: Arc<dyn WorkflowDispatcher>,
    entitlements: Arc<dyn EntitlementProvider>,
    clock: Arc<dyn Clock>,
    config: ReceiptServiceConfig,
}

impl ReceiptService {
    /// Create a new receipt service.
    pub fn new(
        ports: ReceiptServicePorts,
        clock: Arc<dyn Clock>,
        config: ReceiptServiceConfig,
    ) -> Self {
        Self {
            receipts: ports.receipts,
            storage: ports.storage,
            quota: ports.quota,
            dispatcher: ports.dispatcher,
            entitlements: ports.entitlements,
            clock,
            config,
        }
    }

    fn validate_upload(&self, request: &UploadReceiptRequest) -> Result<(), Error> {
        let is_pdf = request
            .content_type
            .as_deref()
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(PDF_MIME_TYPE));
        if !is_pdf {
            return Err(Error::invalid_request(INVALID_FILE_TYPE_MESSAGE));
        }
        if request.bytes.is_empty() {
            return Err(Error::invalid_request("uploaded file is empty"));
        }
        if request.bytes.len() > self.config.max_upload_bytes {
            return Err(Error::payload_too_large(format!(
                "uploaded file exceeds {} bytes",
                self.config.max_upload_bytes
            ))
            .with_details(json!({ "maxBytes": self.config.max_upload_bytes })));
        }
        Ok(())
    }

    async fn owned_receipt(&self, user_id: &UserId, id: &ReceiptId) -> Result<Receipt, Error> {
        self.receipts
            .find_for_user(user_id, id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(RECEIPT_NOT_FOUND_MESSAGE))
    }

    async fn any_receipt(&self, id: &ReceiptId) -> Result<Receipt, Error> {
        self.receipts
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(RECEIPT_NOT_FOUND_MESSAGE))
    }

    async fn discard_stored_file(&self, key: &StorageKey) {
        if let Err(error) = self.storage.delete(key).await {
            warn!(%key, %error, "failed to remove orphaned upload");
        }
    }

    async fn queue_extraction(&self, receipt: &Receipt) -> Result<(), Error> {
        let url = self
            .storage
            .public_url(&receipt.storage_key)
            .map_err(|error| {
                warn!(receipt_id = %receipt.id, %error, "could not build file url");
                Error::service_unavailable(UPLOAD_FAILED_MESSAGE)
            })?;
        let event = WorkflowEvent::ExtractReceipt {
            url,
            receipt_id: receipt.id,
        };
        match self.dispatcher.dispatch(event).await {
            Ok(ack) => {
                info!(receipt_id = %receipt.id, ids = ?ack.ids, "extraction queued");
                Ok(())
            }
            Err(error) => {
                warn!(receipt_id = %receipt.id, %error, "extraction dispatch failed");
                if let Err(mark_error) = self.mark_failed(&receipt.id).await {
                    warn!(receipt_id = %receipt.id, error = %mark_error, "could not mark receipt failed");
                }
                Err(Error::service_unavailable(UPLOAD_FAILED_MESSAGE))
            }
        }
    }
}

/// Map receipt repository failures onto domain errors.
pub(crate) fn map_repository_error(error: ReceiptRepositoryError) -> Error {
    match error {
        ReceiptRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("receipt repository unavailable: {message}"))
        }
        ReceiptRepositoryError::Query { message } => {
            Error::internal(format!("receipt repository error: {message}"))
        }
        ReceiptRepositoryError::Missing { .. } => Error::not_found(RECEIPT_NOT_FOUND_MESSAGE),
    }
}

fn map_storage_error(error: FileStorageError) -> Error {
    match error {
        FileStorageError::NotFound { .. } => Error::not_found("receipt file not found"),
        FileStorageError::Io { message } => {
            Error::service_unavailable(format!("file storage unavailable: {message}"))
        }
        FileStorageError::InvalidUrl { message } => {
            Error::internal(format!("file url could not be built: {message}"))
        }
    }
}

#[async_trait]
impl ReceiptCommand for ReceiptService {
    async fn upload(&self, request: UploadReceiptRequest) -> Result<UploadedReceipt, Error> {
        self.validate_upload(&request)?;
        let UploadReceiptRequest {
            user_id,
            file_name,
            content_type: _,
            bytes,
        } = request;

        let plan = admit_use(self.quota.as_ref(), &user_id, Feature::ReceiptScan).await?;

        let storage_key = StorageKey::generate_pdf();
        if let Err(error) = self.storage.put(&storage_key, &bytes).await {
            warn!(%user_id, %error, "failed to store upload");
            return Err(Error::service_unavailable(UPLOAD_FAILED_MESSAGE));
        }

        let receipt = Receipt::new_upload(
            NewReceipt {
                user_id: user_id.clone(),
                storage_key,
                file_name,
                size_bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
                mime_type: PDF_MIME_TYPE.to_owned(),
            },
            self.clock.utc(),
        );
        if let Err(error) = self.receipts.insert(&receipt).await {
            warn!(%user_id, %error, "failed to register upload");
            self.discard_stored_file(&receipt.storage_key).await;
            return Err(Error::service_unavailable(UPLOAD_FAILED_MESSAGE));
        }

        self.quota
            .increment(&user_id, Feature::ReceiptScan, plan)
            .await;
        self.quota
            .increment(&user_id, Feature::MonthlyUploads, plan)
            .await;

        self.queue_extraction(&receipt).await?;

        Ok(UploadedReceipt {
            receipt_id: receipt.id,
            file_name: receipt.file_name,
        })
    }

    async fn delete(&self, user_id: &UserId, id: &ReceiptId) -> Result<(), Error> {
        let receipt = self.owned_receipt(user_id, id).await?;
        match self.storage.delete(&receipt.storage_key).await {
            Ok(()) | Err(FileStorageError::NotFound { .. }) => {}
            Err(error) => return Err(map_storage_error(error)),
        }
        let removed = self
            .receipts
            .delete_for_user(user_id, id)
            .await
            .map_err(map_repository_error)?;
        if !removed {
            return Err(Error::not_found(RECEIPT_NOT_FOUND_MESSAGE));
        }
        info!(%user_id, receipt_id = %id, "receipt deleted");
        Ok(())
    }

    async fn apply_extraction(
        &self,
        id: &ReceiptId,
        data: ExtractedReceiptData,
    ) -> Result<Receipt, Error> {
        let mut receipt = self.any_receipt(id).await?;
        receipt
            .apply_extraction(data)
            .map_err(|error| Error::conflict(error.to_string()))?;
        self.receipts
            .update(&receipt)
            .await
            .map_err(map_repository_error)?;

        if let Err(error) = self
            .entitlements
            .track_event(&receipt.user_id, RECEIPT_SCAN_EVENT)
            .await
        {
            warn!(receipt_id = %id, %error, "failed to track scan event");
        }
        info!(receipt_id = %id, "receipt extraction applied");
        Ok(receipt)
    }

    async fn mark_failed(&self, id: &ReceiptId) -> Result<(), Error> {
        let receipt = self.any_receipt(id).await?;
        receipt
            .status
            .transition_to(ReceiptStatus::Failed)
            .map_err(|error| Error::conflict(error.to_string()))?;
        let moved = self
            .receipts
            .set_status(id, receipt.status, ReceiptStatus::Failed)
            .await
            .map_err(map_repository_error)?;
        if !moved {
            debug!(receipt_id = %id, "receipt settled before it could be marked failed");
        }
        Ok(())
    }
}

#[async_trait]
impl ReceiptQuery for ReceiptService {
    async fn list(&self, user_id: &UserId) -> Result<Vec<Receipt>, Error> {
        self.receipts
            .list_for_user(user_id)
            .await
            .map_err(map_repository_error)
    }

    async fn get(&self, user_id: &UserId, id: &ReceiptId) -> Result<Receipt, Error> {
        self.owned_receipt(user_id, id).await
    }

    async fn status(&self, user_id: &UserId, id: &ReceiptId) -> Result<ReceiptStatus, Error> {
        Ok(self.owned_receipt(user_id, id).await?.status)
    }

    async fn download_url(&self, user_id: &UserId, id: &ReceiptId) -> Result<Url, Error> {
        let receipt = self.owned_receipt(user_id, id).await?;
        self.storage
            .public_url(&receipt.storage_key)
            .map_err(map_storage_error)
    }
}

#[cfg(test)]
#[path = "receipt_service_tests.rs"]
mod tests;
