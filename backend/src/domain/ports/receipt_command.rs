//! Driving port for receipt mutations.
//!
//! HTTP handlers call [`ReceiptCommand::upload`] and
//! [`ReceiptCommand::delete`]; the workflow handler settles extraction
//! attempts through [`ReceiptCommand::apply_extraction`] and
//! [`ReceiptCommand::mark_failed`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, ExtractedReceiptData, Receipt, ReceiptId, UserId};

/// MIME type accepted for uploads.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Raw upload submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceiptRequest {
    /// Uploading user.
    pub user_id: UserId,
    /// Original file name.
    pub file_name: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Acknowledgement for an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedReceipt {
    /// Identifier of the new receipt.
    pub receipt_id: ReceiptId,
    /// Stored file name.
    pub file_name: String,
}

/// Driving port for receipt mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptCommand: Send + Sync {
    /// Store a PDF, register it, and queue extraction.
    ///
    /// # Errors
    ///
    /// - `invalid_request` for non-PDF or empty uploads.
    /// - `payload_too_large` above the configured size.
    /// - `forbidden` with a `usageCheck` detail when the scan quota is spent.
    /// - `service_unavailable` when storage or dispatch fails.
    async fn upload(&self, request: UploadReceiptRequest) -> Result<UploadedReceipt, Error>;

    /// Delete a receipt and its stored file.
    async fn delete(&self, user_id: &UserId, id: &ReceiptId) -> Result<(), Error>;

    /// Merge extracted data and mark the receipt completed.
    async fn apply_extraction(
        &self,
        id: &ReceiptId,
        data: ExtractedReceiptData,
    ) -> Result<Receipt, Error>;

    /// Mark the current extraction attempt as failed.
    async fn mark_failed(&self, id: &ReceiptId) -> Result<(), Error>;
}
