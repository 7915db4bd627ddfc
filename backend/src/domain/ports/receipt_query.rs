//! Driving port for receipt reads scoped to the requesting user.

use async_trait::async_trait;
use url::Url;

use crate::domain::{Error, Receipt, ReceiptId, ReceiptStatus, UserId};

/// Driving port for receipt reads.
///
/// Every operation reports another user's receipt as `not_found`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptQuery: Send + Sync {
    /// List the user's receipts, newest first.
    async fn list(&self, user_id: &UserId) -> Result<Vec<Receipt>, Error>;

    /// Fetch one receipt.
    async fn get(&self, user_id: &UserId, id: &ReceiptId) -> Result<Receipt, Error>;

    /// Current processing status of one receipt.
    async fn status(&self, user_id: &UserId, id: &ReceiptId) -> Result<ReceiptStatus, Error>;

    /// Public download URL of the receipt's stored file.
    async fn download_url(&self, user_id: &UserId, id: &ReceiptId) -> Result<Url, Error>;
}
