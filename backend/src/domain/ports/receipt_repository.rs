//! Port for receipt persistence.
//!
//! Reads that originate from a user are scoped by owner; the unscoped
//! [`ReceiptRepository::find_by_id`] exists for background workflows that
//! only carry a receipt identifier.

use async_trait::async_trait;

use crate::domain::{Receipt, ReceiptId, ReceiptStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by receipt repository adapters.
    pub enum ReceiptRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "receipt repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "receipt repository query failed: {message}",
        /// Update targeted a receipt that no longer exists.
        Missing { receipt_id: String } =>
            "receipt {receipt_id} does not exist",
    }
}

/// Port for storing and retrieving receipts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// Persist a new receipt.
    async fn insert(&self, receipt: &Receipt) -> Result<(), ReceiptRepositoryError>;

    /// Overwrite every mutable field of an existing receipt.
    ///
    /// Returns [`ReceiptRepositoryError::Missing`] when the row is gone.
    async fn update(&self, receipt: &Receipt) -> Result<(), ReceiptRepositoryError>;

    /// Move a receipt from `from` to `to`, leaving every other field alone.
    ///
    /// Returns `false` when the receipt is missing or no longer in `from`.
    async fn set_status(
        &self,
        id: &ReceiptId,
        from: ReceiptStatus,
        to: ReceiptStatus,
    ) -> Result<bool, ReceiptRepositoryError>;

    /// Fetch a receipt regardless of owner.
    async fn find_by_id(&self, id: &ReceiptId) -> Result<Option<Receipt>, ReceiptRepositoryError>;

    /// Fetch a receipt owned by `user_id`.
    async fn find_for_user(
        &self,
        user_id: &UserId,
        id: &ReceiptId,
    ) -> Result<Option<Receipt>, ReceiptRepositoryError>;

    /// List a user's receipts, newest upload first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Receipt>, ReceiptRepositoryError>;

    /// Remove a receipt owned by `user_id`.
    ///
    /// Returns `false` when no matching row existed.
    async fn delete_for_user(
        &self,
        user_id: &UserId,
        id: &ReceiptId,
    ) -> Result<bool, ReceiptRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReceiptRepository;

#[async_trait]
impl ReceiptRepository for FixtureReceiptRepository {
    async fn insert(&self, _receipt: &Receipt) -> Result<(), ReceiptRepositoryError> {
        Ok(())
    }

    async fn update(&self, receipt: &Receipt) -> Result<(), ReceiptRepositoryError> {
        Err(ReceiptRepositoryError::missing(receipt.id.to_string()))
    }

    async fn set_status(
        &self,
        _id: &ReceiptId,
        _from: ReceiptStatus,
        _to: ReceiptStatus,
    ) -> Result<bool, ReceiptRepositoryError> {
        Ok(false)
    }

    async fn find_by_id(&self, _id: &ReceiptId) -> Result<Option<Receipt>, ReceiptRepositoryError> {
        Ok(None)
    }

    async fn find_for_user(
        &self,
        _user_id: &UserId,
        _id: &ReceiptId,
    ) -> Result<Option<Receipt>, ReceiptRepositoryError> {
        Ok(None)
    }

    async fn list_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<Receipt>, ReceiptRepositoryError> {
        Ok(Vec::new())
    }

    async fn delete_for_user(
        &self,
        _user_id: &UserId,
        _id: &ReceiptId,
    ) -> Result<bool, ReceiptRepositoryError> {
        Ok(false)
    }
}
