//! PostgreSQL-backed `ReceiptRepository` implementation using Diesel ORM.
//!
//! Line items are stored as a JSONB array; every other receipt field has its
//! own column. User-facing queries always filter on `user_id`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ReceiptRepository, ReceiptRepositoryError};
use crate::domain::{LineItem, Receipt, ReceiptId, ReceiptStatus, StorageKey, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewReceiptRow, ReceiptRow, ReceiptUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::receipts;

/// Diesel-backed implementation of the `ReceiptRepository` port.
#[derive(Clone)]
pub struct DieselReceiptRepository {
    pool: DbPool,
}

impl DieselReceiptRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ReceiptRepositoryError {
    map_pool_error(error, ReceiptRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ReceiptRepositoryError {
    map_diesel_error(
        error,
        ReceiptRepositoryError::query,
        ReceiptRepositoryError::connection,
    )
}

fn corrupt(field: &str, detail: impl std::fmt::Display) -> ReceiptRepositoryError {
    ReceiptRepositoryError::query(format!("stored receipt has invalid {field}: {detail}"))
}

fn items_to_json(items: &[LineItem]) -> Result<serde_json::Value, ReceiptRepositoryError> {
    serde_json::to_value(items).map_err(|err| corrupt("items", err))
}

/// Convert a database row to a domain receipt.
fn row_to_receipt(row: ReceiptRow) -> Result<Receipt, ReceiptRepositoryError> {
    let status: ReceiptStatus = row.status.parse().map_err(|err| corrupt("status", err))?;
    Ok(Receipt {
        id: ReceiptId::from_uuid(row.id),
        user_id: UserId::new(&row.user_id).map_err(|err| corrupt("user_id", err))?,
        storage_key: StorageKey::new(row.storage_key).map_err(|err| corrupt("storage_key", err))?,
        file_name: row.file_name,
        size_bytes: u64::try_from(row.size_bytes).map_err(|err| corrupt("size_bytes", err))?,
        mime_type: row.mime_type,
        uploaded_at: row.uploaded_at,
        status,
        merchant_name: row.merchant_name,
        merchant_address: row.merchant_address,
        merchant_phone: row.merchant_phone,
        merchant_email: row.merchant_email,
        transaction_date: row.transaction_date,
        transaction_amount: row.transaction_amount,
        transaction_currency: row.transaction_currency,
        summary: row.summary,
        items: serde_json::from_value(row.items).map_err(|err| corrupt("items", err))?,
    })
}

fn rows_to_receipts(rows: Vec<ReceiptRow>) -> Result<Vec<Receipt>, ReceiptRepositoryError> {
    rows.into_iter().map(row_to_receipt).collect()
}

#[async_trait]
impl ReceiptRepository for DieselReceiptRepository {
    async fn insert(&self, receipt: &Receipt) -> Result<(), ReceiptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewReceiptRow {
            id: *receipt.id.as_uuid(),
            user_id: receipt.user_id.as_ref(),
            storage_key: receipt.storage_key.as_ref(),
            file_name: &receipt.file_name,
            size_bytes: i64::try_from(receipt.size_bytes)
                .map_err(|err| ReceiptRepositoryError::query(err.to_string()))?,
            mime_type: &receipt.mime_type,
            uploaded_at: receipt.uploaded_at,
            status: receipt.status.as_str(),
            items: items_to_json(&receipt.items)?,
        };

        diesel::insert_into(receipts::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn update(&self, receipt: &Receipt) -> Result<(), ReceiptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changes = ReceiptUpdate {
            file_name: &receipt.file_name,
            status: receipt.status.as_str(),
            merchant_name: receipt.merchant_name.as_deref(),
            merchant_address: receipt.merchant_address.as_deref(),
            merchant_phone: receipt.merchant_phone.as_deref(),
            merchant_email: receipt.merchant_email.as_deref(),
            transaction_date: receipt.transaction_date.as_deref(),
            transaction_amount: receipt.transaction_amount,
            transaction_currency: receipt.transaction_currency.as_deref(),
            summary: receipt.summary.as_deref(),
            items: items_to_json(&receipt.items)?,
        };

        let updated = diesel::update(receipts::table.find(receipt.id.as_uuid()))
            .set((&changes, receipts::updated_at.eq(diesel::dsl::now)))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        if updated == 0 {
            return Err(ReceiptRepositoryError::missing(receipt.id.to_string()));
        }
        Ok(())
    }

    async fn set_status(
        &self,
        id: &ReceiptId,
        from: ReceiptStatus,
        to: ReceiptStatus,
    ) -> Result<bool, ReceiptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            receipts::table
                .filter(receipts::id.eq(id.as_uuid()))
                .filter(receipts::status.eq(from.as_str())),
        )
        .set((
            receipts::status.eq(to.as_str()),
            receipts::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn find_by_id(&self, id: &ReceiptId) -> Result<Option<Receipt>, ReceiptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ReceiptRow> = receipts::table
            .find(id.as_uuid())
            .select(ReceiptRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_receipt).transpose()
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        id: &ReceiptId,
    ) -> Result<Option<Receipt>, ReceiptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ReceiptRow> = receipts::table
            .filter(receipts::id.eq(id.as_uuid()))
            .filter(receipts::user_id.eq(user_id.as_ref()))
            .select(ReceiptRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_receipt).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Receipt>, ReceiptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<ReceiptRow> = receipts::table
            .filter(receipts::user_id.eq(user_id.as_ref()))
            .order((receipts::uploaded_at.desc(), receipts::id.desc()))
            .select(ReceiptRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_receipts(rows)
    }

    async fn delete_for_user(
        &self,
        user_id: &UserId,
        id: &ReceiptId,
    ) -> Result<bool, ReceiptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(
            receipts::table
                .filter(receipts::id.eq(id.as_uuid()))
                .filter(receipts::user_id.eq(user_id.as_ref())),
        )
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(deleted > 0)
    }
}
