//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{receipts, usage_records};

/// Row struct for reading from the receipts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = receipts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReceiptRow {
    pub id: Uuid,
    pub user_id: String,
    pub storage_key: String,
    pub file_name: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: String,
    pub merchant_name: Option<String>,
    pub merchant_address: Option<String>,
    pub merchant_phone: Option<String>,
    pub merchant_email: Option<String>,
    pub transaction_date: Option<String>,
    pub transaction_amount: Option<f64>,
    pub transaction_currency: Option<String>,
    pub summary: Option<String>,
    pub items: serde_json::Value,
}

/// Insertable struct for new receipt rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = receipts)]
pub(crate) struct NewReceiptRow<'a> {
    pub id: Uuid,
    pub user_id: &'a str,
    pub storage_key: &'a str,
    pub file_name: &'a str,
    pub size_bytes: i64,
    pub mime_type: &'a str,
    pub uploaded_at: DateTime<Utc>,
    pub status: &'a str,
    pub items: serde_json::Value,
}

/// Changeset overwriting every mutable receipt column.
///
/// `treat_none_as_null` keeps cleared fields cleared instead of skipping them.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = receipts, treat_none_as_null = true)]
pub(crate) struct ReceiptUpdate<'a> {
    pub file_name: &'a str,
    pub status: &'a str,
    pub merchant_name: Option<&'a str>,
    pub merchant_address: Option<&'a str>,
    pub merchant_phone: Option<&'a str>,
    pub merchant_email: Option<&'a str>,
    pub transaction_date: Option<&'a str>,
    pub transaction_amount: Option<f64>,
    pub transaction_currency: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub items: serde_json::Value,
}

/// Row struct for reading from the usage_records table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = usage_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UsageRecordRow {
    pub user_id: String,
    pub feature: String,
    pub count: i64,
    pub last_used_at: DateTime<Utc>,
    pub plan: String,
}

/// Insertable struct seeding a counter at one.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = usage_records)]
pub(crate) struct NewUsageRecordRow<'a> {
    pub user_id: &'a str,
    pub feature: &'a str,
    pub count: i64,
    pub last_used_at: DateTime<Utc>,
    pub plan: &'a str,
}
