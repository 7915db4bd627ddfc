//! Receipt aggregate and its processing lifecycle.
//!
//! A receipt is created in [`ReceiptStatus::Processing`] when its PDF is
//! stored, and leaves that state exactly once per extraction attempt. The
//! extracted fields are optional because the extractor may only recover part
//! of a document.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Identifier of a stored receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(Uuid);

impl ReceiptId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReceiptId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Validation errors for [`StorageKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageKeyError {
    /// Key was empty.
    #[error("storage key must not be empty")]
    Empty,
    /// Key contained characters outside `[A-Za-z0-9._-]` or began with a dot.
    #[error("storage key contains unsupported characters: {0}")]
    InvalidCharacters(String),
}

/// Flat, path-safe reference to a stored file.
///
/// Keys never contain separators, so adapters can map them directly onto a
/// single directory or bucket prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageKey(String);

impl StorageKey {
    /// Validate an existing key.
    pub fn new(raw: impl Into<String>) -> Result<Self, StorageKeyError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(StorageKeyError::Empty);
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
        if raw.starts_with('.') || !raw.chars().all(allowed) {
            return Err(StorageKeyError::InvalidCharacters(raw));
        }
        Ok(Self(raw))
    }

    /// Mint a unique key for a newly uploaded PDF.
    #[must_use]
    pub fn generate_pdf() -> Self {
        Self(format!("{}.pdf", Uuid::new_v4().simple()))
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<StorageKey> for String {
    fn from(value: StorageKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for StorageKey {
    type Error = StorageKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Processing state of a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    /// Extraction or analysis is in flight.
    #[default]
    Processing,
    /// Extraction finished.
    Completed,
    /// Extraction gave up.
    Failed,
}

/// Error raised for a transition the lifecycle does not permit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("receipt cannot move from {from} to {to}")]
pub struct StatusTransitionError {
    /// State the receipt was in.
    pub from: ReceiptStatus,
    /// Requested state.
    pub to: ReceiptStatus,
}

impl ReceiptStatus {
    /// Stable storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// Terminal states may only re-enter `processing` to start a new
    /// attempt; `processing` may settle either way or be re-entered.
    ///
    /// # Examples
    /// ```
    /// use receipt_tracker::domain::ReceiptStatus;
    ///
    /// assert!(ReceiptStatus::Processing.can_transition_to(ReceiptStatus::Completed));
    /// assert!(!ReceiptStatus::Completed.can_transition_to(ReceiptStatus::Failed));
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Processing, _) | (Self::Completed | Self::Failed, Self::Processing)
        )
    }

    /// Validate a transition, returning the new state.
    pub fn transition_to(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status label is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown receipt status: {0}")]
pub struct ReceiptStatusParseError(pub String);

impl FromStr for ReceiptStatus {
    type Err = ReceiptStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ReceiptStatusParseError(other.to_owned())),
        }
    }
}

/// One purchased line on a receipt.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Item description as printed.
    #[serde(alias = "itemName")]
    pub name: String,
    /// Quantity purchased.
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    /// Price per unit, when printed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    /// Line total, when printed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

const fn default_quantity() -> f64 {
    1.0
}

/// Structured fields recovered from a receipt document.
///
/// Every field is optional; [`Receipt::apply_extraction`] keeps the stored
/// value wherever the extractor returned nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedReceiptData {
    /// Display name suggested by the extractor.
    pub file_display_name: Option<String>,
    /// Merchant name.
    pub merchant_name: Option<String>,
    /// Merchant street address.
    pub merchant_address: Option<String>,
    /// Merchant phone number.
    pub merchant_phone: Option<String>,
    /// Merchant email address.
    pub merchant_email: Option<String>,
    /// Transaction date as printed.
    pub transaction_date: Option<String>,
    /// Transaction total.
    pub transaction_amount: Option<f64>,
    /// ISO currency code.
    #[serde(alias = "currency")]
    pub transaction_currency: Option<String>,
    /// Human-readable summary.
    #[serde(alias = "receiptSummary")]
    pub summary: Option<String>,
    /// Purchased lines.
    pub items: Vec<LineItem>,
}

/// Fields required to register a freshly uploaded receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReceipt {
    /// Uploading user.
    pub user_id: UserId,
    /// Location of the stored PDF.
    pub storage_key: StorageKey,
    /// Original file name.
    pub file_name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Declared MIME type.
    pub mime_type: String,
}

/// Stored receipt with any extracted data.
///
/// ## Invariants
/// - `status` only changes through [`Receipt::transition_to`].
/// - `items` is replaced only by a non-empty extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Receipt identifier.
    pub id: ReceiptId,
    /// Owning user.
    pub user_id: UserId,
    /// Location of the stored PDF.
    pub storage_key: StorageKey,
    /// Display file name.
    pub file_name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Declared MIME type.
    pub mime_type: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
    /// Processing state.
    pub status: ReceiptStatus,
    /// Merchant name.
    pub merchant_name: Option<String>,
    /// Merchant street address.
    pub merchant_address: Option<String>,
    /// Merchant phone number.
    pub merchant_phone: Option<String>,
    /// Merchant email address.
    pub merchant_email: Option<String>,
    /// Transaction date as printed.
    pub transaction_date: Option<String>,
    /// Transaction total.
    pub transaction_amount: Option<f64>,
    /// ISO currency code.
    pub transaction_currency: Option<String>,
    /// Human-readable summary.
    pub summary: Option<String>,
    /// Purchased lines.
    pub items: Vec<LineItem>,
}

impl Receipt {
    /// Register a new upload in the `processing` state.
    #[must_use]
    pub fn new_upload(new: NewReceipt, uploaded_at: DateTime<Utc>) -> Self {
        let NewReceipt {
            user_id,
            storage_key,
            file_name,
            size_bytes,
            mime_type,
        } = new;
        Self {
            id: ReceiptId::random(),
            user_id,
            storage_key,
            file_name,
            size_bytes,
            mime_type,
            uploaded_at,
            status: ReceiptStatus::Processing,
            merchant_name: None,
            merchant_address: None,
            merchant_phone: None,
            merchant_email: None,
            transaction_date: None,
            transaction_amount: None,
            transaction_currency: None,
            summary: None,
            items: Vec::new(),
        }
    }

    /// Move to `next`, rejecting transitions the lifecycle forbids.
    pub fn transition_to(&mut self, next: ReceiptStatus) -> Result<(), StatusTransitionError> {
        self.status = self.status.transition_to(next)?;
        Ok(())
    }

    /// Merge extracted fields and mark the receipt completed.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use receipt_tracker::domain::{
    ///     ExtractedReceiptData, NewReceipt, Receipt, ReceiptStatus, StorageKey, UserId,
    /// };
    ///
    /// let mut receipt = Receipt::new_upload(
    ///     NewReceipt {
    ///         user_id: UserId::random(),
    ///         storage_key: StorageKey::generate_pdf(),
    ///         file_name: "lunch.pdf".into(),
    ///         size_bytes: 42,
    ///         mime_type: "application/pdf".into(),
    ///     },
    ///     Utc::now(),
    /// );
    /// receipt
    ///     .apply_extraction(ExtractedReceiptData {
    ///         merchant_name: Some("Cafe Nero".into()),
    ///         ..ExtractedReceiptData::default()
    ///     })
    ///     .expect("processing receipts accept extraction");
    /// assert_eq!(receipt.status, ReceiptStatus::Completed);
    /// assert_eq!(receipt.merchant_name.as_deref(), Some("Cafe Nero"));
    /// ```
    pub fn apply_extraction(
        &mut self,
        data: ExtractedReceiptData,
    ) -> Result<(), StatusTransitionError> {
        self.transition_to(ReceiptStatus::Completed)?;
        let ExtractedReceiptData {
            file_display_name,
            merchant_name,
            merchant_address,
            merchant_phone,
            merchant_email,
            transaction_date,
            transaction_amount,
            transaction_currency,
            summary,
            items,
        } = data;

        if let Some(name) = non_blank(file_display_name) {
            self.file_name = name;
        }
        merge(&mut self.merchant_name, merchant_name);
        merge(&mut self.merchant_address, merchant_address);
        merge(&mut self.merchant_phone, merchant_phone);
        merge(&mut self.merchant_email, merchant_email);
        merge(&mut self.transaction_date, transaction_date);
        merge(&mut self.transaction_currency, transaction_currency);
        merge(&mut self.summary, summary);
        if let Some(amount) = transaction_amount.filter(|value| value.is_finite()) {
            self.transaction_amount = Some(amount);
        }
        if !items.is_empty() {
            self.items = items;
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn merge(slot: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = non_blank(incoming) {
        *slot = Some(value);
    }
}
