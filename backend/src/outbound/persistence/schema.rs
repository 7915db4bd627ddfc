//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Uploaded receipts and their extracted fields.
    receipts (id) {
        id -> Uuid,
        /// Provider-issued owner identifier.
        #[max_length = 128]
        user_id -> Varchar,
        #[max_length = 255]
        storage_key -> Varchar,
        #[max_length = 255]
        file_name -> Varchar,
        size_bytes -> Int8,
        #[max_length = 127]
        mime_type -> Varchar,
        uploaded_at -> Timestamptz,
        /// One of `processing`, `completed`, `failed`.
        #[max_length = 16]
        status -> Varchar,
        merchant_name -> Nullable<Text>,
        merchant_address -> Nullable<Text>,
        merchant_phone -> Nullable<Text>,
        merchant_email -> Nullable<Text>,
        transaction_date -> Nullable<Text>,
        transaction_amount -> Nullable<Float8>,
        #[max_length = 16]
        transaction_currency -> Nullable<Varchar>,
        summary -> Nullable<Text>,
        /// JSON array of line items.
        items -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Monotonic feature usage counters keyed by `(user_id, feature)`.
    usage_records (user_id, feature) {
        #[max_length = 128]
        user_id -> Varchar,
        #[max_length = 32]
        feature -> Varchar,
        count -> Int8,
        last_used_at -> Timestamptz,
        #[max_length = 16]
        plan -> Varchar,
    }
}

diesel::allow_tables_to_appear_in_same_query!(receipts, usage_records);
