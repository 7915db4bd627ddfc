//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations only translate between Diesel rows and domain
//! types; row structs (`models.rs`) and table definitions (`schema.rs`) never
//! leave this module. Connections come from a `bb8` pool through
//! `diesel-async`, and every database failure is mapped to the owning port's
//! error type.
//!
//! # Example
//!
//! ```ignore
//! use receipt_tracker::outbound::persistence::{
//!     DbPool, DieselReceiptRepository, PoolConfig, run_migrations,
//! };
//!
//! run_migrations("postgres://localhost/receipts").await?;
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/receipts")).await?;
//! let repo = DieselReceiptRepository::new(pool);
//! ```

mod diesel_receipt_repository;
mod diesel_usage_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_receipt_repository::DieselReceiptRepository;
pub use diesel_usage_repository::DieselUsageRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
