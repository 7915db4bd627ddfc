//! HTTP inbound adapter exposing REST endpoints.

pub mod debug;
pub mod error;
pub mod files;
pub mod health;
pub mod insights;
pub mod receipts;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod sessions;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod usage;
pub(crate) mod validation;
pub mod workflows;

pub use error::ApiResult;
