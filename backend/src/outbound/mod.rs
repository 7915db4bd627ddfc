//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process repositories for development without a database
//! - **storage**: capability-scoped local file storage
//! - **gemini**: LLM extraction and insight generation
//! - **billing**: entitlement checks and billable event tracking
//! - **workflow**: in-process and hosted workflow event delivery
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod billing;
pub mod gemini;
mod http_status;
pub mod memory;
pub mod persistence;
pub mod storage;
pub mod workflow;
