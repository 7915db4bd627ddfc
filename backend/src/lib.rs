//! Receipt tracker backend library.
//!
//! Hexagonal layout: `domain` holds the receipt, insight and usage-quota
//! logic behind ports; `inbound` adapts HTTP onto the driving ports;
//! `outbound` implements the driven ports for PostgreSQL, local files,
//! Gemini, billing and workflow delivery.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
