//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (sessions,
//!   receipts, insights, usage, workflows, files, health)
//! - **Schemas**: domain type wrappers from
//!   [`schemas`](crate::inbound::http::schemas) that provide OpenAPI
//!   definitions without coupling domain types to the utoipa framework
//! - **Security**: Session cookie authentication scheme
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::debug::{DebugDispatchResponse, IntegrationStatus};
use crate::inbound::http::insights::AnalyzeReceiptBody;
use crate::inbound::http::receipts::{
    DownloadUrlResponse, ReceiptStatusResponse, UploadReceiptData, UploadReceiptResponse,
};
use crate::inbound::http::schemas::{
    EnhancedItemSchema, ErrorCodeSchema, ErrorSchema, FeatureUsageSchema,
    GeneratedInsightsSchema, LineItemSchema, ReceiptAnalysisSchema, ReceiptSchema,
    ReceiptStatusSchema, UsageCheckSchema, UsageSummarySchema,
};
use crate::inbound::http::sessions::{SessionRequest, SessionResponse};
use crate::inbound::http::workflows::WorkflowEventAck;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/session.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Receipt tracker API",
        description = "Receipt upload and extraction, AI insights, and plan-based usage quotas.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::sessions::create_session,
        crate::inbound::http::sessions::delete_session,
        crate::inbound::http::receipts::upload_receipt,
        crate::inbound::http::receipts::list_receipts,
        crate::inbound::http::receipts::receipt_status,
        crate::inbound::http::receipts::get_receipt,
        crate::inbound::http::receipts::receipt_download_url,
        crate::inbound::http::receipts::delete_receipt,
        crate::inbound::http::insights::direct_analysis,
        crate::inbound::http::insights::generate_insights,
        crate::inbound::http::usage::usage_summary,
        crate::inbound::http::usage::feature_usage,
        crate::inbound::http::workflows::handle_workflow_event,
        crate::inbound::http::debug::dispatch_workflow_event,
        crate::inbound::http::debug::workflow_config,
        crate::inbound::http::files::download_file,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        ReceiptSchema,
        ReceiptStatusSchema,
        LineItemSchema,
        UsageCheckSchema,
        FeatureUsageSchema,
        UsageSummarySchema,
        EnhancedItemSchema,
        ReceiptAnalysisSchema,
        GeneratedInsightsSchema,
        SessionRequest,
        SessionResponse,
        UploadReceiptData,
        UploadReceiptResponse,
        ReceiptStatusResponse,
        DownloadUrlResponse,
        AnalyzeReceiptBody,
        WorkflowEventAck,
        DebugDispatchResponse,
        IntegrationStatus,
    )),
    tags(
        (name = "session", description = "Session establishment"),
        (name = "receipts", description = "Receipt upload, listing and deletion"),
        (name = "insights", description = "Quota-gated AI analysis"),
        (name = "usage", description = "Plan usage and quota checks"),
        (name = "workflows", description = "Background workflow delivery and debugging"),
        (name = "files", description = "Stored receipt files"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema field structure and path registration.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";
    const RECEIPT_SCHEMA_NAME: &str = "crate.domain.Receipt";
    const USAGE_CHECK_SCHEMA_NAME: &str = "crate.domain.UsageCheck";

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    fn schema(name: &str) -> RefOr<Schema> {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        schemas
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("schema {name} registered"))
    }

    #[rstest]
    #[case(ERROR_SCHEMA_NAME, "code")]
    #[case(ERROR_SCHEMA_NAME, "message")]
    #[case(RECEIPT_SCHEMA_NAME, "storageKey")]
    #[case(RECEIPT_SCHEMA_NAME, "status")]
    #[case(USAGE_CHECK_SCHEMA_NAME, "allowed")]
    #[case(USAGE_CHECK_SCHEMA_NAME, "remaining")]
    fn schema_has_field(#[case] name: &str, #[case] field: &str) {
        assert_object_schema_has_field(&schema(name), field);
    }

    #[rstest]
    #[case("/api/v1/session")]
    #[case("/api/v1/receipts")]
    #[case("/api/v1/receipts/status")]
    #[case("/api/v1/receipts/{id}/download-url")]
    #[case("/api/v1/insights/direct")]
    #[case("/api/v1/usage/{feature}")]
    #[case("/api/v1/workflows/events")]
    #[case("/files/{key}")]
    fn path_is_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn session_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
