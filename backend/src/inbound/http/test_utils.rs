//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::{test, web};
use serde_json::json;

use crate::domain::ports::{
    FileStorage, FixtureFileStorage, MockInsightsCommand, MockReceiptCommand, MockReceiptQuery,
    MockUsageQuota, MockWorkflowDispatcher, MockWorkflowEventHandler,
};
use crate::inbound::http::state::{HttpState, HttpStateExtras, HttpStatePorts};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// `POST /api/v1/session` establishing `user_id`.
pub fn session_request(user_id: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(json!({ "userId": user_id }))
}

/// Session cookie set by a response.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Mocked ports; unset expectations panic when called.
pub struct TestPorts {
    pub receipts: MockReceiptCommand,
    pub receipts_query: MockReceiptQuery,
    pub insights: MockInsightsCommand,
    pub usage: MockUsageQuota,
    pub files: Arc<dyn FileStorage>,
    pub workflow_events: MockWorkflowEventHandler,
    pub dispatcher: MockWorkflowDispatcher,
    pub extras: HttpStateExtras,
}

impl Default for TestPorts {
    fn default() -> Self {
        Self {
            receipts: MockReceiptCommand::new(),
            receipts_query: MockReceiptQuery::new(),
            insights: MockInsightsCommand::new(),
            usage: MockUsageQuota::new(),
            files: Arc::new(FixtureFileStorage),
            workflow_events: MockWorkflowEventHandler::new(),
            dispatcher: MockWorkflowDispatcher::new(),
            extras: HttpStateExtras::default(),
        }
    }
}

impl TestPorts {
    /// Wrap the mocks as handler state.
    pub fn into_state(self) -> web::Data<HttpState> {
        let ports = HttpStatePorts {
            receipts: Arc::new(self.receipts),
            receipts_query: Arc::new(self.receipts_query),
            insights: Arc::new(self.insights),
            usage: Arc::new(self.usage),
            files: self.files,
            workflow_events: Arc::new(self.workflow_events),
            dispatcher: Arc::new(self.dispatcher),
        };
        web::Data::new(HttpState::new_with_extra(ports, self.extras))
    }
}
