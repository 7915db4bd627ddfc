//! Session endpoints.
//!
//! ```text
//! POST   /api/v1/session {"userId":"user_2bXk9QwErTy"}
//! DELETE /api/v1/session
//! ```
//!
//! The identity provider verifies users before the client calls in; this
//! endpoint only binds that identifier to a signed session cookie.

use actix_web::{HttpResponse, delete, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::UserId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::validation::{FieldName, invalid_value_error};

/// Request body for `POST /api/v1/session`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Provider-verified user identifier.
    #[schema(example = "user_2bXk9QwErTy")]
    pub user_id: String,
}

/// Response body for `POST /api/v1/session`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Identifier now bound to the session.
    pub user_id: String,
}

/// Establish a session for a verified user.
#[utoipa::path(
    post,
    path = "/api/v1/session",
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Session established", body = SessionResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid user id", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "createSession",
    security([])
)]
#[post("/session")]
pub async fn create_session(
    session: SessionContext,
    payload: web::Json<SessionRequest>,
) -> ApiResult<web::Json<SessionResponse>> {
    let raw = payload.into_inner().user_id;
    let user_id = UserId::new(&raw).map_err(|err| {
        invalid_value_error(FieldName::new("userId"), format!("userId is invalid: {err}"), &raw)
    })?;
    session.sign_in(&user_id)?;
    Ok(web::Json(SessionResponse {
        user_id: user_id.into(),
    }))
}

/// End the current session.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    responses((status = 204, description = "Session cleared")),
    tags = ["session"],
    operation_id = "deleteSession",
    security([])
)]
#[delete("/session")]
pub async fn delete_session(session: SessionContext) -> HttpResponse {
    session.sign_out();
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, session_request, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    fn app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().wrap(test_session_middleware()).service(
            web::scope("/api/v1")
                .service(create_session)
                .service(delete_session),
        )
    }

    #[rstest]
    #[actix_web::test]
    async fn session_binds_user_id() {
        let app = actix_test::init_service(app()).await;

        let res = actix_test::call_service(&app, session_request("user_2bXk9").to_request()).await;

        assert_eq!(res.status(), StatusCode::OK);
        let _cookie = session_cookie(&res);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["userId"], "user_2bXk9");
    }

    #[rstest]
    #[case::empty("")]
    #[case::spaces("user 1")]
    #[actix_web::test]
    async fn malformed_ids_are_rejected(#[case] user_id: &str) {
        let app = actix_test::init_service(app()).await;

        let res = actix_test::call_service(&app, session_request(user_id).to_request()).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "userId");
    }

    #[rstest]
    #[actix_web::test]
    async fn delete_clears_session() {
        let app = actix_test::init_service(app()).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete().uri("/api/v1/session").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}
