//! Cookie session access for handlers.
//!
//! The session holds only the caller's [`UserId`], which the identity
//! provider has already verified. A cookie whose stored id fails validation
//! is treated as anonymous.

use actix_session::Session;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Handler-facing view of the request's cookie session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Bind `user_id` to the session, rotating the session id.
    pub fn sign_in(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop the session; the response clears the cookie.
    pub fn sign_out(&self) {
        self.0.purge();
    }

    /// Signed-in user, or `None` for anonymous or tampered sessions.
    pub fn current_user(&self) -> Option<UserId> {
        self.0.get::<UserId>(USER_ID_KEY).unwrap_or_else(|error| {
            warn!(%error, "discarding unreadable session user id");
            None
        })
    }

    /// Signed-in user or `401 Unauthorized`.
    pub fn require_user(&self) -> Result<UserId, Error> {
        self.current_user()
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { Ok(Self(session.await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};

    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

    async fn whoami(session: SessionContext) -> Result<HttpResponse, Error> {
        let user_id = session.require_user()?;
        Ok(HttpResponse::Ok().body(user_id.to_string()))
    }

    async fn sign_in(session: SessionContext) -> Result<HttpResponse, Error> {
        let user_id = UserId::new("user_2bXk9QwErTy").expect("fixture id");
        session.sign_in(&user_id)?;
        Ok(HttpResponse::NoContent().finish())
    }

    async fn sign_out(session: SessionContext) -> HttpResponse {
        session.sign_out();
        HttpResponse::NoContent().finish()
    }

    async fn plant_invalid(session: Session) -> HttpResponse {
        session
            .insert(USER_ID_KEY, "user with spaces")
            .expect("insert raw value");
        HttpResponse::NoContent().finish()
    }

    macro_rules! get {
        ($app:expr, $uri:expr) => {
            actix_test::call_service(
                &$app,
                actix_test::TestRequest::get().uri($uri).to_request(),
            )
            .await
        };
        ($app:expr, $uri:expr, $cookie:expr) => {
            actix_test::call_service(
                &$app,
                actix_test::TestRequest::get().uri($uri).cookie($cookie).to_request(),
            )
            .await
        };
    }

    macro_rules! session_app {
        () => {
            actix_test::init_service(
                App::new()
                    .wrap(test_session_middleware())
                    .route("/whoami", web::get().to(whoami))
                    .route("/sign-in", web::get().to(sign_in))
                    .route("/sign-out", web::get().to(sign_out))
                    .route("/plant-invalid", web::get().to(plant_invalid)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn signed_in_user_is_read_back() {
        let app = session_app!();
        let cookie = session_cookie(&get!(app, "/sign-in"));

        let res = get!(app, "/whoami", cookie);

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await, "user_2bXk9QwErTy");
    }

    #[actix_web::test]
    async fn anonymous_requests_are_unauthorised() {
        let app = session_app!();
        let res = get!(app, "/whoami");
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn invalid_stored_id_reads_as_anonymous() {
        let app = session_app!();
        let cookie = session_cookie(&get!(app, "/plant-invalid"));

        let res = get!(app, "/whoami", cookie);

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn sign_out_expires_the_cookie() {
        let app = session_app!();
        let cookie = session_cookie(&get!(app, "/sign-in"));

        let res = get!(app, "/sign-out", cookie);

        let cleared = session_cookie(&res);
        assert_eq!(cleared.value(), "");
    }
}
