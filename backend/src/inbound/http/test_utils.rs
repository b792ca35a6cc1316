//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};

use crate::domain::UserId;
use crate::domain::ports::{
    MockLendingCommand, MockLendingQuery, MockLoginService, MockSignupCommand,
    MockUserProfileQuery,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

const SIGN_IN_PATH: &str = "/test/sign-in";

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

/// Extract the `session` cookie set by a response.
///
/// # Panics
/// Panics when the response did not set a session cookie.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Mock ports for handler tests. Unconfigured mocks panic when called.
#[derive(Default)]
pub struct TestPorts {
    pub login: MockLoginService,
    pub signup: MockSignupCommand,
    pub profile: MockUserProfileQuery,
    pub lending: MockLendingCommand,
    pub lending_query: MockLendingQuery,
}

impl TestPorts {
    pub fn into_state(self) -> HttpState {
        HttpState::new(HttpStatePorts {
            login: Arc::new(self.login),
            signup: Arc::new(self.signup),
            profile: Arc::new(self.profile),
            lending: Arc::new(self.lending),
            lending_query: Arc::new(self.lending_query),
        })
    }
}

async fn sign_in_handler(
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = UserId::new(path.into_inner())
        .map_err(|err| crate::domain::Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// Request that signs the test client in as `user_id` without a password.
pub fn sign_in(user_id: &UserId) -> test::TestRequest {
    test::TestRequest::post().uri(&format!("{SIGN_IN_PATH}/{user_id}"))
}

/// App serving every API route plus a password-less sign-in helper.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).service(
        web::scope("")
            .wrap(test_session_middleware())
            .route(
                &format!("{SIGN_IN_PATH}/{{id}}"),
                web::post().to(sign_in_handler),
            )
            .service(web::scope("/api/v1").configure(super::routes)),
    )
}
