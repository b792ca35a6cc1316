//! Shared helpers for the HTTP integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; this
//! module assembles the real services over the in-memory store so each test
//! drives the full HTTP stack without a database.

use std::sync::{Arc, Mutex};

use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::test::TestRequest;
use actix_web::{App, web};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::{Value, json};

use backend::Trace;
use backend::domain::{AccountService, LendingService};
use backend::inbound::http::routes;
use backend::inbound::http::session_config::SessionSettings;
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::outbound::hashing::BcryptHasher;
use backend::outbound::memory::InMemoryStore;

/// Clock the tests can move forward to reach due dates.
pub struct SteppingClock {
    now: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub fn start_of_term() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// HTTP state backed by a fresh in-memory store and the given clock.
pub fn lending_state(clock: Arc<SteppingClock>) -> web::Data<HttpState> {
    let store = Arc::new(InMemoryStore::new());
    let accounts = Arc::new(AccountService::new(
        Arc::clone(&store),
        Arc::new(BcryptHasher::new(4)),
    ));
    let lending = Arc::new(LendingService::new(Arc::clone(&store), store, clock));

    web::Data::new(HttpState::new(HttpStatePorts {
        login: accounts.clone(),
        signup: accounts.clone(),
        profile: accounts,
        lending: lending.clone(),
        lending_query: lending,
    }))
}

/// Full application: trace middleware, cookie sessions and every route.
pub fn lending_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    }
    .middleware();

    App::new()
        .app_data(state)
        .wrap(Trace)
        .service(web::scope("/api/v1").wrap(session).configure(routes))
}

/// Extract the `session` cookie set by a response.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

pub fn signup_request(name: &str) -> TestRequest {
    TestRequest::post().uri("/api/v1/signup").set_json(json!({
        "displayName": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "password": "hunter22",
    }))
}

pub fn register_request(session: &Cookie<'static>, title: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/books")
        .cookie(session.clone())
        .set_json(json!({ "title": title, "author": "Octavia E. Butler" }))
}

pub fn borrow_request(session: &Cookie<'static>, book_id: &str, days: Option<i64>) -> TestRequest {
    let request = TestRequest::post()
        .uri(&format!("/api/v1/books/{book_id}/borrow"))
        .cookie(session.clone());
    match days {
        Some(days) => request.set_json(json!({ "days": days })),
        None => request,
    }
}

pub fn return_request(session: &Cookie<'static>, book_id: &str) -> TestRequest {
    TestRequest::post()
        .uri(&format!("/api/v1/books/{book_id}/return"))
        .cookie(session.clone())
}

pub fn get_request(session: Option<&Cookie<'static>>, uri: &str) -> TestRequest {
    let request = TestRequest::get().uri(uri);
    match session {
        Some(cookie) => request.cookie(cookie.clone()),
        None => request,
    }
}

/// String field of a JSON object.
pub fn text<'a>(value: &'a Value, field: &str) -> &'a str {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("missing string field {field} in {value}"))
}

/// Whole days between the `borrowedAt` and `dueAt` of a borrowing payload.
pub fn loan_days(borrowing: &Value) -> i64 {
    let parse = |field: &str| {
        DateTime::parse_from_rfc3339(text(borrowing, field))
            .unwrap_or_else(|err| panic!("{field} is not RFC 3339: {err}"))
    };
    (parse("dueAt") - parse("borrowedAt")).num_days()
}
