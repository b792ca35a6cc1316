//! End-to-end lending flows over HTTP with the in-memory store.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Duration;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

mod support;

use support::{
    SteppingClock, borrow_request, get_request, lending_app, lending_state, loan_days,
    register_request, return_request, session_cookie, signup_request, start_of_term, text,
};

#[fixture]
fn clock() -> Arc<SteppingClock> {
    Arc::new(SteppingClock::starting_at(start_of_term()))
}

#[rstest]
#[actix_web::test]
async fn lend_return_and_relend_with_default_period(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let alice = session_cookie(&test::call_service(&app, signup_request("Alice").to_request()).await);
    let bob = session_cookie(&test::call_service(&app, signup_request("Bob").to_request()).await);
    let carol = session_cookie(&test::call_service(&app, signup_request("Carol").to_request()).await);

    let res = test::call_service(&app, register_request(&alice, "Kindred").to_request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let book: Value = test::read_body_json(res).await;
    let book_id = text(&book, "id").to_owned();
    assert_eq!(book.get("isAvailable"), Some(&json!(true)));
    assert_eq!(book.pointer("/owner/displayName"), Some(&json!("Alice")));

    let res = test::call_service(&app, borrow_request(&bob, &book_id, Some(7)).to_request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let first: Value = test::read_body_json(res).await;
    assert_eq!(loan_days(&first), 7);
    assert_eq!(first.pointer("/borrower/displayName"), Some(&json!("Bob")));
    assert_eq!(first.pointer("/owner/displayName"), Some(&json!("Alice")));
    assert_eq!(text(&first, "status"), "active");

    let detail: Value = test::call_and_read_body_json(
        &app,
        get_request(None, &format!("/api/v1/books/{book_id}")).to_request(),
    )
    .await;
    assert_eq!(text(&detail, "status"), "borrowed");
    assert_eq!(detail.get("isAvailable"), Some(&json!(false)));

    let res = test::call_service(&app, return_request(&bob, &book_id).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let closed: Value = test::read_body_json(res).await;
    assert_eq!(closed.get("returned"), Some(&json!(true)));
    assert_eq!(closed.pointer("/book/isAvailable"), Some(&json!(true)));

    let res = test::call_service(&app, borrow_request(&carol, &book_id, Some(0)).to_request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let second: Value = test::read_body_json(res).await;
    assert_eq!(loan_days(&second), 14);

    let owned: Value = test::call_and_read_body_json(
        &app,
        get_request(Some(&alice), "/api/v1/my-books").to_request(),
    )
    .await;
    let owned = owned.as_array().expect("array of owned books");
    assert_eq!(owned.len(), 1);
    let history = owned
        .first()
        .and_then(|entry| entry.get("borrowings"))
        .and_then(Value::as_array)
        .expect("borrowing history");
    assert_eq!(history.len(), 2);
}

#[rstest]
#[actix_web::test]
async fn borrow_without_body_uses_default_period(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let owner = session_cookie(&test::call_service(&app, signup_request("Owner").to_request()).await);
    let reader = session_cookie(&test::call_service(&app, signup_request("Reader").to_request()).await);
    let book: Value = test::call_and_read_body_json(&app, register_request(&owner, "Dawn").to_request()).await;

    let res = test::call_service(
        &app,
        borrow_request(&reader, text(&book, "id"), None).to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let borrowing: Value = test::read_body_json(res).await;
    assert_eq!(loan_days(&borrowing), 14);
}

#[rstest]
#[actix_web::test]
async fn borrow_with_malformed_days_is_rejected(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let owner = session_cookie(&test::call_service(&app, signup_request("Owner").to_request()).await);
    let reader = session_cookie(&test::call_service(&app, signup_request("Reader").to_request()).await);
    let book: Value = test::call_and_read_body_json(&app, register_request(&owner, "Fledgling").to_request()).await;
    let book_id = text(&book, "id").to_owned();

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/books/{book_id}/borrow"))
            .cookie(reader.clone())
            .set_json(json!({ "days": "seven" }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(text(&body, "code"), "invalid_request");
    assert_eq!(
        body.get("details").and_then(|details| details.get("field")),
        Some(&json!("days"))
    );

    let detail: Value = test::call_and_read_body_json(
        &app,
        get_request(None, &format!("/api/v1/books/{book_id}")).to_request(),
    )
    .await;
    assert_eq!(text(&detail, "status"), "available");
}

#[rstest]
#[actix_web::test]
async fn concurrent_borrows_admit_exactly_one(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let owner = session_cookie(&test::call_service(&app, signup_request("Owner").to_request()).await);
    let first = session_cookie(&test::call_service(&app, signup_request("First").to_request()).await);
    let second = session_cookie(&test::call_service(&app, signup_request("Second").to_request()).await);
    let book: Value = test::call_and_read_body_json(&app, register_request(&owner, "Fledgling").to_request()).await;
    let book_id = text(&book, "id").to_owned();

    let (a, b) = futures::join!(
        test::call_service(&app, borrow_request(&first, &book_id, Some(3)).to_request()),
        test::call_service(&app, borrow_request(&second, &book_id, Some(3)).to_request()),
    );

    let mut statuses = [a.status(), b.status()];
    statuses.sort_by_key(|status| status.as_u16());
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let detail: Value = test::call_and_read_body_json(
        &app,
        get_request(None, &format!("/api/v1/books/{book_id}")).to_request(),
    )
    .await;
    let open = detail
        .get("borrowings")
        .and_then(Value::as_array)
        .expect("history")
        .iter()
        .filter(|entry| entry.get("returned") == Some(&json!(false)))
        .count();
    assert_eq!(open, 1);
}

#[rstest]
#[actix_web::test]
async fn owner_cannot_borrow_own_book(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let owner = session_cookie(&test::call_service(&app, signup_request("Owner").to_request()).await);
    let book: Value = test::call_and_read_body_json(&app, register_request(&owner, "Wild Seed").to_request()).await;

    let res = test::call_service(
        &app,
        borrow_request(&owner, text(&book, "id"), Some(7)).to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(text(&body, "code"), "forbidden");
}

#[rstest]
#[actix_web::test]
async fn returning_an_available_book_conflicts(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let owner = session_cookie(&test::call_service(&app, signup_request("Owner").to_request()).await);
    let book: Value = test::call_and_read_body_json(&app, register_request(&owner, "Imago").to_request()).await;
    let book_id = text(&book, "id").to_owned();

    let res = test::call_service(&app, return_request(&owner, &book_id).to_request()).await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let detail: Value = test::call_and_read_body_json(
        &app,
        get_request(None, &format!("/api/v1/books/{book_id}")).to_request(),
    )
    .await;
    assert_eq!(detail.get("isAvailable"), Some(&json!(true)));
}

#[rstest]
#[actix_web::test]
async fn deleting_a_borrowed_book_conflicts(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let owner = session_cookie(&test::call_service(&app, signup_request("Owner").to_request()).await);
    let reader = session_cookie(&test::call_service(&app, signup_request("Reader").to_request()).await);
    let book: Value = test::call_and_read_body_json(&app, register_request(&owner, "Adulthood Rites").to_request()).await;
    let book_id = text(&book, "id").to_owned();
    let res = test::call_service(&app, borrow_request(&reader, &book_id, Some(5)).to_request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/books/{book_id}"))
            .cookie(owner.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = test::call_service(
        &app,
        get_request(None, &format!("/api/v1/books/{book_id}")).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = test::call_service(&app, return_request(&owner, &book_id).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/books/{book_id}"))
            .cookie(owner.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[rstest]
#[actix_web::test]
async fn past_due_borrowing_is_overdue_until_returned(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(Arc::clone(&clock)))).await;
    let owner = session_cookie(&test::call_service(&app, signup_request("Owner").to_request()).await);
    let reader = session_cookie(&test::call_service(&app, signup_request("Reader").to_request()).await);
    let book: Value = test::call_and_read_body_json(&app, register_request(&owner, "Parable of the Sower").to_request()).await;
    let book_id = text(&book, "id").to_owned();
    let res = test::call_service(&app, borrow_request(&reader, &book_id, Some(7)).to_request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    clock.advance(Duration::days(8));

    let active: Value = test::call_and_read_body_json(
        &app,
        get_request(Some(&reader), "/api/v1/borrowings?status=active").to_request(),
    )
    .await;
    let entry = active
        .as_array()
        .and_then(|entries| entries.first())
        .expect("one active borrowing");
    assert_eq!(text(entry, "status"), "overdue");
    let listing: Value = test::call_and_read_body_json(
        &app,
        get_request(None, &format!("/api/v1/books/{book_id}")).to_request(),
    )
    .await;
    assert_eq!(text(&listing, "status"), "overdue");

    let res = test::call_service(&app, return_request(&reader, &book_id).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    clock.advance(Duration::days(30));

    let returned: Value = test::call_and_read_body_json(
        &app,
        get_request(Some(&reader), "/api/v1/borrowings?status=returned").to_request(),
    )
    .await;
    let entry = returned
        .as_array()
        .and_then(|entries| entries.first())
        .expect("one returned borrowing");
    assert_eq!(text(entry, "status"), "returned");
}

#[rstest]
#[actix_web::test]
async fn available_filter_hides_borrowed_books(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let owner = session_cookie(&test::call_service(&app, signup_request("Owner").to_request()).await);
    let reader = session_cookie(&test::call_service(&app, signup_request("Reader").to_request()).await);
    let lent: Value = test::call_and_read_body_json(&app, register_request(&owner, "Lent").to_request()).await;
    let shelved: Value = test::call_and_read_body_json(&app, register_request(&owner, "Shelved").to_request()).await;
    let res = test::call_service(&app, borrow_request(&reader, text(&lent, "id"), None).to_request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let all: Value = test::call_and_read_body_json(&app, get_request(None, "/api/v1/books").to_request()).await;
    let available: Value = test::call_and_read_body_json(
        &app,
        get_request(None, "/api/v1/books?available=true").to_request(),
    )
    .await;

    assert_eq!(all.as_array().map(Vec::len), Some(2));
    let ids: Vec<&str> = available
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| text(entry, "id"))
        .collect();
    assert_eq!(ids, vec![text(&shelved, "id")]);
}

#[rstest]
#[case::unknown_status("/api/v1/borrowings?status=lost", "status")]
#[case::malformed_book_id("/api/v1/books/not-a-uuid", "id")]
#[actix_web::test]
async fn malformed_inputs_name_the_field(
    clock: Arc<SteppingClock>,
    #[case] uri: &str,
    #[case] field: &str,
) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let reader = session_cookie(&test::call_service(&app, signup_request("Reader").to_request()).await);

    let res = test::call_service(&app, get_request(Some(&reader), uri).to_request()).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(text(&body, "code"), "invalid_request");
    assert_eq!(
        body.get("details").and_then(|details| details.get("field")),
        Some(&json!(field))
    );
}

#[rstest]
#[actix_web::test]
async fn anonymous_callers_cannot_lend(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/books")
            .set_json(json!({ "title": "Kindred", "author": "Octavia E. Butler" }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn signup_logout_and_login_again(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;
    let res = test::call_service(&app, signup_request("Dana").to_request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let session = session_cookie(&res);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/logout")
            .cookie(session)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": "dana@example.com", "password": "wrong-password" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": "DANA@example.com", "password": "hunter22" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let session = session_cookie(&res);

    let me: Value =
        test::call_and_read_body_json(&app, get_request(Some(&session), "/api/v1/me").to_request())
            .await;
    assert_eq!(text(&me, "displayName"), "Dana");
    assert_eq!(text(&me, "email"), "dana@example.com");
}

#[rstest]
#[actix_web::test]
async fn responses_carry_trace_id(clock: Arc<SteppingClock>) {
    let app = test::init_service(lending_app(lending_state(clock))).await;

    let res = test::call_service(&app, get_request(None, "/api/v1/me").to_request()).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let header = res
        .headers()
        .get(backend::domain::TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace id header");
    let body: Value = test::read_body_json(res).await;
    assert_eq!(text(&body, "traceId"), header);
}
