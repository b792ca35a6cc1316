//! Tests for the lending ledger service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockLedgerRepository, MockUserRepository};
use crate::domain::{BookStatus, BorrowingStatus, ErrorCode};

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn user(name: &str) -> User {
    User::new(
        UserId::random(),
        crate::domain::DisplayName::new(name).expect("display name"),
        crate::domain::Email::new(format!("{}@example.com", name.to_lowercase()))
            .expect("email"),
    )
}

struct Cast {
    owner: User,
    borrower: User,
    stranger: User,
}

#[fixture]
fn cast() -> Cast {
    Cast {
        owner: user("Ada"),
        borrower: user("Grace"),
        stranger: user("Linus"),
    }
}

fn book_owned_by(owner: &User) -> Book {
    let draft = BookDraft::try_new("Dune", "Frank Herbert", None, None, None).expect("draft");
    Book::register(BookId::random(), owner.id().clone(), draft, now() - Duration::days(30))
}

fn lent(book: &Book, borrower: &User, days: i64) -> Borrowing {
    Borrowing::open(
        BorrowingId::random(),
        book.id,
        borrower.id().clone(),
        now() - Duration::days(1),
        LoanPeriod::from_request(Some(days)),
    )
}

fn on_loan(mut book: Book) -> Book {
    book.is_available = false;
    book
}

fn service(
    ledger: MockLedgerRepository,
    users: MockUserRepository,
) -> LendingService<MockLedgerRepository, MockUserRepository> {
    LendingService::new(
        Arc::new(ledger),
        Arc::new(users),
        Arc::new(FixtureClock { utc_now: now() }),
    )
}

fn ledger_with_book(book: &Book) -> MockLedgerRepository {
    let mut ledger = MockLedgerRepository::new();
    let snapshot = book.clone();
    ledger
        .expect_find_book()
        .returning(move |_| Ok(Some(snapshot.clone())));
    ledger
}

fn users_returning(people: Vec<User>) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_ids()
        .returning(move |_| Ok(people.clone()));
    users
}

#[rstest]
#[tokio::test]
async fn borrow_opens_loan_with_requested_period(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let mut ledger = ledger_with_book(&book);
    ledger.expect_find_open_borrowing().returning(|_| Ok(None));
    ledger
        .expect_open_borrowing()
        .withf(|borrowing| {
            borrowing.due_at == now() + Duration::days(7)
                && borrowing.borrowed_at == now()
                && !borrowing.returned
        })
        .times(1)
        .returning(|_| Ok(()));
    let users = users_returning(vec![cast.owner.clone(), cast.borrower.clone()]);

    let detail = service(ledger, users)
        .borrow_book(
            Some(cast.borrower.id().clone()),
            book.id,
            LoanPeriod::from_request(Some(7)),
        )
        .await
        .expect("borrow succeeds");

    assert_eq!(&detail.borrowing.borrower_id, cast.borrower.id());
    assert_eq!(detail.borrowing.book_id, book.id);
    assert_eq!(&detail.borrower, &cast.borrower);
    assert_eq!(&detail.owner, &cast.owner);
    assert!(!detail.book.is_available);
    assert_eq!(detail.status, BorrowingStatus::Active);
}

#[rstest]
#[tokio::test]
async fn borrow_defaults_non_positive_period_to_fourteen_days(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let mut ledger = ledger_with_book(&book);
    ledger.expect_find_open_borrowing().returning(|_| Ok(None));
    ledger.expect_open_borrowing().returning(|_| Ok(()));
    let users = users_returning(vec![cast.owner.clone(), cast.borrower.clone()]);

    let detail = service(ledger, users)
        .borrow_book(
            Some(cast.borrower.id().clone()),
            book.id,
            LoanPeriod::from_request(Some(0)),
        )
        .await
        .expect("borrow succeeds");

    let borrowing = &detail.borrowing;
    assert_eq!(borrowing.due_at - borrowing.borrowed_at, Duration::days(14));
}

#[rstest]
#[tokio::test]
async fn anonymous_callers_are_rejected_before_lookup() {
    let mut ledger = MockLedgerRepository::new();
    ledger.expect_find_book().times(0);

    let err = service(ledger, MockUserRepository::new())
        .borrow_book(None, BookId::random(), LoanPeriod::default())
        .await
        .expect_err("anonymous borrow fails");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn borrow_missing_book_is_not_found(cast: Cast) {
    let mut ledger = MockLedgerRepository::new();
    ledger.expect_find_book().returning(|_| Ok(None));
    ledger.expect_open_borrowing().times(0);

    let err = service(ledger, MockUserRepository::new())
        .borrow_book(
            Some(cast.borrower.id().clone()),
            BookId::random(),
            LoanPeriod::default(),
        )
        .await
        .expect_err("missing book");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn borrow_unavailable_book_conflicts(cast: Cast) {
    let book = on_loan(book_owned_by(&cast.owner));
    let mut ledger = ledger_with_book(&book);
    ledger.expect_open_borrowing().times(0);

    let err = service(ledger, MockUserRepository::new())
        .borrow_book(
            Some(cast.stranger.id().clone()),
            book.id,
            LoanPeriod::default(),
        )
        .await
        .expect_err("unavailable book");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "book is not available");
}

#[rstest]
#[tokio::test]
async fn borrow_with_stray_open_borrowing_conflicts(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let open = lent(&book, &cast.borrower, 7);
    let mut ledger = ledger_with_book(&book);
    ledger
        .expect_find_open_borrowing()
        .returning(move |_| Ok(Some(open.clone())));
    ledger.expect_open_borrowing().times(0);

    let err = service(ledger, MockUserRepository::new())
        .borrow_book(
            Some(cast.stranger.id().clone()),
            book.id,
            LoanPeriod::default(),
        )
        .await
        .expect_err("already borrowed");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "book is already borrowed");
}

#[rstest]
#[tokio::test]
async fn owner_cannot_borrow_own_book(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let mut ledger = ledger_with_book(&book);
    ledger.expect_find_open_borrowing().returning(|_| Ok(None));
    ledger.expect_open_borrowing().times(0);

    let err = service(ledger, MockUserRepository::new())
        .borrow_book(Some(cast.owner.id().clone()), book.id, LoanPeriod::default())
        .await
        .expect_err("owner borrow");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn state_guard_runs_before_ownership_guard(cast: Cast) {
    let book = on_loan(book_owned_by(&cast.owner));
    let ledger = ledger_with_book(&book);

    let err = service(ledger, MockUserRepository::new())
        .borrow_book(Some(cast.owner.id().clone()), book.id, LoanPeriod::default())
        .await
        .expect_err("owner borrow of lent book");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(LedgerPersistenceError::conflict("book is not available"), ErrorCode::Conflict)]
#[case(LedgerPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(LedgerPersistenceError::query("boom"), ErrorCode::InternalError)]
#[tokio::test]
async fn borrow_maps_store_failures(
    cast: Cast,
    #[case] failure: LedgerPersistenceError,
    #[case] expected: ErrorCode,
) {
    let book = book_owned_by(&cast.owner);
    let mut ledger = ledger_with_book(&book);
    ledger.expect_find_open_borrowing().returning(|_| Ok(None));
    ledger
        .expect_open_borrowing()
        .return_once(move |_| Err(failure));

    let err = service(ledger, MockUserRepository::new())
        .borrow_book(
            Some(cast.borrower.id().clone()),
            book.id,
            LoanPeriod::default(),
        )
        .await
        .expect_err("store failure");

    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn return_without_open_borrowing_conflicts(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let mut ledger = ledger_with_book(&book);
    ledger.expect_find_open_borrowing().returning(|_| Ok(None));
    ledger.expect_close_borrowing().times(0);

    let err = service(ledger, MockUserRepository::new())
        .return_book(Some(cast.borrower.id().clone()), book.id)
        .await
        .expect_err("nothing to return");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn strangers_cannot_return_books(cast: Cast) {
    let book = on_loan(book_owned_by(&cast.owner));
    let open = lent(&book, &cast.borrower, 7);
    let mut ledger = ledger_with_book(&book);
    ledger
        .expect_find_open_borrowing()
        .returning(move |_| Ok(Some(open.clone())));
    ledger.expect_close_borrowing().times(0);

    let err = service(ledger, MockUserRepository::new())
        .return_book(Some(cast.stranger.id().clone()), book.id)
        .await
        .expect_err("stranger return");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case::borrower(false)]
#[case::owner(true)]
#[tokio::test]
async fn borrower_or_owner_can_return(cast: Cast, #[case] as_owner: bool) {
    let book = on_loan(book_owned_by(&cast.owner));
    let open = lent(&book, &cast.borrower, 7);
    let open_id = open.id;
    let mut ledger = ledger_with_book(&book);
    ledger
        .expect_find_open_borrowing()
        .returning(move |_| Ok(Some(open.clone())));
    ledger
        .expect_close_borrowing()
        .withf(move |closed| closed.id == open_id && closed.returned)
        .times(1)
        .returning(|_| Ok(()));

    let users = users_returning(vec![cast.owner.clone(), cast.borrower.clone()]);

    let caller = if as_owner { &cast.owner } else { &cast.borrower };
    let detail = service(ledger, users)
        .return_book(Some(caller.id().clone()), book.id)
        .await
        .expect("return succeeds");

    assert!(detail.borrowing.returned);
    assert_eq!(detail.borrowing.returned_at, Some(now()));
    assert!(detail.book.is_available);
    assert_eq!(&detail.borrower, &cast.borrower);
    assert_eq!(detail.status, BorrowingStatus::Returned);
}

#[rstest]
#[tokio::test]
async fn only_owner_can_update(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let mut ledger = ledger_with_book(&book);
    ledger.expect_update_book().times(0);
    let patch = BookPatch::try_new(Some("Children of Dune"), None, None, None, None)
        .expect("patch");

    let err = service(ledger, MockUserRepository::new())
        .update_book(Some(cast.stranger.id().clone()), book.id, patch)
        .await
        .expect_err("stranger update");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn owner_update_applies_patch(cast: Cast) {
    let book = on_loan(book_owned_by(&cast.owner));
    let mut ledger = ledger_with_book(&book);
    ledger
        .expect_update_book()
        .withf(|updated| updated.title == "Children of Dune" && updated.author == "Frank Herbert")
        .times(1)
        .returning(|_| Ok(()));
    let patch = BookPatch::try_new(Some("Children of Dune"), None, None, None, None)
        .expect("patch");

    let updated = service(ledger, MockUserRepository::new())
        .update_book(Some(cast.owner.id().clone()), book.id, patch)
        .await
        .expect("update succeeds");

    assert_eq!(updated.title, "Children of Dune");
    assert!(!updated.is_available, "updates never touch availability");
}

#[rstest]
#[tokio::test]
async fn delete_with_open_borrowing_conflicts(cast: Cast) {
    let book = on_loan(book_owned_by(&cast.owner));
    let open = lent(&book, &cast.borrower, 7);
    let mut ledger = ledger_with_book(&book);
    ledger
        .expect_find_open_borrowing()
        .returning(move |_| Ok(Some(open.clone())));
    ledger.expect_delete_book().times(0);

    let err = service(ledger, MockUserRepository::new())
        .delete_book(Some(cast.owner.id().clone()), book.id)
        .await
        .expect_err("delete while lent");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn delete_requires_ownership(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let mut ledger = ledger_with_book(&book);
    ledger.expect_delete_book().times(0);

    let err = service(ledger, MockUserRepository::new())
        .delete_book(Some(cast.borrower.id().clone()), book.id)
        .await
        .expect_err("stranger delete");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn register_creates_available_book_for_caller(cast: Cast) {
    let mut ledger = MockLedgerRepository::new();
    ledger
        .expect_insert_book()
        .withf(|book| book.is_available)
        .times(1)
        .returning(|_| Ok(()));
    let draft = BookDraft::try_new("Hyperion", "Dan Simmons", None, None, None).expect("draft");
    let users = users_returning(vec![cast.owner.clone()]);

    let listing = service(ledger, users)
        .register_book(Some(cast.owner.id().clone()), draft)
        .await
        .expect("register succeeds");

    assert_eq!(&listing.book.owner_id, cast.owner.id());
    assert_eq!(listing.book.created_at, now());
    assert_eq!(&listing.owner, &cast.owner);
    assert!(listing.current_borrowing.is_none());
    assert_eq!(listing.status, BookStatus::Available);
}

#[rstest]
#[tokio::test]
async fn list_books_derives_status_and_filters(cast: Cast) {
    let free = book_owned_by(&cast.owner);
    let overdue_book = on_loan(book_owned_by(&cast.owner));
    let overdue = Borrowing::open(
        BorrowingId::random(),
        overdue_book.id,
        cast.borrower.id().clone(),
        now() - Duration::days(20),
        LoanPeriod::default(),
    );
    let books = vec![overdue_book.clone(), free.clone()];
    let history = vec![overdue.clone()];

    let mut ledger = MockLedgerRepository::new();
    ledger
        .expect_list_books()
        .returning(move || Ok(books.clone()));
    ledger
        .expect_list_borrowings_for_books()
        .returning(move |_| Ok(history.clone()));
    let users = users_returning(vec![cast.owner.clone(), cast.borrower.clone()]);
    let service = service(ledger, users);

    let all = service.list_books(false).await.expect("list all");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].status, BookStatus::Overdue);
    let current = all[0].current_borrowing.as_ref().expect("open loan");
    assert_eq!(&current.borrower, &cast.borrower);
    assert_eq!(current.status, BorrowingStatus::Overdue);
    assert_eq!(all[1].status, BookStatus::Available);

    let available = service.list_books(true).await.expect("list available");
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].book.id, free.id);
}

#[rstest]
#[tokio::test]
async fn get_book_includes_history(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let returned = lent(&book, &cast.borrower, 3).closed_at(now());
    let history = vec![returned.clone()];
    let mut ledger = ledger_with_book(&book);
    ledger
        .expect_list_borrowings_for_books()
        .returning(move |_| Ok(history.clone()));
    let users = users_returning(vec![cast.owner.clone(), cast.borrower.clone()]);

    let detail = service(ledger, users)
        .get_book(book.id)
        .await
        .expect("detail");

    assert_eq!(detail.status, BookStatus::Available);
    assert_eq!(detail.borrowings.len(), 1);
    assert_eq!(detail.borrowings[0].status, BorrowingStatus::Returned);
}

#[rstest]
#[tokio::test]
async fn list_borrowings_joins_book_and_owner(cast: Cast) {
    let book = on_loan(book_owned_by(&cast.owner));
    let open = lent(&book, &cast.borrower, 7);
    let borrowings = vec![open.clone()];
    let books = vec![book.clone()];
    let mut ledger = MockLedgerRepository::new();
    ledger
        .expect_list_borrowings_for_borrower()
        .withf(|_, filter| *filter == BorrowingFilter::Active)
        .returning(move |_, _| Ok(borrowings.clone()));
    ledger
        .expect_find_books()
        .returning(move |_| Ok(books.clone()));
    let users = users_returning(vec![cast.owner.clone(), cast.borrower.clone()]);

    let details = service(ledger, users)
        .list_borrowings(Some(cast.borrower.id().clone()), BorrowingFilter::Active)
        .await
        .expect("borrowings");

    assert_eq!(details.len(), 1);
    assert_eq!(&details[0].owner, &cast.owner);
    assert_eq!(details[0].book.id, book.id);
    assert_eq!(details[0].status, BorrowingStatus::Active);
}

#[rstest]
#[tokio::test]
async fn missing_user_rows_surface_as_internal_errors(cast: Cast) {
    let book = book_owned_by(&cast.owner);
    let mut ledger = ledger_with_book(&book);
    ledger
        .expect_list_borrowings_for_books()
        .returning(|_| Ok(Vec::new()));
    let users = users_returning(Vec::new());

    let err = service(ledger, users)
        .get_book(book.id)
        .await
        .expect_err("owner row missing");

    assert_eq!(err.code(), ErrorCode::InternalError);
}
