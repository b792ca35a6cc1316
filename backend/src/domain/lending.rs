//! Read projections of the ledger and derived book status.
//!
//! Status is never stored; it is computed from the open borrowing and the
//! clock every time a projection is built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::book::Book;
use super::borrowing::{Borrowing, BorrowingStatus};
use super::user::User;

/// Read-time status of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    /// No open borrowing.
    Available,
    /// Lent out and not yet due.
    Borrowed,
    /// Lent out past its due date.
    Overdue,
}

/// Derive the status of `book` from its open borrowing at `now`.
///
/// Borrowings that are closed or belong to another book are ignored.
///
/// # Examples
/// ```
/// use backend::domain::{derive_status, Book, BookDraft, BookId, BookStatus, UserId};
/// use chrono::Utc;
///
/// let draft = BookDraft::try_new("Dune", "Frank Herbert", None, None, None).unwrap();
/// let book = Book::register(BookId::random(), UserId::random(), draft, Utc::now());
/// assert_eq!(derive_status(&book, None, Utc::now()), BookStatus::Available);
/// ```
pub fn derive_status(book: &Book, open: Option<&Borrowing>, now: DateTime<Utc>) -> BookStatus {
    match open.filter(|b| b.book_id == book.id && b.is_open()) {
        Some(borrowing) if borrowing.is_overdue(now) => BookStatus::Overdue,
        Some(_) => BookStatus::Borrowed,
        None => BookStatus::Available,
    }
}

/// A borrowing together with its borrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingSummary {
    /// The borrowing record, flattened into the JSON object.
    #[serde(flatten)]
    pub borrowing: Borrowing,
    /// Who holds or held the book.
    pub borrower: User,
    /// Status at projection time.
    pub status: BorrowingStatus,
}

impl BorrowingSummary {
    /// Pair `borrowing` with its borrower and compute its status at `now`.
    pub fn new(borrowing: Borrowing, borrower: User, now: DateTime<Utc>) -> Self {
        let status = borrowing.status(now);
        Self {
            borrowing,
            borrower,
            status,
        }
    }
}

/// A book as it appears in the catalogue, with its owner and current loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListing {
    /// The book itself, flattened into the JSON object.
    #[serde(flatten)]
    pub book: Book,
    /// Registering user.
    pub owner: User,
    /// Open borrowing, absent when the book is on the shelf.
    pub current_borrowing: Option<BorrowingSummary>,
    /// Derived from `current_borrowing` at projection time.
    pub status: BookStatus,
}

impl BookListing {
    /// Build a listing and derive its status at `now`.
    pub fn new(
        book: Book,
        owner: User,
        current_borrowing: Option<BorrowingSummary>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = derive_status(
            &book,
            current_borrowing.as_ref().map(|summary| &summary.borrowing),
            now,
        );
        Self {
            book,
            owner,
            current_borrowing,
            status,
        }
    }
}

/// A book with its owner and full borrowing history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    /// The book itself, flattened into the JSON object.
    #[serde(flatten)]
    pub book: Book,
    /// Registering user.
    pub owner: User,
    /// Every borrowing of the book, newest first.
    pub borrowings: Vec<BorrowingSummary>,
    /// Derived from the open borrowing, if any, at projection time.
    pub status: BookStatus,
}

impl BookDetail {
    /// Build a detail view; the open entry in `borrowings` drives the status.
    pub fn new(
        book: Book,
        owner: User,
        borrowings: Vec<BorrowingSummary>,
        now: DateTime<Utc>,
    ) -> Self {
        let open = borrowings
            .iter()
            .map(|summary| &summary.borrowing)
            .find(|borrowing| borrowing.is_open());
        let status = derive_status(&book, open, now);
        Self {
            book,
            owner,
            borrowings,
            status,
        }
    }
}

/// A borrowing seen from the borrower's side, with the book and its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingDetail {
    /// The borrowing record, flattened into the JSON object.
    #[serde(flatten)]
    pub borrowing: Borrowing,
    /// Book that was lent.
    pub book: Book,
    /// Owner of the book.
    pub owner: User,
    /// Borrowing user.
    pub borrower: User,
    /// Status at projection time.
    pub status: BorrowingStatus,
}

impl BorrowingDetail {
    /// Assemble the borrower-side view and compute its status at `now`.
    pub fn new(
        borrowing: Borrowing,
        book: Book,
        owner: User,
        borrower: User,
        now: DateTime<Utc>,
    ) -> Self {
        let status = borrowing.status(now);
        Self {
            borrowing,
            book,
            owner,
            borrower,
            status,
        }
    }
}
