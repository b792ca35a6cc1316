//! Port for book and borrowing persistence.
//!
//! Reads return snapshots. The two lending transitions are exposed as single
//! conditional writes so adapters can apply the availability flag and the
//! borrowing row together; a lost race surfaces as `Conflict` rather than a
//! partially applied change.

use async_trait::async_trait;

use crate::domain::{Book, BookId, Borrowing, BorrowingFilter, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger repository adapters.
    pub enum LedgerPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "ledger repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "ledger repository query failed: {message}",
        /// A conditional write lost against a concurrent change.
        Conflict { message: String } => "ledger state changed concurrently: {message}",
        /// The row targeted by a write no longer exists.
        NotFound { message: String } => "ledger row not found: {message}",
    }
}

/// Port for reading and writing books and borrowings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Fetch a book by id.
    async fn find_book(&self, id: &BookId) -> Result<Option<Book>, LedgerPersistenceError>;

    /// Fetch several books at once; missing ids are skipped.
    async fn find_books(&self, ids: &[BookId]) -> Result<Vec<Book>, LedgerPersistenceError>;

    /// All books, newest first.
    async fn list_books(&self) -> Result<Vec<Book>, LedgerPersistenceError>;

    /// Books owned by `owner`, newest first.
    async fn list_books_by_owner(&self, owner: &UserId)
    -> Result<Vec<Book>, LedgerPersistenceError>;

    /// The open borrowing of a book, if any.
    async fn find_open_borrowing(
        &self,
        book_id: &BookId,
    ) -> Result<Option<Borrowing>, LedgerPersistenceError>;

    /// Every borrowing of the given books, newest first.
    async fn list_borrowings_for_books(
        &self,
        book_ids: &[BookId],
    ) -> Result<Vec<Borrowing>, LedgerPersistenceError>;

    /// Borrowings made by `borrower` matching `filter`, newest first.
    async fn list_borrowings_for_borrower(
        &self,
        borrower: &UserId,
        filter: BorrowingFilter,
    ) -> Result<Vec<Borrowing>, LedgerPersistenceError>;

    /// Insert a freshly registered book.
    async fn insert_book(&self, book: &Book) -> Result<(), LedgerPersistenceError>;

    /// Overwrite the descriptive fields of a book. Availability is untouched.
    async fn update_book(&self, book: &Book) -> Result<(), LedgerPersistenceError>;

    /// Delete a book that has no open borrowing.
    ///
    /// Fails with `Conflict` when an open borrowing exists and `NotFound`
    /// when the book is gone.
    async fn delete_book(&self, id: &BookId) -> Result<(), LedgerPersistenceError>;

    /// Mark the book unavailable and insert `borrowing` atomically.
    ///
    /// Only applies while the book is still available; otherwise fails with
    /// `Conflict` and writes nothing.
    async fn open_borrowing(&self, borrowing: &Borrowing) -> Result<(), LedgerPersistenceError>;

    /// Record the return carried by `borrowing` and mark the book available
    /// atomically.
    ///
    /// Only applies while the stored borrowing is still open; otherwise fails
    /// with `Conflict` and writes nothing.
    async fn close_borrowing(&self, borrowing: &Borrowing) -> Result<(), LedgerPersistenceError>;
}
