//! Driving port for ledger mutations.
//!
//! Every call carries the caller explicitly; `None` means the request is
//! anonymous and is rejected with `Unauthorized` before any other check.

use async_trait::async_trait;

use crate::domain::{
    Book, BookDraft, BookId, BookListing, BookPatch, BorrowingDetail, Error, LoanPeriod, UserId,
};

/// Domain use-case port for registering, lending, and maintaining books.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingCommand: Send + Sync {
    /// Register a new available book owned by the caller.
    async fn register_book(
        &self,
        caller: Option<UserId>,
        draft: BookDraft,
    ) -> Result<BookListing, Error>;

    /// Borrow a book for `period`.
    ///
    /// Guards run in order: the book exists (`NotFound`), it is available and
    /// has no open borrowing (`Conflict`), the caller is not the owner
    /// (`Forbidden`).
    async fn borrow_book(
        &self,
        caller: Option<UserId>,
        book_id: BookId,
        period: LoanPeriod,
    ) -> Result<BorrowingDetail, Error>;

    /// Return a borrowed book.
    ///
    /// Guards run in order: the book exists (`NotFound`), it has an open
    /// borrowing (`Conflict`), the caller is the borrower or the owner
    /// (`Forbidden`).
    async fn return_book(
        &self,
        caller: Option<UserId>,
        book_id: BookId,
    ) -> Result<BorrowingDetail, Error>;

    /// Apply a partial update; owner only.
    async fn update_book(
        &self,
        caller: Option<UserId>,
        book_id: BookId,
        patch: BookPatch,
    ) -> Result<Book, Error>;

    /// Delete a book with no open borrowing; owner only.
    async fn delete_book(&self, caller: Option<UserId>, book_id: BookId) -> Result<(), Error>;
}
