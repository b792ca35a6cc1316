//! Driving port for ledger reads.

use async_trait::async_trait;

use crate::domain::{
    BookDetail, BookId, BookListing, BorrowingDetail, BorrowingFilter, Error, UserId,
};

/// Domain use-case port for browsing books and borrowing history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingQuery: Send + Sync {
    /// Every book with its owner and current loan, newest first.
    ///
    /// With `available_only` set, books on loan are left out.
    async fn list_books(&self, available_only: bool) -> Result<Vec<BookListing>, Error>;

    /// Books owned by the caller with their full history, newest first.
    async fn list_owned_books(&self, caller: Option<UserId>) -> Result<Vec<BookDetail>, Error>;

    /// The caller's borrowings matching `filter`, newest first.
    async fn list_borrowings(
        &self,
        caller: Option<UserId>,
        filter: BorrowingFilter,
    ) -> Result<Vec<BorrowingDetail>, Error>;

    /// One book with its owner and full history.
    async fn get_book(&self, book_id: BookId) -> Result<BookDetail, Error>;
}
