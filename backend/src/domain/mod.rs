//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities for the lending ledger and the
//! services that enforce its invariants. Keep types transport agnostic and
//! document invariants and serialisation contracts (serde) in each type's
//! Rustdoc.
//!
//! Public surface:
//! - `Error`/`ErrorCode`: transport-agnostic failure payload.
//! - `User`, `Book`, `Borrowing`: ledger records.
//! - `BookListing`, `BookDetail`, `BorrowingDetail`: read projections.
//! - `LendingService`, `AccountService`: implementations of the driving
//!   ports in [`ports`].

pub mod account_service;
pub mod auth;
pub mod book;
pub mod borrowing;
pub mod error;
pub mod lending;
pub mod lending_service;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{CredentialsValidationError, LoginCredentials, PASSWORD_MIN_LEN, SignupDetails};
pub use self::book::{
    AUTHOR_MAX, Book, BookCondition, BookDraft, BookId, BookPatch, BookValidationError, ISBN_MAX,
    TITLE_MAX,
};
pub use self::borrowing::{
    Borrowing, BorrowingFilter, BorrowingId, BorrowingStatus, LoanPeriod, UnknownBorrowingFilter,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::lending::{
    BookDetail, BookListing, BookStatus, BorrowingDetail, BorrowingSummary, derive_status,
};
pub use self::lending_service::LendingService;
pub use self::trace_id::TraceId;
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, Email, PasswordHash, User, UserAccount, UserId,
    UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
