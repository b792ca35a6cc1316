//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the serialised shape of their corresponding
//! domain types (flattened projections included) but live in the inbound
//! adapter layer where framework concerns belong. They derive `Serialize`
//! only so utoipa can read their serde attributes.

use serde::Serialize;
use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with the current state of the ledger.
    #[schema(rename = "conflict")]
    Conflict,
    /// The backing store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::Error)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "book is not available")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::User`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::User)]
#[serde(rename_all = "camelCase")]
pub struct UserSchema {
    /// Stable user identifier.
    #[schema(value_type = String, format = Uuid, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: String,
    /// Display name shown to colleagues.
    #[schema(example = "Ada Lovelace")]
    display_name: String,
    /// Normalised (lower-case) email address.
    #[schema(example = "ada@example.com")]
    email: String,
}

/// OpenAPI schema for [`crate::domain::BookCondition`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::BookCondition)]
#[serde(rename_all = "lowercase")]
pub enum BookConditionSchema {
    Good,
    Fair,
    Poor,
}

/// OpenAPI schema for [`crate::domain::BookStatus`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::BookStatus)]
#[serde(rename_all = "lowercase")]
pub enum BookStatusSchema {
    Available,
    Borrowed,
    Overdue,
}

/// OpenAPI schema for [`crate::domain::BorrowingStatus`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::BorrowingStatus)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatusSchema {
    Active,
    Overdue,
    Returned,
}

/// OpenAPI schema for [`crate::domain::Book`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::Book)]
#[serde(rename_all = "camelCase")]
pub struct BookSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "Dune")]
    title: String,
    #[schema(example = "Frank Herbert")]
    author: String,
    #[schema(example = "9780441013593")]
    isbn: Option<String>,
    description: Option<String>,
    condition: BookConditionSchema,
    /// False while an open borrowing exists.
    is_available: bool,
    #[schema(value_type = String, format = Uuid)]
    owner_id: String,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

/// OpenAPI schema for [`crate::domain::Borrowing`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::Borrowing)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    book_id: String,
    #[schema(value_type = String, format = Uuid)]
    borrower_id: String,
    #[schema(value_type = String, format = DateTime)]
    borrowed_at: String,
    #[schema(value_type = String, format = DateTime)]
    due_at: String,
    returned: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    returned_at: Option<String>,
}

/// OpenAPI schema for [`crate::domain::BorrowingSummary`].
///
/// Borrowing fields are flattened alongside the borrower.
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::BorrowingSummary)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingSummarySchema {
    #[schema(inline)]
    #[serde(flatten)]
    borrowing: BorrowingSchema,
    borrower: UserSchema,
    status: BorrowingStatusSchema,
}

/// OpenAPI schema for [`crate::domain::BookListing`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::BookListing)]
#[serde(rename_all = "camelCase")]
pub struct BookListingSchema {
    #[schema(inline)]
    #[serde(flatten)]
    book: BookSchema,
    owner: UserSchema,
    current_borrowing: Option<BorrowingSummarySchema>,
    status: BookStatusSchema,
}

/// OpenAPI schema for [`crate::domain::BookDetail`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::BookDetail)]
#[serde(rename_all = "camelCase")]
pub struct BookDetailSchema {
    #[schema(inline)]
    #[serde(flatten)]
    book: BookSchema,
    owner: UserSchema,
    /// Full history, newest first.
    borrowings: Vec<BorrowingSummarySchema>,
    status: BookStatusSchema,
}

/// OpenAPI schema for [`crate::domain::BorrowingDetail`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::BorrowingDetail)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingDetailSchema {
    #[schema(inline)]
    #[serde(flatten)]
    borrowing: BorrowingSchema,
    book: BookSchema,
    owner: UserSchema,
    borrower: UserSchema,
    status: BorrowingStatusSchema,
}
