//! Book ledger HTTP handlers.
//!
//! ```text
//! GET    /api/v1/books?available=true
//! POST   /api/v1/books
//! GET    /api/v1/books/{id}
//! PUT    /api/v1/books/{id}
//! DELETE /api/v1/books/{id}
//! POST   /api/v1/books/{id}/borrow {"days":7}
//! POST   /api/v1/books/{id}/return
//! GET    /api/v1/my-books
//! ```
//!
//! Handlers resolve the caller from the session and pass it to the ledger
//! untouched; authorisation decisions stay in the domain.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{BookDetail, BookDraft, BookListing, BookPatch, LoanPeriod};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    BookDetailSchema, BookListingSchema, BookSchema, BorrowingDetailSchema, ErrorSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, map_book_validation_error, missing_field_error, parse_book_id, parse_condition,
    parse_loan_days,
};

/// Query parameters for `GET /api/v1/books`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBooksQuery {
    /// Only return books that can be borrowed right now.
    pub available: Option<bool>,
}

/// Request body for `POST /api/v1/books`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    /// One of `good`, `fair`, `poor`; defaults to `good`.
    pub condition: Option<String>,
}

/// Request body for `PUT /api/v1/books/{id}`.
///
/// Absent fields keep their stored value; an empty `isbn` or `description`
/// clears it.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub condition: Option<String>,
}

/// Optional request body for `POST /api/v1/books/{id}/borrow`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowBookRequest {
    /// Loan length in days; missing, zero or negative values mean 14.
    pub days: Option<i64>,
}

fn parse_register_request(payload: RegisterBookRequest) -> ApiResult<BookDraft> {
    let RegisterBookRequest {
        title,
        author,
        isbn,
        description,
        condition,
    } = payload;
    let title = title.ok_or_else(|| missing_field_error(FieldName::new("title")))?;
    let author = author.ok_or_else(|| missing_field_error(FieldName::new("author")))?;
    let condition = parse_condition(condition.as_deref())?;
    BookDraft::try_new(
        &title,
        &author,
        isbn.as_deref(),
        description.as_deref(),
        condition,
    )
    .map_err(map_book_validation_error)
}

fn parse_update_request(payload: UpdateBookRequest) -> ApiResult<BookPatch> {
    let condition = parse_condition(payload.condition.as_deref())?;
    BookPatch::try_new(
        payload.title.as_deref(),
        payload.author.as_deref(),
        payload.isbn.as_deref(),
        payload.description.as_deref(),
        condition,
    )
    .map_err(map_book_validation_error)
}

/// List every book with its owner, current loan and status, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/books",
    params(ListBooksQuery),
    responses(
        (status = 200, description = "Books", body = [BookListingSchema]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "listBooks",
    security([])
)]
#[get("/books")]
pub async fn list_books(
    state: web::Data<HttpState>,
    query: web::Query<ListBooksQuery>,
) -> ApiResult<web::Json<Vec<BookListing>>> {
    let available_only = query.available.unwrap_or(false);
    let books = state.lending_query.list_books(available_only).await?;
    Ok(web::Json(books))
}

/// Register a book owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body = RegisterBookRequest,
    responses(
        (status = 201, description = "Book registered", body = BookListingSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "registerBook"
)]
#[post("/books")]
pub async fn register_book(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterBookRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.user_id()?;
    let draft = parse_register_request(payload.into_inner())?;
    let listing = state.lending.register_book(caller, draft).await?;
    Ok(HttpResponse::Created().json(listing))
}

/// Fetch one book with its owner and full borrowing history.
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "Book", body = BookDetailSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "getBook",
    security([])
)]
#[get("/books/{id}")]
pub async fn get_book(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookDetail>> {
    let book_id = parse_book_id(&path)?;
    let book = state.lending_query.get_book(book_id).await?;
    Ok(web::Json(book))
}

/// Update book details; owner only.
#[utoipa::path(
    put,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Book identifier")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "updateBook"
)]
#[put("/books/{id}")]
pub async fn update_book(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateBookRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.user_id()?;
    let book_id = parse_book_id(&path)?;
    let patch = parse_update_request(payload.into_inner())?;
    let book = state.lending.update_book(caller, book_id, patch).await?;
    Ok(HttpResponse::Ok().json(book))
}

/// Delete a book that is not on loan; owner only.
#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Book identifier")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Book is on loan", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "deleteBook"
)]
#[delete("/books/{id}")]
pub async fn delete_book(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = session.user_id()?;
    let book_id = parse_book_id(&path)?;
    state.lending.delete_book(caller, book_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Borrow a book.
///
/// The body is optional; without it the default loan period applies. A body
/// that is present must be a JSON object with an integer `days`.
#[utoipa::path(
    post,
    path = "/api/v1/books/{id}/borrow",
    params(("id" = String, Path, description = "Book identifier")),
    request_body(content = Option<BorrowBookRequest>),
    responses(
        (status = 201, description = "Borrowing opened", body = BorrowingDetailSchema),
        (status = 400, description = "Malformed id or days", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Own book", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Book is not available", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "borrowBook"
)]
#[post("/books/{id}/borrow")]
pub async fn borrow_book(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let caller = session.user_id()?;
    let book_id = parse_book_id(&path)?;
    let period = LoanPeriod::from_request(parse_loan_days(&body)?);
    let borrowing = state.lending.borrow_book(caller, book_id, period).await?;
    Ok(HttpResponse::Created().json(borrowing))
}

/// Return a borrowed book; borrower or owner only.
#[utoipa::path(
    post,
    path = "/api/v1/books/{id}/return",
    params(("id" = String, Path, description = "Book identifier")),
    responses(
        (status = 200, description = "Borrowing closed", body = BorrowingDetailSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Neither borrower nor owner", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Book is not borrowed", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "returnBook"
)]
#[post("/books/{id}/return")]
pub async fn return_book(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = session.user_id()?;
    let book_id = parse_book_id(&path)?;
    let borrowing = state.lending.return_book(caller, book_id).await?;
    Ok(HttpResponse::Ok().json(borrowing))
}

/// Books owned by the caller with their borrowing history.
#[utoipa::path(
    get,
    path = "/api/v1/my-books",
    responses(
        (status = 200, description = "Owned books", body = [BookDetailSchema]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "listMyBooks"
)]
#[get("/my-books")]
pub async fn my_books(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BookDetail>>> {
    let caller = session.user_id()?;
    let books = state.lending_query.list_owned_books(caller).await?;
    Ok(web::Json(books))
}

#[cfg(test)]
#[path = "books_tests.rs"]
mod tests;
