//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` endpoint, the schema wrappers from
//! [`crate::inbound::http::schemas`] and the session cookie security scheme.
//! The document backs Swagger UI in debug builds.

use crate::inbound::http::books::{BorrowBookRequest, RegisterBookRequest, UpdateBookRequest};
use crate::inbound::http::schemas::{
    BookConditionSchema, BookDetailSchema, BookListingSchema, BookSchema, BookStatusSchema,
    BorrowingDetailSchema, BorrowingSchema, BorrowingStatusSchema, BorrowingSummarySchema,
    ErrorCodeSchema, ErrorSchema, UserSchema,
};
use crate::inbound::http::users::{LoginRequest, SignupRequest};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login or POST /api/v1/signup.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Book lending ledger API",
        description = "Register books, lend them to colleagues and track returns."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::signup,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::books::list_books,
        crate::inbound::http::books::register_book,
        crate::inbound::http::books::get_book,
        crate::inbound::http::books::update_book,
        crate::inbound::http::books::delete_book,
        crate::inbound::http::books::borrow_book,
        crate::inbound::http::books::return_book,
        crate::inbound::http::books::my_books,
        crate::inbound::http::borrowings::list_borrowings,
    ),
    components(schemas(
        UserSchema,
        ErrorSchema,
        ErrorCodeSchema,
        BookConditionSchema,
        BookStatusSchema,
        BorrowingStatusSchema,
        BookSchema,
        BorrowingSchema,
        BorrowingSummarySchema,
        BookListingSchema,
        BookDetailSchema,
        BorrowingDetailSchema,
        SignupRequest,
        LoginRequest,
        RegisterBookRequest,
        UpdateBookRequest,
        BorrowBookRequest,
    )),
    tags(
        (name = "users", description = "Sign-up, login and the current session"),
        (name = "books", description = "Book registration and lending"),
        (name = "borrowings", description = "The caller's borrowing history")
    )
)]
pub struct ApiDoc;
