//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

use crate::domain::Error;

pub mod books;
pub mod borrowings;
pub mod error;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// Extractor failures (malformed JSON or query strings) are reported with the
/// same error payload as domain validation failures.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
///
/// let app = App::new().service(web::scope("/api/v1").configure(backend::inbound::http::routes));
/// ```
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| Error::invalid_request(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| Error::invalid_request(err.to_string()).into()),
    )
    .service(users::signup)
    .service(users::login)
    .service(users::logout)
    .service(users::current_user)
    .service(books::list_books)
    .service(books::register_book)
    .service(books::get_book)
    .service(books::update_book)
    .service(books::delete_book)
    .service(books::borrow_book)
    .service(books::return_book)
    .service(books::my_books)
    .service(borrowings::list_borrowings);
}
