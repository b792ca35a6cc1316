//! Borrowing history HTTP handlers.
//!
//! ```text
//! GET /api/v1/borrowings?status=active
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{BorrowingDetail, BorrowingFilter};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{BorrowingDetailSchema, ErrorSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error};

/// Query parameters for `GET /api/v1/borrowings`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BorrowingsQuery {
    /// `active` or `returned`; omit for the full history.
    pub status: Option<String>,
}

fn parse_filter(raw: Option<&str>) -> ApiResult<BorrowingFilter> {
    let Some(raw) = raw else {
        return Ok(BorrowingFilter::All);
    };
    raw.parse::<BorrowingFilter>()
        .map_err(|err| invalid_value_error(FieldName::new("status"), err.to_string(), raw))
}

/// The caller's borrowings, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/borrowings",
    params(BorrowingsQuery),
    responses(
        (status = 200, description = "Borrowings", body = [BorrowingDetailSchema]),
        (status = 400, description = "Unknown status filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["borrowings"],
    operation_id = "listBorrowings"
)]
#[get("/borrowings")]
pub async fn list_borrowings(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<BorrowingsQuery>,
) -> ApiResult<web::Json<Vec<BorrowingDetail>>> {
    let caller = session.user_id()?;
    let filter = parse_filter(query.status.as_deref())?;
    let borrowings = state.lending_query.list_borrowings(caller, filter).await?;
    Ok(web::Json(borrowings))
}
