//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{books, borrowings, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    #[expect(dead_code, reason = "audit column not surfaced by the domain")]
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub display_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

// ---------------------------------------------------------------------------
// Book models
// ---------------------------------------------------------------------------

/// Row struct for reading from and inserting into the books table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub condition: String,
    pub is_available: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Changeset for the owner-editable book columns.
///
/// `None` for `isbn`/`description` writes `NULL` so cleared fields persist.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = books)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BookUpdate<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub isbn: Option<&'a str>,
    pub description: Option<&'a str>,
    pub condition: &'a str,
}

// ---------------------------------------------------------------------------
// Borrowing models
// ---------------------------------------------------------------------------

/// Row struct for reading from and inserting into the borrowings table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = borrowings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BorrowingRow {
    pub id: Uuid,
    pub book_id: Uuid,
    pub borrower_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned: bool,
    pub returned_at: Option<DateTime<Utc>>,
}
