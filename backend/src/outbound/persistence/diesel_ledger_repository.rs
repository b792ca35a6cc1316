//! PostgreSQL-backed `LedgerRepository` implementation using Diesel ORM.
//!
//! The two lending transitions run as conditional writes inside a single
//! transaction: the availability flag only flips when the row is still in the
//! expected state, and zero affected rows rolls the whole change back as a
//! conflict. The partial unique index on open borrowings backs this up when
//! two transactions race past the flag check.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::BoxedDeleteStatement;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{LedgerPersistenceError, LedgerRepository};
use crate::domain::{Book, BookCondition, BookId, Borrowing, BorrowingFilter, BorrowingId, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{BookRow, BookUpdate, BorrowingRow};
use super::pool::{DbPool, PoolError};
use super::schema::{books, borrowings};

/// `DELETE` for a book that is available and has no open borrowing.
///
/// The availability flag is the compare-and-swap key, as in `open_borrowing`:
/// a delete blocked behind a committing borrow re-checks it on the new row
/// version and matches nothing.
fn delete_idle_book(book_id: Uuid) -> BoxedDeleteStatement<'static, Pg, books::table> {
    let open_borrowing = borrowings::table
        .filter(borrowings::book_id.eq(book_id))
        .filter(borrowings::returned.eq(false));
    diesel::delete(books::table)
        .into_boxed()
        .filter(books::id.eq(book_id))
        .filter(books::is_available.eq(true))
        .filter(diesel::dsl::not(diesel::dsl::exists(open_borrowing)))
}

/// Diesel-backed implementation of the [`LedgerRepository`] port.
#[derive(Clone)]
pub struct DieselLedgerRepository {
    pool: DbPool,
}

impl DieselLedgerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a lending transaction.
///
/// Diesel requires the transaction error to absorb its own errors; the other
/// variants abort the transaction with a ledger-level outcome.
#[derive(Debug)]
enum TransitionError {
    Diesel(DieselError),
    Conflict(&'static str),
    NotFound(&'static str),
}

impl From<DieselError> for TransitionError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> LedgerPersistenceError {
    map_basic_pool_error(error, LedgerPersistenceError::connection)
}

fn map_diesel_error(error: DieselError) -> LedgerPersistenceError {
    map_basic_diesel_error(
        error,
        LedgerPersistenceError::query,
        LedgerPersistenceError::connection,
    )
}

fn map_transition_error(error: TransitionError) -> LedgerPersistenceError {
    match error {
        TransitionError::Conflict(message) => LedgerPersistenceError::conflict(message),
        TransitionError::NotFound(message) => LedgerPersistenceError::not_found(message),
        TransitionError::Diesel(err) if is_unique_violation(&err) => {
            LedgerPersistenceError::conflict("book already has an open borrowing")
        }
        TransitionError::Diesel(err) => map_diesel_error(err),
    }
}

fn book_to_row(book: &Book) -> BookRow {
    BookRow {
        id: *book.id.as_uuid(),
        title: book.title.clone(),
        author: book.author.clone(),
        isbn: book.isbn.clone(),
        description: book.description.clone(),
        condition: book.condition.as_str().to_owned(),
        is_available: book.is_available,
        owner_id: *book.owner_id.as_uuid(),
        created_at: book.created_at,
    }
}

fn row_to_book(row: BookRow) -> Book {
    let condition = row.condition.parse().unwrap_or_else(|_| {
        warn!(
            book_id = %row.id,
            value = %row.condition,
            "unrecognised book condition, defaulting to good"
        );
        BookCondition::default()
    });

    Book {
        id: BookId::from_uuid(row.id),
        title: row.title,
        author: row.author,
        isbn: row.isbn,
        description: row.description,
        condition,
        is_available: row.is_available,
        owner_id: UserId::from_uuid(row.owner_id),
        created_at: row.created_at,
    }
}

fn borrowing_to_row(borrowing: &Borrowing) -> BorrowingRow {
    BorrowingRow {
        id: *borrowing.id.as_uuid(),
        book_id: *borrowing.book_id.as_uuid(),
        borrower_id: *borrowing.borrower_id.as_uuid(),
        borrowed_at: borrowing.borrowed_at,
        due_at: borrowing.due_at,
        returned: borrowing.returned,
        returned_at: borrowing.returned_at,
    }
}

fn row_to_borrowing(row: BorrowingRow) -> Borrowing {
    Borrowing {
        id: BorrowingId::from_uuid(row.id),
        book_id: BookId::from_uuid(row.book_id),
        borrower_id: UserId::from_uuid(row.borrower_id),
        borrowed_at: row.borrowed_at,
        due_at: row.due_at,
        returned: row.returned,
        returned_at: row.returned_at,
    }
}

fn book_uuids(ids: &[BookId]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

#[async_trait]
impl LedgerRepository for DieselLedgerRepository {
    async fn find_book(&self, id: &BookId) -> Result<Option<Book>, LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<BookRow> = books::table
            .filter(books::id.eq(id.as_uuid()))
            .select(BookRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_book))
    }

    async fn find_books(&self, ids: &[BookId]) -> Result<Vec<Book>, LedgerPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BookRow> = books::table
            .filter(books::id.eq_any(book_uuids(ids)))
            .select(BookRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_book).collect())
    }

    async fn list_books(&self) -> Result<Vec<Book>, LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BookRow> = books::table
            .order((books::created_at.desc(), books::id.desc()))
            .select(BookRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_book).collect())
    }

    async fn list_books_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Book>, LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BookRow> = books::table
            .filter(books::owner_id.eq(owner.as_uuid()))
            .order((books::created_at.desc(), books::id.desc()))
            .select(BookRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_book).collect())
    }

    async fn find_open_borrowing(
        &self,
        book_id: &BookId,
    ) -> Result<Option<Borrowing>, LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<BorrowingRow> = borrowings::table
            .filter(borrowings::book_id.eq(book_id.as_uuid()))
            .filter(borrowings::returned.eq(false))
            .select(BorrowingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_borrowing))
    }

    async fn list_borrowings_for_books(
        &self,
        book_ids: &[BookId],
    ) -> Result<Vec<Borrowing>, LedgerPersistenceError> {
        if book_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BorrowingRow> = borrowings::table
            .filter(borrowings::book_id.eq_any(book_uuids(book_ids)))
            .order((borrowings::borrowed_at.desc(), borrowings::id.desc()))
            .select(BorrowingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_borrowing).collect())
    }

    async fn list_borrowings_for_borrower(
        &self,
        borrower: &UserId,
        filter: BorrowingFilter,
    ) -> Result<Vec<Borrowing>, LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = borrowings::table
            .filter(borrowings::borrower_id.eq(borrower.as_uuid()))
            .into_boxed();
        query = match filter {
            BorrowingFilter::All => query,
            BorrowingFilter::Active => query.filter(borrowings::returned.eq(false)),
            BorrowingFilter::Returned => query.filter(borrowings::returned.eq(true)),
        };

        let rows: Vec<BorrowingRow> = query
            .order((borrowings::borrowed_at.desc(), borrowings::id.desc()))
            .select(BorrowingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_borrowing).collect())
    }

    async fn insert_book(&self, book: &Book) -> Result<(), LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(books::table)
            .values(&book_to_row(book))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_book(&self, book: &Book) -> Result<(), LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = BookUpdate {
            title: &book.title,
            author: &book.author,
            isbn: book.isbn.as_deref(),
            description: book.description.as_deref(),
            condition: book.condition.as_str(),
        };

        let updated = diesel::update(books::table.filter(books::id.eq(book.id.as_uuid())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(LedgerPersistenceError::not_found("book not found"));
        }
        Ok(())
    }

    async fn delete_book(&self, id: &BookId) -> Result<(), LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let book_id = *id.as_uuid();

        conn.transaction(|conn| {
            async move {
                let deleted = delete_idle_book(book_id).execute(conn).await?;

                if deleted > 0 {
                    return Ok(());
                }

                let still_present: bool =
                    diesel::select(diesel::dsl::exists(books::table.filter(books::id.eq(book_id))))
                        .get_result(conn)
                        .await?;
                if still_present {
                    Err(TransitionError::Conflict("book has an open borrowing"))
                } else {
                    Err(TransitionError::NotFound("book not found"))
                }
            }
            .scope_boxed()
        })
        .await
        .map_err(map_transition_error)
    }

    async fn open_borrowing(&self, borrowing: &Borrowing) -> Result<(), LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = borrowing_to_row(borrowing);

        conn.transaction(|conn| {
            async move {
                let claimed = diesel::update(
                    books::table
                        .filter(books::id.eq(row.book_id))
                        .filter(books::is_available.eq(true)),
                )
                .set(books::is_available.eq(false))
                .execute(conn)
                .await?;

                if claimed == 0 {
                    return Err(TransitionError::Conflict("book is no longer available"));
                }

                diesel::insert_into(borrowings::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_transition_error)
    }

    async fn close_borrowing(&self, borrowing: &Borrowing) -> Result<(), LedgerPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let borrowing_id = *borrowing.id.as_uuid();
        let book_id = *borrowing.book_id.as_uuid();
        let returned_at = borrowing.returned_at;

        conn.transaction(|conn| {
            async move {
                let closed = diesel::update(
                    borrowings::table
                        .filter(borrowings::id.eq(borrowing_id))
                        .filter(borrowings::returned.eq(false)),
                )
                .set((
                    borrowings::returned.eq(true),
                    borrowings::returned_at.eq(returned_at),
                ))
                .execute(conn)
                .await?;

                if closed == 0 {
                    return Err(TransitionError::Conflict("borrowing is already closed"));
                }

                diesel::update(books::table.filter(books::id.eq(book_id)))
                    .set(books::is_available.eq(true))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_transition_error)
    }
}
