//! Lending ledger service.
//!
//! Implements the lending driving ports on top of the ledger and user
//! repositories. Each transition reads a snapshot, checks its guards in a
//! fixed order (existence, state, authorisation) and then hands a single
//! conditional write to the repository. A write that loses a race is reported
//! as `Conflict`; nothing is retried here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    LedgerPersistenceError, LedgerRepository, LendingCommand, LendingQuery, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    Book, BookDetail, BookDraft, BookId, BookListing, BookPatch, Borrowing, BorrowingDetail,
    BorrowingFilter, BorrowingId, BorrowingSummary, Error, LoanPeriod, User, UserId,
};

pub(crate) fn map_ledger_error(error: LedgerPersistenceError) -> Error {
    match error {
        LedgerPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("ledger repository unavailable: {message}"))
        }
        LedgerPersistenceError::Query { message } => {
            Error::internal(format!("ledger repository error: {message}"))
        }
        LedgerPersistenceError::Conflict { message } => Error::conflict(message),
        LedgerPersistenceError::NotFound { message } => Error::not_found(message),
    }
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered"))
        }
    }
}

fn require_caller(caller: Option<UserId>) -> Result<UserId, Error> {
    caller.ok_or_else(|| Error::unauthorized("login required"))
}

fn rejected(action: &'static str, book_id: BookId, error: Error) -> Error {
    debug!(
        action,
        %book_id,
        code = ?error.code(),
        reason = error.message(),
        "lending request rejected"
    );
    error
}

fn book_not_found(book_id: BookId) -> Error {
    Error::not_found(format!("book {book_id} not found"))
}

/// Ledger service implementing [`LendingCommand`] and [`LendingQuery`].
#[derive(Clone)]
pub struct LendingService<L, U> {
    ledger: Arc<L>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<L, U> LendingService<L, U> {
    /// Create a service over the given repositories and clock.
    pub fn new(ledger: Arc<L>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            users,
            clock,
        }
    }
}

impl<L, U> LendingService<L, U>
where
    L: LedgerRepository,
    U: UserRepository,
{
    async fn load_book(&self, action: &'static str, book_id: BookId) -> Result<Book, Error> {
        self.ledger
            .find_book(&book_id)
            .await
            .map_err(map_ledger_error)?
            .ok_or_else(|| rejected(action, book_id, book_not_found(book_id)))
    }

    async fn open_borrowing_of(&self, book_id: BookId) -> Result<Option<Borrowing>, Error> {
        self.ledger
            .find_open_borrowing(&book_id)
            .await
            .map_err(map_ledger_error)
    }

    async fn load_owned_book(
        &self,
        action: &'static str,
        requester: &UserId,
        book_id: BookId,
    ) -> Result<Book, Error> {
        let book = self.load_book(action, book_id).await?;
        if !book.is_owned_by(requester) {
            return Err(rejected(
                action,
                book_id,
                Error::forbidden("only the owner can modify this book"),
            ));
        }
        Ok(book)
    }

    async fn load_users<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a UserId>,
    ) -> Result<HashMap<UserId, User>, Error> {
        let unique: HashSet<&UserId> = ids.into_iter().collect();
        let ids: Vec<UserId> = unique.into_iter().cloned().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self
            .users
            .find_by_ids(&ids)
            .await
            .map_err(map_user_error)?;
        Ok(users
            .into_iter()
            .map(|user| (user.id().clone(), user))
            .collect())
    }

    async fn borrowings_by_book(
        &self,
        book_ids: &[BookId],
    ) -> Result<HashMap<BookId, Vec<Borrowing>>, Error> {
        if book_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let borrowings = self
            .ledger
            .list_borrowings_for_books(book_ids)
            .await
            .map_err(map_ledger_error)?;
        let mut grouped: HashMap<BookId, Vec<Borrowing>> = HashMap::new();
        for borrowing in borrowings {
            grouped.entry(borrowing.book_id).or_default().push(borrowing);
        }
        Ok(grouped)
    }

    async fn detail_books(&self, books: Vec<Book>) -> Result<Vec<BookDetail>, Error> {
        let ids: Vec<BookId> = books.iter().map(|book| book.id).collect();
        let mut history = self.borrowings_by_book(&ids).await?;
        let users = self
            .load_users(
                books.iter().map(|book| &book.owner_id).chain(
                    history
                        .values()
                        .flatten()
                        .map(|borrowing| &borrowing.borrower_id),
                ),
            )
            .await?;

        let now = self.clock.utc();
        books
            .into_iter()
            .map(|book| {
                let owner = user_for(&users, &book.owner_id)?;
                let borrowings = history
                    .remove(&book.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|borrowing| {
                        let borrower = user_for(&users, &borrowing.borrower_id)?;
                        Ok(BorrowingSummary::new(borrowing, borrower, now))
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(BookDetail::new(book, owner, borrowings, now))
            })
            .collect()
    }

    async fn borrowing_detail(
        &self,
        book: Book,
        borrowing: Borrowing,
    ) -> Result<BorrowingDetail, Error> {
        let users = self
            .load_users([&book.owner_id, &borrowing.borrower_id])
            .await?;
        let owner = user_for(&users, &book.owner_id)?;
        let borrower = user_for(&users, &borrowing.borrower_id)?;
        Ok(BorrowingDetail::new(
            borrowing,
            book,
            owner,
            borrower,
            self.clock.utc(),
        ))
    }
}

fn user_for(users: &HashMap<UserId, User>, id: &UserId) -> Result<User, Error> {
    users
        .get(id)
        .cloned()
        .ok_or_else(|| Error::internal(format!("user {id} referenced by the ledger is missing")))
}

#[async_trait]
impl<L, U> LendingCommand for LendingService<L, U>
where
    L: LedgerRepository,
    U: UserRepository,
{
    async fn register_book(
        &self,
        caller: Option<UserId>,
        draft: BookDraft,
    ) -> Result<BookListing, Error> {
        let owner_id = require_caller(caller)?;
        let now = self.clock.utc();
        let book = Book::register(BookId::random(), owner_id, draft, now);
        self.ledger
            .insert_book(&book)
            .await
            .map_err(map_ledger_error)?;
        info!(book_id = %book.id, owner_id = %book.owner_id, "book registered");
        let users = self.load_users([&book.owner_id]).await?;
        let owner = user_for(&users, &book.owner_id)?;
        Ok(BookListing::new(book, owner, None, now))
    }

    async fn borrow_book(
        &self,
        caller: Option<UserId>,
        book_id: BookId,
        period: LoanPeriod,
    ) -> Result<BorrowingDetail, Error> {
        const ACTION: &str = "borrow";
        let requester = require_caller(caller)?;
        let mut book = self.load_book(ACTION, book_id).await?;
        if !book.is_available {
            return Err(rejected(
                ACTION,
                book_id,
                Error::conflict("book is not available"),
            ));
        }
        if self.open_borrowing_of(book_id).await?.is_some() {
            return Err(rejected(
                ACTION,
                book_id,
                Error::conflict("book is already borrowed"),
            ));
        }
        if book.is_owned_by(&requester) {
            return Err(rejected(
                ACTION,
                book_id,
                Error::forbidden("you cannot borrow your own book"),
            ));
        }

        let borrowing = Borrowing::open(
            BorrowingId::random(),
            book_id,
            requester,
            self.clock.utc(),
            period,
        );
        self.ledger
            .open_borrowing(&borrowing)
            .await
            .map_err(|err| rejected(ACTION, book_id, map_ledger_error(err)))?;
        info!(
            %book_id,
            borrower_id = %borrowing.borrower_id,
            due_at = %borrowing.due_at,
            "book borrowed"
        );
        book.is_available = false;
        self.borrowing_detail(book, borrowing).await
    }

    async fn return_book(
        &self,
        caller: Option<UserId>,
        book_id: BookId,
    ) -> Result<BorrowingDetail, Error> {
        const ACTION: &str = "return";
        let requester = require_caller(caller)?;
        let mut book = self.load_book(ACTION, book_id).await?;
        let Some(open) = self.open_borrowing_of(book_id).await? else {
            return Err(rejected(ACTION, book_id, Error::conflict("book is not borrowed")));
        };
        if open.borrower_id != requester && !book.is_owned_by(&requester) {
            return Err(rejected(
                ACTION,
                book_id,
                Error::forbidden("only the borrower or the owner can return this book"),
            ));
        }

        let closed = open.closed_at(self.clock.utc());
        self.ledger
            .close_borrowing(&closed)
            .await
            .map_err(|err| rejected(ACTION, book_id, map_ledger_error(err)))?;
        info!(
            %book_id,
            borrowing_id = %closed.id,
            returned_by = %requester,
            "book returned"
        );
        book.is_available = true;
        self.borrowing_detail(book, closed).await
    }

    async fn update_book(
        &self,
        caller: Option<UserId>,
        book_id: BookId,
        patch: BookPatch,
    ) -> Result<Book, Error> {
        let requester = require_caller(caller)?;
        let mut book = self.load_owned_book("update", &requester, book_id).await?;
        if patch.is_empty() {
            return Ok(book);
        }
        book.apply(patch);
        self.ledger
            .update_book(&book)
            .await
            .map_err(map_ledger_error)?;
        info!(%book_id, "book updated");
        Ok(book)
    }

    async fn delete_book(&self, caller: Option<UserId>, book_id: BookId) -> Result<(), Error> {
        const ACTION: &str = "delete";
        let requester = require_caller(caller)?;
        self.load_owned_book(ACTION, &requester, book_id).await?;
        if self.open_borrowing_of(book_id).await?.is_some() {
            return Err(rejected(
                ACTION,
                book_id,
                Error::conflict("book is currently borrowed and cannot be deleted"),
            ));
        }
        self.ledger
            .delete_book(&book_id)
            .await
            .map_err(|err| rejected(ACTION, book_id, map_ledger_error(err)))?;
        info!(%book_id, "book deleted");
        Ok(())
    }
}

#[async_trait]
impl<L, U> LendingQuery for LendingService<L, U>
where
    L: LedgerRepository,
    U: UserRepository,
{
    async fn list_books(&self, available_only: bool) -> Result<Vec<BookListing>, Error> {
        let books: Vec<Book> = self
            .ledger
            .list_books()
            .await
            .map_err(map_ledger_error)?
            .into_iter()
            .filter(|book| !available_only || book.is_available)
            .collect();
        let ids: Vec<BookId> = books.iter().map(|book| book.id).collect();
        let mut open: HashMap<BookId, Borrowing> = self
            .borrowings_by_book(&ids)
            .await?
            .into_iter()
            .filter_map(|(book_id, borrowings)| {
                borrowings
                    .into_iter()
                    .find(Borrowing::is_open)
                    .map(|borrowing| (book_id, borrowing))
            })
            .collect();
        let users = self
            .load_users(
                books
                    .iter()
                    .map(|book| &book.owner_id)
                    .chain(open.values().map(|borrowing| &borrowing.borrower_id)),
            )
            .await?;

        let now = self.clock.utc();
        books
            .into_iter()
            .map(|book| {
                let owner = user_for(&users, &book.owner_id)?;
                let current = open
                    .remove(&book.id)
                    .map(|borrowing| {
                        let borrower = user_for(&users, &borrowing.borrower_id)?;
                        Ok::<_, Error>(BorrowingSummary::new(borrowing, borrower, now))
                    })
                    .transpose()?;
                Ok(BookListing::new(book, owner, current, now))
            })
            .collect()
    }

    async fn list_owned_books(&self, caller: Option<UserId>) -> Result<Vec<BookDetail>, Error> {
        let owner = require_caller(caller)?;
        let books = self
            .ledger
            .list_books_by_owner(&owner)
            .await
            .map_err(map_ledger_error)?;
        self.detail_books(books).await
    }

    async fn list_borrowings(
        &self,
        caller: Option<UserId>,
        filter: BorrowingFilter,
    ) -> Result<Vec<BorrowingDetail>, Error> {
        let borrower = require_caller(caller)?;
        let borrowings = self
            .ledger
            .list_borrowings_for_borrower(&borrower, filter)
            .await
            .map_err(map_ledger_error)?;
        let book_ids: Vec<BookId> = borrowings
            .iter()
            .map(|borrowing| borrowing.book_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let books: HashMap<BookId, Book> = if book_ids.is_empty() {
            HashMap::new()
        } else {
            self.ledger
                .find_books(&book_ids)
                .await
                .map_err(map_ledger_error)?
                .into_iter()
                .map(|book| (book.id, book))
                .collect()
        };
        let users = self
            .load_users(
                books
                    .values()
                    .map(|book| &book.owner_id)
                    .chain(std::iter::once(&borrower)),
            )
            .await?;

        let now = self.clock.utc();
        borrowings
            .into_iter()
            .map(|borrowing| {
                let book = books.get(&borrowing.book_id).cloned().ok_or_else(|| {
                    Error::internal(format!(
                        "book {} referenced by borrowing {} is missing",
                        borrowing.book_id, borrowing.id
                    ))
                })?;
                let owner = user_for(&users, &book.owner_id)?;
                let borrower = user_for(&users, &borrowing.borrower_id)?;
                Ok(BorrowingDetail::new(borrowing, book, owner, borrower, now))
            })
            .collect()
    }

    async fn get_book(&self, book_id: BookId) -> Result<BookDetail, Error> {
        let book = self.load_book("get", book_id).await?;
        let mut details = self.detail_books(vec![book]).await?;
        details.pop().ok_or_else(|| book_not_found(book_id))
    }
}

#[cfg(test)]
#[path = "lending_service_tests.rs"]
mod tests;
