//! Mutex-guarded store implementing both repository ports.
//!
//! One lock covers users, books and borrowings, and every conditional write
//! is checked and applied under a single acquisition. That makes borrow and
//! return atomic with respect to each other without a transaction manager.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    LedgerPersistenceError, LedgerRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Book, BookId, Borrowing, BorrowingFilter, BorrowingId, Email, User, UserAccount, UserId,
};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<UserId, UserAccount>,
    books: HashMap<BookId, Book>,
    borrowings: HashMap<BorrowingId, Borrowing>,
}

impl State {
    fn has_open_borrowing(&self, book_id: &BookId) -> bool {
        self.borrowings
            .values()
            .any(|borrowing| &borrowing.book_id == book_id && borrowing.is_open())
    }
}

/// Process-local implementation of [`UserRepository`] and [`LedgerRepository`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use backend::domain::ports::{LedgerRepository, UserRepository};
/// use backend::outbound::memory::InMemoryStore;
///
/// let store = Arc::new(InMemoryStore::default());
/// let users: Arc<dyn UserRepository> = store.clone();
/// let ledger: Arc<dyn LedgerRepository> = store;
/// # let _ = (users, ledger);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }

    fn ledger(&self) -> Result<MutexGuard<'_, State>, LedgerPersistenceError> {
        self.lock().map_err(LedgerPersistenceError::query)
    }

    fn users(&self) -> Result<MutexGuard<'_, State>, UserPersistenceError> {
        self.lock().map_err(UserPersistenceError::query)
    }
}

fn newest_books_first(books: &mut [Book]) {
    books.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
    });
}

fn newest_borrowings_first(borrowings: &mut [Borrowing]) {
    borrowings.sort_by(|a, b| {
        b.borrowed_at
            .cmp(&a.borrowed_at)
            .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
    });
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut state = self.users()?;
        let email = account.user.email();
        if state
            .accounts
            .values()
            .any(|existing| existing.user.email() == email)
        {
            return Err(UserPersistenceError::duplicate_email(email.to_string()));
        }
        state
            .accounts
            .insert(account.user.id().clone(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.users()?;
        Ok(state.accounts.get(id).map(|account| account.user.clone()))
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.users()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.accounts.get(id))
            .map(|account| account.user.clone())
            .collect())
    }

    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let state = self.users()?;
        Ok(state
            .accounts
            .values()
            .find(|account| account.user.email() == email)
            .cloned())
    }
}

#[async_trait]
impl LedgerRepository for InMemoryStore {
    async fn find_book(&self, id: &BookId) -> Result<Option<Book>, LedgerPersistenceError> {
        Ok(self.ledger()?.books.get(id).cloned())
    }

    async fn find_books(&self, ids: &[BookId]) -> Result<Vec<Book>, LedgerPersistenceError> {
        let state = self.ledger()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.books.get(id))
            .cloned()
            .collect())
    }

    async fn list_books(&self) -> Result<Vec<Book>, LedgerPersistenceError> {
        let mut books: Vec<Book> = self.ledger()?.books.values().cloned().collect();
        newest_books_first(&mut books);
        Ok(books)
    }

    async fn list_books_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Book>, LedgerPersistenceError> {
        let mut books: Vec<Book> = self
            .ledger()?
            .books
            .values()
            .filter(|book| book.is_owned_by(owner))
            .cloned()
            .collect();
        newest_books_first(&mut books);
        Ok(books)
    }

    async fn find_open_borrowing(
        &self,
        book_id: &BookId,
    ) -> Result<Option<Borrowing>, LedgerPersistenceError> {
        Ok(self
            .ledger()?
            .borrowings
            .values()
            .find(|borrowing| &borrowing.book_id == book_id && borrowing.is_open())
            .cloned())
    }

    async fn list_borrowings_for_books(
        &self,
        book_ids: &[BookId],
    ) -> Result<Vec<Borrowing>, LedgerPersistenceError> {
        let mut borrowings: Vec<Borrowing> = self
            .ledger()?
            .borrowings
            .values()
            .filter(|borrowing| book_ids.contains(&borrowing.book_id))
            .cloned()
            .collect();
        newest_borrowings_first(&mut borrowings);
        Ok(borrowings)
    }

    async fn list_borrowings_for_borrower(
        &self,
        borrower: &UserId,
        filter: BorrowingFilter,
    ) -> Result<Vec<Borrowing>, LedgerPersistenceError> {
        let mut borrowings: Vec<Borrowing> = self
            .ledger()?
            .borrowings
            .values()
            .filter(|borrowing| &borrowing.borrower_id == borrower && filter.matches(borrowing))
            .cloned()
            .collect();
        newest_borrowings_first(&mut borrowings);
        Ok(borrowings)
    }

    async fn insert_book(&self, book: &Book) -> Result<(), LedgerPersistenceError> {
        let mut state = self.ledger()?;
        if state.books.contains_key(&book.id) {
            return Err(LedgerPersistenceError::conflict("book id already exists"));
        }
        state.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> Result<(), LedgerPersistenceError> {
        let mut state = self.ledger()?;
        let Some(stored) = state.books.get_mut(&book.id) else {
            return Err(LedgerPersistenceError::not_found("book not found"));
        };
        let is_available = stored.is_available;
        *stored = Book {
            is_available,
            ..book.clone()
        };
        Ok(())
    }

    async fn delete_book(&self, id: &BookId) -> Result<(), LedgerPersistenceError> {
        let mut state = self.ledger()?;
        let Some(book) = state.books.get(id) else {
            return Err(LedgerPersistenceError::not_found("book not found"));
        };
        if !book.is_available || state.has_open_borrowing(id) {
            return Err(LedgerPersistenceError::conflict("book has an open borrowing"));
        }
        state.books.remove(id);
        state.borrowings.retain(|_, borrowing| &borrowing.book_id != id);
        Ok(())
    }

    async fn open_borrowing(&self, borrowing: &Borrowing) -> Result<(), LedgerPersistenceError> {
        let mut state = self.ledger()?;
        let open_elsewhere = state.has_open_borrowing(&borrowing.book_id);
        let Some(book) = state.books.get_mut(&borrowing.book_id) else {
            return Err(LedgerPersistenceError::not_found("book not found"));
        };
        if !book.is_available || open_elsewhere {
            return Err(LedgerPersistenceError::conflict("book is no longer available"));
        }
        book.is_available = false;
        state.borrowings.insert(borrowing.id, borrowing.clone());
        Ok(())
    }

    async fn close_borrowing(&self, borrowing: &Borrowing) -> Result<(), LedgerPersistenceError> {
        let mut state = self.ledger()?;
        let Some(stored) = state.borrowings.get_mut(&borrowing.id) else {
            return Err(LedgerPersistenceError::not_found("borrowing not found"));
        };
        if !stored.is_open() {
            return Err(LedgerPersistenceError::conflict("borrowing is already closed"));
        }
        stored.returned = true;
        stored.returned_at = borrowing.returned_at;
        if let Some(book) = state.books.get_mut(&borrowing.book_id) {
            book.is_available = true;
        }
        Ok(())
    }
}
