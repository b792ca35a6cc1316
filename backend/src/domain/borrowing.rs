//! Borrowing records and the loan period.
//!
//! A [`Borrowing`] is opened by a successful borrow and closed exactly once
//! by a return. Closed borrowings are history and are never modified again.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::book::BookId;
use super::user::UserId;

/// Stable borrowing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowingId(Uuid);

impl BorrowingId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random [`BorrowingId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BorrowingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Number of days a book may be kept.
///
/// Missing, zero, or negative requests fall back to
/// [`LoanPeriod::DEFAULT_DAYS`], so `due_at` is always after `borrowed_at`.
///
/// # Examples
/// ```
/// use backend::domain::LoanPeriod;
///
/// assert_eq!(LoanPeriod::from_request(Some(7)).days(), 7);
/// assert_eq!(LoanPeriod::from_request(Some(0)).days(), 14);
/// assert_eq!(LoanPeriod::from_request(None).days(), 14);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPeriod(u32);

impl LoanPeriod {
    /// Loan length used when the borrower does not ask for one.
    pub const DEFAULT_DAYS: u32 = 14;

    /// Upper bound keeping `borrowed_at + days` well inside chrono's range.
    pub const MAX_DAYS: u32 = 3650;

    /// Interpret the day count sent by a borrower.
    pub fn from_request(days: Option<i64>) -> Self {
        match days {
            Some(days) if days > 0 => {
                let capped = days.min(i64::from(Self::MAX_DAYS));
                Self(u32::try_from(capped).unwrap_or(Self::DEFAULT_DAYS))
            }
            _ => Self::default(),
        }
    }

    /// Loan length in whole days.
    pub fn days(self) -> u32 {
        self.0
    }

    /// Due date for a loan starting at `borrowed_at`.
    pub fn due_from(self, borrowed_at: DateTime<Utc>) -> DateTime<Utc> {
        borrowed_at + Duration::days(i64::from(self.0))
    }
}

impl Default for LoanPeriod {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}

/// A loan of a book to a borrower.
///
/// ## Invariants
/// - `due_at > borrowed_at`.
/// - `returned_at` is present iff `returned` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrowing {
    /// Stable identifier.
    pub id: BorrowingId,
    /// Book on loan.
    pub book_id: BookId,
    /// User holding the book.
    pub borrower_id: UserId,
    /// When the loan started.
    pub borrowed_at: DateTime<Utc>,
    /// When the book is expected back.
    pub due_at: DateTime<Utc>,
    /// Whether the loan has been closed.
    pub returned: bool,
    /// When the loan was closed.
    pub returned_at: Option<DateTime<Utc>>,
}

impl Borrowing {
    /// Open a new borrowing starting at `now`.
    pub fn open(
        id: BorrowingId,
        book_id: BookId,
        borrower_id: UserId,
        now: DateTime<Utc>,
        period: LoanPeriod,
    ) -> Self {
        Self {
            id,
            book_id,
            borrower_id,
            borrowed_at: now,
            due_at: period.due_from(now),
            returned: false,
            returned_at: None,
        }
    }

    /// Whether the borrowing is still open.
    pub fn is_open(&self) -> bool {
        !self.returned
    }

    /// Whether the borrowing is open and past its due date at `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_at < now
    }

    /// Closed copy of this borrowing, returned at `now`.
    #[must_use]
    pub fn closed_at(&self, now: DateTime<Utc>) -> Self {
        Self {
            returned: true,
            returned_at: Some(now),
            ..self.clone()
        }
    }

    /// Derived status at `now`.
    pub fn status(&self, now: DateTime<Utc>) -> BorrowingStatus {
        if self.returned {
            BorrowingStatus::Returned
        } else if self.is_overdue(now) {
            BorrowingStatus::Overdue
        } else {
            BorrowingStatus::Active
        }
    }
}

/// Read-time status of a borrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    /// Open and not yet due.
    Active,
    /// Open past its due date.
    Overdue,
    /// Closed by a return.
    Returned,
}

/// Filter for a borrower's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorrowingFilter {
    /// Every borrowing.
    #[default]
    All,
    /// Open borrowings, overdue or not.
    Active,
    /// Closed borrowings only.
    Returned,
}

impl BorrowingFilter {
    /// Whether `borrowing` passes the filter.
    pub fn matches(self, borrowing: &Borrowing) -> bool {
        match self {
            Self::All => true,
            Self::Active => borrowing.is_open(),
            Self::Returned => borrowing.returned,
        }
    }
}

/// Error raised for unknown borrowing filter values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status must be one of active, returned (got {0})")]
pub struct UnknownBorrowingFilter(pub String);

impl FromStr for BorrowingFilter {
    type Err = UnknownBorrowingFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "returned" => Ok(Self::Returned),
            _ => Err(UnknownBorrowingFilter(s.to_owned())),
        }
    }
}
