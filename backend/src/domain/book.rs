//! Book data model.
//!
//! A [`Book`] is registered by its owner and stays in the ledger until the
//! owner deletes it. Availability is only ever flipped by the lending
//! service alongside a borrowing transition.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 255;
/// Maximum author length in characters.
pub const AUTHOR_MAX: usize = 255;
/// Maximum ISBN length in characters.
pub const ISBN_MAX: usize = 32;

/// Validation errors returned by the book constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    /// Title was missing or blank.
    EmptyTitle,
    /// Title exceeded `max` characters.
    TitleTooLong { max: usize },
    /// Author was missing or blank.
    EmptyAuthor,
    /// Author exceeded `max` characters.
    AuthorTooLong { max: usize },
    /// ISBN exceeded `max` characters.
    IsbnTooLong { max: usize },
    /// Condition was not one of the known values.
    UnknownCondition(String),
}

impl BookValidationError {
    /// Name of the payload field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyAuthor | Self::AuthorTooLong { .. } => "author",
            Self::IsbnTooLong { .. } => "isbn",
            Self::UnknownCondition(_) => "condition",
        }
    }
}

impl fmt::Display for BookValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::EmptyAuthor => write!(f, "author must not be empty"),
            Self::AuthorTooLong { max } => write!(f, "author must be at most {max} characters"),
            Self::IsbnTooLong { max } => write!(f, "isbn must be at most {max} characters"),
            Self::UnknownCondition(raw) => {
                write!(f, "condition must be one of good, fair, poor (got {raw})")
            }
        }
    }
}

impl std::error::Error for BookValidationError {}

/// Stable book identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random [`BookId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Physical condition recorded by the owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookCondition {
    /// Default for new registrations.
    #[default]
    Good,
    /// Visible wear.
    Fair,
    /// Heavily worn or damaged.
    Poor,
}

impl BookCondition {
    /// Lower-case storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for BookCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookCondition {
    type Err = BookValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "fair" => Ok(Self::Fair),
            "poor" => Ok(Self::Poor),
            _ => Err(BookValidationError::UnknownCondition(s.to_owned())),
        }
    }
}

/// A book registered in the ledger.
///
/// ## Invariants
/// - `title` and `author` are non-empty once trimmed.
/// - `isbn` and `description`, when present, are non-empty.
/// - `is_available` is true iff the book has no open borrowing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Stable identifier.
    pub id: BookId,
    /// Trimmed title.
    pub title: String,
    /// Trimmed author.
    pub author: String,
    /// Optional ISBN, stored as given.
    pub isbn: Option<String>,
    /// Free-form notes from the owner.
    pub description: Option<String>,
    /// Physical condition.
    pub condition: BookCondition,
    /// False while a borrowing is open.
    pub is_available: bool,
    /// Registering user.
    pub owner_id: UserId,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Materialise a freshly registered, available book.
    pub fn register(
        id: BookId,
        owner_id: UserId,
        draft: BookDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        let BookDraft {
            title,
            author,
            isbn,
            description,
            condition,
        } = draft;
        Self {
            id,
            title,
            author,
            isbn,
            description,
            condition,
            is_available: true,
            owner_id,
            created_at,
        }
    }

    /// Whether `user` owns this book.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// Apply a validated patch; untouched fields keep their value.
    pub fn apply(&mut self, patch: BookPatch) {
        let BookPatch {
            title,
            author,
            isbn,
            description,
            condition,
        } = patch;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(author) = author {
            self.author = author;
        }
        if let Some(isbn) = isbn {
            self.isbn = isbn;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(condition) = condition {
            self.condition = condition;
        }
    }
}

/// Validated fields for registering a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    title: String,
    author: String,
    isbn: Option<String>,
    description: Option<String>,
    condition: BookCondition,
}

impl BookDraft {
    /// Validate registration input. Blank optional strings become absent.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{BookCondition, BookDraft};
    ///
    /// let draft = BookDraft::try_new("Dune", "Frank Herbert", Some("  "), None, None).unwrap();
    /// assert_eq!(draft.title(), "Dune");
    /// assert!(draft.isbn().is_none());
    /// assert_eq!(draft.condition(), BookCondition::Good);
    /// ```
    pub fn try_new(
        title: &str,
        author: &str,
        isbn: Option<&str>,
        description: Option<&str>,
        condition: Option<BookCondition>,
    ) -> Result<Self, BookValidationError> {
        Ok(Self {
            title: title_of(title)?,
            author: author_of(author)?,
            isbn: isbn.map(isbn_of).transpose()?.flatten(),
            description: description.and_then(optional),
            condition: condition.unwrap_or_default(),
        })
    }

    /// Trimmed title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Trimmed author.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// ISBN, absent when blank.
    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref()
    }

    /// Description, absent when blank.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Condition, `good` unless given.
    pub fn condition(&self) -> BookCondition {
        self.condition
    }
}

/// Validated partial update for a book.
///
/// For `isbn` and `description` the outer `Option` says whether the field is
/// touched and the inner one whether it is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    title: Option<String>,
    author: Option<String>,
    isbn: Option<Option<String>>,
    description: Option<Option<String>>,
    condition: Option<BookCondition>,
}

impl BookPatch {
    /// Validate update input. An empty `isbn` or `description` clears it.
    pub fn try_new(
        title: Option<&str>,
        author: Option<&str>,
        isbn: Option<&str>,
        description: Option<&str>,
        condition: Option<BookCondition>,
    ) -> Result<Self, BookValidationError> {
        Ok(Self {
            title: title.map(title_of).transpose()?,
            author: author.map(author_of).transpose()?,
            isbn: isbn.map(isbn_of).transpose()?,
            description: description.map(optional),
            condition,
        })
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn within(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

fn title_of(raw: &str) -> Result<String, BookValidationError> {
    match raw.trim() {
        "" => Err(BookValidationError::EmptyTitle),
        title if !within(title, TITLE_MAX) => {
            Err(BookValidationError::TitleTooLong { max: TITLE_MAX })
        }
        title => Ok(title.to_owned()),
    }
}

fn author_of(raw: &str) -> Result<String, BookValidationError> {
    match raw.trim() {
        "" => Err(BookValidationError::EmptyAuthor),
        author if !within(author, AUTHOR_MAX) => {
            Err(BookValidationError::AuthorTooLong { max: AUTHOR_MAX })
        }
        author => Ok(author.to_owned()),
    }
}

fn isbn_of(raw: &str) -> Result<Option<String>, BookValidationError> {
    match optional(raw) {
        Some(isbn) if !within(&isbn, ISBN_MAX) => {
            Err(BookValidationError::IsbnTooLong { max: ISBN_MAX })
        }
        isbn => Ok(isbn),
    }
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
