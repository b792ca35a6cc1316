//! Diesel table definitions mirroring `migrations/`.
//!
//! Kept in sync with the SQL by hand; regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    /// Registered accounts.
    ///
    /// `email` is stored lower-cased and is unique.
    users (id) {
        id -> Uuid,
        /// Human-readable display name (max 64 characters).
        display_name -> Varchar,
        email -> Varchar,
        /// bcrypt hash of the account password.
        password_hash -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Books registered by their owners.
    books (id) {
        id -> Uuid,
        title -> Varchar,
        author -> Varchar,
        isbn -> Nullable<Varchar>,
        description -> Nullable<Text>,
        /// One of `good`, `fair`, `poor`.
        condition -> Varchar,
        /// False exactly while an open borrowing exists.
        is_available -> Bool,
        owner_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Loans of books to users.
    ///
    /// A partial unique index on `book_id WHERE NOT returned` allows at most
    /// one open borrowing per book.
    borrowings (id) {
        id -> Uuid,
        book_id -> Uuid,
        borrower_id -> Uuid,
        borrowed_at -> Timestamptz,
        due_at -> Timestamptz,
        returned -> Bool,
        returned_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(books -> users (owner_id));
diesel::joinable!(borrowings -> books (book_id));
diesel::joinable!(borrowings -> users (borrower_id));

diesel::allow_tables_to_appear_in_same_query!(books, borrowings, users);
