//! In-memory adapters for database-less development and integration tests.
//!
//! State is process local and lost on restart.

mod store;

pub use store::InMemoryStore;
