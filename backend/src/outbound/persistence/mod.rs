//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the user and ledger repository ports backed
//! by PostgreSQL, with async support through `diesel-async` and `bb8`
//! connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Lending rules live in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Conditional writes**: lending transitions update rows only while they
//!   are still in the expected state, so concurrent requests surface as
//!   `Conflict` instead of double loans.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselLedgerRepository, PoolConfig};
//!
//! run_pending_migrations("postgres://localhost/lending")?;
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/lending")).await?;
//! let ledger = DieselLedgerRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_ledger_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_ledger_repository::DieselLedgerRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
