//! Embedded schema migrations.
//!
//! Migrations run over a short-lived synchronous connection at start-up; the
//! async pool is only built afterwards.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations from the `backend/migrations` directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The database could not be reached.
    #[error("failed to connect for migrations: {0}")]
    Connect(#[from] diesel::ConnectionError),
    /// A migration failed to apply.
    #[error("failed to run migrations: {0}")]
    Apply(String),
}

/// Apply every pending migration to the database at `database_url`.
///
/// Blocking; call it from `spawn_blocking` inside an async runtime.
///
/// # Errors
///
/// Returns [`MigrationError`] when connecting or applying a migration fails.
pub fn run_pending_migrations(database_url: &str) -> Result<(), MigrationError> {
    let mut conn = PgConnection::establish(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply(err.to_string()))?;
    for version in &applied {
        info!(%version, "applied migration");
    }
    Ok(())
}
