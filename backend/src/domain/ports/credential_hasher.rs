//! Driven port for one-way password hashing.

use async_trait::async_trait;

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential hashing adapters.
    pub enum CredentialHashError {
        /// Hashing or verification could not complete.
        Hashing { message: String } => "credential hashing failed: {message}",
    }
}

/// Hashes new passwords and verifies login attempts against stored hashes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Produce a salted hash for `password`.
    async fn hash(&self, password: &str) -> Result<PasswordHash, CredentialHashError>;

    /// Check `password` against `hash`.
    async fn verify(&self, password: &str, hash: &PasswordHash)
    -> Result<bool, CredentialHashError>;
}
