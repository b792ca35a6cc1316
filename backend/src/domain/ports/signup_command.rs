//! Driving port for account creation.

use async_trait::async_trait;

use crate::domain::{Error, SignupDetails, User};

/// Domain use-case port for signing up new members.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignupCommand: Send + Sync {
    /// Hash the password and store a new account.
    ///
    /// Fails with `Conflict` when the email is already registered.
    async fn sign_up(&self, details: &SignupDetails) -> Result<User, Error>;
}
