//! Account domain service.
//!
//! Implements signup, login and profile lookup on top of the user repository
//! and a credential hasher.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::lending_service::map_user_error;
use crate::domain::ports::{
    CredentialHashError, CredentialHasher, LoginService, SignupCommand, UserProfileQuery,
    UserRepository,
};
use crate::domain::{Error, LoginCredentials, SignupDetails, User, UserAccount, UserId};

const INVALID_CREDENTIALS: &str = "invalid credentials";

fn map_hash_error(error: CredentialHashError) -> Error {
    Error::internal(error.to_string())
}

/// Account service implementing the login, signup and profile ports.
#[derive(Clone)]
pub struct AccountService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
}

impl<U, H> AccountService<U, H> {
    /// Create a new account service.
    pub fn new(users: Arc<U>, hasher: Arc<H>) -> Self {
        Self { users, hasher }
    }
}

#[async_trait]
impl<U, H> LoginService for AccountService<U, H>
where
    U: UserRepository,
    H: CredentialHasher,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let Some(account) = self
            .users
            .find_account_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            debug!("login rejected: unknown email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !matches {
            debug!(user_id = %account.user.id(), "login rejected: wrong password");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        info!(user_id = %account.user.id(), "user logged in");
        Ok(account.user.id().clone())
    }
}

#[async_trait]
impl<U, H> SignupCommand for AccountService<U, H>
where
    U: UserRepository,
    H: CredentialHasher,
{
    async fn sign_up(&self, details: &SignupDetails) -> Result<User, Error> {
        let password_hash = self
            .hasher
            .hash(details.password())
            .await
            .map_err(map_hash_error)?;
        let user = User::new(
            UserId::random(),
            details.display_name().clone(),
            details.email().clone(),
        );
        let account = UserAccount {
            user,
            password_hash,
        };
        self.users
            .insert(&account)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %account.user.id(), "user signed up");
        Ok(account.user)
    }
}

#[async_trait]
impl<U, H> UserProfileQuery for AccountService<U, H>
where
    U: UserRepository,
    H: CredentialHasher,
{
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}
