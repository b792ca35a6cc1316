//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Emails are stored in their normalised lower-case form and guarded by a
//! unique index, so a duplicate registration surfaces as a unique violation
//! that this adapter reports as `DuplicateEmail`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{DisplayName, Email, PasswordHash, User, UserAccount, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn row_to_user(row: &UserRow) -> Result<User, UserPersistenceError> {
    let display_name = DisplayName::new(row.display_name.clone()).map_err(|err| {
        warn!(user_id = %row.id, error = %err, "stored display name failed validation");
        UserPersistenceError::query("stored user is invalid")
    })?;
    let email = Email::new(&row.email).map_err(|err| {
        warn!(user_id = %row.id, error = %err, "stored email failed validation");
        UserPersistenceError::query("stored user is invalid")
    })?;
    Ok(User::new(UserId::from_uuid(row.id), display_name, email))
}

fn row_to_account(row: UserRow) -> Result<UserAccount, UserPersistenceError> {
    let user = row_to_user(&row)?;
    let password_hash = PasswordHash::new(row.password_hash).map_err(|err| {
        warn!(user_id = %row.id, error = %err, "stored password hash failed validation");
        UserPersistenceError::query("stored user is invalid")
    })?;
    Ok(UserAccount {
        user,
        password_hash,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = &account.user;
        let new_row = NewUserRow {
            id: *user.id().as_uuid(),
            display_name: user.display_name().as_ref(),
            email: user.email().as_ref(),
            password_hash: account.password_hash.as_str(),
        };

        diesel::insert_into(users::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UserPersistenceError::duplicate_email(user.email().to_string())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(&uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.iter().map(row_to_user).collect()
    }

    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_account).transpose()
    }
}
