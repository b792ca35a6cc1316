//! bcrypt-backed `CredentialHasher`.
//!
//! bcrypt is deliberately slow, so both operations run on tokio's blocking
//! pool instead of stalling the actix worker thread.

use async_trait::async_trait;
use tokio::task;
use zeroize::Zeroizing;

use crate::domain::PasswordHash;
use crate::domain::ports::{CredentialHashError, CredentialHasher};

/// Hashes passwords with bcrypt at a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Work factor used when none is configured.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hasher with `cost`, clamped to bcrypt's accepted range.
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    /// Configured work factor.
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COST)
    }
}

fn join_error(err: task::JoinError) -> CredentialHashError {
    CredentialHashError::hashing(format!("hashing task failed: {err}"))
}

#[async_trait]
impl CredentialHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, CredentialHashError> {
        let password = Zeroizing::new(password.to_owned());
        let cost = self.cost;
        let encoded = task::spawn_blocking(move || bcrypt::hash(password.as_bytes(), cost))
            .await
            .map_err(join_error)?
            .map_err(|err| CredentialHashError::hashing(err.to_string()))?;
        PasswordHash::new(encoded).map_err(|err| CredentialHashError::hashing(err.to_string()))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, CredentialHashError> {
        let password = Zeroizing::new(password.to_owned());
        let encoded = hash.as_str().to_owned();
        let outcome = task::spawn_blocking(move || bcrypt::verify(password.as_bytes(), &encoded))
            .await
            .map_err(join_error)?;
        match outcome {
            Ok(matches) => Ok(matches),
            // Malformed stored hashes never match.
            Err(bcrypt::BcryptError::InvalidHash(_)) => Ok(false),
            Err(err) => Err(CredentialHashError::hashing(err.to_string())),
        }
    }
}
