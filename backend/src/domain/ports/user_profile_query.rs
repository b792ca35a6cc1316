//! Driving port for user profile queries.
//!
//! Inbound adapters use this port to load the caller's profile without
//! importing persistence details.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId};

/// Domain use-case port for reading the current user's profile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileQuery: Send + Sync {
    /// Return the profile for the authenticated user.
    ///
    /// A session pointing at a user that no longer exists yields
    /// `Unauthorized`.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error>;
}
