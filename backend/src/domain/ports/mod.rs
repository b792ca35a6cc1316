//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`LendingCommand`, `LendingQuery`, `LoginService`,
//! `SignupCommand`, `UserProfileQuery`) are called by inbound adapters.
//! Driven ports (`LedgerRepository`, `UserRepository`, `CredentialHasher`)
//! are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_hasher;
mod ledger_repository;
mod lending_command;
mod lending_query;
mod login_service;
mod signup_command;
mod user_profile_query;
mod user_repository;

#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHashError, CredentialHasher};
#[cfg(test)]
pub use ledger_repository::MockLedgerRepository;
pub use ledger_repository::{LedgerPersistenceError, LedgerRepository};
#[cfg(test)]
pub use lending_command::MockLendingCommand;
pub use lending_command::LendingCommand;
#[cfg(test)]
pub use lending_query::MockLendingQuery;
pub use lending_query::LendingQuery;
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use signup_command::MockSignupCommand;
pub use signup_command::SignupCommand;
#[cfg(test)]
pub use user_profile_query::MockUserProfileQuery;
pub use user_profile_query::UserProfileQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
