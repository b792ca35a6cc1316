//! Builders wiring repositories and services into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use backend::domain::ports::{CredentialHasher, LedgerRepository, UserRepository};
use backend::domain::{AccountService, LendingService};
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::outbound::hashing::BcryptHasher;
use backend::outbound::memory::InMemoryStore;
use backend::outbound::persistence::{DieselLedgerRepository, DieselUserRepository};

use super::ServerConfig;

/// Assemble the port bundle from one user repository, one ledger repository,
/// a hasher and a clock.
///
/// A single [`LendingService`] serves both the command and query ports, and a
/// single [`AccountService`] serves login, signup and profile.
pub(crate) fn build_ports<U, L, H>(
    users: Arc<U>,
    ledger: Arc<L>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
) -> HttpStatePorts
where
    U: UserRepository + 'static,
    L: LedgerRepository + 'static,
    H: CredentialHasher + 'static,
{
    let accounts = Arc::new(AccountService::new(Arc::clone(&users), hasher));
    let lending = Arc::new(LendingService::new(ledger, users, clock));

    HttpStatePorts {
        login: accounts.clone(),
        signup: accounts.clone(),
        profile: accounts,
        lending: lending.clone(),
        lending_query: lending,
    }
}

/// Build the shared HTTP state, choosing Diesel adapters when a pool is
/// configured and the in-memory store otherwise.
pub(crate) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let hasher = Arc::new(BcryptHasher::new(config.bcrypt_cost));
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let ports = match &config.db_pool {
        Some(pool) => build_ports(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselLedgerRepository::new(pool.clone())),
            hasher,
            clock,
        ),
        None => {
            let store = Arc::new(InMemoryStore::new());
            build_ports(Arc::clone(&store), store, hasher, clock)
        }
    };

    web::Data::new(HttpState::new(ports))
}
