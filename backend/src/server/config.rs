//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use backend::inbound::http::session_config::SessionSettings;
use backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) bcrypt_cost: u32,
}

impl ServerConfig {
    /// Construct a server configuration backed by the in-memory store.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, bcrypt_cost: u32) -> Self {
        Self {
            session,
            bind_addr,
            db_pool: None,
            bcrypt_cost,
        }
    }

    /// Attach a database connection pool so the Diesel adapters are used.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
