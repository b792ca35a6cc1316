//! Server settings loaded via OrthoConfig.
//!
//! Values come from `LENDING_*` environment variables, an optional config
//! file, or command-line flags. Unset values fall back to the defaults below.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_BCRYPT_COST: u32 = 12;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The bind address is not a socket address.
    #[error("invalid bind address {value}: {source}")]
    BindAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Top-level configuration for the lending server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LENDING")]
pub struct ServerSettings {
    /// Socket address to listen on.
    #[ortho_config(default = DEFAULT_BIND_ADDRESS.to_owned())]
    pub bind_address: String,
    /// PostgreSQL URL. Without one the in-memory store is used.
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections.
    pub pool_max_size: Option<u32>,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: Option<u32>,
}

impl ServerSettings {
    /// Parsed bind address; `0.0.0.0:8080` unless configured.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_address.trim();
        value.parse().map_err(|source| SettingsError::BindAddress {
            value: value.to_owned(),
            source,
        })
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool size, defaulting to ten connections.
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// bcrypt cost, defaulting to 12.
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST)
    }
}
