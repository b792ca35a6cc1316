//! Backend entry-point: loads configuration, picks the storage backend and
//! serves the REST API.

mod server;

use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{ServerConfig, ServerSettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;

    let session =
        session_settings_from_env(&mockable::DefaultEnv::new(), BuildMode::from_debug_assertions())
            .map_err(std::io::Error::other)?;

    let mut config = ServerConfig::new(session, bind_addr, settings.bcrypt_cost());
    match settings.database_url() {
        Some(url) => {
            let migration_url = url.to_owned();
            tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
                .await
                .map_err(std::io::Error::other)?
                .map_err(std::io::Error::other)?;
            let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.pool_max_size()))
                .await
                .map_err(std::io::Error::other)?;
            info!(pool_max_size = settings.pool_max_size(), "using PostgreSQL store");
            config = config.with_db_pool(pool);
        }
        None => {
            warn!("no database configured; using the in-memory store, data is lost on restart");
        }
    }

    info!(%bind_addr, "starting lending server");
    create_server(config)?.await
}
