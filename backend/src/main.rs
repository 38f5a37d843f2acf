//! Service entry-point: loads settings, builds pools, and serves the REST API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use reference_enrichment::inbound::http::health::HealthState;
use reference_enrichment::outbound::PoolConfig;
use reference_enrichment::outbound::cache::RedisPool;
use reference_enrichment::outbound::persistence::DbPool;
use reference_enrichment::settings::AppSettings;

use server::{ServerConfig, create_server};

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

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let config = build_server_config(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!("reference enrichment service listening");
    server.await
}

async fn build_server_config(settings: &AppSettings) -> std::io::Result<ServerConfig> {
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let mut config = ServerConfig::new(bind_addr, settings.snapshot_ttl());

    if let Some(url) = settings.database_url.as_deref() {
        let pool = DbPool::new(PoolConfig::postgres(url))
            .await
            .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
        config = config.with_db_pool(pool);
    }

    if let Some(url) = settings.redis_url.as_deref() {
        let pool = RedisPool::new(PoolConfig::redis(url))
            .await
            .map_err(|e| std::io::Error::other(format!("redis pool: {e}")))?;
        config = config.with_redis_pool(pool);
    }

    if let Some(reasoning) = settings.reasoning_config().map_err(std::io::Error::other)? {
        config = config.with_reasoning(reasoning, settings.reasoning_retry());
    }

    Ok(config)
}
