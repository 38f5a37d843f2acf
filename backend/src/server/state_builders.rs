//! Builders wiring ports to adapters for the HTTP state.
//!
//! Each port uses its real adapter when the backing pool or settings are
//! present and a fixture otherwise.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use reference_enrichment::domain::ports::{
    ExtractionScopeLookup, FixtureExtractionScopeLookup, FixtureReasoningSource,
    FixtureReferenceQuery, ReasoningSource, ReferenceCache, ReferenceQuery,
};
use reference_enrichment::domain::{
    EnhancementPorts, EnhancementService, ReferenceSnapshotBuilder, RetryingReasoningSource,
};
use reference_enrichment::inbound::http::state::HttpState;
use reference_enrichment::outbound::cache::{InMemoryReferenceCache, RedisReferenceCache};
use reference_enrichment::outbound::persistence::{
    DieselExtractionScopeLookup, DieselReferenceQuery,
};
use reference_enrichment::outbound::reasoning::AzureReasoningSource;

use super::ServerConfig;

fn build_cache(config: &ServerConfig, clock: &Arc<dyn Clock>) -> Arc<dyn ReferenceCache> {
    match &config.redis_pool {
        Some(pool) => Arc::new(RedisReferenceCache::new(pool.clone(), config.snapshot_ttl)),
        None => {
            info!("no Redis pool configured; keeping reference snapshots in memory");
            Arc::new(InMemoryReferenceCache::new(
                Arc::clone(clock),
                config.snapshot_ttl,
            ))
        }
    }
}

fn build_relational_ports(
    config: &ServerConfig,
) -> (Arc<dyn ExtractionScopeLookup>, Arc<dyn ReferenceQuery>) {
    match &config.db_pool {
        Some(pool) => (
            Arc::new(DieselExtractionScopeLookup::new(pool.clone())),
            Arc::new(DieselReferenceQuery::new(pool.clone())),
        ),
        None => {
            warn!("no database pool configured; using fixture extraction and reference ports");
            (
                Arc::new(FixtureExtractionScopeLookup),
                Arc::new(FixtureReferenceQuery),
            )
        }
    }
}

fn build_reasoning(
    config: ServerConfig,
    clock: &Arc<dyn Clock>,
) -> std::io::Result<Arc<dyn ReasoningSource>> {
    let ServerConfig {
        reasoning,
        reasoning_retry,
        ..
    } = config;
    let Some(reasoning) = reasoning else {
        warn!("reasoning service not configured; free-text fields are echoed unchanged");
        return Ok(Arc::new(FixtureReasoningSource));
    };
    let source = AzureReasoningSource::new(reasoning)
        .map_err(|err| std::io::Error::other(format!("reasoning client setup failed: {err}")))?;
    Ok(Arc::new(RetryingReasoningSource::new(
        Arc::new(source),
        Arc::clone(clock),
        reasoning_retry,
    )))
}

/// Build the handler state from the server configuration.
///
/// # Errors
/// Returns [`std::io::Error`] when the reasoning HTTP client cannot be built.
pub(super) fn build_http_state(config: ServerConfig) -> std::io::Result<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let cache = build_cache(&config, &clock);
    let (scope_lookup, reference_query) = build_relational_ports(&config);
    let reasoning = build_reasoning(config, &clock)?;

    let enhancement = EnhancementService::new(EnhancementPorts {
        scope_lookup,
        cache: Arc::clone(&cache),
        reasoning,
    });
    let snapshots = ReferenceSnapshotBuilder::new(reference_query, Arc::clone(&cache), clock);
    Ok(HttpState::new(
        Arc::new(enhancement),
        Arc::new(snapshots),
        cache,
    ))
}
