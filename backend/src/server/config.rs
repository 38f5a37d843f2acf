//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use reference_enrichment::domain::ReasoningRetryConfig;
use reference_enrichment::outbound::cache::RedisPool;
use reference_enrichment::outbound::persistence::DbPool;
use reference_enrichment::outbound::reasoning::AzureReasoningConfig;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) redis_pool: Option<RedisPool>,
    pub(crate) reasoning: Option<AzureReasoningConfig>,
    pub(crate) reasoning_retry: ReasoningRetryConfig,
    pub(crate) snapshot_ttl: Duration,
}

impl ServerConfig {
    /// Construct a configuration with fixture and in-memory adapters only.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, snapshot_ttl: Duration) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            redis_pool: None,
            reasoning: None,
            reasoning_retry: ReasoningRetryConfig::default(),
            snapshot_ttl,
        }
    }

    /// Attach a database connection pool for the relational adapters.
    ///
    /// When absent, scope lookups report every extraction as unknown and
    /// snapshot builds read empty tables.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Attach a Redis pool; without one snapshots are kept in process.
    #[must_use]
    pub fn with_redis_pool(mut self, pool: RedisPool) -> Self {
        self.redis_pool = Some(pool);
        self
    }

    /// Call Azure OpenAI for free-text fields, retrying per `retry`.
    #[must_use]
    pub fn with_reasoning(mut self, config: AzureReasoningConfig, retry: ReasoningRetryConfig) -> Self {
        self.reasoning = Some(config);
        self.reasoning_retry = retry;
        self
    }
}
