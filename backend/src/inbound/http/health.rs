//! Health endpoints: liveness & readiness probes for orchestration and load balancers.
//! Document endpoints in OpenAPI via Utoipa.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use tracing::warn;

use crate::inbound::http::state::HttpState;

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark startup as complete.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe. Return 200 once startup finished and the reference cache
/// answers a ping; return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is starting or the cache is unreachable")
    )
)]
#[get("/health/ready")]
pub async fn ready(health: web::Data<HealthState>, state: web::Data<HttpState>) -> HttpResponse {
    if !health.is_ready() {
        return HealthState::probe_response(false);
    }
    let cache_ok = match state.cache.ping().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "readiness probe: reference cache ping failed");
            false
        }
    };
    HealthState::probe_response(cache_ok)
}

/// Liveness probe. Return 200 while the process is healthy.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(health: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(health.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockReferenceCache, ReferenceCacheError};
    use crate::inbound::http::test_utils::state_with_cache;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;

    async fn probe(health: HealthState, cache: MockReferenceCache, uri: &str) -> StatusCode {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(health))
                .app_data(web::Data::new(state_with_cache(cache)))
                .service(ready)
                .service(live),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        res.status()
    }

    fn healthy_cache() -> MockReferenceCache {
        let mut cache = MockReferenceCache::new();
        cache.expect_ping().returning(|| Ok(()));
        cache
    }

    fn started() -> HealthState {
        let health = HealthState::new();
        health.mark_ready();
        health
    }

    #[rstest]
    #[actix_web::test]
    async fn ready_once_started_with_live_cache() {
        assert_eq!(probe(started(), healthy_cache(), "/health/ready").await, StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn not_ready_before_startup_completes() {
        let mut cache = MockReferenceCache::new();
        cache.expect_ping().never();
        assert_eq!(
            probe(HealthState::new(), cache, "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn not_ready_when_cache_is_down() {
        let mut cache = MockReferenceCache::new();
        cache
            .expect_ping()
            .returning(|| Err(ReferenceCacheError::unavailable("connection refused")));
        assert_eq!(
            probe(started(), cache, "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn live_fails_after_mark_unhealthy() {
        let health = started();
        health.mark_unhealthy();
        assert_eq!(
            probe(health, MockReferenceCache::new(), "/health/live").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
