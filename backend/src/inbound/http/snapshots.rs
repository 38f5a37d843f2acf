//! Reference snapshot trigger handler.
//!
//! ```text
//! POST /api/v1/extractions/{id}/reference-snapshot
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Scope};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_extraction_id;

/// Whether a new background build was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotBuildState {
    Scheduled,
    /// A build for the same scope is still running.
    AlreadyRunning,
}

/// Response payload for an accepted snapshot request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SnapshotAcceptedBody {
    pub scope: Scope,
    pub build: SnapshotBuildState,
}

/// Schedule a reference snapshot build for an extraction's scope.
#[utoipa::path(
    post,
    path = "/api/v1/extractions/{id}/reference-snapshot",
    params(("id" = String, Path, format = "uuid", description = "Extraction identifier")),
    responses(
        (status = 202, description = "Build accepted", body = SnapshotAcceptedBody),
        (status = 400, description = "Malformed identifier or incomplete scope", body = Error),
        (status = 404, description = "Unknown extraction", body = Error),
        (status = 503, description = "Extraction store unavailable", body = Error)
    ),
    tags = ["snapshots"],
    operation_id = "scheduleReferenceSnapshot"
)]
#[post("/extractions/{id}/reference-snapshot")]
pub async fn schedule_reference_snapshot(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let extraction_id = parse_extraction_id(&path.into_inner())?;
    let scope = state.enhancement.resolve_scope(extraction_id).await?;
    let build = match state.snapshots.spawn_build(scope.clone()) {
        Some(_) => SnapshotBuildState::Scheduled,
        None => SnapshotBuildState::AlreadyRunning,
    };
    Ok(HttpResponse::Accepted().json(SnapshotAcceptedBody { scope, build }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::ports::{
        ExtractionScopeLookupError, FixtureReasoningSource, FixtureReferenceQuery,
        MockExtractionScopeLookup, ReferenceCache,
    };
    use crate::domain::{EnhancementPorts, EnhancementService, ReferenceSnapshotBuilder};
    use crate::outbound::cache::InMemoryReferenceCache;
    use crate::test_support::{MutableClock, fixture_instant, knits_scope};

    fn state(lookup: MockExtractionScopeLookup) -> (HttpState, Arc<dyn ReferenceCache>) {
        let clock = Arc::new(MutableClock::new(fixture_instant()));
        let cache: Arc<dyn ReferenceCache> = Arc::new(InMemoryReferenceCache::new(
            clock.clone(),
            std::time::Duration::from_secs(86_400),
        ));
        let enhancement = EnhancementService::new(EnhancementPorts {
            scope_lookup: Arc::new(lookup),
            cache: Arc::clone(&cache),
            reasoning: Arc::new(FixtureReasoningSource),
        });
        let snapshots =
            ReferenceSnapshotBuilder::new(Arc::new(FixtureReferenceQuery), Arc::clone(&cache), clock);
        (
            HttpState::new(Arc::new(enhancement), Arc::new(snapshots), Arc::clone(&cache)),
            cache,
        )
    }

    async fn call(state: HttpState) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").service(schedule_reference_snapshot)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/v1/extractions/00000000-0000-0000-0000-000000000001/reference-snapshot")
            .to_request();
        let res = test::call_service(&app, req).await;
        let status = res.status();
        let body: Value = test::read_body_json(res).await;
        (status, body)
    }

    #[rstest]
    #[actix_web::test]
    async fn accepts_and_builds_in_background() {
        let mut lookup = MockExtractionScopeLookup::new();
        lookup.expect_scope_for().returning(|_| Ok(knits_scope()));
        let (state, cache) = state(lookup);

        let (status, body) = call(state).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["build"], "scheduled");
        assert_eq!(body["scope"]["customer"], "Acme");

        let mut found = None;
        for _ in 0..50 {
            found = cache
                .find_latest_snapshot_key(&knits_scope())
                .await
                .expect("scan");
            if found.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(found.is_some(), "background build should write a snapshot");
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_extraction_is_404() {
        let mut lookup = MockExtractionScopeLookup::new();
        lookup
            .expect_scope_for()
            .returning(|id| Err(ExtractionScopeLookupError::not_found(id)));
        let (state, _) = state(lookup);

        let (status, body) = call(state).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }
}
