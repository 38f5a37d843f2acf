//! Enhancement HTTP handler.
//!
//! ```text
//! POST /api/v1/extractions/{id}/enhance
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EnhancementResult, Error, TargetMapping};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_extraction_id;

/// Request payload carrying the extracted mappings.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct EnhanceRequestBody {
    pub target_mappings: Vec<TargetMapping>,
}

/// Enhance the mappings of a stored extraction.
///
/// Always answers with the envelope once the extraction exists; degraded
/// dependencies show up in `status`, `error`, and `snapshot_key`.
#[utoipa::path(
    post,
    path = "/api/v1/extractions/{id}/enhance",
    params(("id" = String, Path, format = "uuid", description = "Extraction identifier")),
    request_body = EnhanceRequestBody,
    responses(
        (status = 200, description = "Enhancement envelope", body = EnhancementResult),
        (status = 400, description = "Malformed identifier or body", body = Error),
        (status = 404, description = "Unknown extraction", body = Error)
    ),
    tags = ["enhancement"],
    operation_id = "enhanceExtraction"
)]
#[post("/extractions/{id}/enhance")]
pub async fn enhance_extraction(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<EnhanceRequestBody>,
) -> ApiResult<web::Json<EnhancementResult>> {
    let extraction_id = parse_extraction_id(&path.into_inner())?;
    let EnhanceRequestBody { target_mappings } = payload.into_inner();
    let result = state
        .enhancement
        .enhance_extraction(extraction_id, target_mappings)
        .await?;
    Ok(web::Json(result))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{
        ExtractionScopeLookupError, FixtureReasoningSource, FixtureReferenceQuery,
        MockExtractionScopeLookup, MockReferenceCache, ReferenceCacheError,
    };
    use crate::domain::{EnhancementPorts, EnhancementService, ReferenceSnapshotBuilder, Scope};
    use crate::inbound::http::error::json_error_handler;
    use crate::test_support::{MutableClock, fixture_instant};

    fn state(lookup: MockExtractionScopeLookup) -> HttpState {
        let mut cache = MockReferenceCache::new();
        cache
            .expect_find_latest_snapshot_key()
            .returning(|_| Err(ReferenceCacheError::unavailable("redis down")));
        let cache: Arc<MockReferenceCache> = Arc::new(cache);
        let enhancement = EnhancementService::new(EnhancementPorts {
            scope_lookup: Arc::new(lookup),
            cache: cache.clone(),
            reasoning: Arc::new(FixtureReasoningSource),
        });
        let snapshots = ReferenceSnapshotBuilder::new(
            Arc::new(FixtureReferenceQuery),
            cache.clone(),
            Arc::new(MutableClock::new(fixture_instant())),
        );
        HttpState::new(Arc::new(enhancement), Arc::new(snapshots), cache)
    }

    fn known_extraction() -> MockExtractionScopeLookup {
        let mut lookup = MockExtractionScopeLookup::new();
        lookup
            .expect_scope_for()
            .returning(|_| Ok(Scope::new("Knits", "Acme", "Fabric").expect("scope")));
        lookup
    }

    async fn call(lookup: MockExtractionScopeLookup, uri: &str, body: Value) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(lookup)))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .service(web::scope("/api/v1").service(enhance_extraction)),
        )
        .await;
        let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
        let res = test::call_service(&app, req).await;
        let status = res.status();
        let body: Value = test::read_body_json(res).await;
        (status, body)
    }

    const URI: &str = "/api/v1/extractions/00000000-0000-0000-0000-000000000001/enhance";

    #[rstest]
    #[actix_web::test]
    async fn returns_envelope_when_cache_is_down() {
        let (status, body) = call(
            known_extraction(),
            URI,
            json!({ "target_mappings": [
                { "target_field": "UOM", "target_value": "yds", "target_confidence": "original" },
                { "target_field": "Supplier", "target_value": "Acme Textiles" }
            ]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["snapshot_key"], Value::Null);
        assert_eq!(body["enhanced_mappings"][0]["target_value"], "Yards");
        assert_eq!(body["enhanced_mappings"][0]["target_confidence"], "enhanced");
        assert_eq!(body["enhanced_mappings"][1]["target_value"], "Acme Textiles");
        assert_eq!(body["enhanced_mappings"][1]["target_confidence"], "original");
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_extraction_is_404() {
        let mut lookup = MockExtractionScopeLookup::new();
        lookup
            .expect_scope_for()
            .returning(|id| Err(ExtractionScopeLookupError::not_found(id)));

        let (status, body) = call(lookup, URI, json!({ "target_mappings": [] })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_body_is_400() {
        let mut lookup = MockExtractionScopeLookup::new();
        lookup.expect_scope_for().never();

        let (status, body) = call(lookup, URI, json!({ "mappings": "nope" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_id_is_400() {
        let mut lookup = MockExtractionScopeLookup::new();
        lookup.expect_scope_for().never();

        let (status, body) = call(
            lookup,
            "/api/v1/extractions/42/enhance",
            json!({ "target_mappings": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["code"], "invalid_uuid");
    }
}
