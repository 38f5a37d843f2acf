//! Shared helpers for HTTP handler tests.

use std::sync::Arc;

use chrono::TimeZone;
use chrono::Utc;

use crate::domain::ports::{
    FixtureExtractionScopeLookup, FixtureReasoningSource, FixtureReferenceQuery,
    ReferenceCache,
};
use crate::domain::{EnhancementPorts, EnhancementService, ReferenceSnapshotBuilder};
use crate::inbound::http::state::HttpState;
use crate::test_support::MutableClock;

/// State whose only meaningful dependency is `cache`.
pub fn state_with_cache(cache: impl ReferenceCache + 'static) -> HttpState {
    let cache: Arc<dyn ReferenceCache> = Arc::new(cache);
    let now = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid time");
    let enhancement = EnhancementService::new(EnhancementPorts {
        scope_lookup: Arc::new(FixtureExtractionScopeLookup),
        cache: Arc::clone(&cache),
        reasoning: Arc::new(FixtureReasoningSource),
    });
    let snapshots = ReferenceSnapshotBuilder::new(
        Arc::new(FixtureReferenceQuery),
        Arc::clone(&cache),
        Arc::new(MutableClock::new(now)),
    );
    HttpState::new(Arc::new(enhancement), Arc::new(snapshots), cache)
}
