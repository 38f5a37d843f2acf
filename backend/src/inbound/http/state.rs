//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::ReferenceCache;
use crate::domain::{EnhancementService, ReferenceSnapshotBuilder};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub enhancement: Arc<EnhancementService>,
    pub snapshots: Arc<ReferenceSnapshotBuilder>,
    /// Probed by the readiness endpoint.
    pub cache: Arc<dyn ReferenceCache>,
}

impl HttpState {
    pub fn new(
        enhancement: Arc<EnhancementService>,
        snapshots: Arc<ReferenceSnapshotBuilder>,
        cache: Arc<dyn ReferenceCache>,
    ) -> Self {
        Self {
            enhancement,
            snapshots,
            cache,
        }
    }
}
