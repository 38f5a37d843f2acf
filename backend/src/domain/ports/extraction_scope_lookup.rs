//! Port resolving an extraction to its reference scope.

use async_trait::async_trait;
use uuid::Uuid;

use super::define_port_error;
use crate::domain::Scope;

define_port_error! {
    /// Errors raised while resolving an extraction's scope.
    pub enum ExtractionScopeLookupError {
        /// No extraction exists with the given id.
        NotFound { extraction_id: Uuid } =>
            "extraction {extraction_id} not found",
        /// The extraction exists but has no complete scope yet.
        Incomplete { extraction_id: Uuid } =>
            "extraction {extraction_id} has no complete scope",
        /// A pooled connection could not be obtained.
        Connection { message: String } =>
            "extraction store connection failed: {message}",
        /// The lookup query failed.
        Query { message: String } =>
            "extraction scope query failed: {message}",
    }
}

/// Resolves `(cluster, customer, material_type)` for an extraction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionScopeLookup: Send + Sync {
    async fn scope_for(&self, extraction_id: Uuid) -> Result<Scope, ExtractionScopeLookupError>;
}

/// Fixture that knows no extractions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureExtractionScopeLookup;

#[async_trait]
impl ExtractionScopeLookup for FixtureExtractionScopeLookup {
    async fn scope_for(&self, extraction_id: Uuid) -> Result<Scope, ExtractionScopeLookupError> {
        Err(ExtractionScopeLookupError::not_found(extraction_id))
    }
}
