//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod extraction_scope_lookup;
mod reasoning_source;
mod reference_cache;
mod reference_query;
mod snapshot_key;

#[cfg(test)]
pub use extraction_scope_lookup::MockExtractionScopeLookup;
pub use extraction_scope_lookup::{
    ExtractionScopeLookup, ExtractionScopeLookupError, FixtureExtractionScopeLookup,
};
#[cfg(test)]
pub use reasoning_source::MockReasoningSource;
pub use reasoning_source::{
    FixtureReasoningSource, ReasoningRequest, ReasoningResponse, ReasoningSource,
    ReasoningSourceError,
};
#[cfg(test)]
pub use reference_cache::MockReferenceCache;
pub use reference_cache::{ReferenceCache, ReferenceCacheError, SnapshotRead};
#[cfg(test)]
pub use reference_query::MockReferenceQuery;
pub use reference_query::{FixtureReferenceQuery, ReferenceQuery, ReferenceQueryError};
pub use snapshot_key::SnapshotKey;
