//! Domain primitives and services.
//!
//! Purpose: define the reference snapshot model, the enhancement rule tables,
//! and the services orchestrating them. Adapters reach the domain only
//! through the traits in [`ports`].
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic error payload.
//! - `Scope`, `ReferenceSnapshot`, `ReferenceData`: cached reference model.
//! - `TargetMapping`: one extracted field with its confidence label.
//! - `ReferenceSnapshotBuilder`: background snapshot materialization.
//! - `EnhancementService`: the enhancement entrypoint.

pub mod enhancement_rules;
pub mod enhancement_service;
pub mod error;
pub mod ports;
pub mod reasoning_retry;
pub mod reference;
pub mod reference_filter;
pub mod snapshot_builder;
pub mod target_mapping;
mod trace_id;

pub use self::enhancement_rules::{EnhancementRuleEngine, GroundingTieBreak};
pub use self::enhancement_service::{
    EnhancementPorts, EnhancementRequest, EnhancementResult, EnhancementService,
    EnhancementStatus,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::reasoning_retry::{
    AttemptJitter, BackoffJitter, ReasoningRetryConfig, RetrySleeper, RetryingReasoningSource,
    TokioSleeper,
};
pub use self::reference::{
    ReferenceData, ReferenceRow, ReferenceSnapshot, ReferenceTable, Scope, ScopeFilter,
    ScopeValidationError, SnapshotTimestamp, SnapshotTimestampError, TableMetadata, TableSnapshot,
    column_text,
};
pub use self::reference_filter::{FilterValues, ReferenceFilterEngine};
pub use self::snapshot_builder::{
    ReferenceSnapshotBuilder, SnapshotBuildError, SnapshotBuildOutcome,
};
pub use self::target_mapping::{TargetConfidence, TargetField, TargetMapping};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use reference_enrichment::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::not_found("extraction missing"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
