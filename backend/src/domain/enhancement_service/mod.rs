//! Enhancement entrypoint.
//!
//! Resolves the request scope, loads the latest cached snapshot, narrows it to
//! the request, applies deterministic rules, and delegates free-text fields to
//! the reasoning port. Infrastructure failures degrade the result instead of
//! failing it: an unreachable cache means ungrounded rules, and a failed
//! reasoning call returns the original mappings with an error status.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ports::{
    ExtractionScopeLookup, ExtractionScopeLookupError, ReasoningRequest, ReasoningSource,
    ReferenceCache, SnapshotKey, SnapshotRead,
};
use super::{
    EnhancementRuleEngine, Error, FilterValues, ReferenceData, ReferenceFilterEngine, Scope,
    TargetConfidence, TargetMapping,
};

/// Mappings to enhance for a caller-supplied scope.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementRequest {
    pub scope: Scope,
    pub mappings: Vec<TargetMapping>,
}

/// Overall outcome of an enhancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementStatus {
    Ok,
    /// The reasoning call failed; `enhanced_mappings` are the originals.
    Error,
}

/// Envelope returned for every enhancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnhancementResult {
    pub original_mappings: Vec<TargetMapping>,
    pub filtered_reference_data: ReferenceData,
    pub enhanced_mappings: Vec<TargetMapping>,
    pub status: EnhancementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Master key of the snapshot used, if any.
    #[serde(default)]
    pub snapshot_key: Option<String>,
}

/// Port bundle required by [`EnhancementService`].
pub struct EnhancementPorts {
    pub scope_lookup: Arc<dyn ExtractionScopeLookup>,
    pub cache: Arc<dyn ReferenceCache>,
    pub reasoning: Arc<dyn ReasoningSource>,
}

/// Domain service producing enhancement envelopes.
pub struct EnhancementService {
    scope_lookup: Arc<dyn ExtractionScopeLookup>,
    cache: Arc<dyn ReferenceCache>,
    reasoning: Arc<dyn ReasoningSource>,
    rules: EnhancementRuleEngine,
    filter: ReferenceFilterEngine,
}

impl EnhancementService {
    pub fn new(ports: EnhancementPorts) -> Self {
        Self::with_rules(ports, EnhancementRuleEngine::default())
    }

    /// Build a service with a custom rule engine (for example another tie-break).
    pub fn with_rules(ports: EnhancementPorts, rules: EnhancementRuleEngine) -> Self {
        Self {
            scope_lookup: ports.scope_lookup,
            cache: ports.cache,
            reasoning: ports.reasoning,
            rules,
            filter: ReferenceFilterEngine,
        }
    }

    /// Enhance mappings for a stored extraction.
    ///
    /// Returns `Err` only when the extraction does not exist. Any other lookup
    /// failure falls back to ungrounded enhancement.
    pub async fn enhance_extraction(
        &self,
        extraction_id: Uuid,
        mappings: Vec<TargetMapping>,
    ) -> Result<EnhancementResult, Error> {
        let scope = match self.scope_lookup.scope_for(extraction_id).await {
            Ok(scope) => Some(scope),
            Err(err @ ExtractionScopeLookupError::NotFound { .. }) => {
                return Err(Error::not_found(err.to_string()));
            }
            Err(err) => {
                warn!(%extraction_id, error = %err, "scope lookup failed; enhancing without reference data");
                None
            }
        };
        Ok(self.run(scope.as_ref(), mappings).await)
    }

    /// Enhance mappings for an explicit scope.
    pub async fn enhance(&self, request: EnhancementRequest) -> EnhancementResult {
        self.run(Some(&request.scope), request.mappings).await
    }

    /// Resolve the scope of an extraction, mapping lookup failures to domain
    /// errors.
    pub async fn resolve_scope(&self, extraction_id: Uuid) -> Result<Scope, Error> {
        self.scope_lookup
            .scope_for(extraction_id)
            .await
            .map_err(|err| match err {
                ExtractionScopeLookupError::NotFound { .. } => Error::not_found(err.to_string()),
                ExtractionScopeLookupError::Incomplete { .. } => {
                    Error::invalid_request(err.to_string())
                }
                ExtractionScopeLookupError::Connection { .. }
                | ExtractionScopeLookupError::Query { .. } => {
                    Error::service_unavailable(err.to_string())
                }
            })
    }

    async fn run(&self, scope: Option<&Scope>, mappings: Vec<TargetMapping>) -> EnhancementResult {
        let snapshot = match scope {
            Some(scope) => self.load_snapshot(scope).await,
            None => None,
        };
        let snapshot_key = snapshot.as_ref().map(|read| read.key.master_key());
        let data = snapshot
            .map(|read| read.snapshot.reference_data())
            .unwrap_or_default();

        let filtered = self.filter.filter(&data, &FilterValues::from_mappings(&mappings));
        let ruled = self.rules.apply(&mappings, &filtered);

        let unresolved_fields: Vec<String> = ruled
            .iter()
            .filter(|mapping| mapping.target_field.is_free_text())
            .map(|mapping| mapping.target_field.to_string())
            .collect();

        if unresolved_fields.is_empty() {
            return EnhancementResult {
                original_mappings: mappings,
                filtered_reference_data: filtered,
                enhanced_mappings: ruled,
                status: EnhancementStatus::Ok,
                error: None,
                snapshot_key,
            };
        }

        let request = ReasoningRequest {
            mappings: ruled,
            unresolved_fields,
            reference_data: filtered,
        };
        let (enhanced_mappings, status, error) = match self.reasoning.resolve(&request).await {
            Ok(response) => (
                merge_free_text(request.mappings, response.mappings),
                EnhancementStatus::Ok,
                None,
            ),
            Err(err) => {
                warn!(error = %err, "reasoning call failed; returning original mappings");
                (mappings.clone(), EnhancementStatus::Error, Some(err.to_string()))
            }
        };

        EnhancementResult {
            original_mappings: mappings,
            filtered_reference_data: request.reference_data,
            enhanced_mappings,
            status,
            error,
            snapshot_key,
        }
    }

    /// Latest complete snapshot for `scope`; every failure reads as "none".
    async fn load_snapshot(&self, scope: &Scope) -> Option<SnapshotRead> {
        let key = match self.cache.find_latest_snapshot_key(scope).await {
            Ok(Some(key)) => key,
            Ok(None) => {
                debug!(%scope, "no reference snapshot cached");
                return None;
            }
            Err(err) => {
                warn!(%scope, error = %err, "reference cache lookup failed");
                return None;
            }
        };
        self.read_complete(&key).await
    }

    async fn read_complete(&self, key: &SnapshotKey) -> Option<SnapshotRead> {
        match self.cache.read_snapshot(key).await {
            Ok(Some(read)) if read.is_complete() => {
                debug!(%key, "reference snapshot hit");
                Some(read)
            }
            Ok(Some(read)) => {
                let missing: Vec<_> = read.missing_tables.iter().map(ToString::to_string).collect();
                warn!(%key, ?missing, "reference snapshot partially expired; ignoring it");
                None
            }
            Ok(None) => {
                debug!(%key, "reference snapshot expired before read");
                None
            }
            Err(err) => {
                warn!(%key, error = %err, "reference snapshot read failed");
                None
            }
        }
    }
}

/// Take reasoning values for free-text fields only.
///
/// Response mappings are matched to request mappings by field, in order, so
/// repeated free-text fields pair up positionally.
fn merge_free_text(ruled: Vec<TargetMapping>, proposed: Vec<TargetMapping>) -> Vec<TargetMapping> {
    let mut by_field: HashMap<_, VecDeque<TargetMapping>> = HashMap::new();
    for mapping in proposed {
        by_field
            .entry(mapping.target_field.clone())
            .or_default()
            .push_back(mapping);
    }

    ruled
        .into_iter()
        .map(|mapping| {
            if !mapping.target_field.is_free_text() {
                return mapping;
            }
            let Some(candidate) = by_field
                .get_mut(&mapping.target_field)
                .and_then(VecDeque::pop_front)
            else {
                return mapping;
            };
            let confidence = match candidate.target_confidence {
                TargetConfidence::Original if candidate.target_value != mapping.target_value => {
                    TargetConfidence::Enhanced
                }
                other => other,
            };
            TargetMapping {
                target_confidence: confidence,
                target_value: candidate.target_value,
                ..mapping
            }
        })
        .collect()
}
