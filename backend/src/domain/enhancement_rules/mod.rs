//! Deterministic enhancement rules.
//!
//! Grounded rules copy a column from the filtered reference rows; when no
//! grounded value exists the lexical normalization table applies. Tables that
//! are narrowed by a request value (suppliers, composition, fabric contents,
//! material groups) only ground when the request carried that value. A mapping
//! whose value a rule changes is marked [`TargetConfidence::Enhanced`];
//! everything else passes through untouched.
//!
//! [`TargetConfidence::Enhanced`]: crate::domain::TargetConfidence::Enhanced

mod grounding;
mod normalization;

pub use grounding::GroundingTieBreak;

use super::{FilterValues, ReferenceData, TargetMapping};

/// Applies grounded and normalization rules to a mapping set.
///
/// # Examples
/// ```
/// use reference_enrichment::domain::{
///     EnhancementRuleEngine, ReferenceData, TargetConfidence, TargetMapping,
/// };
///
/// let engine = EnhancementRuleEngine::default();
/// let out = engine.apply(&[TargetMapping::new("UOM", "Yds")], &ReferenceData::default());
/// assert_eq!(out[0].target_value, "Yards");
/// assert_eq!(out[0].target_confidence, TargetConfidence::Enhanced);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EnhancementRuleEngine {
    tie_break: GroundingTieBreak,
}

impl EnhancementRuleEngine {
    /// Engine using `tie_break` for single-value grounded rules.
    pub fn with_tie_break(tie_break: GroundingTieBreak) -> Self {
        Self { tie_break }
    }

    /// Apply the rule tables to every mapping, preserving order.
    ///
    /// `filtered` must be the output of the filter engine for these
    /// `mappings`; the filter values are derived again here to tell matched
    /// rows from tables that were never narrowed.
    pub fn apply(&self, mappings: &[TargetMapping], filtered: &ReferenceData) -> Vec<TargetMapping> {
        let filters = FilterValues::from_mappings(mappings);
        mappings
            .iter()
            .map(|mapping| self.apply_one(mapping, filtered, &filters))
            .collect()
    }

    fn apply_one(
        &self,
        mapping: &TargetMapping,
        filtered: &ReferenceData,
        filters: &FilterValues,
    ) -> TargetMapping {
        let field = &mapping.target_field;
        let replacement = grounding::ground(field, filtered, filters, self.tie_break).or_else(|| {
            normalization::normalize(field, &mapping.target_value).map(str::to_owned)
        });

        match replacement {
            Some(value) if value != mapping.target_value => mapping.enhanced(value),
            _ => mapping.clone(),
        }
    }
}
