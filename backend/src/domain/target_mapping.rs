//! Extracted field mappings and their confidence labels.
//!
//! A [`TargetMapping`] is one field the extraction step pulled out of a scanned
//! technical datasheet. Field names form a closed vocabulary ([`TargetField`]) with
//! an [`TargetField::Other`] pass-through for anything unrecognised.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Target field vocabulary.
///
/// Parsing is case-insensitive and collapses runs of whitespace, so
/// `"width  uom"` resolves to [`TargetField::WidthUom`]. Unknown names are kept
/// verbatim in [`TargetField::Other`] and rendered back unchanged.
///
/// # Examples
/// ```
/// use reference_enrichment::domain::TargetField;
///
/// assert_eq!("material sub group".parse::<TargetField>(), Ok(TargetField::MaterialSubGroup));
/// assert_eq!(TargetField::Uom.to_string(), "UOM");
/// assert_eq!(TargetField::from("Fabric Weight").to_string(), "Fabric Weight");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetField {
    Supplier,
    Customer,
    Currency,
    MaterialType,
    MaterialSecurityGroup,
    MaterialSubGroup,
    Composition,
    MaterialGroup,
    Cluster,
    WidthUom,
    Uom,
    MaterialMasterGrid,
    SourceType,
    /// Free-form field outside the fixed vocabulary.
    Other(String),
}

const KNOWN_FIELDS: [(TargetField, &str); 13] = [
    (TargetField::Supplier, "Supplier"),
    (TargetField::Customer, "Customer"),
    (TargetField::Currency, "Currency"),
    (TargetField::MaterialType, "Material Type"),
    (TargetField::MaterialSecurityGroup, "Material Security Group"),
    (TargetField::MaterialSubGroup, "Material Sub Group"),
    (TargetField::Composition, "Composition"),
    (TargetField::MaterialGroup, "Material Group"),
    (TargetField::Cluster, "Cluster"),
    (TargetField::WidthUom, "Width UOM"),
    (TargetField::Uom, "UOM"),
    (TargetField::MaterialMasterGrid, "Material Master Grid"),
    (TargetField::SourceType, "Source Type"),
];

impl TargetField {
    /// Display label used on the wire.
    pub fn label(&self) -> &str {
        match self {
            Self::Other(name) => name.as_str(),
            known => KNOWN_FIELDS
                .iter()
                .find(|(field, _)| field == known)
                .map_or("", |(_, label)| label),
        }
    }

    /// Whether this field falls outside the fixed vocabulary.
    pub fn is_free_text(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl FromStr for TargetField {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalised = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let field = KNOWN_FIELDS
            .iter()
            .find(|(_, label)| label.eq_ignore_ascii_case(&normalised))
            .map_or_else(|| Self::Other(raw.to_owned()), |(field, _)| field.clone());
        Ok(field)
    }
}

impl From<String> for TargetField {
    fn from(raw: String) -> Self {
        match raw.parse() {
            Ok(field) => field,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for TargetField {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<TargetField> for String {
    fn from(field: TargetField) -> Self {
        match field {
            TargetField::Other(name) => name,
            known => known.label().to_owned(),
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a mapping value was machine-corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetConfidence {
    /// Value as extracted.
    #[default]
    Original,
    /// Value rewritten by a rule or the reasoning call.
    Enhanced,
    /// The reasoning call flagged this value as unresolvable.
    Error,
}

/// One extracted field.
///
/// `target_value` decodes `null` as an empty string, and `target_confidence`
/// falls back to [`TargetConfidence::Original`] when absent or carried in the
/// legacy numeric form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TargetMapping {
    #[schema(value_type = String, example = "UOM")]
    pub target_field: TargetField,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[schema(example = "Yds")]
    pub target_value: String,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub target_confidence: TargetConfidence,
}

impl TargetMapping {
    /// Build an unmodified mapping.
    pub fn new(field: impl Into<TargetField>, value: impl Into<String>) -> Self {
        Self {
            target_field: field.into(),
            target_value: value.into(),
            target_confidence: TargetConfidence::Original,
        }
    }

    /// Return a copy carrying `value` and [`TargetConfidence::Enhanced`].
    #[must_use]
    pub fn enhanced(&self, value: impl Into<String>) -> Self {
        Self {
            target_field: self.target_field.clone(),
            target_value: value.into(),
            target_confidence: TargetConfidence::Enhanced,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<TargetConfidence, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Label(TargetConfidence),
        Score(f64),
    }

    match Repr::deserialize(deserializer) {
        Ok(Repr::Label(label)) => Ok(label),
        Ok(Repr::Score(score)) if (0.0..=1.0).contains(&score) => Ok(TargetConfidence::Original),
        Ok(Repr::Score(score)) => Err(D::Error::custom(format!(
            "confidence score {score} is outside 0..=1"
        ))),
        Err(_) => Err(D::Error::custom(
            "target_confidence must be original, enhanced, error, or a score in 0..=1",
        )),
    }
}
