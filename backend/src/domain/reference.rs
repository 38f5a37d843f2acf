//! Reference snapshot model.
//!
//! A snapshot is an immutable capture of six reference tables for one
//! [`Scope`], stamped with a sortable [`SnapshotTimestamp`]. The per-table
//! source query policy lives on [`ReferenceTable`] so that relational adapters
//! only translate a [`ScopeFilter`] into SQL.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use utoipa::ToSchema;

/// One reference row: column name to JSON value.
pub type ReferenceRow = Map<String, Value>;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Text of `column` in `row`.
///
/// Strings are returned verbatim, numbers and booleans as their JSON text.
/// Missing, null, and nested values yield `None`.
pub fn column_text(row: &ReferenceRow, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The `(cluster, customer, material_type)` triple bounding relevant rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Scope {
    pub cluster: String,
    pub customer: String,
    pub material_type: String,
}

/// Validation errors raised by [`Scope::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeValidationError {
    /// A scope component was blank.
    #[error("scope component `{component}` must not be blank")]
    Blank { component: &'static str },
}

impl Scope {
    /// Build a scope, rejecting blank components.
    ///
    /// # Examples
    /// ```
    /// use reference_enrichment::domain::Scope;
    ///
    /// let scope = Scope::new("Knits", "Acme", "Fabric").expect("valid scope");
    /// assert_eq!(scope.to_string(), "Knits/Acme/Fabric");
    /// assert!(Scope::new("Knits", " ", "Fabric").is_err());
    /// ```
    pub fn new(
        cluster: impl Into<String>,
        customer: impl Into<String>,
        material_type: impl Into<String>,
    ) -> Result<Self, ScopeValidationError> {
        let scope = Self {
            cluster: cluster.into(),
            customer: customer.into(),
            material_type: material_type.into(),
        };
        for (component, value) in [
            ("cluster", &scope.cluster),
            ("customer", &scope.customer),
            ("material_type", &scope.material_type),
        ] {
            if value.trim().is_empty() {
                return Err(ScopeValidationError::Blank { component });
            }
        }
        Ok(scope)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.cluster, self.customer, self.material_type)
    }
}

/// Snapshot build time formatted as `YYYYMMDD_HHMMSS` (UTC).
///
/// Lexicographic order equals chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotTimestamp(String);

/// Returned when a string is not a `YYYYMMDD_HHMMSS` timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("snapshot timestamp `{raw}` is not in YYYYMMDD_HHMMSS form")]
pub struct SnapshotTimestampError {
    raw: String,
}

impl SnapshotTimestamp {
    /// Format an instant.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Parse a timestamp taken from a cache key.
    ///
    /// # Examples
    /// ```
    /// use reference_enrichment::domain::SnapshotTimestamp;
    ///
    /// let ts = SnapshotTimestamp::parse("20250102_030405").expect("valid");
    /// assert_eq!(ts.as_str(), "20250102_030405");
    /// assert!(SnapshotTimestamp::parse("2025-01-02").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, SnapshotTimestampError> {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map(|_| Self(raw.to_owned()))
            .map_err(|_| SnapshotTimestampError {
                raw: raw.to_owned(),
            })
    }

    /// Borrow the formatted value.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for SnapshotTimestamp {
    type Error = SnapshotTimestampError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<SnapshotTimestamp> for String {
    fn from(value: SnapshotTimestamp) -> Self {
        value.0
    }
}

impl fmt::Display for SnapshotTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source-side narrowing applied when a table is queried for a scope.
///
/// `None` means the column is not constrained. Present values are matched as
/// case-insensitive substrings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeFilter {
    pub cluster: Option<String>,
    pub customer: Option<String>,
    pub material_type: Option<String>,
}

impl ScopeFilter {
    /// Whether the table is read in full.
    pub fn is_full_scan(&self) -> bool {
        self.cluster.is_none() && self.customer.is_none() && self.material_type.is_none()
    }
}

/// The six cached reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceTable {
    Customers,
    Suppliers,
    MaterialSecurityGroups,
    MaterialGroups,
    Composition,
    FabricContents,
}

impl ReferenceTable {
    /// Every table, in snapshot order.
    pub const ALL: [Self; 6] = [
        Self::Customers,
        Self::Suppliers,
        Self::MaterialSecurityGroups,
        Self::MaterialGroups,
        Self::Composition,
        Self::FabricContents,
    ];

    /// Logical table name used in master-key mappings and envelopes.
    pub fn logical_name(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Suppliers => "suppliers",
            Self::MaterialSecurityGroups => "material_security_groups",
            Self::MaterialGroups => "material_groups",
            Self::Composition => "composition",
            Self::FabricContents => "fabric_contents",
        }
    }

    /// Suffix of the table's cache key.
    pub fn key_suffix(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Suppliers => "supplier",
            Self::MaterialSecurityGroups => "material_security_group",
            Self::MaterialGroups => "material_groups",
            Self::Composition => "composition",
            Self::FabricContents => "fabric_contents",
        }
    }

    /// Name of the relational table the rows are read from.
    pub fn source_table(self) -> &'static str {
        match self {
            Self::MaterialSecurityGroups => "material_security_group",
            other => other.logical_name(),
        }
    }

    /// Resolve a table from its logical name.
    pub fn from_logical_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.logical_name() == name)
    }

    /// Source query policy: scope-bearing tables are narrowed at the source,
    /// lookup tables are read whole.
    pub fn scope_filter(self, scope: &Scope) -> ScopeFilter {
        match self {
            Self::Customers => ScopeFilter {
                cluster: Some(scope.cluster.clone()),
                customer: Some(scope.customer.clone()),
                material_type: None,
            },
            Self::Suppliers => ScopeFilter {
                cluster: Some(scope.cluster.clone()),
                ..ScopeFilter::default()
            },
            Self::MaterialSecurityGroups => ScopeFilter {
                cluster: Some(scope.cluster.clone()),
                customer: Some(scope.customer.clone()),
                material_type: Some(scope.material_type.clone()),
            },
            Self::MaterialGroups | Self::Composition | Self::FabricContents => {
                ScopeFilter::default()
            }
        }
    }

    /// Human-readable description of the source query, stored as metadata.
    pub fn query_description(self, scope: &Scope) -> String {
        let filter = self.scope_filter(scope);
        let clauses = [
            ("cluster", filter.cluster),
            ("customer", filter.customer),
            ("material_type", filter.material_type),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| format!("{column} ILIKE '%{v}%'")))
        .collect::<Vec<_>>();

        if clauses.is_empty() {
            format!("SELECT * FROM {}", self.source_table())
        } else {
            format!(
                "SELECT * FROM {} WHERE {}",
                self.source_table(),
                clauses.join(" AND ")
            )
        }
    }
}

impl fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

/// Capture statistics stored beside each table's rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub row_count: usize,
    pub query: String,
    pub captured_at: DateTime<Utc>,
}

/// Rows plus metadata for one table within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub data: Vec<ReferenceRow>,
    pub metadata: TableMetadata,
}

impl TableSnapshot {
    /// Wrap freshly queried rows.
    pub fn captured(data: Vec<ReferenceRow>, query: String, captured_at: DateTime<Utc>) -> Self {
        let row_count = data.len();
        Self {
            data,
            metadata: TableMetadata {
                row_count,
                query,
                captured_at,
            },
        }
    }
}

/// Immutable capture of all reference tables for one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSnapshot {
    pub scope: Scope,
    pub timestamp: SnapshotTimestamp,
    pub created_at: DateTime<Utc>,
    pub tables: BTreeMap<ReferenceTable, TableSnapshot>,
}

impl ReferenceSnapshot {
    /// Start an empty snapshot.
    pub fn new(scope: Scope, created_at: DateTime<Utc>) -> Self {
        Self {
            scope,
            timestamp: SnapshotTimestamp::from_datetime(created_at),
            created_at,
            tables: BTreeMap::new(),
        }
    }

    /// Rows captured for `table`; empty when the table is absent.
    pub fn rows(&self, table: ReferenceTable) -> &[ReferenceRow] {
        self.tables
            .get(&table)
            .map_or(&[], |snapshot| snapshot.data.as_slice())
    }

    /// Flatten into the six-table row shape.
    pub fn reference_data(&self) -> ReferenceData {
        let mut data = ReferenceData::default();
        for table in ReferenceTable::ALL {
            *data.rows_mut(table) = self.rows(table).to_vec();
        }
        data
    }
}

/// Row sets for all six tables.
///
/// Always serialises every table so consumers see a stable shape even when a
/// table is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct ReferenceData {
    #[schema(value_type = Vec<Object>)]
    pub customers: Vec<ReferenceRow>,
    #[schema(value_type = Vec<Object>)]
    pub suppliers: Vec<ReferenceRow>,
    #[schema(value_type = Vec<Object>)]
    pub material_security_groups: Vec<ReferenceRow>,
    #[schema(value_type = Vec<Object>)]
    pub material_groups: Vec<ReferenceRow>,
    #[schema(value_type = Vec<Object>)]
    pub composition: Vec<ReferenceRow>,
    #[schema(value_type = Vec<Object>)]
    pub fabric_contents: Vec<ReferenceRow>,
}

impl ReferenceData {
    /// Rows for `table`.
    pub fn rows(&self, table: ReferenceTable) -> &[ReferenceRow] {
        match table {
            ReferenceTable::Customers => &self.customers,
            ReferenceTable::Suppliers => &self.suppliers,
            ReferenceTable::MaterialSecurityGroups => &self.material_security_groups,
            ReferenceTable::MaterialGroups => &self.material_groups,
            ReferenceTable::Composition => &self.composition,
            ReferenceTable::FabricContents => &self.fabric_contents,
        }
    }

    /// Mutable rows for `table`.
    pub fn rows_mut(&mut self, table: ReferenceTable) -> &mut Vec<ReferenceRow> {
        match table {
            ReferenceTable::Customers => &mut self.customers,
            ReferenceTable::Suppliers => &mut self.suppliers,
            ReferenceTable::MaterialSecurityGroups => &mut self.material_security_groups,
            ReferenceTable::MaterialGroups => &mut self.material_groups,
            ReferenceTable::Composition => &mut self.composition,
            ReferenceTable::FabricContents => &mut self.fabric_contents,
        }
    }

    /// Whether every table is empty.
    pub fn is_empty(&self) -> bool {
        ReferenceTable::ALL
            .into_iter()
            .all(|table| self.rows(table).is_empty())
    }
}
