//! Per-request narrowing of snapshot rows.
//!
//! Four tables are filtered by a value taken from the request mappings; the
//! rest pass through whole. Matching is a case-insensitive substring test of
//! the filter value within the row's column.

use super::{ReferenceData, ReferenceRow, ReferenceTable, TargetField, TargetMapping, column_text};

/// Filter values pulled from an enhancement request.
///
/// Blank mapping values are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterValues {
    pub supplier_name: Option<String>,
    pub sub_group_code: Option<String>,
    pub fabric_content: Option<String>,
    pub material_group: Option<String>,
}

impl FilterValues {
    /// Collect filter values from `mappings`. The first non-blank value of a
    /// field wins.
    ///
    /// # Examples
    /// ```
    /// use reference_enrichment::domain::{FilterValues, TargetMapping};
    ///
    /// let values = FilterValues::from_mappings(&[
    ///     TargetMapping::new("Supplier", "Acme Textiles"),
    ///     TargetMapping::new("Material Group", "   "),
    /// ]);
    /// assert_eq!(values.supplier_name.as_deref(), Some("Acme Textiles"));
    /// assert_eq!(values.material_group, None);
    /// ```
    pub fn from_mappings(mappings: &[TargetMapping]) -> Self {
        let mut values = Self::default();
        for mapping in mappings {
            let slot = match mapping.target_field {
                TargetField::Supplier => &mut values.supplier_name,
                TargetField::MaterialSubGroup => &mut values.sub_group_code,
                TargetField::Composition => &mut values.fabric_content,
                TargetField::MaterialGroup => &mut values.material_group,
                _ => continue,
            };
            let value = mapping.target_value.trim();
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.to_owned());
            }
        }
        values
    }

    /// Whether `table` is narrowed per request but these values carry no
    /// filter for it, so its rows match nothing in the request.
    ///
    /// # Examples
    /// ```
    /// use reference_enrichment::domain::{FilterValues, ReferenceTable};
    ///
    /// let values = FilterValues::default();
    /// assert!(values.lacks_filter_for(ReferenceTable::Suppliers));
    /// assert!(!values.lacks_filter_for(ReferenceTable::Customers));
    /// ```
    pub fn lacks_filter_for(&self, table: ReferenceTable) -> bool {
        self.slot(table).is_some_and(|(_, value)| value.is_none())
    }

    /// Filter column and value for `table`, if the table is filtered.
    fn criterion(&self, table: ReferenceTable) -> Option<(&'static str, &str)> {
        let (column, value) = self.slot(table)?;
        value.as_deref().map(|value| (column, value))
    }

    fn slot(&self, table: ReferenceTable) -> Option<(&'static str, &Option<String>)> {
        match table {
            ReferenceTable::Suppliers => Some(("supplier_name", &self.supplier_name)),
            ReferenceTable::Composition => Some(("short_code", &self.sub_group_code)),
            ReferenceTable::FabricContents => Some(("description", &self.fabric_content)),
            ReferenceTable::MaterialGroups => Some(("description", &self.material_group)),
            ReferenceTable::Customers | ReferenceTable::MaterialSecurityGroups => None,
        }
    }
}

/// Applies [`FilterValues`] to snapshot rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceFilterEngine;

impl ReferenceFilterEngine {
    /// Narrow `data` table by table.
    ///
    /// A table without a filter value is returned whole. A filter that matches
    /// nothing yields an empty table, never the unfiltered rows.
    pub fn filter(&self, data: &ReferenceData, values: &FilterValues) -> ReferenceData {
        let mut filtered = ReferenceData::default();
        for table in ReferenceTable::ALL {
            let rows = data.rows(table);
            *filtered.rows_mut(table) = match values.criterion(table) {
                Some((column, needle)) => matching_rows(rows, column, needle),
                None => rows.to_vec(),
            };
        }
        filtered
    }
}

fn matching_rows(rows: &[ReferenceRow], column: &str, needle: &str) -> Vec<ReferenceRow> {
    let needle = needle.to_lowercase();
    rows.iter()
        .filter(|row| {
            column_text(row, column).is_some_and(|text| text.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}
