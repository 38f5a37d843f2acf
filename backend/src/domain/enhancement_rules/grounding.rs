//! Rules replacing values with columns from filtered reference rows.

use crate::domain::{
    FilterValues, ReferenceData, ReferenceRow, ReferenceTable, TargetField, column_text,
};

/// Row chosen when a single-value grounded rule has several candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundingTieBreak {
    /// First candidate in stored order.
    #[default]
    FirstRow,
    /// Last candidate in stored order.
    LastRow,
}

enum Binding {
    Single(ReferenceTable, &'static str),
    Joined(ReferenceTable, &'static str),
}

fn binding(field: &TargetField) -> Option<Binding> {
    use ReferenceTable as T;

    let binding = match field {
        TargetField::Supplier => Binding::Single(T::Suppliers, "vendor_code"),
        TargetField::Customer => Binding::Single(T::Customers, "id"),
        TargetField::Currency => Binding::Single(T::Suppliers, "currency"),
        TargetField::MaterialType => Binding::Single(T::MaterialSecurityGroups, "material_type"),
        TargetField::MaterialSecurityGroup => {
            Binding::Single(T::MaterialSecurityGroups, "security_group")
        }
        TargetField::MaterialSubGroup => Binding::Single(T::Composition, "composition_material"),
        TargetField::Composition => Binding::Single(T::FabricContents, "fabric_content_code"),
        TargetField::Cluster => Binding::Single(T::Customers, "cluster"),
        TargetField::MaterialGroup => Binding::Joined(T::MaterialGroups, "material_group"),
        _ => return None,
    };
    Some(binding)
}

impl Binding {
    const fn table(&self) -> ReferenceTable {
        match self {
            Self::Single(table, _) | Self::Joined(table, _) => *table,
        }
    }
}

/// Grounded value for `field`, or `None` when the bound table has no usable
/// row.
///
/// A table narrowed by a request value only grounds when that value was
/// present; otherwise its rows are the whole table, not matches. Currency
/// shares the suppliers binding, so it needs a Supplier value too.
pub(super) fn ground(
    field: &TargetField,
    data: &ReferenceData,
    filters: &FilterValues,
    tie_break: GroundingTieBreak,
) -> Option<String> {
    let binding = binding(field)?;
    if filters.lacks_filter_for(binding.table()) {
        return None;
    }
    match binding {
        Binding::Single(table, column) => {
            let mut candidates = values(data.rows(table), column);
            match tie_break {
                GroundingTieBreak::FirstRow => candidates.next(),
                GroundingTieBreak::LastRow => candidates.last(),
            }
        }
        Binding::Joined(table, column) => {
            let joined = values(data.rows(table), column).collect::<Vec<_>>();
            (!joined.is_empty()).then(|| joined.join(","))
        }
    }
}

fn values<'a>(rows: &'a [ReferenceRow], column: &'a str) -> impl Iterator<Item = String> + 'a {
    rows.iter().filter_map(move |row| column_text(row, column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn rows(values: Value) -> Vec<ReferenceRow> {
        serde_json::from_value(values).expect("rows decode")
    }

    fn filters() -> FilterValues {
        FilterValues {
            supplier_name: Some("acme".to_owned()),
            sub_group_code: Some("ctn".to_owned()),
            fabric_content: Some("cotton".to_owned()),
            material_group: Some("jersey".to_owned()),
        }
    }

    #[rstest]
    fn joins_material_groups_in_stored_order() {
        let data = ReferenceData {
            material_groups: rows(json!([
                { "material_group": "SJ" },
                { "material_group": "Interlock" },
                { "material_group": null },
                { "material_group": "Single Jersey" }
            ])),
            ..ReferenceData::default()
        };
        assert_eq!(
            ground(
                &TargetField::MaterialGroup,
                &data,
                &filters(),
                GroundingTieBreak::default()
            )
            .as_deref(),
            Some("SJ,Interlock,Single Jersey")
        );
    }

    #[rstest]
    #[case(GroundingTieBreak::FirstRow, "SUP001")]
    #[case(GroundingTieBreak::LastRow, "SUP009")]
    fn single_value_rules_follow_tie_break(#[case] tie_break: GroundingTieBreak, #[case] expected: &str) {
        let data = ReferenceData {
            suppliers: rows(json!([
                { "vendor_code": "SUP001" },
                { "vendor_code": null },
                { "vendor_code": "SUP009" }
            ])),
            ..ReferenceData::default()
        };
        assert_eq!(
            ground(&TargetField::Supplier, &data, &filters(), tie_break).as_deref(),
            Some(expected)
        );
    }

    #[rstest]
    fn numeric_columns_render_as_json_text() {
        let data = ReferenceData {
            customers: rows(json!([{ "id": 42, "cluster": "Knits" }])),
            ..ReferenceData::default()
        };
        assert_eq!(
            ground(&TargetField::Customer, &data, &filters(), GroundingTieBreak::default()).as_deref(),
            Some("42")
        );
    }

    #[rstest]
    #[case(TargetField::Currency)]
    #[case(TargetField::MaterialGroup)]
    #[case(TargetField::Uom)]
    #[case(TargetField::Other("Notes".to_owned()))]
    fn empty_or_unbound_tables_do_not_ground(#[case] field: TargetField) {
        assert_eq!(
            ground(&field, &ReferenceData::default(), &filters(), GroundingTieBreak::default()),
            None
        );
    }

    #[rstest]
    #[case(TargetField::Supplier)]
    #[case(TargetField::Currency)]
    #[case(TargetField::MaterialGroup)]
    #[case(TargetField::MaterialSubGroup)]
    #[case(TargetField::Composition)]
    fn unfiltered_request_tables_do_not_ground(#[case] field: TargetField) {
        let data = ReferenceData {
            suppliers: rows(json!([{ "vendor_code": "SUP900", "currency": "EUR" }])),
            material_groups: rows(json!([{ "material_group": "SJ" }, { "material_group": "TW" }])),
            composition: rows(json!([{ "composition_material": "Cotton" }])),
            fabric_contents: rows(json!([{ "fabric_content_code": "FC-100" }])),
            ..ReferenceData::default()
        };
        assert_eq!(
            ground(&field, &data, &FilterValues::default(), GroundingTieBreak::default()),
            None
        );
    }
}
