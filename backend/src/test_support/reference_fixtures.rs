//! Reference snapshots shaped like the production tables.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use crate::domain::{ReferenceRow, ReferenceSnapshot, ReferenceTable, Scope, TableSnapshot};

/// Fixed instant used as the default build time.
pub fn fixture_instant() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 10, 1, 8, 0, 0).single() {
        Some(at) => at,
        None => panic!("fixture instant is valid"),
    }
}

/// The scope most fixtures are built for.
pub fn knits_scope() -> Scope {
    match Scope::new("Knits", "Acme", "Fabric") {
        Ok(scope) => scope,
        Err(error) => panic!("fixture scope: {error}"),
    }
}

/// Rows per table for a small but realistic reference set.
pub fn fixture_rows(table: ReferenceTable) -> Vec<ReferenceRow> {
    let rows = match table {
        ReferenceTable::Customers => json!([
            { "cluster": "Knits", "customer": "Acme", "customer_code": "C-ACME" }
        ]),
        ReferenceTable::Suppliers => json!([
            { "cluster": "Knits", "supplier_name": "Acme Textiles", "vendor_code": "SUP001", "currency": "USD" },
            { "cluster": "Knits", "supplier_name": "Zenith Mills", "vendor_code": "SUP002", "currency": "EUR" }
        ]),
        ReferenceTable::MaterialSecurityGroups => json!([
            { "cluster": "Knits", "customer": "Acme", "material_type": "Fabric", "security_group": "MSG-7" }
        ]),
        ReferenceTable::MaterialGroups => json!([
            { "description": "Jersey knit", "material_group": "SJ" },
            { "description": "Jersey interlock", "material_group": "Interlock" },
            { "description": "Single Jersey", "material_group": "Single Jersey" },
            { "description": "Woven twill", "material_group": "TW" }
        ]),
        ReferenceTable::Composition => json!([
            { "short_code": "CO95EL5", "sub_group_code": "KN-CO" }
        ]),
        ReferenceTable::FabricContents => json!([
            { "description": "95% Cotton 5% Elastane", "code": "FC-CE" }
        ]),
    };
    match serde_json::from_value::<Vec<ReferenceRow>>(rows) {
        Ok(rows) => rows,
        Err(error) => panic!("fixture rows: {error}"),
    }
}

/// Snapshot holding [`fixture_rows`] for every table.
pub fn fixture_snapshot(scope: &Scope, at: DateTime<Utc>) -> ReferenceSnapshot {
    let mut snapshot = ReferenceSnapshot::new(scope.clone(), at);
    for table in ReferenceTable::ALL {
        snapshot.tables.insert(
            table,
            TableSnapshot::captured(fixture_rows(table), table.query_description(scope), at),
        );
    }
    snapshot
}

/// Parse a JSON array literal into rows.
pub fn rows(value: Value) -> Vec<ReferenceRow> {
    match serde_json::from_value(value) {
        Ok(rows) => rows,
        Err(error) => panic!("rows literal: {error}"),
    }
}
