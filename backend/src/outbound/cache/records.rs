//! JSON records stored under snapshot keys.
//!
//! A snapshot is one master record plus one record per table. The master
//! names every child key so readers never have to guess the layout.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{ReferenceCacheError, SnapshotKey, SnapshotRead};
use crate::domain::{ReferenceSnapshot, ReferenceTable, SnapshotTimestamp, TableSnapshot};

use super::selection::master_describes;

/// Value stored under the master key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct MasterRecord {
    pub cluster: String,
    pub customer: String,
    pub material_type: String,
    pub timestamp: SnapshotTimestamp,
    pub created_at: DateTime<Utc>,
    /// Logical table name to the query that produced it.
    pub queries: BTreeMap<String, String>,
    /// Logical table name to its child key.
    pub tables: BTreeMap<String, String>,
}

/// Every key/value pair making up one snapshot, master first.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct EncodedSnapshot {
    pub key: SnapshotKey,
    pub entries: Vec<(String, String)>,
}

pub(super) fn encode_snapshot(
    snapshot: &ReferenceSnapshot,
) -> Result<EncodedSnapshot, ReferenceCacheError> {
    let key = SnapshotKey::new(snapshot.scope.clone(), snapshot.timestamp.clone());

    let mut queries = BTreeMap::new();
    let mut tables = BTreeMap::new();
    let mut children = Vec::with_capacity(snapshot.tables.len());
    for (table, table_snapshot) in &snapshot.tables {
        let child_key = key.table_key(*table);
        queries.insert(
            table.logical_name().to_owned(),
            table_snapshot.metadata.query.clone(),
        );
        tables.insert(table.logical_name().to_owned(), child_key.clone());
        children.push((child_key, to_json(table_snapshot)?));
    }

    let master = MasterRecord {
        cluster: snapshot.scope.cluster.clone(),
        customer: snapshot.scope.customer.clone(),
        material_type: snapshot.scope.material_type.clone(),
        timestamp: snapshot.timestamp.clone(),
        created_at: snapshot.created_at,
        queries,
        tables,
    };

    let mut entries = Vec::with_capacity(children.len() + 1);
    entries.push((key.master_key(), to_json(&master)?));
    entries.extend(children);
    Ok(EncodedSnapshot { key, entries })
}

pub(super) fn decode_master(raw: &str) -> Result<MasterRecord, ReferenceCacheError> {
    serde_json::from_str(raw).map_err(|err| ReferenceCacheError::serialization(err.to_string()))
}

/// Child keys listed by a master record.
///
/// Unknown logical names are skipped so older readers tolerate newer tables.
pub(super) fn child_keys(master: &MasterRecord) -> Vec<(ReferenceTable, String)> {
    master
        .tables
        .iter()
        .filter_map(|(name, key)| {
            ReferenceTable::from_logical_name(name).map(|table| (table, key.clone()))
        })
        .collect()
}

/// Rebuild a snapshot from its master and the child values read alongside it.
///
/// `children` pairs each table with its raw value; `None` marks an expired
/// child, which reads back as an empty table.
pub(super) fn assemble_snapshot(
    key: &SnapshotKey,
    master: MasterRecord,
    children: Vec<(ReferenceTable, Option<String>)>,
) -> Result<SnapshotRead, ReferenceCacheError> {
    if !master_describes(&master, key) {
        return Err(ReferenceCacheError::serialization(format!(
            "master record under {key} describes another snapshot"
        )));
    }

    let mut snapshot = ReferenceSnapshot::new(key.scope().clone(), master.created_at);
    snapshot.timestamp = master.timestamp;

    let mut missing_tables = Vec::new();
    for (table, raw) in children {
        match raw {
            Some(raw) => {
                let table_snapshot: TableSnapshot = serde_json::from_str(&raw)
                    .map_err(|err| ReferenceCacheError::serialization(err.to_string()))?;
                snapshot.tables.insert(table, table_snapshot);
            }
            None => missing_tables.push(table),
        }
    }

    Ok(SnapshotRead {
        key: key.clone(),
        snapshot,
        missing_tables,
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ReferenceCacheError> {
    serde_json::to_string(value).map_err(|err| ReferenceCacheError::serialization(err.to_string()))
}
