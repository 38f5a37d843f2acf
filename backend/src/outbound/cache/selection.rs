//! Key selection shared by the cache adapters.
//!
//! Scope values may contain `:`, so two scopes can render the same key
//! prefix (`EU:North`/`Acme` and `EU`/`North:Acme`). Key parsing alone cannot
//! tell them apart; the master record can. Adapters therefore walk candidates
//! newest first and keep the first whose master describes the requested scope.

use crate::domain::ReferenceTable;
use crate::domain::Scope;
use crate::domain::ports::{ReferenceCacheError, SnapshotKey};

use super::records::MasterRecord;

/// Parse scanned master keys for `scope`, newest first, without duplicates.
///
/// `SCAN` may return a key more than once across batches.
pub(super) fn newest_first<I, S>(scope: &Scope, raw_keys: I) -> Vec<SnapshotKey>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys: Vec<_> = raw_keys
        .into_iter()
        .filter_map(|raw| SnapshotKey::parse_master(scope, raw.as_ref()))
        .collect();
    keys.sort_by(|a, b| b.timestamp().cmp(a.timestamp()));
    keys.dedup();
    keys
}

/// Whether `master` was written for `key`'s scope and timestamp.
pub(super) fn master_describes(master: &MasterRecord, key: &SnapshotKey) -> bool {
    let scope = key.scope();
    master.cluster == scope.cluster
        && master.customer == scope.customer
        && master.material_type == scope.material_type
        && &master.timestamp == key.timestamp()
}

/// Pair child tables with the values fetched for their keys, in order.
///
/// # Errors
/// Returns [`ReferenceCacheError::Serialization`] when the store answered
/// with a different number of values than keys requested.
pub(super) fn pair_children(
    tables: Vec<(ReferenceTable, String)>,
    values: Vec<Option<String>>,
) -> Result<Vec<(ReferenceTable, Option<String>)>, ReferenceCacheError> {
    if values.len() != tables.len() {
        return Err(ReferenceCacheError::serialization(format!(
            "fetched {} values for {} keys",
            values.len(),
            tables.len()
        )));
    }
    Ok(tables
        .into_iter()
        .map(|(table, _)| table)
        .zip(values)
        .collect())
}
