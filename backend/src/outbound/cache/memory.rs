//! In-process `ReferenceCache` used when no Redis URL is configured.
//!
//! Stores the same encoded records as the Redis adapter and expires them
//! against the injected clock, so expiry behaves identically in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::sync::Mutex;

use crate::domain::ports::{ReferenceCache, ReferenceCacheError, SnapshotKey, SnapshotRead};
use crate::domain::{ReferenceSnapshot, Scope};

use super::records::{MasterRecord, assemble_snapshot, child_keys, decode_master, encode_snapshot};
use super::selection::{master_describes, newest_first};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Snapshot cache held in process memory.
pub struct InMemoryReferenceCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryReferenceCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop a single key, as if it had expired on its own.
    pub async fn remove(&self, key: &str) -> bool {
        self.entries.lock().await.remove(key).is_some()
    }

    fn live_value(entries: &HashMap<String, Entry>, key: &str, now: DateTime<Utc>) -> Option<String> {
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    fn live_master(
        entries: &HashMap<String, Entry>,
        key: &SnapshotKey,
        now: DateTime<Utc>,
    ) -> Option<MasterRecord> {
        let raw = Self::live_value(entries, &key.master_key(), now)?;
        decode_master(&raw).ok()
    }
}

#[async_trait]
impl ReferenceCache for InMemoryReferenceCache {
    async fn write_snapshot(
        &self,
        snapshot: &ReferenceSnapshot,
    ) -> Result<SnapshotKey, ReferenceCacheError> {
        let encoded = encode_snapshot(snapshot)?;
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|err| ReferenceCacheError::serialization(err.to_string()))?;
        let expires_at = self.clock.utc() + ttl;

        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > self.clock.utc());
        for (key, value) in encoded.entries {
            entries.insert(key, Entry { value, expires_at });
        }
        Ok(encoded.key)
    }

    async fn find_latest_snapshot_key(
        &self,
        scope: &Scope,
    ) -> Result<Option<SnapshotKey>, ReferenceCacheError> {
        let now = self.clock.utc();
        let entries = self.entries.lock().await;
        let live = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(raw, _)| raw);
        Ok(newest_first(scope, live).into_iter().find(|key| {
            Self::live_master(&entries, key, now).is_some_and(|master| master_describes(&master, key))
        }))
    }

    async fn read_snapshot(
        &self,
        key: &SnapshotKey,
    ) -> Result<Option<SnapshotRead>, ReferenceCacheError> {
        let now = self.clock.utc();
        let entries = self.entries.lock().await;
        let Some(master) = Self::live_master(&entries, key, now) else {
            return Ok(None);
        };

        let children = child_keys(&master)
            .into_iter()
            .map(|(table, child)| (table, Self::live_value(&entries, &child, now)))
            .collect();
        assemble_snapshot(key, master, children).map(Some)
    }

    async fn ping(&self) -> Result<(), ReferenceCacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReferenceTable, TableSnapshot};
    use crate::test_support::MutableClock;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use serde_json::json;

    const DAY: Duration = Duration::from_secs(86_400);

    #[fixture]
    fn scope() -> Scope {
        Scope::new("Knits", "Acme", "Fabric").expect("scope")
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single().expect("time")
    }

    fn snapshot_at(scope: &Scope, at: DateTime<Utc>) -> ReferenceSnapshot {
        let mut snapshot = ReferenceSnapshot::new(scope.clone(), at);
        for table in ReferenceTable::ALL {
            let rows = serde_json::from_value(json!([{ "code": format!("{table}-1") }]))
                .expect("rows");
            snapshot.tables.insert(
                table,
                TableSnapshot::captured(rows, table.query_description(scope), at),
            );
        }
        snapshot
    }

    fn cache(clock: &Arc<MutableClock>) -> InMemoryReferenceCache {
        InMemoryReferenceCache::new(Arc::clone(clock) as Arc<dyn Clock>, DAY)
    }

    #[rstest]
    #[tokio::test]
    async fn written_snapshot_is_found_and_read_back(scope: Scope) {
        let clock = Arc::new(MutableClock::new(start()));
        let cache = cache(&clock);
        let snapshot = snapshot_at(&scope, start());

        let key = cache.write_snapshot(&snapshot).await.expect("write");
        let found = cache
            .find_latest_snapshot_key(&scope)
            .await
            .expect("scan")
            .expect("snapshot present");
        assert_eq!(found, key);

        let read = cache.read_snapshot(&found).await.expect("read").expect("live");
        assert!(read.is_complete());
        assert_eq!(read.snapshot, snapshot);
    }

    #[rstest]
    #[tokio::test]
    async fn latest_of_two_snapshots_wins(scope: Scope) {
        let clock = Arc::new(MutableClock::new(start()));
        let cache = cache(&clock);
        cache
            .write_snapshot(&snapshot_at(&scope, start()))
            .await
            .expect("first write");
        let later = start() + chrono::Duration::minutes(5);
        let newer = cache
            .write_snapshot(&snapshot_at(&scope, later))
            .await
            .expect("second write");

        let found = cache.find_latest_snapshot_key(&scope).await.expect("scan");
        assert_eq!(found, Some(newer));
    }

    #[rstest]
    #[tokio::test]
    async fn other_scopes_are_not_matched(scope: Scope) {
        let clock = Arc::new(MutableClock::new(start()));
        let cache = cache(&clock);
        let sibling = Scope::new("Knits", "Acme Group", "Fabric").expect("scope");
        cache
            .write_snapshot(&snapshot_at(&sibling, start()))
            .await
            .expect("write");

        assert_eq!(cache.find_latest_snapshot_key(&scope).await.expect("scan"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn expired_snapshot_matches_never_written(scope: Scope) {
        let clock = Arc::new(MutableClock::new(start()));
        let cache = cache(&clock);
        let key = cache
            .write_snapshot(&snapshot_at(&scope, start()))
            .await
            .expect("write");

        clock.advance(DAY);

        assert_eq!(cache.find_latest_snapshot_key(&scope).await.expect("scan"), None);
        assert_eq!(cache.read_snapshot(&key).await.expect("read"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_table_key_is_reported(scope: Scope) {
        let clock = Arc::new(MutableClock::new(start()));
        let cache = cache(&clock);
        let key = cache
            .write_snapshot(&snapshot_at(&scope, start()))
            .await
            .expect("write");
        assert!(cache.remove(&key.table_key(ReferenceTable::FabricContents)).await);

        let read = cache.read_snapshot(&key).await.expect("read").expect("master live");
        assert_eq!(read.missing_tables, [ReferenceTable::FabricContents]);
        assert!(read.snapshot.rows(ReferenceTable::FabricContents).is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn colliding_scope_does_not_hide_older_snapshot() {
        let clock = Arc::new(MutableClock::new(start()));
        let cache = cache(&clock);
        let wanted = Scope::new("EU:North", "Acme", "Fabric").expect("scope");
        let colliding = Scope::new("EU", "North:Acme", "Fabric").expect("scope");
        let own = cache
            .write_snapshot(&snapshot_at(&wanted, start()))
            .await
            .expect("first write");
        cache
            .write_snapshot(&snapshot_at(&colliding, start() + chrono::Duration::minutes(5)))
            .await
            .expect("second write");

        let found = cache
            .find_latest_snapshot_key(&wanted)
            .await
            .expect("scan")
            .expect("own snapshot found");
        assert_eq!(found, own);
        let read = cache.read_snapshot(&found).await.expect("read").expect("live");
        assert_eq!(read.snapshot.scope, wanted);
    }
}
