//! Redis-backed `ReferenceCache` adapter.
//!
//! Snapshots are written as one `MULTI/EXEC` pipeline so the master and every
//! table key share a single expiry. Discovery walks the keyspace with `SCAN`
//! rather than `KEYS` to avoid blocking the server.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis;
use tracing::{debug, warn};

use crate::domain::ports::{ReferenceCache, ReferenceCacheError, SnapshotKey, SnapshotRead};
use crate::domain::{ReferenceSnapshot, Scope};
use crate::outbound::PoolError;

use super::pool::RedisPool;
use super::records::{MasterRecord, assemble_snapshot, child_keys, decode_master, encode_snapshot};
use super::selection::{master_describes, newest_first, pair_children};

const SCAN_BATCH: usize = 100;

/// Snapshot cache stored in Redis.
#[derive(Clone)]
pub struct RedisReferenceCache {
    pool: RedisPool,
    ttl: Duration,
}

impl RedisReferenceCache {
    /// Create a cache whose keys expire `ttl` after each write.
    pub fn new(pool: RedisPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

fn pool_error(err: PoolError) -> ReferenceCacheError {
    ReferenceCacheError::unavailable(err.into_message())
}

fn redis_error(err: redis::RedisError) -> ReferenceCacheError {
    ReferenceCacheError::unavailable(err.to_string())
}

#[async_trait]
impl ReferenceCache for RedisReferenceCache {
    async fn write_snapshot(
        &self,
        snapshot: &ReferenceSnapshot,
    ) -> Result<SnapshotKey, ReferenceCacheError> {
        let encoded = encode_snapshot(snapshot)?;
        let ttl_secs = self.ttl.as_secs().max(1);

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in &encoded.entries {
            pipe.cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl_secs)
                .ignore();
        }

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        pipe.query_async::<()>(&mut *conn)
            .await
            .map_err(redis_error)?;
        debug!(key = %encoded.key, entries = encoded.entries.len(), "reference snapshot stored");
        Ok(encoded.key)
    }

    async fn find_latest_snapshot_key(
        &self,
        scope: &Scope,
    ) -> Result<Option<SnapshotKey>, ReferenceCacheError> {
        let pattern = SnapshotKey::master_pattern(scope);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let mut scanned = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, keys) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async::<(u64, Vec<String>)>(&mut *conn)
                .await
                .map_err(redis_error)?;
            scanned.extend(keys);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        for key in newest_first(scope, &scanned) {
            let Some(master) = fetch_master(&mut *conn, &key).await? else {
                continue;
            };
            if master_describes(&master, &key) {
                return Ok(Some(key));
            }
            debug!(%key, "master key belongs to a colliding scope; trying older");
        }
        Ok(None)
    }

    async fn read_snapshot(
        &self,
        key: &SnapshotKey,
    ) -> Result<Option<SnapshotRead>, ReferenceCacheError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let Some(master) = fetch_master(&mut *conn, key).await? else {
            return Ok(None);
        };

        let tables = child_keys(&master);
        let values = if tables.is_empty() {
            Vec::new()
        } else {
            let keys: Vec<&str> = tables.iter().map(|(_, key)| key.as_str()).collect();
            redis::cmd("MGET")
                .arg(&keys)
                .query_async::<Vec<Option<String>>>(&mut *conn)
                .await
                .map_err(redis_error)?
        };
        let children = pair_children(tables, values)?;
        assemble_snapshot(key, master, children).map(Some)
    }

    async fn ping(&self) -> Result<(), ReferenceCacheError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map(|_| ())
            .map_err(redis_error)
    }
}

/// Read and decode the master record under `key`.
///
/// An unreadable master is logged and treated as absent so an older snapshot
/// can still be served.
async fn fetch_master<C>(
    conn: &mut C,
    key: &SnapshotKey,
) -> Result<Option<MasterRecord>, ReferenceCacheError>
where
    C: redis::aio::ConnectionLike + Send,
{
    let raw = redis::cmd("GET")
        .arg(key.master_key())
        .query_async::<Option<String>>(conn)
        .await
        .map_err(redis_error)?;
    Ok(raw.and_then(|raw| match decode_master(&raw) {
        Ok(master) => Some(master),
        Err(error) => {
            warn!(%key, %error, "unreadable master record");
            None
        }
    }))
}
