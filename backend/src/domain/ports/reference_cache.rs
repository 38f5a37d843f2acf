//! Port for the time-boxed reference snapshot cache.

use async_trait::async_trait;

use super::{SnapshotKey, define_port_error};
use crate::domain::{ReferenceSnapshot, ReferenceTable, Scope};

define_port_error! {
    /// Errors surfaced by reference cache adapters.
    pub enum ReferenceCacheError {
        /// The cache backend could not be reached or timed out.
        Unavailable { message: String } =>
            "reference cache unavailable: {message}",
        /// A stored value could not be encoded or decoded.
        Serialization { message: String } =>
            "reference cache serialisation failed: {message}",
    }
}

/// A snapshot read back from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRead {
    pub key: SnapshotKey,
    pub snapshot: ReferenceSnapshot,
    /// Tables whose keys had expired or vanished; they read back empty.
    pub missing_tables: Vec<ReferenceTable>,
}

impl SnapshotRead {
    /// Whether every table key was present.
    pub fn is_complete(&self) -> bool {
        self.missing_tables.is_empty()
    }
}

/// Snapshot storage keyed by scope and build timestamp.
///
/// Every key written for a snapshot shares one expiry; expired snapshots are
/// indistinguishable from snapshots that were never written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceCache: Send + Sync {
    /// Store the master record and every table record in one atomic write.
    async fn write_snapshot(
        &self,
        snapshot: &ReferenceSnapshot,
    ) -> Result<SnapshotKey, ReferenceCacheError>;

    /// Return the key of the newest live snapshot for `scope`.
    async fn find_latest_snapshot_key(
        &self,
        scope: &Scope,
    ) -> Result<Option<SnapshotKey>, ReferenceCacheError>;

    /// Read a snapshot; `None` when its master record is gone.
    async fn read_snapshot(
        &self,
        key: &SnapshotKey,
    ) -> Result<Option<SnapshotRead>, ReferenceCacheError>;

    /// Connectivity probe used by readiness checks.
    async fn ping(&self) -> Result<(), ReferenceCacheError>;
}
