//! Materializes reference snapshots from the relational store into the cache.
//!
//! Builds are normally fire-and-forget: [`ReferenceSnapshotBuilder::spawn_build`]
//! returns at once and the work runs on a Tokio task. A per-scope in-flight
//! guard drops duplicate requests while a build for the same scope is running.
//! A query failure aborts the build before anything is written, so the
//! previously cached snapshot stays the latest.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::try_join_all;
use mockable::Clock;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::ports::{ReferenceCache, ReferenceCacheError, ReferenceQuery, ReferenceQueryError, SnapshotKey};
use super::{ReferenceSnapshot, ReferenceTable, Scope, TableSnapshot, TraceId};

/// Failure of one snapshot build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotBuildError {
    #[error("querying {table} failed: {source}")]
    Query {
        table: ReferenceTable,
        #[source]
        source: ReferenceQueryError,
    },
    #[error(transparent)]
    Cache(#[from] ReferenceCacheError),
}

/// Result of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotBuildOutcome {
    pub key: SnapshotKey,
    pub row_counts: BTreeMap<ReferenceTable, usize>,
}

/// Builds and stores reference snapshots.
pub struct ReferenceSnapshotBuilder {
    query: Arc<dyn ReferenceQuery>,
    cache: Arc<dyn ReferenceCache>,
    clock: Arc<dyn Clock>,
    in_flight: Mutex<HashSet<Scope>>,
}

impl ReferenceSnapshotBuilder {
    pub fn new(
        query: Arc<dyn ReferenceQuery>,
        cache: Arc<dyn ReferenceCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            query,
            cache,
            clock,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Start a background build for `scope`.
    ///
    /// Returns `None` without spawning when a build for the same scope is
    /// already running. The caller's trace id, if any, is carried into the
    /// task.
    pub fn spawn_build(self: &Arc<Self>, scope: Scope) -> Option<JoinHandle<()>> {
        let guard = InFlight::acquire(Arc::clone(self), scope.clone())?;
        let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);
        let builder = Arc::clone(self);

        Some(tokio::spawn(TraceId::scope(trace_id, async move {
            let _guard = guard;
            match builder.build_snapshot(&scope).await {
                Ok(outcome) => info!(
                    %scope,
                    key = %outcome.key,
                    tables = outcome.row_counts.len(),
                    %trace_id,
                    "reference snapshot built"
                ),
                Err(err) => error!(%scope, error = %err, %trace_id, "reference snapshot build failed"),
            }
        })))
    }

    /// Query every table for `scope` and write the snapshot.
    pub async fn build_snapshot(&self, scope: &Scope) -> Result<SnapshotBuildOutcome, SnapshotBuildError> {
        let captured_at = self.clock.utc();
        let tables = try_join_all(ReferenceTable::ALL.into_iter().map(|table| async move {
            let filter = table.scope_filter(scope);
            let rows = self
                .query
                .fetch_rows(table, &filter)
                .await
                .map_err(|source| SnapshotBuildError::Query { table, source })?;
            let snapshot = TableSnapshot::captured(rows, table.query_description(scope), captured_at);
            Ok::<_, SnapshotBuildError>((table, snapshot))
        }))
        .await?;

        let mut snapshot = ReferenceSnapshot::new(scope.clone(), captured_at);
        snapshot.tables.extend(tables);
        let row_counts = snapshot
            .tables
            .iter()
            .map(|(table, rows)| (*table, rows.metadata.row_count))
            .collect();

        let key = self.cache.write_snapshot(&snapshot).await?;
        Ok(SnapshotBuildOutcome { key, row_counts })
    }

    fn in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<Scope>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a scope as being built until dropped.
struct InFlight {
    builder: Arc<ReferenceSnapshotBuilder>,
    scope: Scope,
}

impl InFlight {
    fn acquire(builder: Arc<ReferenceSnapshotBuilder>, scope: Scope) -> Option<Self> {
        if !builder.in_flight().insert(scope.clone()) {
            warn!(%scope, "reference snapshot build already running; skipping");
            return None;
        }
        Some(Self { builder, scope })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.builder.in_flight().remove(&self.scope);
    }
}
