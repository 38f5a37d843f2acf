//! Driven port reading reference tables from the relational store.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{ReferenceRow, ReferenceTable, ScopeFilter};

define_port_error! {
    /// Errors raised while querying reference tables.
    pub enum ReferenceQueryError {
        /// A pooled connection could not be obtained.
        Connection { message: String } =>
            "reference store connection failed: {message}",
        /// The query itself failed.
        Query { message: String } =>
            "reference query failed: {message}",
    }
}

/// Read-only access to the six reference tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceQuery: Send + Sync {
    /// Fetch every row of `table` matching `filter`, in stored order.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use reference_enrichment::domain::{ReferenceTable, ScopeFilter};
    /// use reference_enrichment::domain::ports::{FixtureReferenceQuery, ReferenceQuery};
    ///
    /// let rows = FixtureReferenceQuery
    ///     .fetch_rows(ReferenceTable::Composition, &ScopeFilter::default())
    ///     .await?;
    /// assert!(rows.is_empty());
    /// # Ok::<(), reference_enrichment::domain::ports::ReferenceQueryError>(())
    /// ```
    async fn fetch_rows(
        &self,
        table: ReferenceTable,
        filter: &ScopeFilter,
    ) -> Result<Vec<ReferenceRow>, ReferenceQueryError>;
}

/// Fixture returning no rows for every table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureReferenceQuery;

#[async_trait]
impl ReferenceQuery for FixtureReferenceQuery {
    async fn fetch_rows(
        &self,
        _table: ReferenceTable,
        _filter: &ScopeFilter,
    ) -> Result<Vec<ReferenceRow>, ReferenceQueryError> {
        Ok(Vec::new())
    }
}
