//! PostgreSQL-backed `ExtractionScopeLookup` adapter.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::Scope;
use crate::domain::ports::{ExtractionScopeLookup, ExtractionScopeLookupError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::ExtractionScopeRow;
use super::pool::DbPool;
use super::schema::extractions;

/// Reads the scope columns of the `extractions` table.
#[derive(Clone)]
pub struct DieselExtractionScopeLookup {
    pool: DbPool,
}

impl DieselExtractionScopeLookup {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_scope(
    extraction_id: Uuid,
    row: ExtractionScopeRow,
) -> Result<Scope, ExtractionScopeLookupError> {
    let ExtractionScopeRow {
        cluster,
        customer,
        material_type,
    } = row;
    let (Some(cluster), Some(customer), Some(material_type)) = (cluster, customer, material_type)
    else {
        return Err(ExtractionScopeLookupError::incomplete(extraction_id));
    };
    Scope::new(cluster, customer, material_type)
        .map_err(|_| ExtractionScopeLookupError::incomplete(extraction_id))
}

#[async_trait]
impl ExtractionScopeLookup for DieselExtractionScopeLookup {
    async fn scope_for(&self, extraction_id: Uuid) -> Result<Scope, ExtractionScopeLookupError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ExtractionScopeLookupError::connection))?;

        let row = extractions::table
            .filter(extractions::id.eq(extraction_id))
            .select(ExtractionScopeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_diesel_error(
                    err,
                    ExtractionScopeLookupError::query,
                    ExtractionScopeLookupError::connection,
                )
            })?;

        match row {
            Some(row) => row_to_scope(extraction_id, row),
            None => Err(ExtractionScopeLookupError::not_found(extraction_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(cluster: Option<&str>, customer: Option<&str>, material_type: Option<&str>) -> ExtractionScopeRow {
        ExtractionScopeRow {
            cluster: cluster.map(str::to_owned),
            customer: customer.map(str::to_owned),
            material_type: material_type.map(str::to_owned),
        }
    }

    #[rstest]
    fn complete_rows_become_scopes() {
        let scope = row_to_scope(Uuid::nil(), row(Some("Knits"), Some("Acme"), Some("Fabric")))
            .expect("complete scope");
        assert_eq!(scope, Scope::new("Knits", "Acme", "Fabric").expect("scope"));
    }

    #[rstest]
    #[case(row(None, Some("Acme"), Some("Fabric")))]
    #[case(row(Some("Knits"), Some(""), Some("Fabric")))]
    #[case(row(Some("Knits"), Some("Acme"), None))]
    fn missing_or_blank_columns_are_incomplete(#[case] input: ExtractionScopeRow) {
        let err = row_to_scope(Uuid::nil(), input).expect_err("incomplete");
        assert_eq!(err, ExtractionScopeLookupError::incomplete(Uuid::nil()));
    }
}
