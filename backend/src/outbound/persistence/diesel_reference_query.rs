//! PostgreSQL-backed `ReferenceQuery` adapter.
//!
//! Reference tables differ in shape, so rows are rendered server-side with
//! `row_to_json` and decoded as JSON objects. Scope predicates become
//! `ILIKE '%value%'` clauses with LIKE metacharacters escaped.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;
use serde_json::Value;

use crate::domain::ports::{ReferenceQuery, ReferenceQueryError};
use crate::domain::{ReferenceRow, ReferenceTable, ScopeFilter};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::JsonRow;
use super::pool::DbPool;

/// Diesel-backed reader for the six reference tables.
#[derive(Clone)]
pub struct DieselReferenceQuery {
    pool: DbPool,
}

impl DieselReferenceQuery {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// SQL text and ILIKE patterns for one table read.
#[derive(Debug, PartialEq, Eq)]
struct ReferenceSelect {
    sql: String,
    patterns: Vec<String>,
}

fn build_select(table: ReferenceTable, filter: &ScopeFilter) -> ReferenceSelect {
    let predicates = [
        ("cluster", filter.cluster.as_deref()),
        ("customer", filter.customer.as_deref()),
        ("material_type", filter.material_type.as_deref()),
    ];

    let mut clauses = Vec::new();
    let mut patterns = Vec::new();
    for (column, value) in predicates {
        let Some(value) = value else { continue };
        patterns.push(format!("%{}%", escape_like(value)));
        clauses.push(format!("{column} ILIKE ${}", patterns.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    ReferenceSelect {
        sql: format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {}{where_clause}) t",
            table.source_table()
        ),
        patterns,
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn into_reference_row(table: ReferenceTable, row: JsonRow) -> Result<ReferenceRow, ReferenceQueryError> {
    match row.row {
        Value::Object(map) => Ok(map),
        other => Err(ReferenceQueryError::query(format!(
            "{table} row is not an object: {other}"
        ))),
    }
}

#[async_trait]
impl ReferenceQuery for DieselReferenceQuery {
    async fn fetch_rows(
        &self,
        table: ReferenceTable,
        filter: &ScopeFilter,
    ) -> Result<Vec<ReferenceRow>, ReferenceQueryError> {
        let select = build_select(table, filter);
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ReferenceQueryError::connection))?;

        let query = select
            .patterns
            .into_iter()
            .fold(diesel::sql_query(select.sql).into_boxed::<Pg>(), |query, pattern| {
                query.bind::<Text, _>(pattern)
            });
        let rows: Vec<JsonRow> = query.load(&mut conn).await.map_err(|err| {
            map_diesel_error(err, ReferenceQueryError::query, ReferenceQueryError::connection)
        })?;

        rows.into_iter()
            .map(|row| into_reference_row(table, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn filter(cluster: Option<&str>, customer: Option<&str>, material_type: Option<&str>) -> ScopeFilter {
        ScopeFilter {
            cluster: cluster.map(str::to_owned),
            customer: customer.map(str::to_owned),
            material_type: material_type.map(str::to_owned),
        }
    }

    #[rstest]
    fn full_scan_has_no_predicates() {
        let select = build_select(ReferenceTable::Composition, &ScopeFilter::default());
        assert_eq!(
            select.sql,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM composition) t"
        );
        assert!(select.patterns.is_empty());
    }

    #[rstest]
    fn scoped_read_numbers_placeholders_in_order() {
        let select = build_select(
            ReferenceTable::MaterialSecurityGroups,
            &filter(Some("Knits"), Some("Acme"), Some("Fabric")),
        );
        assert_eq!(
            select.sql,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM material_security_group \
             WHERE cluster ILIKE $1 AND customer ILIKE $2 AND material_type ILIKE $3) t"
        );
        assert_eq!(select.patterns, ["%Knits%", "%Acme%", "%Fabric%"]);
    }

    #[rstest]
    fn like_metacharacters_are_escaped() {
        let select = build_select(ReferenceTable::Suppliers, &filter(Some("50%_off\\"), None, None));
        assert_eq!(select.patterns, [r"%50\%\_off\\%"]);
    }

    #[rstest]
    fn non_object_rows_are_rejected() {
        let err = into_reference_row(ReferenceTable::Customers, JsonRow { row: json!([1, 2]) })
            .expect_err("arrays are not rows");
        assert!(matches!(err, ReferenceQueryError::Query { .. }));
    }
}
