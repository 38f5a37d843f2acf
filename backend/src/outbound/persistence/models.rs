//! Internal Diesel row structs.

use diesel::prelude::*;
use diesel::sql_types::Json;

use super::schema::extractions;

/// Scope columns of one extraction.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = extractions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ExtractionScopeRow {
    pub cluster: Option<String>,
    pub customer: Option<String>,
    pub material_type: Option<String>,
}

/// A reference row rendered by `row_to_json`.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct JsonRow {
    #[diesel(sql_type = Json)]
    pub row: serde_json::Value,
}
