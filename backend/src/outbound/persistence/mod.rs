//! PostgreSQL read adapters using Diesel.
//!
//! The relational store is read-only from this service: reference tables are
//! snapshotted into the cache and extractions are looked up for their scope.
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay private
//! to this module.
//!
//! # Example
//!
//! ```ignore
//! use reference_enrichment::outbound::PoolConfig;
//! use reference_enrichment::outbound::persistence::{DbPool, DieselReferenceQuery};
//!
//! let pool = DbPool::new(PoolConfig::postgres("postgres://localhost/reference")).await?;
//! let query = DieselReferenceQuery::new(pool);
//! ```

mod diesel_extraction_scope_lookup;
mod diesel_reference_query;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_extraction_scope_lookup::DieselExtractionScopeLookup;
pub use diesel_reference_query::DieselReferenceQuery;
pub use pool::DbPool;
