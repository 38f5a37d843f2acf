//! Reference snapshot cache adapters.
//!
//! [`RedisReferenceCache`] is the production store; [`InMemoryReferenceCache`]
//! keeps the same record layout in process for local runs and tests. Both
//! encode snapshots through the private `records` module and choose the
//! latest snapshot through `selection`.

mod memory;
mod pool;
mod records;
mod redis_reference_cache;
mod selection;

pub use memory::InMemoryReferenceCache;
pub use pool::RedisPool;
pub use redis_reference_cache::RedisReferenceCache;
