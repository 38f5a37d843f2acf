//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **cache**: Redis-backed and in-memory reference snapshot caches
//! - **persistence**: PostgreSQL reference and extraction reads via Diesel
//! - **reasoning**: chat-completion client for the reasoning port
//!
//! Adapters translate between domain types and wire representations. They
//! contain no business logic.

pub mod cache;
pub mod persistence;
mod pool;
pub mod reasoning;

pub use pool::{PoolConfig, PoolError};
