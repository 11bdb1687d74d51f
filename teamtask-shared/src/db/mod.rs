//! Database plumbing
//!
//! - `pool`: PostgreSQL connection pool with health checks
//! - `migrations`: embedded schema migrations
//!
//! Queries live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
