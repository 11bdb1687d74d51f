//! # TeamTask Shared Library
//!
//! Domain model, persistence and business rules of TeamTask, used by the
//! HTTP API server.
//!
//! ## Module Organization
//!
//! - `models`: users, organizations, memberships and tasks
//! - `store`: persistence traits with PostgreSQL and in-memory adapters
//! - `services`: membership, task, organization and account services
//! - `ai`: free-text task extraction
//! - `auth`: password hashing and JWT
//! - `invite`: invite code generation
//! - `clock`: injectable time source
//! - `db`: connection pool and migrations

pub mod ai;
pub mod auth;
pub mod clock;
pub mod db;
pub mod invite;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the TeamTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
