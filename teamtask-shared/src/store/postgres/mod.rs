//! PostgreSQL store
//!
//! Implements every store trait over one `PgPool`. Multi-row operations run
//! inside a transaction; unique violations surface as
//! [`StoreError::Conflict`](super::StoreError::Conflict).
//!
//! # Example
//!
//! ```no_run
//! use teamtask_shared::db::pool::{create_pool, DatabaseConfig};
//! use teamtask_shared::store::{PgStore, UserStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig {
//!     url: std::env::var("DATABASE_URL")?,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let store = PgStore::new(pool);
//! let user = store.find_user_by_username("alice").await?;
//! # Ok(())
//! # }
//! ```

mod organizations;
mod tasks;
mod users;

use sqlx::PgPool;

use super::StoreError;

/// PostgreSQL-backed implementation of the store traits
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations to `Conflict`, everything else to `Database`
pub(crate) fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::Conflict(constraint);
        }
    }
    StoreError::Database(err)
}
