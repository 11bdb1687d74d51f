//! Organizations
//!
//! An organization is the tenant boundary: tasks belong to exactly one
//! organization and users reach them through memberships. Each organization
//! carries a rotatable invite code that lets users join on their own.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE organizations (
//!     id UUID PRIMARY KEY,
//!     name VARCHAR(255) NOT NULL,
//!     invite_code VARCHAR(32) NOT NULL UNIQUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suffix appended to a username to name its personal organization
pub const PERSONAL_ORGANIZATION_SUFFIX: &str = "'s organization";

/// An organization (tenant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Display name, never blank
    pub name: String,

    /// Current invite code
    ///
    /// Rotating it invalidates the previous code immediately.
    pub invite_code: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Builds a new organization with a fresh ID, stamped at `now`
    pub fn new(name: impl Into<String>, invite_code: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            invite_code: invite_code.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Name of the personal organization created for `username` at signup
    pub fn personal_name(username: &str) -> String {
        format!("{username}{PERSONAL_ORGANIZATION_SUFFIX}")
    }
}
