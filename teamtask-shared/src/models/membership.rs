//! Organization memberships
//!
//! A membership links a user to an organization with a role. It is the unit
//! of multi-tenant access control: every organization- or task-scoped
//! operation checks for a membership row at call time.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE organization_role AS ENUM ('owner', 'member');
//!
//! CREATE TABLE organization_members (
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     role organization_role NOT NULL,
//!     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (organization_id, user_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::organization::Organization;
use super::user::UserSummary;

/// Role of a member within an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "organization_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrganizationRole {
    /// Can rename, delete, rotate the invite code and remove members
    Owner,

    /// Can work with the organization's tasks
    Member,
}

impl OrganizationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationRole::Owner => "owner",
            OrganizationRole::Member => "member",
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, OrganizationRole::Owner)
    }
}

/// Membership row, unique per (organization, user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrganizationMember {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrganizationRole,
    pub joined_at: DateTime<Utc>,
}

impl OrganizationMember {
    pub fn new(organization_id: Uuid, user_id: Uuid, role: OrganizationRole, joined_at: DateTime<Utc>) -> Self {
        Self {
            organization_id,
            user_id,
            role,
            joined_at,
        }
    }
}

/// One organization a user belongs to, with the user's role in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    pub organization: Organization,
    pub role: OrganizationRole,
    pub joined_at: DateTime<Utc>,
}

/// One member of an organization, with the member's public identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub user: UserSummary,
    pub role: OrganizationRole,
    pub joined_at: DateTime<Utc>,
}

/// An organization together with its current members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationWithMembers {
    pub organization: Organization,
    pub members: Vec<MemberProfile>,
}

impl OrganizationWithMembers {
    /// Role of `user_id` in this organization, if they are a member
    pub fn role_of(&self, user_id: Uuid) -> Option<OrganizationRole> {
        self.members
            .iter()
            .find(|member| member.user.id == user_id)
            .map(|member| member.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(OrganizationRole::Owner.as_str(), "owner");
        assert_eq!(OrganizationRole::Member.as_str(), "member");
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&OrganizationRole::Owner).unwrap();
        assert_eq!(json, "\"owner\"");

        let role: OrganizationRole = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(role, OrganizationRole::Member);
        assert!(!role.is_owner());
    }
}
