//! Membership resolver
//!
//! Decides which organizations a user may act within. Every organization-
//! and task-scoped operation goes through here; nothing is cached, so each
//! call sees the current membership rows.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::error::{DomainError, DomainResult, StoreResultExt};
use crate::models::OrganizationMember;
use crate::store::OrganizationStore;

#[derive(Clone)]
pub struct MembershipResolver {
    organizations: Arc<dyn OrganizationStore>,
}

impl MembershipResolver {
    pub fn new(organizations: Arc<dyn OrganizationStore>) -> Self {
        Self { organizations }
    }

    /// Organizations the user may query tasks within
    ///
    /// With a specific organization, returns it alone after checking
    /// membership. Without one, returns every organization the user belongs
    /// to, possibly none.
    ///
    /// # Errors
    ///
    /// - `NotOrganizationMember` when the requested organization does not
    ///   have the user as a member
    pub async fn resolve_accessible_organizations(
        &self,
        user_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> DomainResult<Vec<Uuid>> {
        if let Some(organization_id) = organization_id {
            self.ensure_member(organization_id, user_id).await?;
            return Ok(vec![organization_id]);
        }

        let memberships = self
            .organizations
            .list_memberships_for_user(user_id)
            .await
            .context("list memberships")?;

        Ok(memberships
            .into_iter()
            .map(|membership| membership.organization.id)
            .collect())
    }

    /// Returns the membership row, or `NotOrganizationMember` when there is none
    pub async fn ensure_member(&self, organization_id: Uuid, user_id: Uuid) -> DomainResult<OrganizationMember> {
        match self
            .organizations
            .find_member(organization_id, user_id)
            .await
            .context("check organization membership")?
        {
            Some(member) => Ok(member),
            None => {
                debug!(%organization_id, %user_id, "Rejected non-member");
                Err(DomainError::NotOrganizationMember)
            }
        }
    }

    /// Like [`ensure_member`](Self::ensure_member), additionally requiring the owner role
    pub async fn ensure_owner(&self, organization_id: Uuid, user_id: Uuid) -> DomainResult<OrganizationMember> {
        let member = self.ensure_member(organization_id, user_id).await?;
        if !member.role.is_owner() {
            debug!(%organization_id, %user_id, "Rejected non-owner");
            return Err(DomainError::NotOrganizationOwner);
        }
        Ok(member)
    }
}
