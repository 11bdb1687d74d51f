//! Organization domain service
//!
//! Lifecycle of organizations: creation with an owner, rename, cascading
//! deletion, invite code rotation, join by invite and member removal. Owner
//! checks for the mutating operations happen before these methods are called
//! (see [`MembershipResolver::ensure_owner`]).

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{DomainError, DomainResult, StoreResultExt};
use super::membership::MembershipResolver;
use crate::clock::Clock;
use crate::invite::{InviteCodeError, InviteCodeGenerator};
use crate::models::{Organization, OrganizationMember, OrganizationMembership, OrganizationRole, OrganizationWithMembers};
use crate::store::{OrganizationStore, StoreError, INVITE_CODE_CONSTRAINT};

#[derive(Clone)]
pub struct OrganizationService {
    organizations: Arc<dyn OrganizationStore>,
    invite_codes: Arc<dyn InviteCodeGenerator>,
    clock: Arc<dyn Clock>,
    membership: MembershipResolver,
}

impl OrganizationService {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        invite_codes: Arc<dyn InviteCodeGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let membership = MembershipResolver::new(organizations.clone());
        Self {
            organizations,
            invite_codes,
            clock,
            membership,
        }
    }

    pub fn membership(&self) -> &MembershipResolver {
        &self.membership
    }

    /// Creates an organization owned by `owner_id`
    ///
    /// The organization and the owner membership are written as one unit.
    pub async fn create_organization(&self, name: &str, owner_id: Uuid) -> DomainResult<Organization> {
        let name = validate_name(name)?;
        let invite_code = self.new_invite_code()?;
        let now = self.clock.now();

        let organization = Organization::new(name, invite_code, now);
        let owner = OrganizationMember::new(organization.id, owner_id, OrganizationRole::Owner, now);

        match self.organizations.create_organization(&organization, &owner).await {
            Ok(()) => {}
            Err(err) if err.is_conflict_on(INVITE_CODE_CONSTRAINT) => {
                return Err(DomainError::InviteCodeGenerationFailed(InviteCodeError::Collision))
            }
            Err(source) => {
                return Err(DomainError::Storage {
                    operation: "create organization",
                    source,
                })
            }
        }

        info!(organization_id = %organization.id, user_id = %owner_id, "Organization created");
        Ok(organization)
    }

    /// Every organization the user belongs to, with role and join time
    pub async fn list_organizations_for_user(&self, user_id: Uuid) -> DomainResult<Vec<OrganizationMembership>> {
        self.organizations
            .list_memberships_for_user(user_id)
            .await
            .context("list organizations")
    }

    pub async fn get_organization_with_members(&self, organization_id: Uuid) -> DomainResult<OrganizationWithMembers> {
        let organization = self.find_organization(organization_id).await?;
        let members = self
            .organizations
            .list_members(organization_id)
            .await
            .context("list organization members")?;

        Ok(OrganizationWithMembers { organization, members })
    }

    pub async fn update_organization_name(&self, organization_id: Uuid, name: &str) -> DomainResult<Organization> {
        let name = validate_name(name)?;
        let mut organization = self.find_organization(organization_id).await?;

        organization.name = name.to_string();
        organization.updated_at = self.clock.now();
        self.save(&organization, "update organization").await?;

        info!(%organization_id, "Organization renamed");
        Ok(organization)
    }

    /// Deletes the organization with its tasks, assignments and memberships
    pub async fn delete_organization(&self, organization_id: Uuid) -> DomainResult<()> {
        let deleted = self
            .organizations
            .delete_organization(organization_id)
            .await
            .context("delete organization")?;

        if !deleted {
            return Err(DomainError::OrganizationNotFound);
        }

        info!(%organization_id, "Organization deleted");
        Ok(())
    }

    /// Joins the organization whose current invite code is `code`
    pub async fn join_by_invite_code(&self, user_id: Uuid, code: &str) -> DomainResult<Organization> {
        let organization = self
            .organizations
            .find_organization_by_invite_code(code.trim())
            .await
            .context("look up invite code")?
            .ok_or(DomainError::InvalidInviteCode)?;

        if self
            .organizations
            .find_member(organization.id, user_id)
            .await
            .context("check organization membership")?
            .is_some()
        {
            return Err(DomainError::AlreadyOrganizationMember);
        }

        let member = OrganizationMember::new(organization.id, user_id, OrganizationRole::Member, self.clock.now());
        match self.organizations.add_member(&member).await {
            Ok(()) => {}
            // Lost a race with a concurrent join of the same user
            Err(StoreError::Conflict(_)) => return Err(DomainError::AlreadyOrganizationMember),
            Err(source) => {
                return Err(DomainError::Storage {
                    operation: "add organization member",
                    source,
                })
            }
        }

        info!(organization_id = %organization.id, %user_id, "User joined organization");
        Ok(organization)
    }

    /// Replaces the invite code; the old code stops working immediately
    ///
    /// A new code that collides with another organization's fails
    /// `InviteCodeGenerationFailed` and leaves the current code in place.
    pub async fn regenerate_invite_code(&self, organization_id: Uuid) -> DomainResult<Organization> {
        let mut organization = self.find_organization(organization_id).await?;

        organization.invite_code = self.new_invite_code()?;
        organization.updated_at = self.clock.now();
        self.save(&organization, "update invite code").await?;

        info!(%organization_id, "Invite code regenerated");
        Ok(organization)
    }

    /// Removes `target_id` from the organization
    ///
    /// Nothing prevents removing the last owner.
    pub async fn remove_member(&self, organization_id: Uuid, actor_id: Uuid, target_id: Uuid) -> DomainResult<()> {
        if actor_id == target_id {
            debug!(%organization_id, user_id = %actor_id, "Rejected self-removal");
            return Err(DomainError::CannotRemoveYourself);
        }

        let removed = self
            .organizations
            .remove_member(organization_id, target_id)
            .await
            .context("remove organization member")?;

        if !removed {
            return Err(DomainError::OrganizationMemberNotFound);
        }

        info!(%organization_id, user_id = %actor_id, removed_user_id = %target_id, "Member removed");
        Ok(())
    }

    async fn find_organization(&self, organization_id: Uuid) -> DomainResult<Organization> {
        self.organizations
            .find_organization(organization_id)
            .await
            .context("fetch organization")?
            .ok_or(DomainError::OrganizationNotFound)
    }

    async fn save(&self, organization: &Organization, operation: &'static str) -> DomainResult<()> {
        match self.organizations.update_organization(organization).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(DomainError::OrganizationNotFound),
            Err(err) if err.is_conflict_on(INVITE_CODE_CONSTRAINT) => {
                Err(DomainError::InviteCodeGenerationFailed(InviteCodeError::Collision))
            }
            Err(source) => Err(DomainError::Storage { operation, source }),
        }
    }

    fn new_invite_code(&self) -> DomainResult<String> {
        self.invite_codes
            .generate()
            .map_err(DomainError::InviteCodeGenerationFailed)
    }
}

/// Rejects blank names; accepted names are kept as given
fn validate_name(name: &str) -> DomainResult<&str> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidOrganizationName);
    }
    Ok(name)
}
