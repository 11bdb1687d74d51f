/// Access gates for organization and task routes
///
/// Run before the service call a handler makes. A caller who is not a member
/// of the organization gets a 404, the same answer as for a missing resource.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use teamtask_shared::models::{OrganizationMember, TaskDetails};
use teamtask_shared::services::DomainError;
use uuid::Uuid;

fn hide_non_member(err: DomainError, resource: &str) -> ApiError {
    match err {
        DomainError::NotOrganizationMember => {
            tracing::debug!(resource, "Access denied to non-member");
            ApiError::NotFound(format!("{} not found", resource))
        }
        other => other.into(),
    }
}

/// Requires `user_id` to be a member of the organization
pub async fn organization_member(state: &AppState, organization_id: Uuid, user_id: Uuid) -> ApiResult<OrganizationMember> {
    state
        .membership
        .ensure_member(organization_id, user_id)
        .await
        .map_err(|err| hide_non_member(err, "organization"))
}

/// Requires `user_id` to own the organization; members who are not owners get a 403
pub async fn organization_owner(state: &AppState, organization_id: Uuid, user_id: Uuid) -> ApiResult<OrganizationMember> {
    let member = organization_member(state, organization_id, user_id).await?;

    if !member.role.is_owner() {
        tracing::debug!(%organization_id, %user_id, "Owner-only action refused");
        return Err(DomainError::NotOrganizationOwner.into());
    }

    Ok(member)
}

/// Loads the task and requires membership of its organization
pub async fn task_member(state: &AppState, task_id: Uuid, user_id: Uuid) -> ApiResult<TaskDetails> {
    let details = state.tasks.get_task(task_id).await?;

    state
        .membership
        .ensure_member(details.task.organization_id, user_id)
        .await
        .map_err(|err| hide_non_member(err, "task"))?;

    Ok(details)
}
