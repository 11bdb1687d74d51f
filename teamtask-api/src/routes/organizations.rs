/// Organization endpoints
///
/// # Endpoints
///
/// - `POST /v1/organizations` - Create an organization owned by the caller
/// - `GET /v1/organizations` - Organizations the caller belongs to, with role
/// - `POST /v1/organizations/join` - Join by invite code
/// - `GET /v1/organizations/:id` - Organization with members (members only)
/// - `PUT /v1/organizations/:id` - Rename (owners only)
/// - `DELETE /v1/organizations/:id` - Delete with all tasks (owners only)
/// - `POST /v1/organizations/:id/regenerate-code` - New invite code (owners only)
/// - `DELETE /v1/organizations/:id/members/:user_id` - Remove a member (owners only)

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::{access, auth::CurrentUser},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use teamtask_shared::models::{Organization, OrganizationMembership, OrganizationWithMembers};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct OrganizationNameRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, message = "Invite code is required"))]
    pub invite_code: String,
}

pub async fn create_organization(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<OrganizationNameRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    req.validate()?;

    let organization = state.organizations.create_organization(&req.name, current.id).await?;

    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn list_organizations(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<OrganizationMembership>>> {
    Ok(Json(state.organizations.list_organizations_for_user(current.id).await?))
}

/// Joins the organization holding `invite_code`
///
/// # Errors
///
/// - `400 Bad Request`: Unknown or rotated invite code
/// - `409 Conflict`: Already a member
pub async fn join_organization(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<JoinRequest>,
) -> ApiResult<Json<Organization>> {
    req.validate()?;

    Ok(Json(
        state
            .organizations
            .join_by_invite_code(current.id, &req.invite_code)
            .await?,
    ))
}

pub async fn get_organization(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrganizationWithMembers>> {
    access::organization_member(&state, id, current.id).await?;

    Ok(Json(state.organizations.get_organization_with_members(id).await?))
}

pub async fn update_organization(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<OrganizationNameRequest>,
) -> ApiResult<Json<Organization>> {
    req.validate()?;
    access::organization_owner(&state, id, current.id).await?;

    Ok(Json(state.organizations.update_organization_name(id, &req.name).await?))
}

pub async fn delete_organization(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    access::organization_owner(&state, id, current.id).await?;
    state.organizations.delete_organization(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn regenerate_invite_code(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Organization>> {
    access::organization_owner(&state, id, current.id).await?;

    Ok(Json(state.organizations.regenerate_invite_code(id).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    access::organization_owner(&state, id, current.id).await?;
    state.organizations.remove_member(id, current.id, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
