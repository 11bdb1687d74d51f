/// Task endpoints
///
/// # Endpoints
///
/// - `GET /v1/tasks` - List tasks across (or within one of) the caller's organizations
/// - `POST /v1/tasks` - Create a task; the creator is assigned
/// - `POST /v1/tasks/generate` - Extract task candidates from free text (not persisted)
/// - `GET /v1/tasks/:id` - Task with creator, organization and assignees
/// - `PATCH /v1/tasks/:id` - Partial update
/// - `DELETE /v1/tasks/:id` - Delete (creator only)
/// - `POST /v1/tasks/:id/assign` - Assign organization members (creator only)
/// - `POST /v1/tasks/:id/unassign` - Remove assignments (creator only)
/// - `POST /v1/tasks/:id/toggle` - Flip TODO/DONE (creator or assignee)
///
/// Every `:id` route answers 404 unless the caller belongs to the task's
/// organization.

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::{access, auth::CurrentUser},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teamtask_shared::{
    ai::GeneratedTask,
    models::{CreateTask, DueDateUpdate, TaskDetails, TaskStatus, UpdateTask},
    services::TaskQuery,
};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query string of `GET /v1/tasks`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListTasksQuery {
    pub organization_id: Option<Uuid>,

    #[serde(default)]
    pub assigned_to_me: bool,

    /// Due within the server's current local day
    #[serde(default)]
    pub due_today: bool,

    pub status: Option<TaskStatus>,

    /// Ascending due date, undated last; otherwise newest first
    #[serde(default)]
    pub sort_by_due_date: bool,

    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskDetails>,
    pub total: u64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub organization_id: Uuid,

    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Body of `PATCH /v1/tasks/:id`; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub due_date: Option<DateTime<Utc>>,

    /// Removes the due date; wins over `due_date`
    #[serde(default)]
    pub clear_due_date: bool,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: DueDateUpdate::from_parts(req.clear_due_date, req.due_date),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateTasksRequest {
    #[validate(length(min = 1, max = 10000, message = "Text must be between 1 and 10000 characters"))]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateTasksResponse {
    pub tasks: Vec<GeneratedTask>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<ListTasksQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    params.validate()?;

    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    let result = state
        .tasks
        .list_tasks(&TaskQuery {
            actor_id: current.id,
            organization_id: params.organization_id,
            assigned_to_me: params.assigned_to_me,
            due_today: params.due_today,
            status: params.status,
            sort_by_due_date: params.sort_by_due_date,
            page,
            page_size,
        })
        .await?;

    let total_pages = result.total.div_ceil(page_size as u64);

    Ok(Json(TaskListResponse {
        tasks: result.tasks,
        total: result.total,
        page,
        page_size,
        total_pages,
    }))
}

pub async fn create_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskDetails>)> {
    req.validate()?;
    access::organization_member(&state, req.organization_id, current.id).await?;

    let task = state
        .tasks
        .create_task(CreateTask {
            organization_id: req.organization_id,
            creator_id: current.id,
            title: req.title,
            description: req.description.unwrap_or_default(),
            status: req.status,
            due_date: req.due_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetails>> {
    Ok(Json(access::task_member(&state, id, current.id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskDetails>> {
    req.validate()?;
    access::task_member(&state, id, current.id).await?;

    Ok(Json(state.tasks.update_task(id, req.into()).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    access::task_member(&state, id, current.id).await?;
    state.tasks.delete_task(id, current.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_users(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignmentRequest>,
) -> ApiResult<Json<TaskDetails>> {
    access::task_member(&state, id, current.id).await?;
    state.tasks.assign_users(id, current.id, &req.user_ids).await?;

    Ok(Json(state.tasks.get_task(id).await?))
}

pub async fn unassign_users(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignmentRequest>,
) -> ApiResult<Json<TaskDetails>> {
    access::task_member(&state, id, current.id).await?;
    state.tasks.unassign_users(id, current.id, &req.user_ids).await?;

    Ok(Json(state.tasks.get_task(id).await?))
}

pub async fn toggle_task_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetails>> {
    access::task_member(&state, id, current.id).await?;

    Ok(Json(state.tasks.toggle_task_status(id, current.id).await?))
}

/// Extracts task candidates from `text`; nothing is stored
///
/// # Errors
///
/// - `503 Service Unavailable`: No AI backend configured
/// - `422 Unprocessable Entity`: No usable tasks in the AI output
/// - `502 Bad Gateway`: The AI call failed or timed out
pub async fn generate_tasks(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<GenerateTasksRequest>,
) -> ApiResult<Json<GenerateTasksResponse>> {
    req.validate()?;

    let tasks = state.tasks.generate_tasks(&req.text, current.id).await?;

    Ok(Json(GenerateTasksResponse { tasks }))
}
