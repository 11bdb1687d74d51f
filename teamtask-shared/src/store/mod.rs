//! Persistence ports
//!
//! One trait per entity family. Services hold them as `Arc<dyn ...>` so the
//! PostgreSQL adapter in [`postgres`] and the in-memory adapter in [`memory`]
//! are interchangeable.
//!
//! Operations that touch several rows as one unit (signup, organization
//! creation, task creation with self-assignment, task and organization
//! deletion) are single trait methods so each adapter can make them atomic.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    MemberProfile, Organization, OrganizationMember, OrganizationMembership, Task, TaskDetails, TaskPage,
    TaskStatus, User,
};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Unique constraint on `users.username`
pub const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Unique constraint on `organizations.invite_code`
pub const INVITE_CODE_CONSTRAINT: &str = "organizations_invite_code_key";

/// Errors returned by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row the operation needs does not exist
    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write; carries the constraint name
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// Database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store cannot serve requests (e.g. poisoned lock)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    /// True when the write was rejected by the named unique constraint
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, StoreError::Conflict(name) if name == constraint)
    }
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Creates a user, its personal organization and the owner membership
    /// as one unit
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the username or invite code is
    /// taken; nothing is written in that case.
    async fn create_with_personal_organization(
        &self,
        user: &User,
        organization: &Organization,
        owner: &OrganizationMember,
    ) -> StoreResult<()>;
}

/// Organization and membership persistence
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Creates an organization and its first owner membership as one unit
    async fn create_organization(&self, organization: &Organization, owner: &OrganizationMember) -> StoreResult<()>;

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>>;

    async fn find_organization_by_invite_code(&self, code: &str) -> StoreResult<Option<Organization>>;

    /// Persists name, invite code and `updated_at`
    ///
    /// Returns [`StoreError::NotFound`] when the organization does not exist.
    async fn update_organization(&self, organization: &Organization) -> StoreResult<()>;

    /// Deletes the organization with its tasks, assignments and memberships
    ///
    /// Returns `false` when the organization did not exist.
    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_member(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<Option<OrganizationMember>>;

    /// Returns [`StoreError::Conflict`] when the pair already has a row.
    async fn add_member(&self, member: &OrganizationMember) -> StoreResult<()>;

    /// Returns `false` when no membership row existed.
    async fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Members ordered by join time
    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<MemberProfile>>;

    /// Organizations the user belongs to, ordered by join time
    async fn list_memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<OrganizationMembership>>;
}

/// Ordering of task listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSort {
    /// Newest first
    #[default]
    CreatedDesc,

    /// Earliest due date first, tasks without a due date last
    DueDateAsc,
}

/// Store-level task listing filter
///
/// Every predicate that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Tasks must belong to one of these organizations
    pub organization_ids: Vec<Uuid>,

    pub status: Option<TaskStatus>,

    /// Tasks must have an assignment row for this user
    pub assigned_to: Option<Uuid>,

    /// Half-open due date range `[from, to)`
    pub due_between: Option<(DateTime<Utc>, DateTime<Utc>)>,

    pub sort: TaskSort,

    /// `(offset, limit)`; `None` returns every match
    pub page: Option<(u64, u64)>,
}

/// Task and assignment persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts the task and assigns its creator as one unit
    async fn create_task(&self, task: &Task, assigned_at: DateTime<Utc>) -> StoreResult<()>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Task with creator, organization and assignees attached
    async fn find_task_details(&self, id: Uuid) -> StoreResult<Option<TaskDetails>>;

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<TaskPage>;

    /// Persists title, description, status, due date and `updated_at`
    ///
    /// Returns [`StoreError::NotFound`] when the task does not exist.
    async fn update_task(&self, task: &Task) -> StoreResult<()>;

    /// Deletes the task and its assignments as one unit
    ///
    /// Returns `false` when the task did not exist.
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Inserts assignment rows, leaving existing ones untouched
    async fn assign_users(&self, task_id: Uuid, user_ids: &[Uuid], assigned_at: DateTime<Utc>) -> StoreResult<()>;

    /// Deletes assignment rows; missing rows are ignored
    async fn unassign_users(&self, task_id: Uuid, user_ids: &[Uuid]) -> StoreResult<()>;

    async fn is_assigned(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Number of `user_ids` that are existing users and current members of
    /// the organization
    async fn count_assignable_users(&self, organization_id: Uuid, user_ids: &[Uuid]) -> StoreResult<u64>;
}
