//! Tasks and task assignments
//!
//! A task belongs to exactly one organization and has exactly one creator.
//! Its status is either `TODO` or `DONE`; the creator is assigned to it at
//! creation time and may assign other current members of the organization.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_status AS ENUM ('TODO', 'DONE');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     creator_id UUID NOT NULL REFERENCES users(id),
//!     title TEXT NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     status task_status NOT NULL DEFAULT 'TODO',
//!     due_date TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE task_assignments (
//!     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id),
//!     assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (task_id, user_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::organization::Organization;
use super::user::UserSummary;

/// Task status
///
/// Exactly two states; toggling flips between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::Done => "DONE",
        }
    }

    /// The other status
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Todo => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Todo,
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(TaskStatus::Todo),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// A task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning organization; never changes after creation
    pub organization_id: Uuid,

    /// User who created the task
    pub creator_id: Uuid,

    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id
    }
}

/// Assignment row, unique per (task, user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskAssignment {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

/// A task with its creator, organization and assignees attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    pub task: Task,
    pub creator: UserSummary,
    pub organization: Organization,
    pub assignees: Vec<UserSummary>,
}

impl TaskDetails {
    pub fn is_assigned(&self, user_id: Uuid) -> bool {
        self.assignees.iter().any(|assignee| assignee.id == user_id)
    }
}

/// One page of tasks plus the total number of matches ignoring pagination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<TaskDetails>,
    pub total: u64,
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub organization_id: Uuid,

    /// Acting user; becomes the creator and first assignee
    pub creator_id: Uuid,

    /// Required, must not be blank
    pub title: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Defaults to `TODO`
    pub status: Option<TaskStatus>,

    pub due_date: Option<DateTime<Utc>>,
}

/// How an update treats the due date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueDateUpdate {
    /// Leave the current due date untouched
    #[default]
    Keep,

    /// Remove the due date
    Clear,

    /// Replace the due date
    Set(DateTime<Utc>),
}

impl DueDateUpdate {
    /// Combines an explicit clear flag with an optional new value
    ///
    /// A clear wins over a simultaneous value.
    pub fn from_parts(clear: bool, value: Option<DateTime<Utc>>) -> Self {
        match (clear, value) {
            (true, _) => DueDateUpdate::Clear,
            (false, Some(due)) => DueDateUpdate::Set(due),
            (false, None) => DueDateUpdate::Keep,
        }
    }

    /// Resolves the update against the current due date
    pub fn apply(self, current: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match self {
            DueDateUpdate::Keep => current,
            DueDateUpdate::Clear => None,
            DueDateUpdate::Set(due) => Some(due),
        }
    }
}

/// Partial update of a task; only present fields are applied
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: DueDateUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_toggle_is_symmetric() {
        assert_eq!(TaskStatus::Todo.toggled(), TaskStatus::Done);
        assert_eq!(TaskStatus::Done.toggled(), TaskStatus::Todo);
        assert_eq!(TaskStatus::Todo.toggled().toggled(), TaskStatus::Todo);
    }

    #[test]
    fn test_status_default_is_todo() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&TaskStatus::Done).unwrap(), "\"DONE\"");
        assert_eq!("TODO".parse::<TaskStatus>().unwrap(), TaskStatus::Todo);
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_due_date_update_clear_wins() {
        let due = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();

        assert_eq!(DueDateUpdate::from_parts(true, Some(due)), DueDateUpdate::Clear);
        assert_eq!(DueDateUpdate::from_parts(false, Some(due)), DueDateUpdate::Set(due));
        assert_eq!(DueDateUpdate::from_parts(false, None), DueDateUpdate::Keep);
    }

    #[test]
    fn test_due_date_update_apply() {
        let current = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let next = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();

        assert_eq!(DueDateUpdate::Keep.apply(Some(current)), Some(current));
        assert_eq!(DueDateUpdate::Clear.apply(Some(current)), None);
        assert_eq!(DueDateUpdate::Set(next).apply(None), Some(next));
    }
}
