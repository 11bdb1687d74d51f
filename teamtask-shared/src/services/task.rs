//! Task domain service
//!
//! Listing, creation with self-assignment, field updates, deletion, status
//! toggling, assignment management and AI-assisted extraction. Creator and
//! assignee rules are checked here; organization membership of the caller is
//! checked through [`MembershipResolver`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{DomainError, DomainResult, StoreResultExt};
use super::generation::sanitize_generated_tasks;
use super::membership::MembershipResolver;
use crate::ai::{ExtractorError, GeneratedTask, TaskExtractor};
use crate::clock::{local_day_window, Clock};
use crate::models::{CreateTask, Task, TaskDetails, TaskPage, TaskStatus, UpdateTask};
use crate::store::{TaskFilter, TaskSort, TaskStore};

/// Default bound on one extraction call
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Caller-facing listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub actor_id: Uuid,

    /// Restrict to one organization; `None` means every organization the
    /// actor belongs to
    pub organization_id: Option<Uuid>,

    pub assigned_to_me: bool,

    /// Only tasks due within the actor's current local day
    pub due_today: bool,

    pub status: Option<TaskStatus>,

    pub sort_by_due_date: bool,

    /// 1-based; `page <= 0` or `page_size <= 0` disables pagination
    pub page: i64,
    pub page_size: i64,
}

impl TaskQuery {
    fn page_window(&self) -> Option<(u64, u64)> {
        if self.page <= 0 || self.page_size <= 0 {
            return None;
        }
        let page = u64::try_from(self.page - 1).ok()?;
        let size = u64::try_from(self.page_size).ok()?;
        Some((page.saturating_mul(size), size))
    }
}

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    membership: MembershipResolver,
    extractor: Option<Arc<dyn TaskExtractor>>,
    clock: Arc<dyn Clock>,
    extraction_timeout: Duration,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, membership: MembershipResolver, clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks,
            membership,
            extractor: None,
            clock,
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
        }
    }

    /// Enables [`generate_tasks`](Self::generate_tasks)
    pub fn with_extractor(mut self, extractor: Arc<dyn TaskExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    pub fn has_extractor(&self) -> bool {
        self.extractor.is_some()
    }

    pub async fn list_tasks(&self, query: &TaskQuery) -> DomainResult<TaskPage> {
        let organization_ids = self
            .membership
            .resolve_accessible_organizations(query.actor_id, query.organization_id)
            .await?;

        if organization_ids.is_empty() {
            return Ok(TaskPage::default());
        }

        let filter = TaskFilter {
            organization_ids,
            status: query.status,
            assigned_to: query.assigned_to_me.then_some(query.actor_id),
            due_between: query.due_today.then(|| local_day_window(self.clock.local_now())),
            sort: if query.sort_by_due_date {
                TaskSort::DueDateAsc
            } else {
                TaskSort::CreatedDesc
            },
            page: query.page_window(),
        };

        self.tasks.list_tasks(&filter).await.context("list tasks")
    }

    pub async fn get_task(&self, task_id: Uuid) -> DomainResult<TaskDetails> {
        self.tasks
            .find_task_details(task_id)
            .await
            .context("fetch task")?
            .ok_or(DomainError::TaskNotFound)
    }

    /// Creates a task and assigns its creator
    ///
    /// # Errors
    ///
    /// - `TitleRequired` for a missing or empty title
    /// - `NotOrganizationMember` when the creator is not in the organization
    pub async fn create_task(&self, input: CreateTask) -> DomainResult<TaskDetails> {
        let title = match input.title {
            Some(title) if !title.is_empty() => title,
            _ => return Err(DomainError::TitleRequired),
        };

        self.membership
            .ensure_member(input.organization_id, input.creator_id)
            .await?;

        let now = self.clock.now();
        let task = Task {
            id: Uuid::new_v4(),
            organization_id: input.organization_id,
            creator_id: input.creator_id,
            title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };

        self.tasks.create_task(&task, now).await.context("create task")?;

        info!(
            task_id = %task.id,
            organization_id = %task.organization_id,
            user_id = %task.creator_id,
            "Task created"
        );

        self.get_task(task.id).await
    }

    /// Applies the fields present in `patch`
    ///
    /// Any caller who reached the task may edit it; there is no creator rule.
    pub async fn update_task(&self, task_id: Uuid, patch: UpdateTask) -> DomainResult<TaskDetails> {
        let mut task = self.find_task(task_id).await?;

        if let Some(title) = patch.title {
            if title.is_empty() {
                return Err(DomainError::TitleEmpty);
            }
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.due_date = patch.due_date.apply(task.due_date);
        task.updated_at = self.clock.now();

        self.tasks.update_task(&task).await.context("update task")?;

        info!(task_id = %task.id, "Task updated");

        self.get_task(task.id).await
    }

    /// Deletes a task and its assignments; creator only
    pub async fn delete_task(&self, task_id: Uuid, actor_id: Uuid) -> DomainResult<()> {
        let task = self.find_task(task_id).await?;
        Self::ensure_creator(&task, actor_id)?;

        if !self.tasks.delete_task(task_id).await.context("delete task")? {
            return Err(DomainError::TaskNotFound);
        }

        info!(%task_id, user_id = %actor_id, "Task deleted");
        Ok(())
    }

    /// Assigns users to a task; creator only
    ///
    /// Every target must be an existing user and a current member of the
    /// task's organization. Already-assigned users are left untouched.
    pub async fn assign_users(&self, task_id: Uuid, actor_id: Uuid, user_ids: &[Uuid]) -> DomainResult<()> {
        if user_ids.is_empty() {
            return Err(DomainError::NoUserIdsProvided);
        }

        let task = self.find_task(task_id).await?;
        Self::ensure_creator(&task, actor_id)?;

        let unique = dedup_ids(user_ids);

        let assignable = self
            .tasks
            .count_assignable_users(task.organization_id, &unique)
            .await
            .context("validate assignees")?;

        if assignable != unique.len() as u64 {
            debug!(%task_id, requested = unique.len(), assignable, "Rejected assignment");
            return Err(DomainError::InvalidTaskAssignee);
        }

        self.tasks
            .assign_users(task_id, &unique, self.clock.now())
            .await
            .context("assign users")?;

        info!(%task_id, user_id = %actor_id, count = unique.len(), "Users assigned");
        Ok(())
    }

    /// Removes assignments; creator only
    ///
    /// Targets need not be organization members anymore, so assignments left
    /// behind by removed members can be cleaned up.
    pub async fn unassign_users(&self, task_id: Uuid, actor_id: Uuid, user_ids: &[Uuid]) -> DomainResult<()> {
        if user_ids.is_empty() {
            return Err(DomainError::NoUserIdsProvided);
        }

        let task = self.find_task(task_id).await?;
        Self::ensure_creator(&task, actor_id)?;

        let unique = dedup_ids(user_ids);
        self.tasks
            .unassign_users(task_id, &unique)
            .await
            .context("unassign users")?;

        info!(%task_id, user_id = %actor_id, count = unique.len(), "Users unassigned");
        Ok(())
    }

    /// Flips TODO and DONE; creator or assignee only
    pub async fn toggle_task_status(&self, task_id: Uuid, actor_id: Uuid) -> DomainResult<TaskDetails> {
        let mut task = self.find_task(task_id).await?;

        if !task.is_creator(actor_id)
            && !self
                .tasks
                .is_assigned(task_id, actor_id)
                .await
                .context("check task assignment")?
        {
            debug!(%task_id, user_id = %actor_id, "Rejected status toggle");
            return Err(DomainError::TaskPermissionDenied);
        }

        task.status = task.status.toggled();
        task.updated_at = self.clock.now();
        self.tasks.update_task(&task).await.context("update task status")?;

        info!(%task_id, user_id = %actor_id, status = task.status.as_str(), "Task status toggled");

        self.get_task(task_id).await
    }

    /// Extracts task candidates from free text
    ///
    /// Candidates are sanitized but never persisted.
    pub async fn generate_tasks(&self, text: &str, actor_id: Uuid) -> DomainResult<Vec<GeneratedTask>> {
        let extractor = self.extractor.as_ref().ok_or(DomainError::AiServiceNotConfigured)?;

        let now = self.clock.now();
        let candidates = match tokio::time::timeout(self.extraction_timeout, extractor.extract(text, now)).await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                warn!(user_id = %actor_id, error = %e, "Task extraction failed");
                return Err(DomainError::Extraction(e));
            }
            Err(_) => {
                warn!(user_id = %actor_id, timeout_secs = self.extraction_timeout.as_secs(), "Task extraction timed out");
                return Err(DomainError::Extraction(ExtractorError::Timeout(
                    self.extraction_timeout.as_secs(),
                )));
            }
        };

        let tasks = sanitize_generated_tasks(candidates, now)?;
        info!(user_id = %actor_id, count = tasks.len(), "Tasks generated");
        Ok(tasks)
    }

    async fn find_task(&self, task_id: Uuid) -> DomainResult<Task> {
        self.tasks
            .find_task(task_id)
            .await
            .context("fetch task")?
            .ok_or(DomainError::TaskNotFound)
    }

    fn ensure_creator(task: &Task, actor_id: Uuid) -> DomainResult<()> {
        if task.is_creator(actor_id) {
            return Ok(());
        }
        debug!(task_id = %task.id, user_id = %actor_id, "Rejected non-creator");
        Err(DomainError::NotTaskCreator)
    }
}

fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window() {
        let mut query = TaskQuery {
            page: 3,
            page_size: 20,
            ..Default::default()
        };
        assert_eq!(query.page_window(), Some((40, 20)));

        query.page = 0;
        assert_eq!(query.page_window(), None);

        query.page = 1;
        query.page_size = -5;
        assert_eq!(query.page_window(), None);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_ids(&[a, b, a, a, b]), vec![a, b]);
    }
}
