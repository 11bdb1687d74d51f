//! In-memory store for tests and local development
//!
//! All entity families share one state behind a single `RwLock`, so every
//! multi-row operation is atomic by holding the write guard for its whole
//! duration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{
    OrganizationStore, StoreError, StoreResult, TaskFilter, TaskSort, TaskStore, UserStore, INVITE_CODE_CONSTRAINT,
    USERNAME_CONSTRAINT,
};
use crate::models::{
    MemberProfile, Organization, OrganizationMember, OrganizationMembership, Task, TaskAssignment, TaskDetails,
    TaskPage, User, UserSummary,
};

/// Thread-safe in-memory implementation of every store trait
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    organizations: HashMap<Uuid, Organization>,
    /// Keyed by (organization, user)
    members: HashMap<(Uuid, Uuid), OrganizationMember>,
    tasks: HashMap<Uuid, Task>,
    /// Keyed by (task, user)
    assignments: HashMap<(Uuid, Uuid), TaskAssignment>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user directly, bypassing signup
    pub fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.username_taken(&user.username) {
            return Err(StoreError::Conflict(USERNAME_CONSTRAINT.to_string()));
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    /// Number of assignment rows for the pair (0 or 1)
    pub fn assignment_rows(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<usize> {
        let state = self.read()?;
        Ok(usize::from(state.assignments.contains_key(&(task_id, user_id))))
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }
}

impl MemoryState {
    fn username_taken(&self, username: &str) -> bool {
        self.users.values().any(|user| user.username == username)
    }

    fn invite_code_taken(&self, code: &str, except: Option<Uuid>) -> bool {
        self.organizations
            .values()
            .any(|org| org.invite_code == code && Some(org.id) != except)
    }

    fn user_summary(&self, user_id: Uuid) -> StoreResult<UserSummary> {
        self.users
            .get(&user_id)
            .map(User::summary)
            .ok_or(StoreError::NotFound)
    }

    fn hydrate(&self, task: &Task) -> StoreResult<TaskDetails> {
        let creator = self.user_summary(task.creator_id)?;
        let organization = self
            .organizations
            .get(&task.organization_id)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        let mut rows: Vec<&TaskAssignment> = self
            .assignments
            .values()
            .filter(|assignment| assignment.task_id == task.id)
            .collect();
        rows.sort_by_key(|assignment| (assignment.assigned_at, assignment.user_id));

        let assignees = rows
            .into_iter()
            .map(|assignment| self.user_summary(assignment.user_id))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(TaskDetails {
            task: task.clone(),
            creator,
            organization,
            assignees,
        })
    }

    fn matches(&self, task: &Task, filter: &TaskFilter) -> bool {
        if !filter.organization_ids.contains(&task.organization_id) {
            return false;
        }
        if filter.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if let Some(user_id) = filter.assigned_to {
            if !self.assignments.contains_key(&(task.id, user_id)) {
                return false;
            }
        }
        if let Some((from, to)) = filter.due_between {
            match task.due_date {
                Some(due) if due >= from && due < to => {}
                _ => return false,
            }
        }
        true
    }
}

fn compare_tasks(sort: TaskSort, a: &Task, b: &Task) -> Ordering {
    let newest_first = b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id));
    match sort {
        TaskSort::CreatedDesc => newest_first,
        TaskSort::DueDateAsc => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y).then(newest_first),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => newest_first,
        },
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_with_personal_organization(
        &self,
        user: &User,
        organization: &Organization,
        owner: &OrganizationMember,
    ) -> StoreResult<()> {
        let mut state = self.write()?;

        if state.username_taken(&user.username) {
            return Err(StoreError::Conflict(USERNAME_CONSTRAINT.to_string()));
        }
        if state.invite_code_taken(&organization.invite_code, None) {
            return Err(StoreError::Conflict(INVITE_CODE_CONSTRAINT.to_string()));
        }

        state.users.insert(user.id, user.clone());
        state.organizations.insert(organization.id, organization.clone());
        state
            .members
            .insert((owner.organization_id, owner.user_id), owner.clone());
        Ok(())
    }
}

#[async_trait]
impl OrganizationStore for InMemoryStore {
    async fn create_organization(&self, organization: &Organization, owner: &OrganizationMember) -> StoreResult<()> {
        let mut state = self.write()?;

        if state.invite_code_taken(&organization.invite_code, None) {
            return Err(StoreError::Conflict(INVITE_CODE_CONSTRAINT.to_string()));
        }

        state.organizations.insert(organization.id, organization.clone());
        state
            .members
            .insert((owner.organization_id, owner.user_id), owner.clone());
        Ok(())
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        Ok(self.read()?.organizations.get(&id).cloned())
    }

    async fn find_organization_by_invite_code(&self, code: &str) -> StoreResult<Option<Organization>> {
        Ok(self
            .read()?
            .organizations
            .values()
            .find(|org| org.invite_code == code)
            .cloned())
    }

    async fn update_organization(&self, organization: &Organization) -> StoreResult<()> {
        let mut state = self.write()?;

        if !state.organizations.contains_key(&organization.id) {
            return Err(StoreError::NotFound);
        }
        if state.invite_code_taken(&organization.invite_code, Some(organization.id)) {
            return Err(StoreError::Conflict(INVITE_CODE_CONSTRAINT.to_string()));
        }

        state.organizations.insert(organization.id, organization.clone());
        Ok(())
    }

    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;

        if state.organizations.remove(&id).is_none() {
            return Ok(false);
        }

        let task_ids: HashSet<Uuid> = state
            .tasks
            .values()
            .filter(|task| task.organization_id == id)
            .map(|task| task.id)
            .collect();
        state
            .assignments
            .retain(|(task_id, _), _| !task_ids.contains(task_id));
        state.tasks.retain(|task_id, _| !task_ids.contains(task_id));
        state.members.retain(|(org_id, _), _| *org_id != id);
        Ok(true)
    }

    async fn find_member(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<Option<OrganizationMember>> {
        Ok(self
            .read()?
            .members
            .get(&(organization_id, user_id))
            .cloned())
    }

    async fn add_member(&self, member: &OrganizationMember) -> StoreResult<()> {
        let mut state = self.write()?;
        let key = (member.organization_id, member.user_id);

        if state.members.contains_key(&key) {
            return Err(StoreError::Conflict("membership already exists".to_string()));
        }
        state.members.insert(key, member.clone());
        Ok(())
    }

    async fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .write()?
            .members
            .remove(&(organization_id, user_id))
            .is_some())
    }

    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<MemberProfile>> {
        let state = self.read()?;

        let mut rows: Vec<&OrganizationMember> = state
            .members
            .values()
            .filter(|member| member.organization_id == organization_id)
            .collect();
        rows.sort_by_key(|member| (member.joined_at, member.user_id));

        rows.into_iter()
            .map(|member| {
                Ok(MemberProfile {
                    user: state.user_summary(member.user_id)?,
                    role: member.role,
                    joined_at: member.joined_at,
                })
            })
            .collect()
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<OrganizationMembership>> {
        let state = self.read()?;

        let mut rows: Vec<&OrganizationMember> = state
            .members
            .values()
            .filter(|member| member.user_id == user_id)
            .collect();
        rows.sort_by_key(|member| (member.joined_at, member.organization_id));

        Ok(rows
            .into_iter()
            .filter_map(|member| {
                state
                    .organizations
                    .get(&member.organization_id)
                    .map(|organization| OrganizationMembership {
                        organization: organization.clone(),
                        role: member.role,
                        joined_at: member.joined_at,
                    })
            })
            .collect())
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn create_task(&self, task: &Task, assigned_at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.write()?;

        if state.tasks.contains_key(&task.id) {
            return Err(StoreError::Conflict(format!("task {} already exists", task.id)));
        }

        state.tasks.insert(task.id, task.clone());
        state.assignments.insert(
            (task.id, task.creator_id),
            TaskAssignment {
                task_id: task.id,
                user_id: task.creator_id,
                assigned_at,
            },
        );
        Ok(())
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_task_details(&self, id: Uuid) -> StoreResult<Option<TaskDetails>> {
        let state = self.read()?;
        state.tasks.get(&id).map(|task| state.hydrate(task)).transpose()
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<TaskPage> {
        let state = self.read()?;

        let mut matching: Vec<&Task> = state
            .tasks
            .values()
            .filter(|task| state.matches(task, filter))
            .collect();
        let total = matching.len() as u64;
        matching.sort_by(|a, b| compare_tasks(filter.sort, a, b));

        let page: Vec<&Task> = match filter.page {
            Some((offset, limit)) => matching
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => matching,
        };

        let tasks = page
            .into_iter()
            .map(|task| state.hydrate(task))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(TaskPage { tasks, total })
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let mut state = self.write()?;

        let stored = state.tasks.get_mut(&task.id).ok_or(StoreError::NotFound)?;
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.due_date = task.due_date;
        stored.updated_at = task.updated_at;
        Ok(())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;

        if state.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        state.assignments.retain(|(task_id, _), _| *task_id != id);
        Ok(true)
    }

    async fn assign_users(&self, task_id: Uuid, user_ids: &[Uuid], assigned_at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.write()?;

        if !state.tasks.contains_key(&task_id) {
            return Err(StoreError::NotFound);
        }
        for &user_id in user_ids {
            state
                .assignments
                .entry((task_id, user_id))
                .or_insert(TaskAssignment {
                    task_id,
                    user_id,
                    assigned_at,
                });
        }
        Ok(())
    }

    async fn unassign_users(&self, task_id: Uuid, user_ids: &[Uuid]) -> StoreResult<()> {
        let mut state = self.write()?;
        for &user_id in user_ids {
            state.assignments.remove(&(task_id, user_id));
        }
        Ok(())
    }

    async fn is_assigned(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.read()?.assignments.contains_key(&(task_id, user_id)))
    }

    async fn count_assignable_users(&self, organization_id: Uuid, user_ids: &[Uuid]) -> StoreResult<u64> {
        let state = self.read()?;
        let distinct: HashSet<&Uuid> = user_ids.iter().collect();

        Ok(distinct
            .into_iter()
            .filter(|user_id| {
                state.users.contains_key(*user_id) && state.members.contains_key(&(organization_id, **user_id))
            })
            .count() as u64)
    }
}
