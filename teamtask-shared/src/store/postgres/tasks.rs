use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::{map_write_error, PgStore};
use crate::models::{Organization, Task, TaskDetails, TaskPage, TaskStatus, UserSummary};
use crate::store::{StoreError, StoreResult, TaskFilter, TaskSort, TaskStore};

const TASK_DETAIL_COLUMNS: &str = r#"
    SELECT t.id, t.organization_id, t.creator_id, t.title, t.description, t.status, t.due_date,
           t.created_at, t.updated_at,
           u.username AS creator_username,
           o.name AS organization_name, o.invite_code AS organization_invite_code,
           o.created_at AS organization_created_at, o.updated_at AS organization_updated_at
    FROM tasks t
    JOIN users u ON u.id = t.creator_id
    JOIN organizations o ON o.id = t.organization_id
"#;

#[derive(sqlx::FromRow)]
struct TaskDetailRow {
    id: Uuid,
    organization_id: Uuid,
    creator_id: Uuid,
    title: String,
    description: String,
    status: TaskStatus,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_username: String,
    organization_name: String,
    organization_invite_code: String,
    organization_created_at: DateTime<Utc>,
    organization_updated_at: DateTime<Utc>,
}

impl TaskDetailRow {
    fn into_details(self, assignees: Vec<UserSummary>) -> TaskDetails {
        TaskDetails {
            creator: UserSummary {
                id: self.creator_id,
                username: self.creator_username,
            },
            organization: Organization {
                id: self.organization_id,
                name: self.organization_name,
                invite_code: self.organization_invite_code,
                created_at: self.organization_created_at,
                updated_at: self.organization_updated_at,
            },
            task: Task {
                id: self.id,
                organization_id: self.organization_id,
                creator_id: self.creator_id,
                title: self.title,
                description: self.description,
                status: self.status,
                due_date: self.due_date,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            assignees,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AssigneeRow {
    task_id: Uuid,
    user_id: Uuid,
    username: String,
}

/// Appends the `WHERE` clause shared by the count and page queries
fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a TaskFilter) {
    builder.push(" WHERE t.organization_id = ANY(");
    builder.push_bind(filter.organization_ids.as_slice());
    builder.push(")");

    if let Some(status) = filter.status {
        builder.push(" AND t.status = ");
        builder.push_bind(status);
    }

    if let Some(user_id) = filter.assigned_to {
        builder.push(" AND EXISTS (SELECT 1 FROM task_assignments ta WHERE ta.task_id = t.id AND ta.user_id = ");
        builder.push_bind(user_id);
        builder.push(")");
    }

    if let Some((from, to)) = filter.due_between {
        builder.push(" AND t.due_date >= ");
        builder.push_bind(from);
        builder.push(" AND t.due_date < ");
        builder.push_bind(to);
    }
}

fn order_clause(sort: TaskSort) -> &'static str {
    match sort {
        TaskSort::CreatedDesc => " ORDER BY t.created_at DESC, t.id ASC",
        TaskSort::DueDateAsc => {
            " ORDER BY CASE WHEN t.due_date IS NULL THEN 1 ELSE 0 END, t.due_date ASC, t.created_at DESC, t.id ASC"
        }
    }
}

impl PgStore {
    /// Assignees of each task, in assignment order
    async fn load_assignees(&self, task_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<UserSummary>>> {
        let rows = sqlx::query_as::<_, AssigneeRow>(
            r#"
            SELECT ta.task_id, ta.user_id, u.username
            FROM task_assignments ta
            JOIN users u ON u.id = ta.user_id
            WHERE ta.task_id = ANY($1)
            ORDER BY ta.assigned_at ASC, ta.user_id ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_task: HashMap<Uuid, Vec<UserSummary>> = HashMap::new();
        for row in rows {
            by_task.entry(row.task_id).or_default().push(UserSummary {
                id: row.user_id,
                username: row.username,
            });
        }
        Ok(by_task)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, task: &Task, assigned_at: DateTime<Utc>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, organization_id, creator_id, title, description, status, due_date,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(task.id)
        .bind(task.organization_id)
        .bind(task.creator_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query(
            r#"
            INSERT INTO task_assignments (task_id, user_id, assigned_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (task_id, user_id) DO NOTHING
            "#,
        )
        .bind(task.id)
        .bind(task.creator_id)
        .bind(assigned_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, organization_id, creator_id, title, description, status, due_date,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn find_task_details(&self, id: Uuid) -> StoreResult<Option<TaskDetails>> {
        let mut builder = QueryBuilder::<Postgres>::new(TASK_DETAIL_COLUMNS);
        builder.push(" WHERE t.id = ");
        builder.push_bind(id);

        let Some(row) = builder
            .build_query_as::<TaskDetailRow>()
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut assignees = self.load_assignees(&[id]).await?;
        Ok(Some(row.into_details(assignees.remove(&id).unwrap_or_default())))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<TaskPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(TASK_DETAIL_COLUMNS);
        push_filter(&mut select, filter);
        select.push(order_clause(filter.sort));
        if let Some((offset, limit)) = filter.page {
            select.push(" LIMIT ");
            select.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
            select.push(" OFFSET ");
            select.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
        }

        let rows = select
            .build_query_as::<TaskDetailRow>()
            .fetch_all(&self.pool)
            .await?;

        let task_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut assignees = self.load_assignees(&task_ids).await?;

        let tasks = rows
            .into_iter()
            .map(|row| {
                let task_assignees = assignees.remove(&row.id).unwrap_or_default();
                row.into_details(task_assignees)
            })
            .collect();

        Ok(TaskPage {
            tasks,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, due_date = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM task_assignments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn assign_users(&self, task_id: Uuid, user_ids: &[Uuid], assigned_at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO task_assignments (task_id, user_id, assigned_at)
            SELECT $1, user_id, $3
            FROM UNNEST($2::uuid[]) AS user_id
            ON CONFLICT (task_id, user_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(user_ids)
        .bind(assigned_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unassign_users(&self, task_id: Uuid, user_ids: &[Uuid]) -> StoreResult<()> {
        sqlx::query("DELETE FROM task_assignments WHERE task_id = $1 AND user_id = ANY($2)")
            .bind(task_id)
            .bind(user_ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn is_assigned(&self, task_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM task_assignments
                WHERE task_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_assignable_users(&self, organization_id: Uuid, user_ids: &[Uuid]) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT u.id)
            FROM users u
            JOIN organization_members m ON m.user_id = u.id
            WHERE m.organization_id = $1 AND u.id = ANY($2)
            "#,
        )
        .bind(organization_id)
        .bind(user_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
