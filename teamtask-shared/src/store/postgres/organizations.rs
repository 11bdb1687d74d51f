use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::{map_write_error, PgStore};
use crate::models::{
    MemberProfile, Organization, OrganizationMember, OrganizationMembership, OrganizationRole, UserSummary,
};
use crate::store::{OrganizationStore, StoreError, StoreResult};

#[derive(sqlx::FromRow)]
struct MemberRow {
    user_id: Uuid,
    username: String,
    role: OrganizationRole,
    joined_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    name: String,
    invite_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role: OrganizationRole,
    joined_at: DateTime<Utc>,
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn create_organization(&self, organization: &Organization, owner: &OrganizationMember) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, invite_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.invite_code)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query(
            r#"
            INSERT INTO organization_members (organization_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(owner.organization_id)
        .bind(owner.user_id)
        .bind(owner.role)
        .bind(owner.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, invite_code, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn find_organization_by_invite_code(&self, code: &str) -> StoreResult<Option<Organization>> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, invite_code, created_at, updated_at
            FROM organizations
            WHERE invite_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn update_organization(&self, organization: &Organization) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET name = $2, invite_code = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.invite_code)
        .bind(organization.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_organization(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let assignments = sqlx::query(
            r#"
            DELETE FROM task_assignments
            WHERE task_id IN (SELECT id FROM tasks WHERE organization_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let tasks = sqlx::query("DELETE FROM tasks WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let members = sqlx::query("DELETE FROM organization_members WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let organization = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            organization_id = %id,
            assignments = assignments.rows_affected(),
            tasks = tasks.rows_affected(),
            members = members.rows_affected(),
            "Deleted organization cascade"
        );
        Ok(organization.rows_affected() > 0)
    }

    async fn find_member(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<Option<OrganizationMember>> {
        let member = sqlx::query_as::<_, OrganizationMember>(
            r#"
            SELECT organization_id, user_id, role, joined_at
            FROM organization_members
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn add_member(&self, member: &OrganizationMember) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO organization_members (organization_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(member.organization_id)
        .bind(member.user_id)
        .bind(member.role)
        .bind(member.joined_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM organization_members
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_members(&self, organization_id: Uuid) -> StoreResult<Vec<MemberProfile>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT m.user_id, u.username, m.role, m.joined_at
            FROM organization_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = $1
            ORDER BY m.joined_at ASC, m.user_id ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MemberProfile {
                user: UserSummary {
                    id: row.user_id,
                    username: row.username,
                },
                role: row.role,
                joined_at: row.joined_at,
            })
            .collect())
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<OrganizationMembership>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT o.id, o.name, o.invite_code, o.created_at, o.updated_at, m.role, m.joined_at
            FROM organization_members m
            JOIN organizations o ON o.id = m.organization_id
            WHERE m.user_id = $1
            ORDER BY m.joined_at ASC, o.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrganizationMembership {
                organization: Organization {
                    id: row.id,
                    name: row.name,
                    invite_code: row.invite_code,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
                role: row.role,
                joined_at: row.joined_at,
            })
            .collect())
    }
}
