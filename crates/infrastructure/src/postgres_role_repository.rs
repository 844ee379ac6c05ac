use async_trait::async_trait;
use gatewise_application::RoleRepository;
use gatewise_core::{AppError, AppResult, NonEmptyString, TenantId};
use gatewise_domain::{PermissionSet, Role, RoleId};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed role repository.
///
/// Grant sets are stored as a JSONB array of permission identifiers, so
/// rehydration re-validates every identifier against the catalog.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    permissions: Value,
    is_system: bool,
    is_active: bool,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let permissions: PermissionSet =
            serde_json::from_value(self.permissions).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode permissions for role '{}': {error}",
                    self.id
                ))
            })?;

        Ok(Role::from_stored(
            RoleId::from_uuid(self.id),
            self.tenant_id.map(TenantId::from_uuid),
            NonEmptyString::new(self.name)?,
            self.description,
            permissions,
            self.is_system,
            self.is_active,
        ))
    }
}

fn permissions_json(role: &Role) -> AppResult<Value> {
    serde_json::to_value(role.permissions()).map_err(|error| {
        AppError::Internal(format!(
            "failed to encode permissions for role '{}': {error}",
            role.id()
        ))
    })
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn insert_role(&self, role: Role) -> AppResult<()> {
        let permissions = permissions_json(&role)?;

        sqlx::query(
            r#"
            INSERT INTO roles (id, tenant_id, name, description, permissions, is_system, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(role.name().as_str())
        .bind(role.description())
        .bind(permissions)
        .bind(role.is_system())
        .bind(role.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert role: {error}")))?;

        Ok(())
    }

    async fn update_role(&self, role: Role) -> AppResult<()> {
        let permissions = permissions_json(&role)?;

        sqlx::query(
            r#"
            UPDATE roles
            SET name = $2, description = $3, permissions = $4, is_active = $5
            WHERE id = $1
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name().as_str())
        .bind(role.description())
        .bind(permissions)
        .bind(role.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role: {error}")))?;

        Ok(())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, permissions, is_system, is_active
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn find_role_by_name(&self, tenant_id: TenantId, name: &str) -> AppResult<Option<Role>> {
        // A tenant's own role shadows a system role of the same name.
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, permissions, is_system, is_active
            FROM roles
            WHERE name = $1 AND (tenant_id = $2 OR tenant_id IS NULL)
            ORDER BY tenant_id NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role by name: {error}")))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, permissions, is_system, is_active
            FROM roles
            WHERE tenant_id = $1 OR tenant_id IS NULL
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }

    async fn list_system_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, permissions, is_system, is_active
            FROM roles
            WHERE is_system
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list system roles: {error}")))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }

    async fn count_members_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM team_members
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count members with role: {error}"))
        })?;

        Ok(count.max(0) as u64)
    }
}
