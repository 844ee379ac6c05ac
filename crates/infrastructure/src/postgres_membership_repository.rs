use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatewise_application::{MembershipRepository, TeamRepository};
use gatewise_core::{AppError, AppResult, NonEmptyString, TenantId, UserId};
use gatewise_domain::{MemberId, RoleId, Team, TeamId, TeamMember};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed team and membership repository.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TeamRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
}

impl TeamRow {
    fn into_team(self) -> AppResult<Team> {
        Ok(Team::from_stored(
            TeamId::from_uuid(self.id),
            TenantId::from_uuid(self.tenant_id),
            NonEmptyString::new(self.name)?,
        ))
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    id: Uuid,
    team_id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    invited_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl MemberRow {
    fn into_member(self) -> TeamMember {
        TeamMember::from_stored(
            MemberId::from_uuid(self.id),
            TeamId::from_uuid(self.team_id),
            UserId::from_uuid(self.user_id),
            RoleId::from_uuid(self.role_id),
            self.invited_at,
            self.accepted_at,
            self.is_active,
        )
    }
}

#[async_trait]
impl TeamRepository for PostgresMembershipRepository {
    async fn insert_team(&self, team: Team) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO teams (id, tenant_id, name)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(team.id().as_uuid())
        .bind(team.tenant_id().as_uuid())
        .bind(team.name().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert team: {error}")))?;

        Ok(())
    }

    async fn find_team(&self, team_id: TeamId) -> AppResult<Option<Team>> {
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, tenant_id, name
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(team_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load team: {error}")))?;

        row.map(TeamRow::into_team).transpose()
    }

    async fn count_teams(&self, tenant_id: TenantId) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM teams
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count teams: {error}")))
    }
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn insert_member(&self, member: TeamMember) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO team_members (id, team_id, user_id, role_id, invited_at, accepted_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(member.id().as_uuid())
        .bind(member.team_id().as_uuid())
        .bind(member.user_id().as_uuid())
        .bind(member.role_id().as_uuid())
        .bind(member.invited_at())
        .bind(member.accepted_at())
        .bind(member.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert member: {error}")))?;

        Ok(())
    }

    async fn update_member(&self, member: TeamMember) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE team_members
            SET role_id = $2, accepted_at = $3, is_active = $4
            WHERE id = $1
            "#,
        )
        .bind(member.id().as_uuid())
        .bind(member.role_id().as_uuid())
        .bind(member.accepted_at())
        .bind(member.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update member: {error}")))?;

        Ok(())
    }

    async fn delete_member(&self, member_id: MemberId) -> AppResult<()> {
        sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(member_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete member: {error}")))?;

        Ok(())
    }

    async fn find_member(&self, member_id: MemberId) -> AppResult<Option<TeamMember>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, team_id, user_id, role_id, invited_at, accepted_at, is_active
            FROM team_members
            WHERE id = $1
            "#,
        )
        .bind(member_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load member: {error}")))?;

        Ok(row.map(MemberRow::into_member))
    }

    async fn find_member_for_user(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<Option<TeamMember>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, team_id, user_id, role_id, invited_at, accepted_at, is_active
            FROM team_members
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load member: {error}")))?;

        Ok(row.map(MemberRow::into_member))
    }

    async fn find_member_in_tenant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<TeamMember>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT members.id, members.team_id, members.user_id, members.role_id,
                   members.invited_at, members.accepted_at, members.is_active
            FROM team_members AS members
            INNER JOIN teams ON teams.id = members.team_id
            WHERE teams.tenant_id = $1 AND members.user_id = $2
            ORDER BY members.invited_at
            LIMIT 1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load tenant membership: {error}"))
        })?;

        Ok(row.map(MemberRow::into_member))
    }

    async fn list_members(&self, team_id: TeamId) -> AppResult<Vec<TeamMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, team_id, user_id, role_id, invited_at, accepted_at, is_active
            FROM team_members
            WHERE team_id = $1
            ORDER BY invited_at DESC
            "#,
        )
        .bind(team_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list members: {error}")))?;

        Ok(rows.into_iter().map(MemberRow::into_member).collect())
    }

    async fn count_members(&self, team_id: TeamId) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM team_members
            WHERE team_id = $1
            "#,
        )
        .bind(team_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count members: {error}")))
    }
}
