use std::collections::HashMap;

use async_trait::async_trait;
use gatewise_application::{MembershipRepository, RoleRepository, TeamRepository, UserDirectory};
use gatewise_core::{AppResult, TenantId, UserId};
use gatewise_domain::{EmailAddress, MemberId, Role, RoleId, Team, TeamId, TeamMember};
use tokio::sync::RwLock;

/// In-memory store backing the role, team, membership and user directory
/// ports from a single set of maps.
///
/// Serving all four ports from one struct keeps cross-aggregate queries
/// (member counts per role, membership lookup by tenant) consistent without
/// a shared database. Intended for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
    teams: RwLock<HashMap<TeamId, Team>>,
    members: RwLock<HashMap<MemberId, TeamMember>>,
    users: RwLock<HashMap<String, UserId>>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
            teams: RwLock::new(HashMap::new()),
            members: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryAccessRepository {
    async fn insert_role(&self, role: Role) -> AppResult<()> {
        self.roles.write().await.insert(role.id(), role);
        Ok(())
    }

    async fn update_role(&self, role: Role) -> AppResult<()> {
        self.roles.write().await.insert(role.id(), role);
        Ok(())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.roles.write().await.remove(&role_id);
        Ok(())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, tenant_id: TenantId, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| role.name().as_str() == name && role.is_usable_by_tenant(tenant_id))
            .cloned())
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;

        let mut listed: Vec<Role> = roles
            .values()
            .filter(|role| role.is_usable_by_tenant(tenant_id))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));

        Ok(listed)
    }

    async fn list_system_roles(&self) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;

        let mut listed: Vec<Role> = roles
            .values()
            .filter(|role| role.is_system())
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));

        Ok(listed)
    }

    async fn count_members_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .filter(|member| member.role_id() == role_id)
            .count() as u64)
    }
}

#[async_trait]
impl TeamRepository for InMemoryAccessRepository {
    async fn insert_team(&self, team: Team) -> AppResult<()> {
        self.teams.write().await.insert(team.id(), team);
        Ok(())
    }

    async fn find_team(&self, team_id: TeamId) -> AppResult<Option<Team>> {
        Ok(self.teams.read().await.get(&team_id).cloned())
    }

    async fn count_teams(&self, tenant_id: TenantId) -> AppResult<i64> {
        Ok(self
            .teams
            .read()
            .await
            .values()
            .filter(|team| team.tenant_id() == tenant_id)
            .count() as i64)
    }
}

#[async_trait]
impl MembershipRepository for InMemoryAccessRepository {
    async fn insert_member(&self, member: TeamMember) -> AppResult<()> {
        self.members.write().await.insert(member.id(), member);
        Ok(())
    }

    async fn update_member(&self, member: TeamMember) -> AppResult<()> {
        self.members.write().await.insert(member.id(), member);
        Ok(())
    }

    async fn delete_member(&self, member_id: MemberId) -> AppResult<()> {
        self.members.write().await.remove(&member_id);
        Ok(())
    }

    async fn find_member(&self, member_id: MemberId) -> AppResult<Option<TeamMember>> {
        Ok(self.members.read().await.get(&member_id).cloned())
    }

    async fn find_member_for_user(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<Option<TeamMember>> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .find(|member| member.team_id() == team_id && member.user_id() == user_id)
            .cloned())
    }

    async fn find_member_in_tenant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<TeamMember>> {
        let teams = self.teams.read().await;

        Ok(self
            .members
            .read()
            .await
            .values()
            .find(|member| {
                member.user_id() == user_id
                    && teams
                        .get(&member.team_id())
                        .map(|team| team.tenant_id() == tenant_id)
                        .unwrap_or(false)
            })
            .cloned())
    }

    async fn list_members(&self, team_id: TeamId) -> AppResult<Vec<TeamMember>> {
        let members = self.members.read().await;

        let mut listed: Vec<TeamMember> = members
            .values()
            .filter(|member| member.team_id() == team_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.invited_at().cmp(&left.invited_at()));

        Ok(listed)
    }

    async fn count_members(&self, team_id: TeamId) -> AppResult<i64> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .filter(|member| member.team_id() == team_id)
            .count() as i64)
    }
}

#[async_trait]
impl UserDirectory for InMemoryAccessRepository {
    async fn resolve_or_invite(&self, email: &EmailAddress) -> AppResult<UserId> {
        let mut users = self.users.write().await;

        Ok(*users
            .entry(email.as_str().to_owned())
            .or_insert_with(UserId::new))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use gatewise_application::{MembershipRepository, RoleRepository, TeamRepository, UserDirectory};
    use gatewise_core::{NonEmptyString, TenantId, UserId};
    use gatewise_domain::{EmailAddress, PermissionSet, Role, SystemRole, Team, TeamMember};

    use super::InMemoryAccessRepository;

    fn name(value: &str) -> NonEmptyString {
        NonEmptyString::new(value).unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn roles_are_isolated_per_tenant() {
        let repository = InMemoryAccessRepository::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();

        let role = Role::custom(
            tenant_a,
            name("Ops"),
            None,
            PermissionSet::parse(["contacts.view"]).unwrap_or_else(|_| unreachable!()),
        )
        .unwrap_or_else(|_| unreachable!());
        assert!(repository.insert_role(role).await.is_ok());

        let visible = repository.list_roles(tenant_a).await.unwrap_or_default();
        let hidden = repository.list_roles(tenant_b).await.unwrap_or_default();
        assert_eq!(visible.len(), 1);
        assert!(hidden.is_empty());

        assert!(
            repository
                .find_role_by_name(tenant_b, "Ops")
                .await
                .unwrap_or_default()
                .is_none()
        );
    }

    #[tokio::test]
    async fn system_roles_are_visible_to_every_tenant() {
        let repository = InMemoryAccessRepository::new();
        let role = SystemRole::Viewer.build().unwrap_or_else(|_| unreachable!());
        assert!(repository.insert_role(role).await.is_ok());

        let listed = repository.list_roles(TenantId::new()).await.unwrap_or_default();
        assert_eq!(listed.len(), 1);
        assert_eq!(
            repository.list_system_roles().await.unwrap_or_default().len(),
            1
        );
    }

    #[tokio::test]
    async fn member_count_follows_role_references() {
        let repository = InMemoryAccessRepository::new();
        let role = SystemRole::Viewer.build().unwrap_or_else(|_| unreachable!());
        let role_id = role.id();
        assert!(repository.insert_role(role).await.is_ok());

        let team = Team::new(TenantId::new(), name("Sales"));
        let team_id = team.id();
        assert!(repository.insert_team(team).await.is_ok());

        let member = TeamMember::invite(team_id, UserId::new(), role_id, Utc::now());
        let member_id = member.id();
        assert!(repository.insert_member(member).await.is_ok());
        assert_eq!(
            repository
                .count_members_with_role(role_id)
                .await
                .unwrap_or_default(),
            1
        );

        assert!(repository.delete_member(member_id).await.is_ok());
        assert_eq!(
            repository
                .count_members_with_role(role_id)
                .await
                .unwrap_or_default(),
            0
        );
    }

    #[tokio::test]
    async fn tenant_scoped_member_lookup_ignores_other_tenants() {
        let repository = InMemoryAccessRepository::new();
        let tenant_id = TenantId::new();
        let user_id = UserId::new();

        let team = Team::new(tenant_id, name("Sales"));
        let team_id = team.id();
        assert!(repository.insert_team(team).await.is_ok());

        let role = SystemRole::Viewer.build().unwrap_or_else(|_| unreachable!());
        let role_id = role.id();
        assert!(repository.insert_role(role).await.is_ok());

        let member = TeamMember::invite(team_id, user_id, role_id, Utc::now());
        assert!(repository.insert_member(member).await.is_ok());

        assert!(
            repository
                .find_member_in_tenant(tenant_id, user_id)
                .await
                .unwrap_or_default()
                .is_some()
        );
        assert!(
            repository
                .find_member_in_tenant(TenantId::new(), user_id)
                .await
                .unwrap_or_default()
                .is_none()
        );
    }

    #[tokio::test]
    async fn directory_resolves_the_same_user_for_the_same_email() {
        let repository = InMemoryAccessRepository::new();
        let email = EmailAddress::new("bob@example.com").unwrap_or_else(|_| unreachable!());

        let first = repository.resolve_or_invite(&email).await.unwrap_or_default();
        let second = repository.resolve_or_invite(&email).await.unwrap_or_default();
        assert_eq!(first, second);

        let other = EmailAddress::new("alice@example.com").unwrap_or_else(|_| unreachable!());
        let third = repository.resolve_or_invite(&other).await.unwrap_or_default();
        assert_ne!(first, third);
    }
}
