use std::sync::Arc;

use async_trait::async_trait;
use gatewise_core::{AppError, AppResult, NonEmptyString, TenantId};
use gatewise_domain::{PermissionSet, Role, RoleId, RoleUpdate, SystemRole};

/// Role projection with the number of members currently holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWithMembers {
    /// The role entity.
    pub role: Role,
    /// Members referencing the role across the tenant's teams.
    pub member_count: u64,
}

/// Input payload for creating a custom role.
///
/// Permissions arrive as raw identifiers and are validated against the
/// catalog here, at the boundary, so invalid grants are rejected once rather
/// than silently ignored wherever they are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Optional role description.
    pub description: Option<String>,
    /// Permission identifiers to grant.
    pub permissions: Vec<String>,
}

/// Input payload for replacing a custom role's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name.
    pub name: String,
    /// New role description.
    pub description: Option<String>,
    /// New permission identifiers.
    pub permissions: Vec<String>,
}

/// Repository port for role persistence.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role.
    async fn insert_role(&self, role: Role) -> AppResult<()>;

    /// Replaces a stored role in full; concurrent readers see the old or the
    /// new version, never a mix.
    async fn update_role(&self, role: Role) -> AppResult<()>;

    /// Deletes a role by id.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Finds a role by id, system or custom.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by name among the tenant's custom roles and the system
    /// roles.
    async fn find_role_by_name(&self, tenant_id: TenantId, name: &str)
    -> AppResult<Option<Role>>;

    /// Lists the system roles plus the tenant's custom roles.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Lists the seeded system roles.
    async fn list_system_roles(&self) -> AppResult<Vec<Role>>;

    /// Counts members currently assigned the role.
    async fn count_members_with_role(&self, role_id: RoleId) -> AppResult<u64>;
}

/// Application service owning role lifecycle rules.
#[derive(Clone)]
pub struct RoleService {
    repository: Arc<dyn RoleRepository>,
}

impl RoleService {
    /// Creates a new role service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>) -> Self {
        Self { repository }
    }

    /// Inserts the seeded system role templates that are not present yet.
    pub async fn seed_system_roles(&self) -> AppResult<()> {
        let existing = self.repository.list_system_roles().await?;

        for template in SystemRole::all() {
            if existing
                .iter()
                .any(|role| role.name().as_str() == template.name())
            {
                continue;
            }

            self.repository.insert_role(template.build()?).await?;
        }

        Ok(())
    }

    /// Creates a tenant-authored custom role.
    pub async fn create_role(
        &self,
        tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        let name = NonEmptyString::new(input.name)?;
        let permissions = PermissionSet::parse(&input.permissions)?;

        if self
            .repository
            .find_role_by_name(tenant_id, name.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a role named '{}' already exists",
                name.as_str()
            )));
        }

        let role = Role::custom(tenant_id, name, input.description, permissions)?;
        self.repository.insert_role(role.clone()).await?;

        Ok(role)
    }

    /// Replaces a custom role's name, description and permissions atomically.
    pub async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role> {
        let mut role = self
            .repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        let name = NonEmptyString::new(input.name)?;
        let permissions = PermissionSet::parse(&input.permissions)?;

        if name.as_str() != role.name().as_str()
            && let Some(tenant_id) = role.tenant_id()
            && self
                .repository
                .find_role_by_name(tenant_id, name.as_str())
                .await?
                .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a role named '{}' already exists",
                name.as_str()
            )));
        }

        role.apply_update(RoleUpdate {
            name,
            description: input.description,
            permissions,
        })?;

        self.repository.update_role(role.clone()).await?;
        Ok(role)
    }

    /// Enables or disables a custom role.
    pub async fn set_role_active(&self, role_id: RoleId, is_active: bool) -> AppResult<Role> {
        let mut role = self
            .repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        role.set_active(is_active)?;
        self.repository.update_role(role.clone()).await?;
        Ok(role)
    }

    /// Deletes a custom role once no member references it.
    pub async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let role = self
            .repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        if role.is_system() {
            return Err(AppError::Forbidden(format!(
                "system role '{}' cannot be deleted",
                role.name().as_str()
            )));
        }

        let member_count = self.repository.count_members_with_role(role_id).await?;
        if member_count > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' is still assigned to {member_count} member(s); reassign them first",
                role.name().as_str()
            )));
        }

        self.repository.delete_role(role_id).await
    }

    /// Returns the tenant's visible roles with member counts.
    pub async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleWithMembers>> {
        let roles = self.repository.list_roles(tenant_id).await?;

        let mut listed = Vec::with_capacity(roles.len());
        for role in roles {
            let member_count = self.repository.count_members_with_role(role.id()).await?;
            listed.push(RoleWithMembers { role, member_count });
        }

        Ok(listed)
    }

    /// Finds a role by id.
    pub async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.repository.find_role(role_id).await
    }

    /// Finds a role visible to the tenant by name.
    pub async fn find_role_by_name(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> AppResult<Option<Role>> {
        self.repository.find_role_by_name(tenant_id, name).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use gatewise_core::{AppError, AppResult, TenantId};
    use gatewise_domain::{Role, RoleId, SystemRole};
    use tokio::sync::Mutex;

    use super::{CreateRoleInput, RoleRepository, RoleService, UpdateRoleInput};

    #[derive(Default)]
    struct FakeRoleRepository {
        roles: Mutex<HashMap<RoleId, Role>>,
        member_counts: Mutex<HashMap<RoleId, u64>>,
    }

    #[async_trait]
    impl RoleRepository for FakeRoleRepository {
        async fn insert_role(&self, role: Role) -> AppResult<()> {
            self.roles.lock().await.insert(role.id(), role);
            Ok(())
        }

        async fn update_role(&self, role: Role) -> AppResult<()> {
            self.roles.lock().await.insert(role.id(), role);
            Ok(())
        }

        async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
            self.roles.lock().await.remove(&role_id);
            Ok(())
        }

        async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
            Ok(self.roles.lock().await.get(&role_id).cloned())
        }

        async fn find_role_by_name(
            &self,
            tenant_id: TenantId,
            name: &str,
        ) -> AppResult<Option<Role>> {
            Ok(self
                .roles
                .lock()
                .await
                .values()
                .find(|role| {
                    role.name().as_str() == name && role.is_usable_by_tenant(tenant_id)
                })
                .cloned())
        }

        async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
            Ok(self
                .roles
                .lock()
                .await
                .values()
                .filter(|role| role.is_usable_by_tenant(tenant_id))
                .cloned()
                .collect())
        }

        async fn list_system_roles(&self) -> AppResult<Vec<Role>> {
            Ok(self
                .roles
                .lock()
                .await
                .values()
                .filter(|role| role.is_system())
                .cloned()
                .collect())
        }

        async fn count_members_with_role(&self, role_id: RoleId) -> AppResult<u64> {
            Ok(self
                .member_counts
                .lock()
                .await
                .get(&role_id)
                .copied()
                .unwrap_or(0))
        }
    }

    fn service() -> (RoleService, Arc<FakeRoleRepository>) {
        let repository = Arc::new(FakeRoleRepository::default());
        (RoleService::new(repository.clone()), repository)
    }

    fn input(name: &str, permissions: &[&str]) -> CreateRoleInput {
        CreateRoleInput {
            name: name.to_owned(),
            description: None,
            permissions: permissions.iter().map(|value| (*value).to_owned()).collect(),
        }
    }

    #[tokio::test]
    async fn create_role_rejects_unknown_permission() {
        let (service, _) = service();
        let result = service
            .create_role(TenantId::new(), input("Ops", &["contacts.fly"]))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_role_rejects_empty_permission_set() {
        let (service, _) = service();
        let result = service.create_role(TenantId::new(), input("Ops", &[])).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_role_rejects_duplicate_name() {
        let (service, _) = service();
        let tenant_id = TenantId::new();
        let first = service
            .create_role(tenant_id, input("Ops", &["contacts.view"]))
            .await;
        assert!(first.is_ok());

        let second = service
            .create_role(tenant_id, input("Ops", &["deals.view"]))
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn same_name_is_allowed_across_tenants() {
        let (service, _) = service();
        let first = service
            .create_role(TenantId::new(), input("Ops", &["contacts.view"]))
            .await;
        assert!(first.is_ok());

        let second = service
            .create_role(TenantId::new(), input("Ops", &["contacts.view"]))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn update_system_role_is_forbidden() {
        let (service, repository) = service();
        let system = SystemRole::Viewer.build().unwrap_or_else(|_| unreachable!());
        let role_id = system.id();
        assert!(repository.insert_role(system).await.is_ok());

        let result = service
            .update_role(
                role_id,
                UpdateRoleInput {
                    name: "Viewer".to_owned(),
                    description: None,
                    permissions: vec!["contacts.view".to_owned()],
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn delete_system_role_is_forbidden() {
        let (service, repository) = service();
        let system = SystemRole::Viewer.build().unwrap_or_else(|_| unreachable!());
        let role_id = system.id();
        assert!(repository.insert_role(system).await.is_ok());

        let result = service.delete_role(role_id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn delete_role_blocked_while_members_remain() {
        let (service, repository) = service();
        let tenant_id = TenantId::new();
        let role = service
            .create_role(tenant_id, input("Ops", &["contacts.view"]))
            .await
            .unwrap_or_else(|_| unreachable!());

        repository.member_counts.lock().await.insert(role.id(), 2);
        let blocked = service.delete_role(role.id()).await;
        assert!(matches!(blocked, Err(AppError::Conflict(_))));

        repository.member_counts.lock().await.insert(role.id(), 0);
        let allowed = service.delete_role(role.id()).await;
        assert!(allowed.is_ok());
        assert!(
            service
                .find_role(role.id())
                .await
                .unwrap_or_default()
                .is_none()
        );
    }

    #[tokio::test]
    async fn update_replaces_fields_atomically() {
        let (service, _) = service();
        let tenant_id = TenantId::new();
        let role = service
            .create_role(tenant_id, input("Ops", &["contacts.view"]))
            .await
            .unwrap_or_else(|_| unreachable!());

        let updated = service
            .update_role(
                role.id(),
                UpdateRoleInput {
                    name: "Operations".to_owned(),
                    description: Some("after hours".to_owned()),
                    permissions: vec!["deals.view".to_owned(), "deals.edit".to_owned()],
                },
            )
            .await;
        assert!(updated.is_ok());

        let updated = updated.unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.name().as_str(), "Operations");
        assert_eq!(updated.permissions().len(), 2);
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let (service, repository) = service();
        assert!(service.seed_system_roles().await.is_ok());
        assert!(service.seed_system_roles().await.is_ok());

        let seeded = repository.list_system_roles().await.unwrap_or_default();
        assert_eq!(seeded.len(), SystemRole::all().len());
    }
}
