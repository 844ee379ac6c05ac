//! Role entities and the seeded system roles.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use gatewise_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::PermissionSet;

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named permission grant set, either platform-seeded or tenant-authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    tenant_id: Option<TenantId>,
    name: NonEmptyString,
    description: Option<String>,
    permissions: PermissionSet,
    is_system: bool,
    is_active: bool,
}

/// Full replacement payload for a custom role's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleUpdate {
    /// New role name.
    pub name: NonEmptyString,
    /// New role description.
    pub description: Option<String>,
    /// New grant set.
    pub permissions: PermissionSet,
}

impl Role {
    /// Creates a tenant-authored custom role.
    ///
    /// Fails when the permission set is empty; a role that grants nothing is
    /// always a caller mistake.
    pub fn custom(
        tenant_id: TenantId,
        name: NonEmptyString,
        description: Option<String>,
        permissions: PermissionSet,
    ) -> AppResult<Self> {
        if permissions.is_empty() {
            return Err(AppError::Validation(
                "a role must grant at least one permission".to_owned(),
            ));
        }

        Ok(Self {
            id: RoleId::new(),
            tenant_id: Some(tenant_id),
            name,
            description,
            permissions,
            is_system: false,
            is_active: true,
        })
    }

    /// Creates a platform-seeded system role, shared across tenants.
    pub fn system(
        name: NonEmptyString,
        description: Option<String>,
        permissions: PermissionSet,
    ) -> AppResult<Self> {
        if permissions.is_empty() {
            return Err(AppError::Validation(
                "a role must grant at least one permission".to_owned(),
            ));
        }

        Ok(Self {
            id: RoleId::new(),
            tenant_id: None,
            name,
            description,
            permissions,
            is_system: true,
            is_active: true,
        })
    }

    /// Rehydrates a role from stored fields without re-running creation rules.
    #[must_use]
    pub fn from_stored(
        id: RoleId,
        tenant_id: Option<TenantId>,
        name: NonEmptyString,
        description: Option<String>,
        permissions: PermissionSet,
        is_system: bool,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            tenant_id,
            name,
            description,
            permissions,
            is_system,
            is_active,
        }
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the owning tenant; `None` for system roles.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the role description, if set.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the granted permissions.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns whether the role is platform-seeded and immutable.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Returns whether the role currently grants anything at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the role is usable by members of the given tenant.
    #[must_use]
    pub fn is_usable_by_tenant(&self, tenant_id: TenantId) -> bool {
        self.is_system || self.tenant_id == Some(tenant_id)
    }

    /// Replaces name, description and permissions in one step.
    ///
    /// System roles never accept an update, whatever the payload.
    pub fn apply_update(&mut self, update: RoleUpdate) -> AppResult<()> {
        if self.is_system {
            return Err(AppError::Forbidden(format!(
                "system role '{}' cannot be modified",
                self.name.as_str()
            )));
        }

        if update.permissions.is_empty() {
            return Err(AppError::Validation(
                "a role must grant at least one permission".to_owned(),
            ));
        }

        self.name = update.name;
        self.description = update.description;
        self.permissions = update.permissions;
        Ok(())
    }

    /// Enables or disables a custom role.
    pub fn set_active(&mut self, is_active: bool) -> AppResult<()> {
        if self.is_system {
            return Err(AppError::Forbidden(format!(
                "system role '{}' cannot be modified",
                self.name.as_str()
            )));
        }

        self.is_active = is_active;
        Ok(())
    }
}

/// Platform role templates seeded at system initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Full access to every feature.
    Administrator,
    /// Runs team activities and reporting.
    Manager,
    /// Works own contacts, deals and tasks.
    SalesRepresentative,
    /// Runs campaigns, forms and landing pages.
    Marketing,
    /// Assists customers, read-mostly.
    Support,
    /// Read-only access.
    Viewer,
}

impl SystemRole {
    /// Returns every seeded template.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SystemRole] = &[
            SystemRole::Administrator,
            SystemRole::Manager,
            SystemRole::SalesRepresentative,
            SystemRole::Marketing,
            SystemRole::Support,
            SystemRole::Viewer,
        ];

        ALL
    }

    /// Returns the display name of the template.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::Manager => "Manager",
            Self::SalesRepresentative => "Sales Representative",
            Self::Marketing => "Marketing",
            Self::Support => "Support",
            Self::Viewer => "Viewer",
        }
    }

    /// Returns the description of the template.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Administrator => "Full access to all features",
            Self::Manager => "Manage team activities and reports",
            Self::SalesRepresentative => "Manage own contacts, deals, and tasks",
            Self::Marketing => "Manage marketing campaigns and content",
            Self::Support => "View and assist with customer issues",
            Self::Viewer => "Read-only access",
        }
    }

    /// Returns the template's grant set.
    ///
    /// Fails if a template identifier is missing from the catalog, so a
    /// mistyped grant surfaces at seed time instead of silently narrowing
    /// the role.
    pub fn permissions(&self) -> AppResult<PermissionSet> {
        let names: &[&str] = match self {
            Self::Administrator => return Ok(PermissionSet::all_permissions()),
            Self::Manager => &[
                "contacts.view",
                "contacts.create",
                "contacts.edit",
                "contacts.delete",
                "contacts.export",
                "contacts.manage_all",
                "companies.view",
                "companies.create",
                "companies.edit",
                "companies.delete",
                "companies.manage_all",
                "deals.view",
                "deals.create",
                "deals.edit",
                "deals.delete",
                "deals.change_stage",
                "deals.manage_all",
                "tasks.view",
                "tasks.create",
                "tasks.edit",
                "tasks.delete",
                "tasks.assign",
                "tasks.complete",
                "tasks.manage_all",
                "products.view",
                "products.create",
                "products.edit",
                "invoices.view",
                "invoices.create",
                "invoices.edit",
                "invoices.send",
                "quotations.view",
                "quotations.create",
                "quotations.edit",
                "quotations.send",
                "analytics.view_dashboard",
                "analytics.view_reports",
                "analytics.export_reports",
                "team_management.view_teams",
                "team_management.invite_members",
            ],
            Self::SalesRepresentative => &[
                "contacts.view",
                "contacts.create",
                "contacts.edit",
                "companies.view",
                "companies.create",
                "companies.edit",
                "deals.view",
                "deals.create",
                "deals.edit",
                "deals.change_stage",
                "tasks.view",
                "tasks.create",
                "tasks.edit",
                "tasks.complete",
                "products.view",
                "quotations.view",
                "quotations.create",
                "quotations.edit",
                "quotations.send",
                "analytics.view_dashboard",
            ],
            Self::Marketing => &[
                "contacts.view",
                "contacts.create",
                "contacts.edit",
                "contacts.import",
                "forms.view",
                "forms.create",
                "forms.edit",
                "forms.delete",
                "forms.view_submissions",
                "forms.manage_all",
                "email_campaigns.view",
                "email_campaigns.create",
                "email_campaigns.edit",
                "email_campaigns.delete",
                "email_campaigns.send",
                "email_campaigns.manage_all",
                "landing_pages.view",
                "landing_pages.create",
                "landing_pages.edit",
                "landing_pages.delete",
                "landing_pages.publish",
                "landing_pages.manage_all",
                "analytics.view_dashboard",
                "analytics.view_reports",
            ],
            Self::Support => &[
                "contacts.view",
                "contacts.edit",
                "companies.view",
                "deals.view",
                "tasks.view",
                "tasks.create",
                "tasks.edit",
                "tasks.complete",
                "invoices.view",
                "analytics.view_dashboard",
            ],
            Self::Viewer => &[
                "contacts.view",
                "companies.view",
                "deals.view",
                "tasks.view",
                "products.view",
                "invoices.view",
                "quotations.view",
                "analytics.view_dashboard",
            ],
        };

        names.iter().map(|name| name.parse()).collect()
    }

    /// Builds the seeded role entity for this template.
    pub fn build(&self) -> AppResult<Role> {
        Role::system(
            NonEmptyString::new(self.name())?,
            Some(self.description().to_owned()),
            self.permissions()?,
        )
    }
}

impl FromStr for SystemRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|template| template.name() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown system role '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use gatewise_core::{AppError, NonEmptyString, TenantId};

    use crate::permission::{PermissionCategory, PermissionSet};

    use super::{Role, RoleUpdate, SystemRole};

    fn name(value: &str) -> NonEmptyString {
        NonEmptyString::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn sample_permissions() -> PermissionSet {
        PermissionSet::parse(["contacts.view", "contacts.create"])
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn custom_role_requires_permissions() {
        let result = Role::custom(TenantId::new(), name("Ops"), None, PermissionSet::new());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn custom_role_carries_its_tenant() {
        let tenant_id = TenantId::new();
        let role = Role::custom(tenant_id, name("Ops"), None, sample_permissions())
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(role.tenant_id(), Some(tenant_id));
        assert!(!role.is_system());
        assert!(role.is_active());
    }

    #[test]
    fn system_role_rejects_updates() {
        let mut role = SystemRole::Viewer.build().unwrap_or_else(|_| unreachable!());
        let result = role.apply_update(RoleUpdate {
            name: name("Renamed"),
            description: None,
            permissions: sample_permissions(),
        });
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(role.name().as_str(), "Viewer");
    }

    #[test]
    fn system_role_rejects_deactivation() {
        let mut role = SystemRole::Support.build().unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            role.set_active(false),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn update_replaces_all_mutable_fields() {
        let mut role = Role::custom(TenantId::new(), name("Ops"), None, sample_permissions())
            .unwrap_or_else(|_| unreachable!());
        let new_permissions = PermissionSet::parse(["deals.view"]).unwrap_or_else(|_| unreachable!());
        let result = role.apply_update(RoleUpdate {
            name: name("Operations"),
            description: Some("On-call rotation".to_owned()),
            permissions: new_permissions.clone(),
        });
        assert!(result.is_ok());
        assert_eq!(role.name().as_str(), "Operations");
        assert_eq!(role.description(), Some("On-call rotation"));
        assert_eq!(role.permissions(), &new_permissions);
    }

    #[test]
    fn update_rejects_empty_permission_set() {
        let mut role = Role::custom(TenantId::new(), name("Ops"), None, sample_permissions())
            .unwrap_or_else(|_| unreachable!());
        let result = role.apply_update(RoleUpdate {
            name: name("Ops"),
            description: None,
            permissions: PermissionSet::new(),
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn system_role_is_usable_by_any_tenant() {
        let role = SystemRole::Manager.build().unwrap_or_else(|_| unreachable!());
        assert!(role.is_usable_by_tenant(TenantId::new()));
        assert_eq!(role.tenant_id(), None);
    }

    #[test]
    fn custom_role_is_scoped_to_its_tenant() {
        let tenant_id = TenantId::new();
        let role = Role::custom(tenant_id, name("Ops"), None, sample_permissions())
            .unwrap_or_else(|_| unreachable!());
        assert!(role.is_usable_by_tenant(tenant_id));
        assert!(!role.is_usable_by_tenant(TenantId::new()));
    }

    #[test]
    fn administrator_template_grants_full_catalog() {
        let permissions = SystemRole::Administrator
            .permissions()
            .unwrap_or_else(|_| unreachable!());
        for category in PermissionCategory::all() {
            assert!(permissions.fully_contains_category(*category));
        }
    }

    #[test]
    fn template_grants_resolve_against_the_catalog() {
        for template in SystemRole::all() {
            let permissions = template.permissions();
            assert!(
                permissions.is_ok(),
                "template '{}' carries an unknown identifier",
                template.name()
            );
        }
    }

    #[test]
    fn every_template_builds_a_non_empty_role() {
        for template in SystemRole::all() {
            let role = template.build();
            assert!(role.is_ok(), "template '{}' failed", template.name());
            assert!(!role.unwrap_or_else(|_| unreachable!()).permissions().is_empty());
        }
    }
}
