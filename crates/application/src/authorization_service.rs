use std::sync::Arc;

use gatewise_core::{Actor, AppError, AppResult};
use gatewise_domain::{FeatureKey, Permission};

use crate::entitlement_service::EntitlementService;
use crate::membership_service::MembershipRepository;
use crate::role_service::RoleRepository;

/// Application service answering authorization questions.
///
/// This is the single decision surface: callers ask before mutating, and a
/// denial carries the reason as an error. Decisions read live membership and
/// role state; nothing is cached across calls.
#[derive(Clone)]
pub struct AuthorizationService {
    members: Arc<dyn MembershipRepository>,
    roles: Arc<dyn RoleRepository>,
    entitlements: EntitlementService,
}

impl AuthorizationService {
    /// Creates a new authorization service from its ports.
    #[must_use]
    pub fn new(
        members: Arc<dyn MembershipRepository>,
        roles: Arc<dyn RoleRepository>,
        entitlements: EntitlementService,
    ) -> Self {
        Self {
            members,
            roles,
            entitlements,
        }
    }

    /// Grants or denies the actor the given permission in their tenant.
    ///
    /// Super admins are granted unconditionally. Everyone else must hold an
    /// accepted, non-suspended membership whose role is active and grants the
    /// permission.
    pub async fn authorize(&self, actor: &Actor, permission: Permission) -> AppResult<()> {
        if actor.is_super_admin() {
            return Ok(());
        }

        let member = self
            .members
            .find_member_in_tenant(actor.tenant_id(), actor.user_id())
            .await?;
        let Some(member) = member.filter(|member| member.can_act()) else {
            return Err(AppError::Forbidden(format!(
                "user '{}' has no active membership in tenant '{}'",
                actor.user_id(),
                actor.tenant_id()
            )));
        };

        let role = self
            .roles
            .find_role(member.role_id())
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "membership '{}' references missing role '{}'",
                    member.id(),
                    member.role_id()
                ))
            })?;

        if !role.is_active() {
            return Err(AppError::Forbidden(format!(
                "role '{}' is deactivated",
                role.name().as_str()
            )));
        }

        if !role.permissions().contains(permission) {
            return Err(AppError::Forbidden(format!(
                "role '{}' does not grant '{}'",
                role.name().as_str(),
                permission.as_str()
            )));
        }

        Ok(())
    }

    /// Returns the authorization verdict as a boolean, for callers that
    /// branch rather than fail.
    pub async fn has_permission(&self, actor: &Actor, permission: Permission) -> AppResult<bool> {
        match self.authorize(actor, permission).await {
            Ok(()) => Ok(true),
            Err(AppError::Forbidden(_)) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Authorizes the actor and then checks that `delta` more of the feature
    /// fits within the tenant's plan.
    ///
    /// The permission check always runs first, so an unauthorized actor gets
    /// `Forbidden` even when the quota is also exhausted. Super admins bypass
    /// both checks.
    pub async fn authorize_and_check_quota(
        &self,
        actor: &Actor,
        permission: Permission,
        feature: FeatureKey,
        delta: i64,
    ) -> AppResult<()> {
        if actor.is_super_admin() {
            return Ok(());
        }

        self.authorize(actor, permission).await?;
        self.entitlements
            .check_quota(actor.tenant_id(), feature, delta)
            .await
    }
}
