use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TenantId;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
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

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Resolved identity used for one authorization decision.
///
/// The super-admin flag is resolved once when the session context is built,
/// never re-derived from role names at individual call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
    tenant_id: TenantId,
    is_super_admin: bool,
}

impl Actor {
    /// Creates an actor from resolved identity and tenancy data.
    #[must_use]
    pub fn new(user_id: UserId, tenant_id: TenantId) -> Self {
        Self {
            user_id,
            tenant_id,
            is_super_admin: false,
        }
    }

    /// Creates a platform super-admin actor that bypasses policy checks.
    #[must_use]
    pub fn super_admin(user_id: UserId, tenant_id: TenantId) -> Self {
        Self {
            user_id,
            tenant_id,
            is_super_admin: true,
        }
    }

    /// Returns the acting user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the tenant the actor operates in.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns whether the actor bypasses permission and quota checks.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.is_super_admin
    }
}

#[cfg(test)]
mod tests {
    use crate::TenantId;

    use super::{Actor, UserId};

    #[test]
    fn regular_actor_is_not_super_admin() {
        let actor = Actor::new(UserId::new(), TenantId::new());
        assert!(!actor.is_super_admin());
    }

    #[test]
    fn super_admin_constructor_sets_flag() {
        let actor = Actor::super_admin(UserId::new(), TenantId::new());
        assert!(actor.is_super_admin());
    }
}
