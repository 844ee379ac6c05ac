//! Teams and team membership, including the invitation state machine.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use gatewise_core::{AppError, AppResult, NonEmptyString, TenantId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::RoleId;

/// Validated email address used to address an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one
    /// `@`, local part and domain are non-empty, domain contains at least one
    /// `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Unique identifier for a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(Uuid);

impl TeamId {
    /// Creates a new random team identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a team identifier from an existing UUID value.
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

impl Default for TeamId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TeamId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a team membership record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(Uuid);

impl MemberId {
    /// Creates a new random member identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a member identifier from an existing UUID value.
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

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MemberId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A tenant-owned team grouping members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    tenant_id: TenantId,
    name: NonEmptyString,
}

impl Team {
    /// Creates a team in the given tenant.
    #[must_use]
    pub fn new(tenant_id: TenantId, name: NonEmptyString) -> Self {
        Self {
            id: TeamId::new(),
            tenant_id,
            name,
        }
    }

    /// Rehydrates a team from stored fields.
    #[must_use]
    pub fn from_stored(id: TeamId, tenant_id: TenantId, name: NonEmptyString) -> Self {
        Self {
            id,
            tenant_id,
            name,
        }
    }

    /// Returns the team identifier.
    #[must_use]
    pub fn id(&self) -> TeamId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the team name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }
}

/// Lifecycle position of a membership, derived from the acceptance timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    /// Invitation sent, not yet accepted.
    Invited,
    /// Invitation accepted; the member participates in the team.
    Accepted,
}

/// A user's membership in one team, carrying exactly one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    id: MemberId,
    team_id: TeamId,
    user_id: UserId,
    role_id: RoleId,
    invited_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl TeamMember {
    /// Creates a freshly invited member.
    #[must_use]
    pub fn invite(team_id: TeamId, user_id: UserId, role_id: RoleId, invited_at: DateTime<Utc>) -> Self {
        Self {
            id: MemberId::new(),
            team_id,
            user_id,
            role_id,
            invited_at,
            accepted_at: None,
            is_active: true,
        }
    }

    /// Rehydrates a member from stored fields.
    #[must_use]
    pub fn from_stored(
        id: MemberId,
        team_id: TeamId,
        user_id: UserId,
        role_id: RoleId,
        invited_at: DateTime<Utc>,
        accepted_at: Option<DateTime<Utc>>,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            team_id,
            user_id,
            role_id,
            invited_at,
            accepted_at,
            is_active,
        }
    }

    /// Returns the membership identifier.
    #[must_use]
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Returns the team this membership belongs to.
    #[must_use]
    pub fn team_id(&self) -> TeamId {
        self.team_id
    }

    /// Returns the member's user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the single role held by this member.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns when the invitation was issued.
    #[must_use]
    pub fn invited_at(&self) -> DateTime<Utc> {
        self.invited_at
    }

    /// Returns when the invitation was accepted, if it has been.
    #[must_use]
    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    /// Returns whether the member is suspended (`false`) or active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the lifecycle state derived from the acceptance timestamp.
    #[must_use]
    pub fn state(&self) -> MembershipState {
        if self.accepted_at.is_some() {
            MembershipState::Accepted
        } else {
            MembershipState::Invited
        }
    }

    /// Returns whether the membership currently backs authorization checks.
    ///
    /// Suspension is orthogonal to acceptance; both must hold.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.is_active && self.state() == MembershipState::Accepted
    }

    /// Accepts the invitation.
    pub fn accept(&mut self, accepted_at: DateTime<Utc>) -> AppResult<()> {
        if self.accepted_at.is_some() {
            return Err(AppError::InvalidState(format!(
                "membership '{}' has already been accepted",
                self.id
            )));
        }

        self.accepted_at = Some(accepted_at);
        Ok(())
    }

    /// Replaces the member's role reference; never adds a second role.
    pub fn change_role(&mut self, role_id: RoleId) {
        self.role_id = role_id;
    }

    /// Suspends the member. Idempotent.
    pub fn suspend(&mut self) {
        self.is_active = false;
    }

    /// Lifts a suspension. Idempotent.
    pub fn reactivate(&mut self) {
        self.is_active = true;
    }
}
