use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use gatewise_core::{AppError, AppResult, TenantId, UserId};
use gatewise_domain::{
    EmailAddress, FeatureKey, MemberId, Role, RoleId, Team, TeamId, TeamMember,
};

use crate::entitlement_service::EntitlementService;
use crate::role_service::RoleRepository;

/// Repository port for team lookups.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Persists a new team.
    async fn insert_team(&self, team: Team) -> AppResult<()>;

    /// Finds a team by id.
    async fn find_team(&self, team_id: TeamId) -> AppResult<Option<Team>>;

    /// Counts teams owned by the tenant.
    async fn count_teams(&self, tenant_id: TenantId) -> AppResult<i64>;
}

/// Repository port for membership persistence.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Persists a new membership.
    async fn insert_member(&self, member: TeamMember) -> AppResult<()>;

    /// Replaces a stored membership in full; concurrent readers see the old
    /// or the new version, never a mix.
    async fn update_member(&self, member: TeamMember) -> AppResult<()>;

    /// Hard-deletes a membership. Deleting an absent member is not an error.
    async fn delete_member(&self, member_id: MemberId) -> AppResult<()>;

    /// Finds a membership by id.
    async fn find_member(&self, member_id: MemberId) -> AppResult<Option<TeamMember>>;

    /// Finds a user's membership within one team.
    async fn find_member_for_user(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<Option<TeamMember>>;

    /// Finds a user's membership anywhere in the tenant's teams.
    async fn find_member_in_tenant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<TeamMember>>;

    /// Lists a team's memberships, most recently invited first.
    async fn list_members(&self, team_id: TeamId) -> AppResult<Vec<TeamMember>>;

    /// Counts the team's memberships, any state.
    async fn count_members(&self, team_id: TeamId) -> AppResult<i64>;
}

/// Port for resolving invitation emails to users.
///
/// User records and credentials are owned elsewhere; the engine only needs a
/// stable user id for the invited address, creating a pending user if the
/// address is unknown.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolves an email to an existing or pending user.
    async fn resolve_or_invite(&self, email: &EmailAddress) -> AppResult<UserId>;
}

/// Externally observable membership transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    /// A user was invited to a team.
    Invited {
        /// The created membership.
        member: TeamMember,
        /// The invited address.
        email: EmailAddress,
    },
    /// An invitation was accepted.
    Accepted {
        /// The accepted membership.
        member: TeamMember,
    },
    /// A member's role was replaced.
    RoleChanged {
        /// The membership after the change.
        member: TeamMember,
        /// The role held before the change.
        previous_role: RoleId,
    },
    /// A member was suspended.
    Suspended {
        /// The suspended membership.
        member: TeamMember,
    },
    /// A suspension was lifted.
    Reactivated {
        /// The reactivated membership.
        member: TeamMember,
    },
    /// A membership was removed.
    Removed {
        /// The membership as it was before deletion.
        member: TeamMember,
    },
}

/// Port for the external notification collaborator.
///
/// Delivery is best effort: adapters handle their own failures, and the
/// engine never rolls back a state change over a missed notification.
#[async_trait]
pub trait MembershipNotifier: Send + Sync {
    /// Announces a membership transition.
    async fn notify(&self, event: MembershipEvent);
}

/// Application service driving the membership state machine.
#[derive(Clone)]
pub struct MembershipService {
    teams: Arc<dyn TeamRepository>,
    members: Arc<dyn MembershipRepository>,
    roles: Arc<dyn RoleRepository>,
    directory: Arc<dyn UserDirectory>,
    entitlements: EntitlementService,
    notifier: Arc<dyn MembershipNotifier>,
}

impl MembershipService {
    /// Creates a new membership service from its ports.
    #[must_use]
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        members: Arc<dyn MembershipRepository>,
        roles: Arc<dyn RoleRepository>,
        directory: Arc<dyn UserDirectory>,
        entitlements: EntitlementService,
        notifier: Arc<dyn MembershipNotifier>,
    ) -> Self {
        Self {
            teams,
            members,
            roles,
            directory,
            entitlements,
            notifier,
        }
    }

    /// Creates a team, counting it against the tenant's team quota.
    pub async fn create_team(&self, team: Team) -> AppResult<()> {
        self.entitlements
            .check_quota(team.tenant_id(), FeatureKey::MaxTeams, 1)
            .await?;

        self.teams.insert_team(team).await
    }

    /// Invites a user to a team with the given role.
    pub async fn invite(
        &self,
        team_id: TeamId,
        email: EmailAddress,
        role_id: RoleId,
    ) -> AppResult<TeamMember> {
        let team = self
            .teams
            .find_team(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("team '{team_id}' does not exist")))?;

        self.resolve_assignable_role(role_id, team.tenant_id()).await?;

        // The member cap is per team, not per tenant.
        let seats_taken = self.members.count_members(team_id).await?;
        self.entitlements
            .check_quota_with_usage(
                team.tenant_id(),
                FeatureKey::MaxTeamMembers,
                seats_taken,
                1,
            )
            .await?;

        let user_id = self.directory.resolve_or_invite(&email).await?;
        if self
            .members
            .find_member_for_user(team_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "'{}' is already a member of the team",
                email.as_str()
            )));
        }

        let member = TeamMember::invite(team_id, user_id, role_id, Utc::now());
        self.members.insert_member(member.clone()).await?;

        self.notifier
            .notify(MembershipEvent::Invited {
                member: member.clone(),
                email,
            })
            .await;

        Ok(member)
    }

    /// Accepts a pending invitation.
    pub async fn accept(&self, member_id: MemberId) -> AppResult<TeamMember> {
        let mut member = self.require_member(member_id).await?;
        member.accept(Utc::now())?;
        self.members.update_member(member.clone()).await?;

        self.notifier
            .notify(MembershipEvent::Accepted {
                member: member.clone(),
            })
            .await;

        Ok(member)
    }

    /// Replaces a member's role; valid while invited or accepted.
    pub async fn change_role(
        &self,
        member_id: MemberId,
        new_role_id: RoleId,
    ) -> AppResult<TeamMember> {
        let mut member = self.require_member(member_id).await?;

        let team = self
            .teams
            .find_team(member.team_id())
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "membership '{member_id}' references missing team '{}'",
                    member.team_id()
                ))
            })?;
        self.resolve_assignable_role(new_role_id, team.tenant_id())
            .await?;

        let previous_role = member.role_id();
        if previous_role == new_role_id {
            return Ok(member);
        }

        member.change_role(new_role_id);
        self.members.update_member(member.clone()).await?;

        self.notifier
            .notify(MembershipEvent::RoleChanged {
                member: member.clone(),
                previous_role,
            })
            .await;

        Ok(member)
    }

    /// Suspends a member. Already-suspended members are left untouched.
    pub async fn suspend(&self, member_id: MemberId) -> AppResult<TeamMember> {
        let mut member = self.require_member(member_id).await?;
        if !member.is_active() {
            return Ok(member);
        }

        member.suspend();
        self.members.update_member(member.clone()).await?;

        self.notifier
            .notify(MembershipEvent::Suspended {
                member: member.clone(),
            })
            .await;

        Ok(member)
    }

    /// Lifts a suspension. Already-active members are left untouched.
    pub async fn reactivate(&self, member_id: MemberId) -> AppResult<TeamMember> {
        let mut member = self.require_member(member_id).await?;
        if member.is_active() {
            return Ok(member);
        }

        member.reactivate();
        self.members.update_member(member.clone()).await?;

        self.notifier
            .notify(MembershipEvent::Reactivated {
                member: member.clone(),
            })
            .await;

        Ok(member)
    }

    /// Hard-deletes a membership from any state; the underlying user is
    /// never touched. Removing an already-removed member is a no-op.
    pub async fn remove(&self, member_id: MemberId) -> AppResult<()> {
        let Some(member) = self.members.find_member(member_id).await? else {
            return Ok(());
        };

        self.members.delete_member(member_id).await?;
        self.notifier
            .notify(MembershipEvent::Removed { member })
            .await;

        Ok(())
    }

    /// Lists a team's members.
    pub async fn list_members(&self, team_id: TeamId) -> AppResult<Vec<TeamMember>> {
        self.members.list_members(team_id).await
    }

    async fn require_member(&self, member_id: MemberId) -> AppResult<TeamMember> {
        self.members
            .find_member(member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("membership '{member_id}' does not exist")))
    }

    async fn resolve_assignable_role(
        &self,
        role_id: RoleId,
        tenant_id: TenantId,
    ) -> AppResult<Role> {
        let role = self
            .roles
            .find_role(role_id)
            .await?
            .filter(|role| role.is_usable_by_tenant(tenant_id))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "role '{role_id}' does not resolve to a role of this tenant"
                ))
            })?;

        Ok(role)
    }
}
