//! Console membership notifier for development. Logs transitions to tracing
//! output instead of delivering emails or webhooks.

use async_trait::async_trait;
use gatewise_application::{MembershipEvent, MembershipNotifier};
use tracing::info;

/// Development notifier that logs membership transitions to the console.
#[derive(Clone)]
pub struct ConsoleMembershipNotifier;

impl ConsoleMembershipNotifier {
    /// Creates a new console notifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleMembershipNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipNotifier for ConsoleMembershipNotifier {
    async fn notify(&self, event: MembershipEvent) {
        match event {
            MembershipEvent::Invited { member, email } => {
                info!(
                    member_id = %member.id(),
                    team_id = %member.team_id(),
                    email = email.as_str(),
                    "membership invitation issued"
                );
            }
            MembershipEvent::Accepted { member } => {
                info!(
                    member_id = %member.id(),
                    team_id = %member.team_id(),
                    "membership invitation accepted"
                );
            }
            MembershipEvent::RoleChanged {
                member,
                previous_role,
            } => {
                info!(
                    member_id = %member.id(),
                    previous_role = %previous_role,
                    new_role = %member.role_id(),
                    "membership role changed"
                );
            }
            MembershipEvent::Suspended { member } => {
                info!(member_id = %member.id(), "membership suspended");
            }
            MembershipEvent::Reactivated { member } => {
                info!(member_id = %member.id(), "membership reactivated");
            }
            MembershipEvent::Removed { member } => {
                info!(
                    member_id = %member.id(),
                    team_id = %member.team_id(),
                    "membership removed"
                );
            }
        }
    }
}
