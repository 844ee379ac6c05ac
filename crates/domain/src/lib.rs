//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod entitlement;
mod member;
mod permission;
mod plan;
mod role;

pub use entitlement::{Entitlement, FeatureUsage};
pub use member::{EmailAddress, MemberId, MembershipState, Team, TeamId, TeamMember};
pub use permission::{Permission, PermissionCategory, PermissionGroup, PermissionSet};
pub use plan::{BuiltinPlan, FeatureKey, FeatureLimit, Plan, PlanId, UNLIMITED};
pub use role::{Role, RoleId, RoleUpdate, SystemRole};
