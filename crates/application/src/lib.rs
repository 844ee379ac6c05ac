//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod entitlement_service;
mod membership_service;
mod role_service;

pub use authorization_service::AuthorizationService;
pub use entitlement_service::{EntitlementService, PlanRepository, UsageCounter};
pub use membership_service::{
    MembershipEvent, MembershipNotifier, MembershipRepository, MembershipService, TeamRepository,
    UserDirectory,
};
pub use role_service::{
    CreateRoleInput, RoleRepository, RoleService, RoleWithMembers, UpdateRoleInput,
};
