//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_membership_notifier;
mod in_memory_access_repository;
mod in_memory_plan_repository;
mod in_memory_usage_counter;
mod postgres_membership_repository;
mod postgres_plan_repository;
mod postgres_role_repository;
mod postgres_usage_counter;
mod postgres_user_directory;

pub use console_membership_notifier::ConsoleMembershipNotifier;
pub use in_memory_access_repository::InMemoryAccessRepository;
pub use in_memory_plan_repository::InMemoryPlanRepository;
pub use in_memory_usage_counter::InMemoryUsageCounter;
pub use postgres_membership_repository::PostgresMembershipRepository;
pub use postgres_plan_repository::PostgresPlanRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_usage_counter::PostgresUsageCounter;
pub use postgres_user_directory::PostgresUserDirectory;
