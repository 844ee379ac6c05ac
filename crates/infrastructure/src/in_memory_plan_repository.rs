use std::collections::HashMap;

use async_trait::async_trait;
use gatewise_application::PlanRepository;
use gatewise_core::{AppResult, TenantId};
use gatewise_domain::{Plan, PlanId};
use tokio::sync::RwLock;

/// In-memory plan catalog and subscription store.
#[derive(Debug, Default)]
pub struct InMemoryPlanRepository {
    plans: RwLock<HashMap<PlanId, Plan>>,
    subscriptions: RwLock<HashMap<TenantId, PlanId>>,
}

impl InMemoryPlanRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn insert_plan(&self, plan: Plan) -> AppResult<()> {
        self.plans.write().await.insert(plan.id(), plan);
        Ok(())
    }

    async fn list_plans(&self) -> AppResult<Vec<Plan>> {
        let plans = self.plans.read().await;

        let mut listed: Vec<Plan> = plans.values().cloned().collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));

        Ok(listed)
    }

    async fn find_plan_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        Ok(self
            .plans
            .read()
            .await
            .values()
            .find(|plan| plan.name().as_str() == name)
            .cloned())
    }

    async fn subscribe_tenant(&self, tenant_id: TenantId, plan_id: PlanId) -> AppResult<()> {
        self.subscriptions.write().await.insert(tenant_id, plan_id);
        Ok(())
    }

    async fn find_plan_for_tenant(&self, tenant_id: TenantId) -> AppResult<Option<Plan>> {
        let subscriptions = self.subscriptions.read().await;
        let Some(plan_id) = subscriptions.get(&tenant_id) else {
            return Ok(None);
        };

        Ok(self.plans.read().await.get(plan_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use gatewise_application::PlanRepository;
    use gatewise_core::TenantId;
    use gatewise_domain::BuiltinPlan;

    use super::InMemoryPlanRepository;

    #[tokio::test]
    async fn resubscribing_replaces_the_previous_plan() {
        let repository = InMemoryPlanRepository::new();
        let tenant_id = TenantId::new();

        let free = BuiltinPlan::Free.build().unwrap_or_else(|_| unreachable!());
        let starter = BuiltinPlan::Starter
            .build()
            .unwrap_or_else(|_| unreachable!());
        let starter_id = starter.id();
        assert!(repository.insert_plan(free.clone()).await.is_ok());
        assert!(repository.insert_plan(starter).await.is_ok());

        assert!(repository.subscribe_tenant(tenant_id, free.id()).await.is_ok());
        assert!(repository.subscribe_tenant(tenant_id, starter_id).await.is_ok());

        let active = repository
            .find_plan_for_tenant(tenant_id)
            .await
            .unwrap_or_default();
        assert!(active.is_some_and(|plan| plan.id() == starter_id));
    }

    #[tokio::test]
    async fn unknown_tenant_has_no_plan() {
        let repository = InMemoryPlanRepository::new();
        assert!(
            repository
                .find_plan_for_tenant(TenantId::new())
                .await
                .unwrap_or_default()
                .is_none()
        );
    }
}
