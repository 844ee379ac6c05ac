use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use gatewise_core::{AppError, AppResult, TenantId};
use gatewise_domain::{BuiltinPlan, Entitlement, FeatureKey, FeatureLimit, Plan, PlanId};

/// Repository port for the plan catalog and tenant subscriptions.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Persists a plan definition.
    async fn insert_plan(&self, plan: Plan) -> AppResult<()>;

    /// Lists all plans in the catalog.
    async fn list_plans(&self) -> AppResult<Vec<Plan>>;

    /// Finds a plan by its stable name.
    async fn find_plan_by_name(&self, name: &str) -> AppResult<Option<Plan>>;

    /// Binds a tenant to a plan, replacing any previous subscription.
    async fn subscribe_tenant(&self, tenant_id: TenantId, plan_id: PlanId) -> AppResult<()>;

    /// Returns the tenant's active plan, if subscribed.
    async fn find_plan_for_tenant(&self, tenant_id: TenantId) -> AppResult<Option<Plan>>;
}

/// Port for the external usage collaborator.
///
/// Counts are owned by the resource stores (contacts table, deals table, …);
/// the engine only ever reads them, freshly, per check.
#[async_trait]
pub trait UsageCounter: Send + Sync {
    /// Returns the live count of the feature's resources in the tenant.
    async fn count(&self, tenant_id: TenantId, feature: FeatureKey) -> AppResult<i64>;
}

/// Application service resolving entitlements and enforcing quotas.
#[derive(Clone)]
pub struct EntitlementService {
    plans: Arc<dyn PlanRepository>,
    usage: Arc<dyn UsageCounter>,
}

impl EntitlementService {
    /// Creates a new entitlement service from its ports.
    #[must_use]
    pub fn new(plans: Arc<dyn PlanRepository>, usage: Arc<dyn UsageCounter>) -> Self {
        Self { plans, usage }
    }

    /// Inserts the built-in plan tiers that are not present yet.
    pub async fn seed_builtin_plans(&self) -> AppResult<()> {
        for tier in BuiltinPlan::all() {
            if self.plans.find_plan_by_name(tier.name()).await?.is_some() {
                continue;
            }

            self.plans.insert_plan(tier.build()?).await?;
        }

        Ok(())
    }

    /// Resolves the tenant's plan and one fresh count per feature.
    pub async fn resolve(&self, tenant_id: TenantId) -> AppResult<Entitlement> {
        let plan = self.active_plan(tenant_id).await?;

        let mut usage = BTreeMap::new();
        for feature in FeatureKey::all() {
            usage.insert(*feature, self.usage.count(tenant_id, *feature).await?);
        }

        Ok(Entitlement::new(tenant_id, plan, usage))
    }

    /// Checks whether `delta` more of the feature fits within the tenant's
    /// plan cap, counting usage at this instant.
    ///
    /// Check-then-create is not atomic against this contract: the verdict is
    /// accurate when it is computed, and the resource store owns the final
    /// authoritative constraint if hard enforcement under concurrency is
    /// required.
    pub async fn check_quota(
        &self,
        tenant_id: TenantId,
        feature: FeatureKey,
        delta: i64,
    ) -> AppResult<()> {
        if delta < 0 {
            return Err(AppError::Validation(format!(
                "quota delta must be non-negative, got {delta}"
            )));
        }

        let plan = self.active_plan(tenant_id).await?;
        let limit = plan.limit_for(feature);
        if limit.is_unlimited() {
            return Ok(());
        }

        let used = self.usage.count(tenant_id, feature).await?;
        Self::verdict(feature, limit, used, delta)
    }

    /// Checks a caller-supplied usage figure against the tenant's plan cap.
    ///
    /// For caps scoped narrower than the tenant (members per team), the
    /// caller counts within the right scope and passes the figure in;
    /// everything else matches [`Self::check_quota`].
    pub async fn check_quota_with_usage(
        &self,
        tenant_id: TenantId,
        feature: FeatureKey,
        used: i64,
        delta: i64,
    ) -> AppResult<()> {
        if delta < 0 {
            return Err(AppError::Validation(format!(
                "quota delta must be non-negative, got {delta}"
            )));
        }

        let plan = self.active_plan(tenant_id).await?;
        let limit = plan.limit_for(feature);
        if limit.is_unlimited() {
            return Ok(());
        }

        Self::verdict(feature, limit, used, delta)
    }

    fn verdict(feature: FeatureKey, limit: FeatureLimit, used: i64, delta: i64) -> AppResult<()> {
        if limit.allows(used, delta) {
            return Ok(());
        }

        Err(AppError::QuotaExceeded {
            feature: feature.as_str().to_owned(),
            limit: limit.value(),
            used,
            requested: delta,
        })
    }

    async fn active_plan(&self, tenant_id: TenantId) -> AppResult<Plan> {
        self.plans
            .find_plan_for_tenant(tenant_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("tenant '{tenant_id}' has no active plan"))
            })
    }
}
