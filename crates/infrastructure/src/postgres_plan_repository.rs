use std::collections::BTreeMap;

use async_trait::async_trait;
use gatewise_application::PlanRepository;
use gatewise_core::{AppError, AppResult, NonEmptyString, TenantId};
use gatewise_domain::{FeatureKey, FeatureLimit, Plan, PlanId};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed plan catalog and subscription store.
///
/// Limits are stored as a JSONB object keyed by feature identifier, so
/// rehydration re-validates every value against the sentinel rules.
#[derive(Clone)]
pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    display_name: String,
    limits: Value,
}

impl PlanRow {
    fn into_plan(self) -> AppResult<Plan> {
        let limits: BTreeMap<FeatureKey, FeatureLimit> = serde_json::from_value(self.limits)
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode limits for plan '{}': {error}",
                    self.id
                ))
            })?;

        Ok(Plan::from_stored(
            PlanId::from_uuid(self.id),
            NonEmptyString::new(self.name)?,
            NonEmptyString::new(self.display_name)?,
            limits,
        ))
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn insert_plan(&self, plan: Plan) -> AppResult<()> {
        let limits = serde_json::to_value(plan.limits()).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode limits for plan '{}': {error}",
                plan.id()
            ))
        })?;

        sqlx::query(
            r#"
            INSERT INTO plans (id, name, display_name, limits)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(plan.id().as_uuid())
        .bind(plan.name().as_str())
        .bind(plan.display_name().as_str())
        .bind(limits)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert plan: {error}")))?;

        Ok(())
    }

    async fn list_plans(&self) -> AppResult<Vec<Plan>> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, display_name, limits
            FROM plans
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list plans: {error}")))?;

        rows.into_iter().map(PlanRow::into_plan).collect()
    }

    async fn find_plan_by_name(&self, name: &str) -> AppResult<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, display_name, limits
            FROM plans
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load plan: {error}")))?;

        row.map(PlanRow::into_plan).transpose()
    }

    async fn subscribe_tenant(&self, tenant_id: TenantId, plan_id: PlanId) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tenant_subscriptions (tenant_id, plan_id)
            VALUES ($1, $2)
            ON CONFLICT (tenant_id) DO UPDATE SET plan_id = EXCLUDED.plan_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(plan_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to subscribe tenant: {error}")))?;

        Ok(())
    }

    async fn find_plan_for_tenant(&self, tenant_id: TenantId) -> AppResult<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT plans.id, plans.name, plans.display_name, plans.limits
            FROM tenant_subscriptions AS subscriptions
            INNER JOIN plans ON plans.id = subscriptions.plan_id
            WHERE subscriptions.tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load tenant subscription: {error}"))
        })?;

        row.map(PlanRow::into_plan).transpose()
    }
}
