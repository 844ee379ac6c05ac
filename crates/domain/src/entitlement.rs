//! Derived entitlements: a tenant's plan limits joined with live usage.
//!
//! Entitlements are never persisted. Usage figures are counted fresh by the
//! resolver for every check, so a value held here is only accurate at the
//! instant it was computed.

use std::collections::BTreeMap;

use gatewise_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};

use crate::plan::{FeatureKey, Plan};

/// One feature's limit, usage and display percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureUsage {
    /// Feature key.
    pub feature: FeatureKey,
    /// Plan cap, `-1` for unlimited.
    pub limit: i64,
    /// Live count at resolution time.
    pub used: i64,
    /// Display percentage, clamped to `[0, 100]`; `0` for unlimited.
    pub percentage: u8,
}

/// A tenant's plan limits combined with usage counted at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    tenant_id: TenantId,
    plan: Plan,
    usage: BTreeMap<FeatureKey, i64>,
}

impl Entitlement {
    /// Combines a plan with freshly counted usage.
    #[must_use]
    pub fn new(tenant_id: TenantId, plan: Plan, usage: BTreeMap<FeatureKey, i64>) -> Self {
        Self {
            tenant_id,
            plan,
            usage,
        }
    }

    /// Returns the tenant this entitlement was resolved for.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the tenant's active plan.
    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Returns the counted usage for a feature; uncounted features are zero.
    #[must_use]
    pub fn usage_for(&self, feature: FeatureKey) -> i64 {
        self.usage.get(&feature).copied().unwrap_or(0)
    }

    /// Returns the display percentage for a feature.
    #[must_use]
    pub fn percentage(&self, feature: FeatureKey) -> u8 {
        self.plan
            .limit_for(feature)
            .percentage_used(self.usage_for(feature))
    }

    /// Checks whether `delta` more of the feature fits within the plan cap.
    pub fn check(&self, feature: FeatureKey, delta: i64) -> AppResult<()> {
        let limit = self.plan.limit_for(feature);
        let used = self.usage_for(feature);

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

    /// Returns one report row per feature for billing and usage displays.
    #[must_use]
    pub fn usage_report(&self) -> Vec<FeatureUsage> {
        FeatureKey::all()
            .iter()
            .map(|feature| {
                let limit = self.plan.limit_for(*feature);
                let used = self.usage_for(*feature);
                FeatureUsage {
                    feature: *feature,
                    limit: limit.value(),
                    used,
                    percentage: limit.percentage_used(used),
                }
            })
            .collect()
    }
}
