use std::collections::HashMap;

use async_trait::async_trait;
use gatewise_application::UsageCounter;
use gatewise_core::{AppResult, TenantId};
use gatewise_domain::FeatureKey;
use tokio::sync::RwLock;

/// In-memory usage counter with externally settable counts.
///
/// Real deployments count live resource rows; here the counts are set
/// directly, which is what quota tests need.
#[derive(Debug, Default)]
pub struct InMemoryUsageCounter {
    counts: RwLock<HashMap<(TenantId, FeatureKey), i64>>,
}

impl InMemoryUsageCounter {
    /// Creates a counter reporting zero usage everywhere.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the reported count for a tenant and feature.
    pub async fn set_count(&self, tenant_id: TenantId, feature: FeatureKey, count: i64) {
        self.counts.write().await.insert((tenant_id, feature), count);
    }

    /// Adds to the reported count for a tenant and feature.
    pub async fn add(&self, tenant_id: TenantId, feature: FeatureKey, delta: i64) {
        *self
            .counts
            .write()
            .await
            .entry((tenant_id, feature))
            .or_insert(0) += delta;
    }
}

#[async_trait]
impl UsageCounter for InMemoryUsageCounter {
    async fn count(&self, tenant_id: TenantId, feature: FeatureKey) -> AppResult<i64> {
        Ok(self
            .counts
            .read()
            .await
            .get(&(tenant_id, feature))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use gatewise_application::UsageCounter;
    use gatewise_core::TenantId;
    use gatewise_domain::FeatureKey;

    use super::InMemoryUsageCounter;

    #[tokio::test]
    async fn counts_default_to_zero_and_track_updates() {
        let counter = InMemoryUsageCounter::new();
        let tenant_id = TenantId::new();

        assert_eq!(
            counter
                .count(tenant_id, FeatureKey::MaxContacts)
                .await
                .unwrap_or_default(),
            0
        );

        counter.set_count(tenant_id, FeatureKey::MaxContacts, 5).await;
        counter.add(tenant_id, FeatureKey::MaxContacts, 2).await;
        assert_eq!(
            counter
                .count(tenant_id, FeatureKey::MaxContacts)
                .await
                .unwrap_or_default(),
            7
        );

        // Other tenants are unaffected.
        assert_eq!(
            counter
                .count(TenantId::new(), FeatureKey::MaxContacts)
                .await
                .unwrap_or_default(),
            0
        );
    }
}
