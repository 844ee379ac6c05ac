use async_trait::async_trait;
use gatewise_application::UsageCounter;
use gatewise_core::{AppError, AppResult, TenantId};
use gatewise_domain::FeatureKey;
use sqlx::PgPool;

/// PostgreSQL-backed usage counter.
///
/// Every check runs a fresh `COUNT` against the resource table owning the
/// feature; nothing is cached, so a verdict always reflects rows committed
/// at query time.
#[derive(Clone)]
pub struct PostgresUsageCounter {
    pool: PgPool,
}

impl PostgresUsageCounter {
    /// Creates a counter with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn count_query(feature: FeatureKey) -> &'static str {
    match feature {
        FeatureKey::MaxContacts => "SELECT COUNT(*) FROM contacts WHERE tenant_id = $1",
        FeatureKey::MaxUsers => {
            r#"
            SELECT COUNT(DISTINCT members.user_id)
            FROM team_members AS members
            INNER JOIN teams ON teams.id = members.team_id
            WHERE teams.tenant_id = $1
            "#
        }
        FeatureKey::MaxTeams => "SELECT COUNT(*) FROM teams WHERE tenant_id = $1",
        FeatureKey::MaxTeamMembers => {
            // The member cap applies per team, so usage reports the fullest team.
            r#"
            SELECT COALESCE(MAX(seats.taken), 0)
            FROM (
                SELECT COUNT(*) AS taken
                FROM team_members AS members
                INNER JOIN teams ON teams.id = members.team_id
                WHERE teams.tenant_id = $1
                GROUP BY members.team_id
            ) AS seats
            "#
        }
        FeatureKey::MaxForms => "SELECT COUNT(*) FROM forms WHERE tenant_id = $1",
        FeatureKey::MaxLandingPages => "SELECT COUNT(*) FROM landing_pages WHERE tenant_id = $1",
        FeatureKey::MaxWorkflows => "SELECT COUNT(*) FROM workflows WHERE tenant_id = $1",
        FeatureKey::MaxEmailsPerMonth => {
            // Monthly features count within the current calendar month only.
            r#"
            SELECT COUNT(*)
            FROM email_sends
            WHERE tenant_id = $1 AND sent_at >= date_trunc('month', now())
            "#
        }
        FeatureKey::SocialMediaAccounts => {
            "SELECT COUNT(*) FROM social_accounts WHERE tenant_id = $1"
        }
        FeatureKey::SocialMediaPosts => "SELECT COUNT(*) FROM social_posts WHERE tenant_id = $1",
    }
}

#[async_trait]
impl UsageCounter for PostgresUsageCounter {
    async fn count(&self, tenant_id: TenantId, feature: FeatureKey) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(count_query(feature))
            .bind(tenant_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to count usage for '{feature}': {error}"))
            })
    }
}
