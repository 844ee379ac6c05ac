use async_trait::async_trait;
use gatewise_application::UserDirectory;
use gatewise_core::{AppError, AppResult, UserId};
use gatewise_domain::EmailAddress;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed user directory.
///
/// Unknown addresses get a pending user row so the invitation can reference
/// a stable user id before the person ever signs in.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn resolve_or_invite(&self, email: &EmailAddress) -> AppResult<UserId> {
        // The no-op update makes the conflicting row visible to RETURNING.
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve user: {error}")))?;

        Ok(UserId::from_uuid(user_id))
    }
}
