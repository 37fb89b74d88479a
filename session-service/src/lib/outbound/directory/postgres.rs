use async_trait::async_trait;
use auth::HashedSecret;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::session::models::EmailAddress;
use crate::domain::session::models::Principal;
use crate::domain::session::models::PrincipalId;
use crate::domain::session::ports::UserDirectory;
use crate::session::errors::DirectoryError;

/// Directory over the `users` table.
///
/// Emails are stored normalized, so lookup is an exact match.
pub struct PostgresUserDirectory {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct PrincipalRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Principal>, DirectoryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirectoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(r) if r.password_hash.is_empty() => Err(DirectoryError::InvalidRecord(format!(
                "user {} has no secret hash",
                r.id
            ))),
            Some(r) => Ok(Some(Principal {
                id: PrincipalId(r.id),
                email: EmailAddress::normalize(&r.email),
                secret_hash: HashedSecret::new(r.password_hash),
                created_at: r.created_at,
            })),
            None => Ok(None),
        }
    }
}
