use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::PasswordReset;
use crate::error::AppError;

#[async_trait]
pub trait ResetStore: Send + Sync {
    async fn by_token_hash(&self, token_hash: &str) -> Result<PasswordReset, AppError>;
    async fn create(&self, reset: &mut PasswordReset) -> Result<(), AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

pub struct PgResetStore {
    db: PgPool,
}

impl PgResetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResetStore for PgResetStore {
    async fn by_token_hash(&self, token_hash: &str) -> Result<PasswordReset, AppError> {
        sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT id, user_id, token_hash, created_at
            FROM password_resets
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn create(&self, reset: &mut PasswordReset) -> Result<(), AppError> {
        let (id, created_at) = sqlx::query_as::<_, (i64, time::OffsetDateTime)>(
            r#"
            INSERT INTO password_resets (user_id, token_hash)
            VALUES ($1, $2)
            RETURNING id, created_at
            "#,
        )
        .bind(reset.user_id)
        .bind(&reset.token_hash)
        .fetch_one(&self.db)
        .await?;

        reset.id = id;
        reset.created_at = Some(created_at);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM password_resets WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
