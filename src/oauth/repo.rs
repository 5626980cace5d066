use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::repo_types::{OAuthConnection, ProviderToken};
use crate::error::AppError;

#[async_trait]
pub trait OAuthStore: Send + Sync {
    async fn find(&self, user_id: i64, service: &str) -> Result<OAuthConnection, AppError>;
    async fn create(&self, conn: &mut OAuthConnection) -> Result<(), AppError>;
    async fn update_token(&self, id: i64, token: &ProviderToken) -> Result<(), AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

pub struct PgOAuthStore {
    db: PgPool,
}

impl PgOAuthStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OAuthStore for PgOAuthStore {
    async fn find(&self, user_id: i64, service: &str) -> Result<OAuthConnection, AppError> {
        sqlx::query_as::<_, OAuthConnection>(
            r#"
            SELECT id, user_id, service, access_token, token_type, refresh_token, expiry, created_at
            FROM oauth_connections
            WHERE user_id = $1 AND service = $2
            "#,
        )
        .bind(user_id)
        .bind(service)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn create(&self, conn: &mut OAuthConnection) -> Result<(), AppError> {
        let (id, created_at) = sqlx::query_as::<_, (i64, OffsetDateTime)>(
            r#"
            INSERT INTO oauth_connections
                (user_id, service, access_token, token_type, refresh_token, expiry)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(conn.user_id)
        .bind(&conn.service)
        .bind(&conn.access_token)
        .bind(&conn.token_type)
        .bind(&conn.refresh_token)
        .bind(conn.expiry)
        .fetch_one(&self.db)
        .await?;

        conn.id = id;
        conn.created_at = Some(created_at);
        Ok(())
    }

    async fn update_token(&self, id: i64, token: &ProviderToken) -> Result<(), AppError> {
        let res = sqlx::query(
            r#"
            UPDATE oauth_connections
            SET access_token = $2, token_type = $3, refresh_token = $4, expiry = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&token.access_token)
        .bind(&token.token_type)
        .bind(&token.refresh_token)
        .bind(token.expiry)
        .execute(&self.db)
        .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM oauth_connections WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
