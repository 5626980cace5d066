use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::users::repo_types::User;

/// Raw user persistence. Implementations do no validation; callers go
/// through `UserService`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn by_id(&self, id: i64) -> Result<User, AppError>;
    async fn by_email(&self, email: &str) -> Result<User, AppError>;
    /// Looks up by the HMAC digest of the remember token.
    async fn by_remember(&self, remember_hash: &str) -> Result<User, AppError>;
    /// Inserts and backfills `id`, `created_at` and `updated_at`.
    async fn create(&self, user: &mut User) -> Result<(), AppError>;
    async fn update(&self, user: &mut User) -> Result<(), AppError>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn first_where(&self, column: &str, value: &str) -> Result<User, AppError> {
        let sql = format!(
            r#"
            SELECT id, name, age, email, password_hash, remember_hash, created_at, updated_at
            FROM users
            WHERE {column} = $1 AND deleted_at IS NULL
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn by_id(&self, id: i64) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, email, password_hash, remember_hash, created_at, updated_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn by_email(&self, email: &str) -> Result<User, AppError> {
        self.first_where("email", email).await
    }

    async fn by_remember(&self, remember_hash: &str) -> Result<User, AppError> {
        self.first_where("remember_hash", remember_hash).await
    }

    async fn create(&self, user: &mut User) -> Result<(), AppError> {
        let (id, created_at, updated_at) = sqlx::query_as::<_, (i64, time::OffsetDateTime, time::OffsetDateTime)>(
            r#"
            INSERT INTO users (name, age, email, password_hash, remember_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(user.age)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.remember_hash)
        .fetch_one(&self.db)
        .await?;

        user.id = id;
        user.created_at = Some(created_at);
        user.updated_at = Some(updated_at);
        Ok(())
    }

    async fn update(&self, user: &mut User) -> Result<(), AppError> {
        let updated_at = sqlx::query_scalar::<_, time::OffsetDateTime>(
            r#"
            UPDATE users
               SET name = $2, age = $3, email = $4, password_hash = $5,
                   remember_hash = $6, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            RETURNING updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.age)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.remember_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)?;

        user.updated_at = Some(updated_at);
        Ok(())
    }
}
