use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::repo_types::Gallery;
use crate::error::AppError;

#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn by_id(&self, id: i64) -> Result<Gallery, AppError>;
    async fn by_user_id(&self, user_id: i64) -> Result<Vec<Gallery>, AppError>;
    async fn create(&self, gallery: &mut Gallery) -> Result<(), AppError>;
    async fn update(&self, gallery: &mut Gallery) -> Result<(), AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

pub struct PgGalleryStore {
    db: PgPool,
}

impl PgGalleryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GalleryStore for PgGalleryStore {
    async fn by_id(&self, id: i64) -> Result<Gallery, AppError> {
        sqlx::query_as::<_, Gallery>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM galleries
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn by_user_id(&self, user_id: i64) -> Result<Vec<Gallery>, AppError> {
        let rows = sqlx::query_as::<_, Gallery>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM galleries
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create(&self, gallery: &mut Gallery) -> Result<(), AppError> {
        let (id, created_at) = sqlx::query_as::<_, (i64, OffsetDateTime)>(
            r#"
            INSERT INTO galleries (user_id, title)
            VALUES ($1, $2)
            RETURNING id, created_at
            "#,
        )
        .bind(gallery.user_id)
        .bind(&gallery.title)
        .fetch_one(&self.db)
        .await?;

        gallery.id = id;
        gallery.created_at = Some(created_at);
        gallery.updated_at = Some(created_at);
        Ok(())
    }

    async fn update(&self, gallery: &mut Gallery) -> Result<(), AppError> {
        let updated_at = sqlx::query_scalar::<_, OffsetDateTime>(
            r#"
            UPDATE galleries
            SET user_id = $2, title = $3, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING updated_at
            "#,
        )
        .bind(gallery.id)
        .bind(gallery.user_id)
        .bind(&gallery.title)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound)?;

        gallery.updated_at = Some(updated_at);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE galleries SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
