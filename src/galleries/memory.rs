use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::GalleryStore;
use super::repo_types::Gallery;
use crate::error::AppError;

#[derive(Default)]
pub struct InMemoryGalleryStore {
    galleries: RwLock<BTreeMap<i64, Gallery>>,
    next_id: AtomicI64,
}

impl InMemoryGalleryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GalleryStore for InMemoryGalleryStore {
    async fn by_id(&self, id: i64) -> Result<Gallery, AppError> {
        self.galleries
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn by_user_id(&self, user_id: i64) -> Result<Vec<Gallery>, AppError> {
        Ok(self
            .galleries
            .read()
            .unwrap()
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, gallery: &mut Gallery) -> Result<(), AppError> {
        let now = OffsetDateTime::now_utc();
        gallery.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        gallery.created_at = Some(now);
        gallery.updated_at = Some(now);
        self.galleries
            .write()
            .unwrap()
            .insert(gallery.id, gallery.clone());
        Ok(())
    }

    async fn update(&self, gallery: &mut Gallery) -> Result<(), AppError> {
        let mut galleries = self.galleries.write().unwrap();
        let slot = galleries.get_mut(&gallery.id).ok_or(AppError::NotFound)?;
        gallery.updated_at = Some(OffsetDateTime::now_utc());
        *slot = gallery.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.galleries.write().unwrap().remove(&id);
        Ok(())
    }
}
