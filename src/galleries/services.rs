use std::sync::Arc;

use super::repo::GalleryStore;
use super::repo_types::Gallery;
use crate::error::{AppError, ValidationError};

type GalleryCheck = fn(&mut Gallery) -> Result<(), AppError>;

const WRITE_STEPS: &[GalleryCheck] = &[user_id_required, title_required];

fn user_id_required(gallery: &mut Gallery) -> Result<(), AppError> {
    if gallery.user_id <= 0 {
        return Err(ValidationError::UserIdRequired.into());
    }
    Ok(())
}

fn title_required(gallery: &mut Gallery) -> Result<(), AppError> {
    gallery.title = gallery.title.trim().to_string();
    if gallery.title.is_empty() {
        return Err(ValidationError::TitleRequired.into());
    }
    Ok(())
}

fn run_steps(gallery: &mut Gallery) -> Result<(), AppError> {
    WRITE_STEPS.iter().try_for_each(|step| step(gallery))
}

#[derive(Clone)]
pub struct GalleryService {
    store: Arc<dyn GalleryStore>,
}

impl GalleryService {
    pub fn new(store: Arc<dyn GalleryStore>) -> Self {
        Self { store }
    }

    pub async fn by_id(&self, id: i64) -> Result<Gallery, AppError> {
        if id <= 0 {
            return Err(AppError::InvalidId);
        }
        self.store.by_id(id).await
    }

    pub async fn by_user_id(&self, user_id: i64) -> Result<Vec<Gallery>, AppError> {
        self.store.by_user_id(user_id).await
    }

    pub async fn create(&self, gallery: &mut Gallery) -> Result<(), AppError> {
        run_steps(gallery)?;
        self.store.create(gallery).await
    }

    pub async fn update(&self, gallery: &mut Gallery) -> Result<(), AppError> {
        run_steps(gallery)?;
        self.store.update(gallery).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if id <= 0 {
            return Err(AppError::InvalidId);
        }
        self.store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galleries::memory::InMemoryGalleryStore;

    fn service() -> GalleryService {
        GalleryService::new(Arc::new(InMemoryGalleryStore::new()))
    }

    #[tokio::test]
    async fn create_requires_owner_then_title() {
        let svc = service();
        let mut g = Gallery::default();
        assert!(matches!(
            svc.create(&mut g).await,
            Err(AppError::Validation(ValidationError::UserIdRequired))
        ));

        let mut g = Gallery { user_id: 1, title: "   ".into(), ..Default::default() };
        assert!(matches!(
            svc.create(&mut g).await,
            Err(AppError::Validation(ValidationError::TitleRequired))
        ));
    }

    #[tokio::test]
    async fn create_list_update_delete() {
        let svc = service();
        let mut a = Gallery { user_id: 1, title: " Summer ".into(), ..Default::default() };
        let mut b = Gallery { user_id: 2, title: "Winter".into(), ..Default::default() };
        svc.create(&mut a).await.unwrap();
        svc.create(&mut b).await.unwrap();
        assert_eq!(a.title, "Summer");

        let mine = svc.by_user_id(1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, a.id);

        a.title = "Autumn".into();
        svc.update(&mut a).await.unwrap();
        assert_eq!(svc.by_id(a.id).await.unwrap().title, "Autumn");

        a.title = String::new();
        assert!(svc.update(&mut a).await.is_err());
        assert_eq!(svc.by_id(a.id).await.unwrap().title, "Autumn");

        svc.delete(a.id).await.unwrap();
        assert!(matches!(svc.by_id(a.id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn non_positive_ids_are_invalid() {
        let svc = service();
        assert!(matches!(svc.by_id(0).await, Err(AppError::InvalidId)));
        assert!(matches!(svc.delete(-1).await, Err(AppError::InvalidId)));
    }
}
