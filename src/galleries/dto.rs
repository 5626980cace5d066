use serde::{Deserialize, Serialize};

use super::images::Image;
use super::repo_types::Gallery;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GalleryForm {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub filename: String,
    pub path: String,
    pub hash: String,
}

impl From<&Image> for ImageView {
    fn from(image: &Image) -> Self {
        Self {
            filename: image.filename.clone(),
            path: image.path(),
            hash: image.hash.clone(),
        }
    }
}

/// A gallery together with its images, as the show/edit pages use it.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryPage {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub images: Vec<ImageView>,
}

impl GalleryPage {
    pub fn new(gallery: &Gallery, images: &[Image]) -> Self {
        Self {
            id: gallery.id,
            user_id: gallery.user_id,
            title: gallery.title.clone(),
            images: images.iter().map(ImageView::from).collect(),
        }
    }
}
