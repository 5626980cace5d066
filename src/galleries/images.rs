//! Gallery images live on disk, not in the database:
//! `<root>/galleries/<gallery_id>/<filename>`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use reqwest::Url;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{AppError, ValidationError};
use crate::hash::sha256_hex;

/// URL prefix the image root is served under.
pub const IMAGES_URL_PREFIX: &str = "/images";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub gallery_id: i64,
    pub filename: String,
    /// Hex SHA-256 of the file content; empty when not computed.
    pub hash: String,
}

impl Image {
    pub fn new(gallery_id: i64, filename: impl Into<String>) -> Self {
        Self {
            gallery_id,
            filename: filename.into(),
            hash: String::new(),
        }
    }

    /// Location relative to the image root, always `/`-separated.
    pub fn relative_path(&self) -> String {
        format!("galleries/{}/{}", self.gallery_id, self.filename)
    }

    /// Escaped URL path the image is served from.
    pub fn path(&self) -> String {
        let raw = format!("{IMAGES_URL_PREFIX}/{}", self.relative_path());
        let Ok(mut url) = Url::parse("http://localhost/") else {
            return raw;
        };
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().extend([
                    IMAGES_URL_PREFIX.trim_start_matches('/'),
                    "galleries",
                    &self.gallery_id.to_string(),
                    &self.filename,
                ]);
            }
            Err(()) => return raw,
        }
        url.path().to_string()
    }
}

/// Reduces a client supplied name to its final path component.
pub fn sanitize_filename(name: &str) -> Result<String, AppError> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(ValidationError::FilenameInvalid.into());
    }
    Ok(base.to_string())
}

/// Last path segment of a URL, query and fragment excluded.
fn filename_from_url(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct ImageService {
    root: PathBuf,
}

impl ImageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn gallery_dir(&self, gallery_id: i64) -> PathBuf {
        self.root.join("galleries").join(gallery_id.to_string())
    }

    /// Writes `data` as `filename` into the gallery, replacing any file of
    /// the same name.
    pub async fn create(
        &self,
        gallery_id: i64,
        data: &[u8],
        filename: &str,
    ) -> Result<Image, AppError> {
        let filename = sanitize_filename(filename)?;
        let dir = self.gallery_dir(gallery_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&filename), data).await?;
        debug!(gallery_id, %filename, bytes = data.len(), "image stored");
        Ok(Image {
            gallery_id,
            filename,
            hash: sha256_hex(data),
        })
    }

    /// Images in the gallery, sorted by filename. A gallery with no
    /// directory yet has no images.
    pub async fn by_gallery_id(&self, gallery_id: i64) -> Result<Vec<Image>, AppError> {
        let dir = self.gallery_dir(gallery_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            let data = tokio::fs::read(entry.path()).await?;
            images.push(Image {
                gallery_id,
                filename,
                hash: sha256_hex(&data),
            });
        }
        images.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(images)
    }

    pub async fn delete(&self, image: &Image) -> Result<(), AppError> {
        let filename = sanitize_filename(&image.filename)?;
        match tokio::fs::remove_file(self.gallery_dir(image.gallery_id).join(&filename)).await {
            Ok(()) => {
                debug!(gallery_id = image.gallery_id, %filename, "image deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Downloads every URL concurrently into the gallery. Failed downloads
    /// are logged and skipped; the stored images are returned.
    pub async fn fetch_links(
        &self,
        http: &reqwest::Client,
        gallery_id: i64,
        urls: Vec<String>,
    ) -> Vec<Image> {
        let mut tasks = JoinSet::new();
        for url in urls {
            let svc = self.clone();
            let http = http.clone();
            tasks.spawn(async move {
                let res = svc.fetch_one(&http, gallery_id, &url).await;
                (url, res)
            });
        }

        let mut stored = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(image))) => stored.push(image),
                Ok((url, Err(e))) => {
                    warn!(gallery_id, %url, error = %format!("{e:#}"), "image download failed")
                }
                Err(e) => warn!(gallery_id, error = %e, "image download task failed"),
            }
        }
        info!(gallery_id, stored = stored.len(), "linked images imported");
        stored
    }

    async fn fetch_one(
        &self,
        http: &reqwest::Client,
        gallery_id: i64,
        raw_url: &str,
    ) -> anyhow::Result<Image> {
        let url = Url::parse(raw_url.trim()).context("parse url")?;
        let filename = filename_from_url(&url).context("url has no filename")?;
        let resp = http
            .get(url)
            .send()
            .await
            .context("request image")?
            .error_for_status()
            .context("image response")?;
        let body = resp.bytes().await.context("read image body")?;
        Ok(self.create(gallery_id, &body, &filename).await?)
    }
}
