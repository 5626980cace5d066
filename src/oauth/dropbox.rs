//! Minimal Dropbox API client: folder listing only.

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const LIST_FOLDER_URL: &str = "https://api.dropboxapi.com/2/files/list_folder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub folders: Vec<Entry>,
    pub files: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    #[serde(default)]
    path_lower: String,
}

impl From<ListFolderResponse> for Listing {
    fn from(resp: ListFolderResponse) -> Self {
        let mut listing = Listing::default();
        for raw in resp.entries {
            let entry = Entry {
                name: raw.name,
                path: raw.path_lower,
            };
            match raw.tag.as_str() {
                "folder" => listing.folders.push(entry),
                "file" => listing.files.push(entry),
                _ => {}
            }
        }
        listing
    }
}

/// Dropbox wants `""` for the root folder, not `/`.
fn normalize_path(path: &str) -> &str {
    let path = path.trim();
    if path == "/" {
        ""
    } else {
        path
    }
}

pub async fn list_folder(
    http: &reqwest::Client,
    endpoint: &str,
    access_token: &str,
    path: &str,
) -> anyhow::Result<Listing> {
    let resp = http
        .post(endpoint)
        .bearer_auth(access_token)
        .json(&serde_json::json!({ "path": normalize_path(path) }))
        .send()
        .await
        .context("dropbox list_folder request")?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("dropbox list_folder returned {status}: {body}");
    }
    let body: ListFolderResponse = resp.json().await.context("decode list_folder")?;
    Ok(body.into())
}
