use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::OAuthStore;
use super::repo_types::{OAuthConnection, ProviderToken};
use crate::error::AppError;

#[derive(Default)]
pub struct InMemoryOAuthStore {
    conns: RwLock<HashMap<i64, OAuthConnection>>,
    next_id: AtomicI64,
}

impl InMemoryOAuthStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OAuthStore for InMemoryOAuthStore {
    async fn find(&self, user_id: i64, service: &str) -> Result<OAuthConnection, AppError> {
        self.conns
            .read()
            .unwrap()
            .values()
            .find(|c| c.user_id == user_id && c.service == service)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn create(&self, conn: &mut OAuthConnection) -> Result<(), AppError> {
        let mut conns = self.conns.write().unwrap();
        // Mirrors the unique (user_id, service) index.
        if conns
            .values()
            .any(|c| c.user_id == conn.user_id && c.service == conn.service)
        {
            return Err(AppError::Upstream(anyhow::anyhow!(
                "duplicate oauth connection for user {} and {}",
                conn.user_id,
                conn.service
            )));
        }
        conn.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        conn.created_at = Some(OffsetDateTime::now_utc());
        conns.insert(conn.id, conn.clone());
        Ok(())
    }

    async fn update_token(&self, id: i64, token: &ProviderToken) -> Result<(), AppError> {
        let mut conns = self.conns.write().unwrap();
        let conn = conns.get_mut(&id).ok_or(AppError::NotFound)?;
        conn.access_token = token.access_token.clone();
        conn.token_type = token.token_type.clone();
        conn.refresh_token = token.refresh_token.clone();
        conn.expiry = token.expiry;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.conns.write().unwrap().remove(&id);
        Ok(())
    }
}
