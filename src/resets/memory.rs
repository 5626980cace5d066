use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::ResetStore;
use super::repo_types::PasswordReset;
use crate::error::AppError;

#[derive(Default)]
pub struct InMemoryResetStore {
    resets: RwLock<HashMap<i64, PasswordReset>>,
    next_id: AtomicI64,
}

impl InMemoryResetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdates a reset so expiry can be exercised.
    #[cfg(test)]
    pub fn set_created_at(&self, id: i64, created_at: OffsetDateTime) {
        if let Some(r) = self.resets.write().unwrap().get_mut(&id) {
            r.created_at = Some(created_at);
        }
    }
}

#[async_trait]
impl ResetStore for InMemoryResetStore {
    async fn by_token_hash(&self, token_hash: &str) -> Result<PasswordReset, AppError> {
        self.resets
            .read()
            .unwrap()
            .values()
            .find(|r| r.token_hash == token_hash)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn create(&self, reset: &mut PasswordReset) -> Result<(), AppError> {
        reset.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        reset.created_at = Some(OffsetDateTime::now_utc());
        let stored = PasswordReset {
            token: None,
            ..reset.clone()
        };
        self.resets.write().unwrap().insert(reset.id, stored);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.resets.write().unwrap().remove(&id);
        Ok(())
    }
}
