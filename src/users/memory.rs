//! In-memory user store

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::UserStore;
use super::repo_types::User;
use crate::error::AppError;

pub struct InMemoryUserStore {
    users: RwLock<HashMap<i64, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Result<User, AppError> {
        self.users
            .read()
            .unwrap()
            .values()
            .find(|u| pred(u))
            .cloned()
            .ok_or(AppError::NotFound)
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Stored copies never carry plaintext fields.
fn at_rest(user: &User) -> User {
    User {
        password: None,
        remember: None,
        ..user.clone()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn by_id(&self, id: i64) -> Result<User, AppError> {
        self.find(|u| u.id == id)
    }

    async fn by_email(&self, email: &str) -> Result<User, AppError> {
        self.find(|u| u.email == email)
    }

    async fn by_remember(&self, remember_hash: &str) -> Result<User, AppError> {
        self.find(|u| u.remember_hash == remember_hash)
    }

    async fn create(&self, user: &mut User) -> Result<(), AppError> {
        let now = OffsetDateTime::now_utc();
        user.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        user.created_at = Some(now);
        user.updated_at = Some(now);
        self.users.write().unwrap().insert(user.id, at_rest(user));
        Ok(())
    }

    async fn update(&self, user: &mut User) -> Result<(), AppError> {
        let mut users = self.users.write().unwrap();
        let slot = users.get_mut(&user.id).ok_or(AppError::NotFound)?;
        user.updated_at = Some(OffsetDateTime::now_utc());
        *slot = at_rest(user);
        Ok(())
    }
}
