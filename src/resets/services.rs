use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use super::repo::ResetStore;
use super::repo_types::PasswordReset;
use crate::error::{AppError, ValidationError};
use crate::hash::Hmac;
use crate::tokens;

type ResetCheck = fn(&ResetService, &mut PasswordReset) -> Result<(), AppError>;

/// Issue steps, in order.
const CREATE_STEPS: &[ResetCheck] = &[
    ResetService::require_user_id,
    ResetService::set_token_if_unset,
    ResetService::hmac_token,
];

#[derive(Clone)]
pub struct ResetService {
    store: Arc<dyn ResetStore>,
    hmac: Hmac,
    ttl: Duration,
}

impl ResetService {
    pub fn new(store: Arc<dyn ResetStore>, hmac: Hmac, ttl: Duration) -> Self {
        Self { store, hmac, ttl }
    }

    /// Persists the digest; the plaintext stays in `reset.token` for the caller.
    pub async fn create(&self, reset: &mut PasswordReset) -> Result<(), AppError> {
        for step in CREATE_STEPS {
            step(self, reset)?;
        }
        self.store.create(reset).await
    }

    pub async fn by_token(&self, token: &str) -> Result<PasswordReset, AppError> {
        self.store.by_token_hash(&self.hmac.hash(token)).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if id <= 0 {
            return Err(AppError::InvalidId);
        }
        self.store.delete(id).await
    }

    pub fn is_expired(&self, reset: &PasswordReset) -> bool {
        match reset.created_at {
            Some(created_at) => created_at + self.ttl < OffsetDateTime::now_utc(),
            None => false,
        }
    }

    fn require_user_id(&self, reset: &mut PasswordReset) -> Result<(), AppError> {
        if reset.user_id <= 0 {
            return Err(ValidationError::UserIdRequired.into());
        }
        Ok(())
    }

    fn set_token_if_unset(&self, reset: &mut PasswordReset) -> Result<(), AppError> {
        if reset.token.is_none() {
            reset.token = Some(tokens::remember_token()?);
        }
        Ok(())
    }

    fn hmac_token(&self, reset: &mut PasswordReset) -> Result<(), AppError> {
        if let Some(token) = &reset.token {
            reset.token_hash = self.hmac.hash(token);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resets::memory::InMemoryResetStore;

    fn service() -> ResetService {
        ResetService::new(
            Arc::new(InMemoryResetStore::new()),
            Hmac::new("test-key"),
            Duration::hours(1),
        )
    }

    #[tokio::test]
    async fn create_requires_user_id() {
        let svc = service();
        let mut reset = PasswordReset::default();
        let err = svc.create(&mut reset).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::UserIdRequired)));
    }

    #[tokio::test]
    async fn create_issues_token_and_stores_digest_only() {
        let svc = service();
        let mut reset = PasswordReset { user_id: 7, ..Default::default() };
        svc.create(&mut reset).await.unwrap();

        let token = reset.token.clone().expect("token issued");
        assert_ne!(reset.token_hash, token);

        let found = svc.by_token(&token).await.unwrap();
        assert_eq!(found.user_id, 7);
        assert!(found.token.is_none());
        assert!(matches!(svc.by_token("bogus").await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn supplied_token_is_kept() {
        let svc = service();
        let mut reset = PasswordReset {
            user_id: 1,
            token: Some("chosen".into()),
            ..Default::default()
        };
        svc.create(&mut reset).await.unwrap();
        assert_eq!(reset.token.as_deref(), Some("chosen"));
        assert!(svc.by_token("chosen").await.is_ok());
    }

    #[tokio::test]
    async fn delete_rejects_non_positive_ids() {
        let svc = service();
        assert!(matches!(svc.delete(0).await, Err(AppError::InvalidId)));
        assert!(matches!(svc.delete(-3).await, Err(AppError::InvalidId)));
    }

    #[test]
    fn expiry_uses_ttl() {
        let svc = service();
        let fresh = PasswordReset {
            created_at: Some(OffsetDateTime::now_utc()),
            ..Default::default()
        };
        let stale = PasswordReset {
            created_at: Some(OffsetDateTime::now_utc() - Duration::hours(2)),
            ..Default::default()
        };
        assert!(!svc.is_expired(&fresh));
        assert!(svc.is_expired(&stale));
    }
}
