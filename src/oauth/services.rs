use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use super::provider::OAuthProvider;
use super::repo::OAuthStore;
use super::repo_types::{OAuthConnection, ProviderToken};
use crate::error::{AppError, ValidationError};

type ConnectionCheck = fn(&OAuthConnection) -> Result<(), AppError>;

const CREATE_STEPS: &[ConnectionCheck] = &[user_id_required, service_required];

fn user_id_required(conn: &OAuthConnection) -> Result<(), AppError> {
    if conn.user_id <= 0 {
        return Err(ValidationError::UserIdRequired.into());
    }
    Ok(())
}

fn service_required(conn: &OAuthConnection) -> Result<(), AppError> {
    if conn.service.is_empty() {
        return Err(ValidationError::ServiceRequired.into());
    }
    Ok(())
}

/// `state` echoed by the provider must equal the value issued in the cookie.
pub fn verify_state(issued: Option<&str>, returned: &str) -> Result<(), AppError> {
    match issued {
        Some(issued) if !issued.is_empty() && issued == returned => Ok(()),
        _ => Err(AppError::InvalidOAuthState),
    }
}

#[derive(Clone)]
pub struct OAuthService {
    store: Arc<dyn OAuthStore>,
}

impl OAuthService {
    pub fn new(store: Arc<dyn OAuthStore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, user_id: i64, service: &str) -> Result<OAuthConnection, AppError> {
        self.store.find(user_id, service).await
    }

    pub async fn create(&self, conn: &mut OAuthConnection) -> Result<(), AppError> {
        CREATE_STEPS.iter().try_for_each(|step| step(conn))?;
        self.store.create(conn).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if id <= 0 {
            return Err(AppError::InvalidId);
        }
        self.store.delete(id).await
    }

    /// Replaces any existing connection for (user, service) with `token`.
    pub async fn connect(
        &self,
        user_id: i64,
        service: &str,
        token: ProviderToken,
    ) -> Result<OAuthConnection, AppError> {
        match self.find(user_id, service).await {
            Ok(existing) => self.delete(existing.id).await?,
            Err(AppError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let mut conn = OAuthConnection {
            user_id,
            service: service.to_string(),
            access_token: token.access_token,
            token_type: token.token_type,
            refresh_token: token.refresh_token,
            expiry: token.expiry,
            ..Default::default()
        };
        self.create(&mut conn).await?;
        info!(user_id, service, "oauth connection stored");
        Ok(conn)
    }

    /// Returns the connection with a usable access token, refreshing and
    /// persisting it first when it has expired.
    pub async fn usable(
        &self,
        provider: &OAuthProvider,
        mut conn: OAuthConnection,
    ) -> Result<OAuthConnection, AppError> {
        if !conn.is_expired(OffsetDateTime::now_utc()) {
            return Ok(conn);
        }
        let Some(refresh) = conn.refresh_token.clone() else {
            return Ok(conn);
        };

        let token = provider.refresh(&refresh).await?;
        self.store.update_token(conn.id, &token).await?;
        info!(user_id = conn.user_id, service = provider.name(), "oauth token refreshed");

        conn.access_token = token.access_token;
        conn.token_type = token.token_type;
        conn.refresh_token = token.refresh_token;
        conn.expiry = token.expiry;
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::memory::InMemoryOAuthStore;

    fn service() -> OAuthService {
        OAuthService::new(Arc::new(InMemoryOAuthStore::new()))
    }

    fn token(access: &str) -> ProviderToken {
        ProviderToken {
            access_token: access.into(),
            token_type: "bearer".into(),
            ..Default::default()
        }
    }

    #[test]
    fn state_must_match_issued_cookie() {
        assert!(verify_state(Some("abc"), "abc").is_ok());
        assert!(matches!(verify_state(Some("abc"), "abd"), Err(AppError::InvalidOAuthState)));
        assert!(matches!(verify_state(None, "abc"), Err(AppError::InvalidOAuthState)));
        assert!(matches!(verify_state(Some(""), ""), Err(AppError::InvalidOAuthState)));
    }

    #[tokio::test]
    async fn create_validates_owner_then_service() {
        let svc = service();
        let mut conn = OAuthConnection { service: "dropbox".into(), ..Default::default() };
        assert!(matches!(
            svc.create(&mut conn).await,
            Err(AppError::Validation(ValidationError::UserIdRequired))
        ));
        let mut conn = OAuthConnection { user_id: 1, ..Default::default() };
        assert!(matches!(
            svc.create(&mut conn).await,
            Err(AppError::Validation(ValidationError::ServiceRequired))
        ));
    }

    #[tokio::test]
    async fn connect_replaces_previous_connection() {
        let svc = service();
        let first = svc.connect(1, "dropbox", token("one")).await.unwrap();
        let second = svc.connect(1, "dropbox", token("two")).await.unwrap();
        assert_ne!(first.id, second.id);

        let found = svc.find(1, "dropbox").await.unwrap();
        assert_eq!(found.id, second.id);
        assert_eq!(found.access_token, "two");
        assert!(matches!(svc.find(2, "dropbox").await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn delete_rejects_invalid_id() {
        assert!(matches!(service().delete(0).await, Err(AppError::InvalidId)));
    }

    /// Provider backed by a local token endpoint that always answers `body`.
    async fn provider_answering(body: serde_json::Value) -> OAuthProvider {
        use axum::{routing::post, Json, Router};

        let app = Router::new().route("/token", post(move || async move { Json(body) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let cfg = crate::config::OAuthConfig {
            id: "cid".into(),
            secret: "secret".into(),
            auth_url: "https://example.com/authorize".into(),
            token_url: format!("http://{addr}/token"),
            redirect_url: "http://localhost/cb".into(),
        };
        OAuthProvider::from_config("dropbox", &cfg, "http://localhost/cb").unwrap()
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let provider = provider_answering(serde_json::json!({
            "access_token": "fresh",
            "token_type": "bearer",
            "expires_in": 3600
        }))
        .await;

        let svc = service();
        let stale = ProviderToken {
            refresh_token: Some("keep-me".into()),
            expiry: Some(OffsetDateTime::now_utc() - time::Duration::minutes(1)),
            ..token("stale")
        };
        let conn = svc.connect(1, "dropbox", stale).await.unwrap();

        let conn = svc.usable(&provider, conn).await.unwrap();
        assert_eq!(conn.access_token, "fresh");
        assert_eq!(conn.refresh_token.as_deref(), Some("keep-me"));
        assert!(!conn.is_expired(OffsetDateTime::now_utc()));

        let stored = svc.find(1, "dropbox").await.unwrap();
        assert_eq!(stored.access_token, "fresh");
    }

    #[tokio::test]
    async fn out_of_range_expires_in_means_no_expiry() {
        let provider = provider_answering(serde_json::json!({
            "access_token": "forever",
            "token_type": "bearer",
            "expires_in": u64::MAX
        }))
        .await;

        let exchanged = provider.exchange("code").await.unwrap();
        assert_eq!(exchanged.access_token, "forever");
        assert!(exchanged.expiry.is_none());

        let svc = service();
        let stale = ProviderToken {
            refresh_token: Some("r".into()),
            expiry: Some(OffsetDateTime::now_utc() - time::Duration::minutes(1)),
            ..token("stale")
        };
        let conn = svc.connect(1, "dropbox", stale).await.unwrap();
        let conn = svc.usable(&provider, conn).await.unwrap();
        assert_eq!(conn.access_token, "forever");
        assert!(conn.expiry.is_none());
        assert!(svc.find(1, "dropbox").await.unwrap().expiry.is_none());
    }

    #[tokio::test]
    async fn live_token_is_used_as_is() {
        let cfg = crate::config::OAuthConfig {
            id: "cid".into(),
            auth_url: "https://example.com/authorize".into(),
            token_url: "http://127.0.0.1:1/token".into(),
            ..Default::default()
        };
        let provider = OAuthProvider::from_config("dropbox", &cfg, "http://localhost/cb").unwrap();
        let svc = service();
        let conn = svc.connect(1, "dropbox", token("live")).await.unwrap();
        assert_eq!(svc.usable(&provider, conn).await.unwrap().access_token, "live");
    }
}
