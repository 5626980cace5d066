use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::email::{ConsoleEmailSender, EmailSender, MailgunEmailSender};
use crate::galleries::images::ImageService;
use crate::galleries::memory::InMemoryGalleryStore;
use crate::galleries::repo::{GalleryStore, PgGalleryStore};
use crate::galleries::services::GalleryService;
use crate::hash::Hmac;
use crate::oauth::memory::InMemoryOAuthStore;
use crate::oauth::provider::OAuthProvider;
use crate::oauth::repo::{OAuthStore, PgOAuthStore};
use crate::oauth::services::OAuthService;
use crate::resets::memory::InMemoryResetStore;
use crate::resets::repo::{PgResetStore, ResetStore};
use crate::resets::services::ResetService;
use crate::users::memory::InMemoryUserStore;
use crate::users::repo::{PgUserStore, UserStore};
use crate::users::services::UserService;

pub const DROPBOX: &str = "dropbox";

/// Storage backends for every service.
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub resets: Arc<dyn ResetStore>,
    pub galleries: Arc<dyn GalleryStore>,
    pub oauth: Arc<dyn OAuthStore>,
}

impl Stores {
    pub fn postgres(db: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(db.clone())),
            resets: Arc::new(PgResetStore::new(db.clone())),
            galleries: Arc::new(PgGalleryStore::new(db.clone())),
            oauth: Arc::new(PgOAuthStore::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            resets: Arc::new(InMemoryResetStore::new()),
            galleries: Arc::new(InMemoryGalleryStore::new()),
            oauth: Arc::new(InMemoryOAuthStore::new()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserService,
    pub galleries: GalleryService,
    pub images: ImageService,
    pub oauth: OAuthService,
    pub providers: Arc<HashMap<String, OAuthProvider>>,
    pub emailer: Arc<dyn EmailSender>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Loads config, connects and migrates the database, and picks a mailer.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let db = crate::db::connect(&config.database_url()).await?;
        crate::db::migrate(&db).await?;

        let http = reqwest::Client::new();
        let emailer: Arc<dyn EmailSender> = if config.mailgun.is_configured() {
            tracing::info!(domain = %config.mailgun.domain, "using mailgun mailer");
            Arc::new(MailgunEmailSender::new(http.clone(), &config.mailgun))
        } else {
            tracing::warn!("mailgun not configured; emails are only logged");
            Arc::new(ConsoleEmailSender::new())
        };

        Self::from_parts(config, Stores::postgres(db), emailer, http)
    }

    pub fn from_parts(
        config: AppConfig,
        stores: Stores,
        emailer: Arc<dyn EmailSender>,
        http: reqwest::Client,
    ) -> anyhow::Result<Self> {
        let hmac = Hmac::new(&config.hmac_key);
        let resets = ResetService::new(
            stores.resets,
            hmac.clone(),
            time::Duration::minutes(config.reset_token_ttl_minutes),
        );
        let users = UserService::new(
            stores.users,
            resets,
            hmac,
            config.pepper.clone(),
            config.bcrypt_cost,
        );

        let mut providers = HashMap::new();
        if config.dropbox.is_configured() {
            let callback = format!(
                "{}/oauth/{DROPBOX}/callback",
                config.base_url.trim_end_matches('/')
            );
            providers.insert(
                DROPBOX.to_string(),
                OAuthProvider::from_config(DROPBOX, &config.dropbox, &callback)?,
            );
        }

        Ok(Self {
            users,
            galleries: GalleryService::new(stores.galleries),
            images: ImageService::new(&config.images_dir),
            oauth: OAuthService::new(stores.oauth),
            providers: Arc::new(providers),
            emailer,
            http,
            config: Arc::new(config),
        })
    }

    pub fn provider(&self, service: &str) -> Option<&OAuthProvider> {
        self.providers.get(service)
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub fn fake(config: AppConfig, emailer: Arc<dyn EmailSender>) -> Self {
        Self::from_parts(config, Stores::in_memory(), emailer, reqwest::Client::new())
            .expect("fake state")
    }
}
