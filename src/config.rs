use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: "postgres".into(),
            name: "lenslocked_dev".into(),
        }
    }
}

impl PostgresConfig {
    pub fn connection_url(&self) -> String {
        if self.password.is_empty() {
            format!(
                "postgres://{}@{}:{}/{}?sslmode=disable",
                self.user, self.host, self.port, self.name
            )
        } else {
            format!(
                "postgres://{}:{}@{}:{}/{}?sslmode=disable",
                self.user, self.password, self.host, self.port, self.name
            )
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    /// Sender address; falls back to `support@<domain>`.
    pub from: String,
}

impl MailgunConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.domain.is_empty()
    }
}

/// Client registration for one third-party OAuth2 provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub id: String,
    pub secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_url: String,
}

impl OAuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.id.is_empty() && !self.auth_url.is_empty() && !self.token_url.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub env: String,
    pub pepper: String,
    pub hmac_key: String,
    pub bcrypt_cost: u32,
    pub images_dir: String,
    pub base_url: String,
    pub reset_token_ttl_minutes: i64,
    pub database: PostgresConfig,
    pub mailgun: MailgunConfig,
    pub dropbox: OAuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            env: "dev".into(),
            pepper: "foobar".into(),
            hmac_key: "secret-hmac-key".into(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            images_dir: "images".into(),
            base_url: "http://localhost:3000".into(),
            reset_token_ttl_minutes: 12 * 60,
            database: PostgresConfig::default(),
            mailgun: MailgunConfig::default(),
            dropbox: OAuthConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads the JSON config at `path`. A missing file yields the defaults
    /// unless `required` is set.
    pub fn load(path: impl AsRef<Path>, required: bool) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found; using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read config {}", path.display()));
            }
        };
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        tracing::info!(path = %path.display(), env = %cfg.env, "loaded config");
        Ok(cfg)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let path = std::env::var("APP_CONFIG").unwrap_or_else(|_| ".config".into());
        let required = std::env::args().any(|a| a == "--prod");
        Self::load(path, required)
    }

    pub fn is_prod(&self) -> bool {
        self.env == "prod"
    }

    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.connection_url())
    }
}
