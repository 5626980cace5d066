//! Shared helpers for router-level tests.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum_test::{TestRequest, TestServer};
use cookie::Cookie;
use tempfile::TempDir;

use crate::auth::cookies::{CSRF_COOKIE, REMEMBER_COOKIE};
use crate::auth::csrf::CSRF_HEADER;
use crate::config::{AppConfig, OAuthConfig};
use crate::email::{EmailSender, Message};
use crate::state::AppState;

/// Captures outgoing mail.
#[derive(Default, Clone)]
pub struct RecordingEmailSender {
    pub sent: Arc<RwLock<Vec<Message>>>,
}

impl RecordingEmailSender {
    pub fn last_to(&self, to: &str) -> Option<Message> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.to.contains(to))
            .cloned()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        self.sent.write().unwrap().push(message);
        Ok(())
    }
}

const TEST_CSRF_TOKEN: &str = "test-csrf-token";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub mailer: RecordingEmailSender,
    pub images: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let images = tempfile::tempdir().unwrap();
        let mut config = AppConfig {
            bcrypt_cost: 4,
            images_dir: images.path().to_string_lossy().into_owned(),
            dropbox: OAuthConfig {
                id: "test-client".into(),
                secret: "test-secret".into(),
                auth_url: "https://www.dropbox.com/oauth2/authorize".into(),
                // Nothing listens here; an exchange attempt fails fast.
                token_url: "http://127.0.0.1:1/token".into(),
                redirect_url: String::new(),
            },
            ..AppConfig::default()
        };
        tweak(&mut config);

        let mailer = RecordingEmailSender::default();
        let state = AppState::fake(config, Arc::new(mailer.clone()));
        let server = TestServer::new(crate::app::build_app(state.clone())).unwrap();
        Self {
            server,
            state,
            mailer,
            images,
        }
    }

    /// POST carrying a matching CSRF cookie and header.
    pub fn post(&self, path: &str) -> TestRequest {
        self.server
            .post(path)
            .add_cookie(Cookie::new(CSRF_COOKIE, TEST_CSRF_TOKEN))
            .add_header(CSRF_HEADER, TEST_CSRF_TOKEN)
    }

    /// Signs up a user and returns their session cookie.
    pub async fn signup(&self, email: &str, password: &str) -> Cookie<'static> {
        let res = self
            .post("/signup")
            .form(&[
                ("name", "Test User"),
                ("age", "30"),
                ("email", email),
                ("password", password),
            ])
            .await;
        res.assert_status(axum::http::StatusCode::FOUND);
        res.cookie(REMEMBER_COOKIE)
    }
}
