pub mod templates;

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde::Serialize;
use tera::Context;
use tower_cookies::{cookie::time::Duration, Cookie, Cookies};
use tracing::error;

use crate::auth::cookies::csrf_token;
use crate::error::AppError;
use crate::users::dto::PublicUser;
use crate::users::repo_types::User;

const ALERT_LEVEL_COOKIE: &str = "alert_level";
const ALERT_MESSAGE_COOKIE: &str = "alert_message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[serde(rename = "danger")]
    Error,
    Warning,
    Info,
    Success,
}

impl AlertLevel {
    fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Error => "danger",
            AlertLevel::Warning => "warning",
            AlertLevel::Info => "info",
            AlertLevel::Success => "success",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "danger" => Some(AlertLevel::Error),
            "warning" => Some(AlertLevel::Warning),
            "info" => Some(AlertLevel::Info),
            "success" => Some(AlertLevel::Success),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Error,
            message: message.into(),
        }
    }
}

/// Top-level value every template receives.
#[derive(Debug, Serialize)]
pub struct Data<T: Serialize> {
    pub alert: Option<Alert>,
    pub user: Option<PublicUser>,
    /// Echoed by every form as a hidden field.
    pub csrf_token: String,
    pub page: T,
}

impl<T: Serialize> Data<T> {
    pub fn new(page: T) -> Self {
        Self {
            alert: None,
            user: None,
            csrf_token: String::new(),
            page,
        }
    }

    pub fn with_user(mut self, user: Option<&User>) -> Self {
        self.user = user.map(PublicUser::from);
        self
    }

    /// Public errors are shown as-is, anything else is logged and masked.
    pub fn set_alert(&mut self, err: &AppError) {
        self.alert = Some(Alert::error(err.user_message()));
    }

    pub fn alert_error(&mut self, message: impl Into<String>) {
        self.alert = Some(Alert::error(message));
    }
}

pub fn render<T: Serialize>(cookies: &Cookies, template: &str, mut data: Data<T>) -> Response {
    if data.alert.is_none() {
        data.alert = take_alert(cookies);
    }
    data.csrf_token = csrf_token(cookies).unwrap_or_default();
    let context = match Context::from_serialize(&data) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, template, "build template context failed");
            return internal_error();
        }
    };
    match templates::render(template, &context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = ?e, template, "render template failed");
            internal_error()
        }
    }
}

/// 302 to `to`.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

/// Stores a one-shot alert in cookies and redirects.
pub fn redirect_alert(cookies: &Cookies, to: &str, alert: Alert) -> Response {
    set_alert_cookies(cookies, &alert);
    redirect(to)
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, crate::error::GENERIC_MESSAGE).into_response()
}

fn set_alert_cookies(cookies: &Cookies, alert: &Alert) {
    let expires = Duration::minutes(5);
    cookies.add(
        Cookie::build((ALERT_LEVEL_COOKIE, alert.level.as_str().to_string()))
            .path("/")
            .http_only(true)
            .max_age(expires)
            .build(),
    );
    cookies.add(
        Cookie::build((ALERT_MESSAGE_COOKIE, URL_SAFE.encode(alert.message.as_bytes())))
            .path("/")
            .http_only(true)
            .max_age(expires)
            .build(),
    );
}

fn take_alert(cookies: &Cookies) -> Option<Alert> {
    let level = cookies.get(ALERT_LEVEL_COOKIE)?;
    let message = cookies.get(ALERT_MESSAGE_COOKIE)?;

    for name in [ALERT_LEVEL_COOKIE, ALERT_MESSAGE_COOKIE] {
        cookies.remove(Cookie::build((name, "")).path("/").build());
    }

    let level = AlertLevel::parse(level.value())?;
    let message = URL_SAFE
        .decode(message.value())
        .ok()
        .and_then(|raw| String::from_utf8(raw).ok())?;
    Some(Alert { level, message })
}
