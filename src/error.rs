use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub const GENERIC_MESSAGE: &str =
    "Something went wrong. Please try again, and contact us if the problem persists.";

/// Field-level failures raised by the validation pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email address is required")]
    EmailRequired,
    #[error("Email address is not valid")]
    EmailInvalid,
    #[error("Email address is already taken")]
    EmailTaken,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("Password is required")]
    PasswordRequired,
    #[error("User ID is required")]
    UserIdRequired,
    #[error("Title is required")]
    TitleRequired,
    #[error("Service is required")]
    ServiceRequired,
    #[error("Reset token has expired")]
    ResetTokenExpired,
    #[error("Filename is not valid")]
    FilenameInvalid,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource not found")]
    NotFound,

    #[error("ID provided was invalid")]
    InvalidId,

    #[error("Incorrect password provided")]
    IncorrectPassword,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("You do not have permission to access this resource")]
    Forbidden,

    #[error("Invalid state provided")]
    InvalidOAuthState,

    #[error("Invalid OAuth2 service")]
    UnknownService,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl AppError {
    /// Message safe to show to the end user, if any.
    pub fn public_message(&self) -> Option<String> {
        match self {
            AppError::Database(_) | AppError::Io(_) | AppError::Upstream(_) => None,
            other => Some(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::InvalidId => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::IncorrectPassword => StatusCode::UNAUTHORIZED,
            AppError::Validation(_)
            | AppError::InvalidOAuthState
            | AppError::UnknownService
            | AppError::TokenExchange(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Io(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Like `public_message`, but logs and substitutes private errors.
    pub fn user_message(&self) -> String {
        match self.public_message() {
            Some(msg) => msg,
            None => {
                tracing::error!(error = %self, "internal error");
                GENERIC_MESSAGE.to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.user_message()).into_response()
    }
}
