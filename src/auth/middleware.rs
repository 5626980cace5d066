use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use tracing::{debug, warn};

use super::cookies::remember_token;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::repo_types::User;
use crate::views;

/// Resolves the remember cookie to a user and stores it in the request
/// extensions. Anonymous requests pass through untouched.
pub async fn resolve_user(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = remember_token(&cookies) {
        match state.users.by_remember(&token).await {
            Ok(user) => {
                debug!(user_id = user.id, "session resolved");
                req.extensions_mut().insert(user);
            }
            Err(AppError::NotFound) => debug!("remember token did not match a user"),
            Err(e) => warn!(error = %e, "session lookup failed"),
        }
    }
    next.run(req).await
}

/// Redirects to the login page unless `resolve_user` attached a user.
pub async fn require_user(req: Request, next: Next) -> Response {
    if req.extensions().get::<User>().is_none() {
        return views::redirect("/login");
    }
    next.run(req).await
}
