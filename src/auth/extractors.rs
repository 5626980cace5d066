use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};

use crate::users::repo_types::User;
use crate::views;

/// The signed-in user; redirects to `/login` when there is none.
pub struct AuthUser(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| views::redirect("/login"))
    }
}

/// The signed-in user, if any.
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<User>().cloned()))
    }
}
