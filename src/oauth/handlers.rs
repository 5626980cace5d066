use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Response,
    routing::get,
    Json, Router,
};
use tower_cookies::Cookies;
use tracing::{info, instrument, warn};

use super::dropbox::{self, Listing, LIST_FOLDER_URL};
use super::dto::{CallbackQuery, ListQuery};
use super::provider::OAuthProvider;
use super::services::verify_state;
use crate::auth::cookies::{clear_oauth_state_cookie, oauth_state, set_oauth_state_cookie};
use crate::auth::extractors::AuthUser;
use crate::auth::middleware::require_user;
use crate::error::AppError;
use crate::state::AppState;
use crate::tokens;
use crate::views::{self, Alert};

const STATE_BYTES: usize = 32;

pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/oauth/:service/connect", get(connect))
        .route("/oauth/:service/callback", get(callback))
        .route("/oauth/:service/test", get(list_remote))
        .route_layer(middleware::from_fn(require_user))
}

fn provider<'a>(state: &'a AppState, service: &str) -> Result<&'a OAuthProvider, AppError> {
    state.provider(service).ok_or(AppError::UnknownService)
}

/// Issues a state value in a cookie and sends the user to the consent page.
#[instrument(skip_all)]
async fn connect(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Path(service): Path<String>,
) -> Result<Response, AppError> {
    let provider = provider(&state, &service)?;
    let csrf = tokens::string(STATE_BYTES)?;
    set_oauth_state_cookie(&cookies, &csrf, state.config.is_prod());
    info!(user_id = user.id, service = provider.name(), "oauth connect started");
    Ok(views::redirect(&provider.authorize_url(&csrf)))
}

/// Verifies the state before any network call, then exchanges the code and
/// replaces the user's connection for this service.
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(user): AuthUser,
    Path(service): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let provider = provider(&state, &service)?;

    let issued = oauth_state(&cookies);
    if let Err(e) = verify_state(issued.as_deref(), &query.state) {
        warn!(user_id = user.id, %service, "oauth state mismatch");
        return Err(e);
    }
    clear_oauth_state_cookie(&cookies);

    let token = provider.exchange(&query.code).await.map_err(|e| {
        warn!(error = %e, user_id = user.id, %service, "oauth token exchange failed");
        e
    })?;
    state.oauth.connect(user.id, &service, token).await?;

    Ok(views::redirect_alert(
        &cookies,
        "/galleries",
        Alert::success(format!("Your {service} account is now connected.")),
    ))
}

/// Lists a folder of the connected account, refreshing the token if needed.
#[instrument(skip_all)]
async fn list_remote(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(service): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Listing>, AppError> {
    let provider = provider(&state, &service)?;
    let conn = state.oauth.find(user.id, &service).await?;
    let conn = state.oauth.usable(provider, conn).await?;

    let listing =
        dropbox::list_folder(&state.http, LIST_FOLDER_URL, &conn.access_token, &query.path).await?;
    Ok(Json(listing))
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::post, Json, Router};
    use cookie::Cookie;

    use crate::auth::cookies::OAUTH_STATE_COOKIE;
    use crate::testing::TestApp;

    #[tokio::test]
    async fn connect_sets_state_and_redirects_to_provider() {
        let app = TestApp::new();
        let session = app.signup("jon@example.com", "password1").await;

        let res = app
            .server
            .get("/oauth/dropbox/connect")
            .add_cookie(session)
            .await;
        res.assert_status(StatusCode::FOUND);
        let state = res.cookie(OAUTH_STATE_COOKIE);
        assert!(!state.value().is_empty());

        let location = res.header("location").to_str().unwrap().to_string();
        let url = reqwest::Url::parse(&location).unwrap();
        assert_eq!(url.host_str(), Some("www.dropbox.com"));
        let returned = url.query_pairs().find(|(k, _)| k == "state").unwrap().1.into_owned();
        assert_eq!(returned, state.value());
    }

    #[tokio::test]
    async fn unknown_service_is_rejected() {
        let app = TestApp::new();
        let session = app.signup("jon@example.com", "password1").await;
        let res = app
            .server
            .get("/oauth/flickr/connect")
            .add_cookie(session)
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oauth_routes_require_a_session() {
        let app = TestApp::new();
        let res = app.server.get("/oauth/dropbox/connect").await;
        res.assert_status(StatusCode::FOUND);
        assert_eq!(res.header("location"), "/login");
    }

    #[tokio::test]
    async fn mismatched_state_fails_before_exchange() {
        let app = TestApp::new();
        let session = app.signup("jon@example.com", "password1").await;

        let res = app
            .server
            .get("/oauth/dropbox/callback")
            .add_query_param("code", "abc")
            .add_query_param("state", "forged")
            .add_cookie(session.clone())
            .add_cookie(Cookie::new(OAUTH_STATE_COOKIE, "issued"))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.text(), "Invalid state provided");

        let res = app
            .server
            .get("/oauth/dropbox/callback")
            .add_query_param("code", "abc")
            .add_query_param("state", "forged")
            .add_cookie(session)
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.text(), "Invalid state provided");
    }

    #[tokio::test]
    async fn matching_state_reaches_the_exchange() {
        let app = TestApp::new();
        let session = app.signup("jon@example.com", "password1").await;

        // The fake token endpoint is unreachable, so the exchange itself fails.
        let res = app
            .server
            .get("/oauth/dropbox/callback")
            .add_query_param("code", "abc")
            .add_query_param("state", "issued")
            .add_cookie(session)
            .add_cookie(Cookie::new(OAUTH_STATE_COOKIE, "issued"))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert!(res.text().starts_with("Token exchange failed"));
    }

    #[tokio::test]
    async fn successful_callback_stores_connection() {
        let token_server = Router::new().route(
            "/token",
            post(|| async {
                Json(serde_json::json!({
                    "access_token": "remote-access",
                    "token_type": "bearer",
                    "refresh_token": "remote-refresh",
                    "expires_in": 14400
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, token_server).await.unwrap() });

        let app = TestApp::with_config(|cfg| cfg.dropbox.token_url = format!("http://{addr}/token"));
        let session = app.signup("jon@example.com", "password1").await;
        let user = app.state.users.by_remember(session.value()).await.unwrap();

        for _ in 0..2 {
            let res = app
                .server
                .get("/oauth/dropbox/callback")
                .add_query_param("code", "abc")
                .add_query_param("state", "issued")
                .add_cookie(session.clone())
                .add_cookie(Cookie::new(OAUTH_STATE_COOKIE, "issued"))
                .await;
            res.assert_status(StatusCode::FOUND);
            assert_eq!(res.header("location"), "/galleries");
            assert!(res.cookie(OAUTH_STATE_COOKIE).value().is_empty());
        }

        let conn = app.state.oauth.find(user.id, "dropbox").await.unwrap();
        assert_eq!(conn.access_token, "remote-access");
        assert_eq!(conn.refresh_token.as_deref(), Some("remote-refresh"));
        assert!(conn.expiry.is_some());
    }

    #[tokio::test]
    async fn listing_without_connection_is_not_found() {
        let app = TestApp::new();
        let session = app.signup("jon@example.com", "password1").await;
        let res = app
            .server
            .get("/oauth/dropbox/test")
            .add_cookie(session)
            .await;
        res.assert_status(StatusCode::NOT_FOUND);
    }
}
