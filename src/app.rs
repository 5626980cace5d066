use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::auth::csrf;
use crate::auth::extractors::MaybeUser;
use crate::auth::middleware::resolve_user;
use crate::galleries::gallery_routes;
use crate::galleries::images::IMAGES_URL_PREFIX;
use crate::oauth::oauth_routes;
use crate::state::AppState;
use crate::users::user_routes;
use crate::views::{self, Data};

pub fn build_app(state: AppState) -> Router {
    let images = ServeDir::new(state.images.root());

    Router::new()
        .route("/", get(home))
        .route("/contact", get(contact))
        .route("/faq", get(faq))
        .merge(user_routes())
        .merge(gallery_routes())
        .merge(oauth_routes())
        .nest_service(IMAGES_URL_PREFIX, images)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_user))
        .layer(middleware::from_fn_with_state(state.clone(), csrf::protect))
        .layer(CookieManagerLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
        .with_state(state)
}

async fn home(cookies: Cookies, MaybeUser(user): MaybeUser) -> Response {
    views::render(&cookies, "home.html", Data::new(()).with_user(user.as_ref()))
}

async fn contact(cookies: Cookies, MaybeUser(user): MaybeUser) -> Response {
    views::render(&cookies, "static/contact.html", Data::new(()).with_user(user.as_ref()))
}

async fn faq(cookies: Cookies, MaybeUser(user): MaybeUser) -> Response {
    views::render(&cookies, "static/faq.html", Data::new(()).with_user(user.as_ref()))
}

async fn not_found(cookies: Cookies, MaybeUser(user): MaybeUser) -> Response {
    let data = Data::new(()).with_user(user.as_ref());
    let page = views::render(&cookies, "static/not_found.html", data);
    (StatusCode::NOT_FOUND, page).into_response()
}

pub async fn serve(app: Router, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        port
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::testing::TestApp;

    #[tokio::test]
    async fn home_renders_for_anonymous_and_signed_in() {
        let app = TestApp::new();
        let res = app.server.get("/").await;
        res.assert_status_ok();
        assert!(res.text().contains("Sign up"));

        let session = app.signup("jon@example.com", "password1").await;
        let res = app.server.get("/").add_cookie(session).await;
        assert!(res.text().contains("Log out"));
    }

    #[tokio::test]
    async fn static_pages_render() {
        let app = TestApp::new();
        let res = app.server.get("/contact").await;
        res.assert_status_ok();
        assert!(res.text().contains("Contact us"));

        let res = app.server.get("/faq").await;
        res.assert_status_ok();
        assert!(res.text().contains("Frequently asked questions"));
    }

    #[tokio::test]
    async fn unknown_paths_get_the_not_found_page() {
        let app = TestApp::new();
        let res = app.server.get("/no/such/page").await;
        res.assert_status(StatusCode::NOT_FOUND);
        assert!(res.text().contains("We could not find that page"));
    }

    #[tokio::test]
    async fn stored_images_are_served() {
        let app = TestApp::new();
        let image = app.state.images.create(5, b"pixels", "dot.png").await.unwrap();

        let res = app.server.get(&image.path()).await;
        res.assert_status_ok();
        assert_eq!(res.as_bytes().as_ref(), b"pixels");

        app.server
            .get("/images/galleries/5/missing.png")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bogus_session_cookie_is_anonymous() {
        let app = TestApp::new();
        let res = app
            .server
            .get("/galleries")
            .add_cookie(cookie::Cookie::new(
                crate::auth::cookies::REMEMBER_COOKIE,
                "not-a-real-token",
            ))
            .await;
        res.assert_status(StatusCode::FOUND);
        assert_eq!(res.header("location"), "/login");
    }

    #[tokio::test]
    async fn flash_alert_shows_once() {
        let app = TestApp::new();
        app.signup("jon@example.com", "password1").await;
        let token = app.state.users.initiate_reset("jon@example.com").await.unwrap();

        let res = app
            .post("/reset")
            .form(&[("token", token.as_str()), ("password", "new-password")])
            .await;
        res.assert_status(StatusCode::FOUND);
        let level = res.cookie("alert_level");
        let message = res.cookie("alert_message");

        let res = app
            .server
            .get("/galleries")
            .add_cookie(res.cookie(crate::auth::cookies::REMEMBER_COOKIE))
            .add_cookie(level)
            .add_cookie(message)
            .await;
        res.assert_status_ok();
        assert!(res.text().contains("Your password has been reset"));
        assert!(res.cookie("alert_message").value().is_empty());
    }
}
