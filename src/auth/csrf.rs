//! Double-submit CSRF protection for every state-changing request.
//!
//! Each browser gets a random token in an http-only cookie. Forms echo it in
//! a hidden `csrf_token` field (or the `X-CSRF-Token` header) and any request
//! other than GET, HEAD, OPTIONS or TRACE must carry a matching copy.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{FromRequest, Multipart, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Form,
};
use tower_cookies::Cookies;
use tracing::{error, warn};

use super::cookies::{csrf_token, set_csrf_cookie};
use crate::error::GENERIC_MESSAGE;
use crate::galleries::handlers::MAX_UPLOAD_BYTES;
use crate::state::AppState;
use crate::tokens;

pub const CSRF_FIELD: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

const CSRF_TOKEN_BYTES: usize = 32;
// Room for the multipart framing around a full upload.
const MAX_FORM_BYTES: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub async fn protect(
    State(state): State<AppState>,
    cookies: Cookies,
    req: Request,
    next: Next,
) -> Response {
    let issued = csrf_token(&cookies);

    let req = if is_safe(req.method()) {
        req
    } else {
        let Some(expected) = issued.as_deref() else {
            warn!(uri = %req.uri(), "state-changing request without a csrf cookie");
            return forbidden();
        };
        let uri = req.uri().clone();
        let (req, submitted) = match submitted_token(req).await {
            Ok(found) => found,
            Err(res) => return res,
        };
        if submitted.as_deref() != Some(expected) {
            warn!(%uri, "csrf token mismatch");
            return forbidden();
        }
        req
    };

    if issued.is_none() {
        match tokens::string(CSRF_TOKEN_BYTES) {
            Ok(token) => set_csrf_cookie(&cookies, &token, state.config.is_prod()),
            Err(e) => {
                error!(error = %e, "csrf token generation failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE).into_response();
            }
        }
    }
    next.run(req).await
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Invalid CSRF token").into_response()
}

/// Reads the token from the header, or else from the buffered form body.
/// The body is handed back so the handler can still extract it.
async fn submitted_token(req: Request) -> Result<(Request, Option<String>), Response> {
    if let Some(value) = req.headers().get(CSRF_HEADER) {
        let token = value.to_str().ok().map(str::to_string);
        return Ok((req, token));
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES).await.map_err(|e| {
        warn!(error = %e, "form body rejected");
        StatusCode::PAYLOAD_TOO_LARGE.into_response()
    })?;

    let token = form_field(&content_type, bytes.clone()).await;
    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

async fn form_field(content_type: &str, bytes: Bytes) -> Option<String> {
    let copy = Request::builder()
        .method(Method::POST)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .ok()?;

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(copy, &()).await.ok()?;
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some(CSRF_FIELD) {
                return field.text().await.ok();
            }
        }
        None
    } else {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(copy, &())
            .await
            .ok()?;
        pairs
            .into_iter()
            .find(|(name, _)| name == CSRF_FIELD)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use cookie::Cookie;

    use super::*;
    use crate::auth::cookies::CSRF_COOKIE;
    use crate::testing::TestApp;

    #[tokio::test]
    async fn first_visit_issues_a_token_into_forms() {
        let app = TestApp::new();
        let res = app.server.get("/signup").await;
        let token = res.cookie(CSRF_COOKIE);
        assert!(!token.value().is_empty());
        assert!(res
            .text()
            .contains(&format!(r#"name="csrf_token" value="{}""#, token.value())));
    }

    #[tokio::test]
    async fn post_without_token_is_forbidden() {
        let app = TestApp::new();
        let res = app
            .server
            .post("/signup")
            .form(&[("email", "jon@example.com"), ("password", "password1")])
            .await;
        res.assert_status(StatusCode::FORBIDDEN);
        assert!(app.state.users.by_email("jon@example.com").await.is_err());
    }

    #[tokio::test]
    async fn mismatched_token_is_forbidden() {
        let app = TestApp::new();
        let res = app
            .server
            .post("/signup")
            .add_cookie(Cookie::new(CSRF_COOKIE, "issued"))
            .form(&[
                ("csrf_token", "forged"),
                ("email", "jon@example.com"),
                ("password", "password1"),
            ])
            .await;
        res.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn form_field_token_is_accepted_and_body_kept() {
        let app = TestApp::new();
        let res = app
            .server
            .post("/signup")
            .add_cookie(Cookie::new(CSRF_COOKIE, "issued"))
            .form(&[
                ("csrf_token", "issued"),
                ("name", "Jon"),
                ("email", "jon@example.com"),
                ("password", "password1"),
            ])
            .await;
        res.assert_status(StatusCode::FOUND);
        let user = app.state.users.by_email("jon@example.com").await.unwrap();
        assert_eq!(user.name, "Jon");
    }

    #[tokio::test]
    async fn multipart_field_token_is_accepted() {
        let app = TestApp::new();
        let session = app.signup("owner@example.com", "password1").await;
        let res = app
            .post("/galleries")
            .add_cookie(session.clone())
            .form(&[("title", "Pics")])
            .await;
        let location = res.header("location").to_str().unwrap().to_string();
        let id: i64 = location
            .trim_start_matches("/galleries/")
            .trim_end_matches("/edit")
            .parse()
            .unwrap();

        let form = MultipartForm::new()
            .add_text(CSRF_FIELD, "issued")
            .add_part("images", Part::bytes(b"px".as_slice()).file_name("dot.png"));
        let res = app
            .server
            .post(&format!("/galleries/{id}/images"))
            .add_cookie(session)
            .add_cookie(Cookie::new(CSRF_COOKIE, "issued"))
            .multipart(form)
            .await;
        res.assert_status(StatusCode::FOUND);
        assert_eq!(app.state.images.by_gallery_id(id).await.unwrap().len(), 1);
    }

    #[test]
    fn only_unsafe_methods_are_checked() {
        assert!(is_safe(&Method::GET));
        assert!(is_safe(&Method::HEAD));
        assert!(!is_safe(&Method::POST));
        assert!(!is_safe(&Method::DELETE));
    }
}
