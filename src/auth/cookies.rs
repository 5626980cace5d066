use tower_cookies::{
    cookie::{time::Duration, SameSite},
    Cookie, Cookies,
};

pub const REMEMBER_COOKIE: &str = "remember_cookie";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
pub const CSRF_COOKIE: &str = "csrf_token";

const OAUTH_STATE_TTL_MINUTES: i64 = 10;

pub fn remember_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(REMEMBER_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn set_remember_cookie(cookies: &Cookies, token: &str, secure: bool) {
    let cookie = Cookie::build((REMEMBER_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookies.add(cookie);
}

pub fn clear_remember_cookie(cookies: &Cookies) {
    expire(cookies, REMEMBER_COOKIE);
}

pub fn oauth_state(cookies: &Cookies) -> Option<String> {
    cookies.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string())
}

pub fn set_oauth_state_cookie(cookies: &Cookies, state: &str, secure: bool) {
    let cookie = Cookie::build((OAUTH_STATE_COOKIE, state.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::minutes(OAUTH_STATE_TTL_MINUTES))
        .build();
    cookies.add(cookie);
}

pub fn clear_oauth_state_cookie(cookies: &Cookies) {
    expire(cookies, OAUTH_STATE_COOKIE);
}

/// Form token issued to this browser, including one added earlier in the
/// same request.
pub fn csrf_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn set_csrf_cookie(cookies: &Cookies, token: &str, secure: bool) {
    let cookie = Cookie::build((CSRF_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookies.add(cookie);
}

fn expire(cookies: &Cookies, name: &'static str) {
    let cookie = Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .max_age(Duration::ZERO)
        .build();
    cookies.add(cookie);
}
