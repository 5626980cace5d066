use axum::{
    extract::{Query, State},
    middleware,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use tower_cookies::Cookies;
use tracing::{info, instrument, warn};

use super::dto::{ForgotPwForm, LoginForm, ResetPwForm, ResetQuery, SignupForm};
use super::repo_types::User;
use crate::auth::cookies::{clear_remember_cookie, set_remember_cookie};
use crate::auth::extractors::{AuthUser, MaybeUser};
use crate::auth::middleware::require_user;
use crate::email;
use crate::error::AppError;
use crate::state::AppState;
use crate::tokens;
use crate::views::{self, Alert, Data};

const AFTER_LOGIN: &str = "/galleries";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", get(signup_page).post(signup))
        .route("/login", get(login_page).post(login))
        .route("/forgot", get(forgot_page).post(forgot))
        .route("/reset", get(reset_page).post(reset))
        .merge(
            Router::new()
                .route("/logout", post(logout))
                .route_layer(middleware::from_fn(require_user)),
        )
}

/// Persists a fresh remember token when the user has none in hand and
/// writes it to the session cookie.
pub async fn sign_in(state: &AppState, cookies: &Cookies, user: &mut User) -> Result<(), AppError> {
    let token = match user.remember.clone() {
        Some(token) => token,
        None => {
            let token = tokens::remember_token()?;
            user.remember = Some(token.clone());
            state.users.update(user).await?;
            token
        }
    };
    set_remember_cookie(cookies, &token, state.config.is_prod());
    info!(user_id = user.id, "signed in");
    Ok(())
}

#[instrument(skip_all)]
async fn signup_page(cookies: Cookies, MaybeUser(user): MaybeUser) -> Response {
    views::render(
        &cookies,
        "users/new.html",
        Data::new(SignupForm::default()).with_user(user.as_ref()),
    )
}

#[instrument(skip_all)]
async fn signup(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<SignupForm>,
) -> Response {
    let mut user = form.to_user();
    if let Err(e) = state.users.create(&mut user).await {
        warn!(error = %e, "signup rejected");
        let mut data = Data::new(form);
        data.set_alert(&e);
        return views::render(&cookies, "users/new.html", data);
    }

    let emailer = state.emailer.clone();
    let (name, email) = (user.name.clone(), user.email.clone());
    tokio::spawn(async move {
        if let Err(e) = emailer.welcome(&name, &email).await {
            warn!(error = %format!("{e:#}"), "welcome email failed");
        }
    });

    if let Err(e) = sign_in(&state, &cookies, &mut user).await {
        warn!(error = %e, user_id = user.id, "sign in after signup failed");
        return views::redirect("/login");
    }
    views::redirect(AFTER_LOGIN)
}

#[instrument(skip_all)]
async fn login_page(cookies: Cookies, MaybeUser(user): MaybeUser) -> Response {
    views::render(
        &cookies,
        "users/login.html",
        Data::new(LoginForm::default()).with_user(user.as_ref()),
    )
}

#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut user = match state.users.authenticate(&form.email, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, email = %form.email, "login rejected");
            let mut data = Data::new(form);
            match e {
                AppError::NotFound => data.alert_error("No user exists with that email address"),
                other => data.set_alert(&other),
            }
            return views::render(&cookies, "users/login.html", data);
        }
    };

    if let Err(e) = sign_in(&state, &cookies, &mut user).await {
        let mut data = Data::new(form);
        data.set_alert(&e);
        return views::render(&cookies, "users/login.html", data);
    }
    views::redirect(AFTER_LOGIN)
}

/// Expires the cookie, then rotates the remember token so the old value is
/// useless everywhere. Rotation failures are only logged.
#[instrument(skip_all)]
async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
    AuthUser(mut user): AuthUser,
) -> Response {
    clear_remember_cookie(&cookies);

    match tokens::remember_token() {
        Ok(token) => {
            user.remember = Some(token);
            if let Err(e) = state.users.update(&mut user).await {
                warn!(error = %e, user_id = user.id, "remember token rotation failed");
            }
        }
        Err(e) => warn!(error = %e, "remember token generation failed"),
    }
    views::redirect_alert(&cookies, "/", Alert::success("Successfully logged out!"))
}

#[instrument(skip_all)]
async fn forgot_page(cookies: Cookies, MaybeUser(user): MaybeUser) -> Response {
    views::render(
        &cookies,
        "users/forgot_pw.html",
        Data::new(ForgotPwForm::default()).with_user(user.as_ref()),
    )
}

#[instrument(skip_all)]
async fn forgot(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<ForgotPwForm>,
) -> Response {
    let sent = async {
        let token = state.users.initiate_reset(&form.email).await?;
        let url = email::reset_url(&state.config.base_url, &token)?;
        state.emailer.reset_pw(&form.email, &url, &token).await?;
        Ok::<_, AppError>(())
    }
    .await;

    let mut data = Data::new(form);
    match sent {
        Ok(()) => {
            data.alert = Some(Alert::success(
                "Instructions for resetting your password have been emailed to you.",
            ));
        }
        Err(e) => {
            warn!(error = %e, "password reset request failed");
            data.set_alert(&e);
        }
    }
    views::render(&cookies, "users/forgot_pw.html", data)
}

#[instrument(skip_all)]
async fn reset_page(cookies: Cookies, Query(query): Query<ResetQuery>) -> Response {
    let form = ResetPwForm {
        token: query.token,
        password: String::new(),
    };
    views::render(&cookies, "users/reset_pw.html", Data::new(form))
}

#[instrument(skip_all)]
async fn reset(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<ResetPwForm>,
) -> Response {
    let mut user = match state.users.complete_reset(&form.token, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "password reset rejected");
            let mut data = Data::new(form);
            data.set_alert(&e);
            return views::render(&cookies, "users/reset_pw.html", data);
        }
    };

    user.remember = None;
    if let Err(e) = sign_in(&state, &cookies, &mut user).await {
        warn!(error = %e, user_id = user.id, "sign in after reset failed");
        return views::redirect("/login");
    }
    views::redirect_alert(
        &cookies,
        AFTER_LOGIN,
        Alert::success("Your password has been reset and you have been logged in!"),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::auth::cookies::REMEMBER_COOKIE;
    use crate::testing::TestApp;

    fn location(res: &axum_test::TestResponse) -> String {
        res.header("location").to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn signup_signs_in_and_redirects() {
        let app = TestApp::new();
        let session = app.signup("Jon@Example.com", "password1").await;
        assert!(!session.value().is_empty());

        let user = app.state.users.by_remember(session.value()).await.unwrap();
        assert_eq!(user.email, "jon@example.com");

        let res = app.server.get("/galleries").add_cookie(session).await;
        res.assert_status_ok();
    }

    #[tokio::test]
    async fn signup_errors_rerender_form_with_alert() {
        let app = TestApp::new();
        let res = app
            .post("/signup")
            .form(&[("name", "Jon"), ("email", "jon@example.com"), ("password", "short")])
            .await;
        res.assert_status_ok();
        let body = res.text();
        assert!(body.contains("Password must be at least 8 characters long"));
        assert!(body.contains("jon@example.com"));
        assert!(res.maybe_cookie(REMEMBER_COOKIE).is_none());
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_email_and_bad_password() {
        let app = TestApp::new();
        app.signup("jon@example.com", "password1").await;

        let res = app
            .post("/login")
            .form(&[("email", "nobody@example.com"), ("password", "password1")])
            .await;
        assert!(res.text().contains("No user exists with that email address"));

        let res = app
            .post("/login")
            .form(&[("email", "jon@example.com"), ("password", "wrong-one")])
            .await;
        assert!(res.text().contains("Incorrect password provided"));

        let res = app
            .post("/login")
            .form(&[("email", "JON@example.com"), ("password", "password1")])
            .await;
        res.assert_status(StatusCode::FOUND);
        assert_eq!(location(&res), "/galleries");
        assert!(!res.cookie(REMEMBER_COOKIE).value().is_empty());
    }

    #[tokio::test]
    async fn logout_invalidates_old_token() {
        let app = TestApp::new();
        let session = app.signup("jon@example.com", "password1").await;

        let res = app.post("/logout").add_cookie(session.clone()).await;
        res.assert_status(StatusCode::FOUND);
        assert_eq!(location(&res), "/");
        assert!(res.cookie(REMEMBER_COOKIE).value().is_empty());

        let home = app
            .server
            .get("/")
            .add_cookie(res.cookie("alert_level"))
            .add_cookie(res.cookie("alert_message"))
            .await;
        assert!(home.text().contains("Successfully logged out!"));

        let res = app.server.get("/galleries").add_cookie(session).await;
        res.assert_status(StatusCode::FOUND);
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn logout_requires_a_session() {
        let app = TestApp::new();
        let res = app.post("/logout").await;
        res.assert_status(StatusCode::FOUND);
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn forgot_then_reset_password() {
        let app = TestApp::new();
        app.signup("jon@example.com", "password1").await;

        let res = app
            .post("/forgot")
            .form(&[("email", "jon@example.com")])
            .await;
        assert!(res.text().contains("have been emailed to you"));

        let mail = app.mailer.last_to("jon@example.com").expect("reset mail sent");
        assert!(mail.text.contains("http://localhost:3000/reset?token="));
        let link = mail
            .text
            .lines()
            .find(|l| l.starts_with("http://localhost:3000/reset?token="))
            .unwrap();
        let url = reqwest::Url::parse(link).unwrap();
        let token = url.query_pairs().find(|(k, _)| k == "token").unwrap().1.into_owned();

        let res = app.server.get("/reset").add_query_param("token", &token).await;
        res.assert_status_ok();

        let res = app
            .post("/reset")
            .form(&[("token", token.as_str()), ("password", "brand-new-pw")])
            .await;
        res.assert_status(StatusCode::FOUND);
        assert_eq!(location(&res), "/galleries");
        let session = res.cookie(REMEMBER_COOKIE);
        assert_eq!(
            app.state.users.by_remember(session.value()).await.unwrap().email,
            "jon@example.com"
        );

        let res = app
            .post("/reset")
            .form(&[("token", token.as_str()), ("password", "another-pw")])
            .await;
        res.assert_status_ok();
        assert!(res.text().contains("Resource not found"));
        assert!(app.state.users.authenticate("jon@example.com", "brand-new-pw").await.is_ok());
    }

    #[tokio::test]
    async fn forgot_for_unknown_email_shows_error() {
        let app = TestApp::new();
        let res = app
            .post("/forgot")
            .form(&[("email", "ghost@example.com")])
            .await;
        assert!(res.text().contains("Resource not found"));
        assert!(app.mailer.sent.read().unwrap().is_empty());
    }
}
