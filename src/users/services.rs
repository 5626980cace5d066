use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, ValidationError};
use crate::hash::Hmac;
use crate::resets::repo_types::PasswordReset;
use crate::resets::services::ResetService;
use crate::tokens;
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

pub const MIN_PASSWORD_LENGTH: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,16}$").unwrap();
}

/// One normalisation or validation step applied before a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserStep {
    PasswordMinLength,
    BcryptPassword,
    PasswordHashRequired,
    SetRememberIfUnset,
    HmacRemember,
    NormalizeEmail,
    RequireEmail,
    EmailFormat,
    EmailIsAvail,
}

const CREATE_STEPS: &[UserStep] = &[
    UserStep::PasswordMinLength,
    UserStep::BcryptPassword,
    UserStep::PasswordHashRequired,
    UserStep::SetRememberIfUnset,
    UserStep::HmacRemember,
    UserStep::NormalizeEmail,
    UserStep::RequireEmail,
    UserStep::EmailFormat,
    UserStep::EmailIsAvail,
];

/// Same as create, minus issuing a remember token.
const UPDATE_STEPS: &[UserStep] = &[
    UserStep::PasswordMinLength,
    UserStep::BcryptPassword,
    UserStep::PasswordHashRequired,
    UserStep::HmacRemember,
    UserStep::NormalizeEmail,
    UserStep::RequireEmail,
    UserStep::EmailFormat,
    UserStep::EmailIsAvail,
];

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    resets: ResetService,
    hmac: Hmac,
    pepper: String,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        resets: ResetService,
        hmac: Hmac,
        pepper: impl Into<String>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            resets,
            hmac,
            pepper: pepper.into(),
            bcrypt_cost,
        }
    }

    pub async fn by_id(&self, id: i64) -> Result<User, AppError> {
        self.store.by_id(id).await
    }

    pub async fn by_email(&self, email: &str) -> Result<User, AppError> {
        self.store.by_email(&normalize_email(email)).await
    }

    /// Storage is only ever queried by digest.
    pub async fn by_remember(&self, token: &str) -> Result<User, AppError> {
        self.store.by_remember(&self.hmac.hash(token)).await
    }

    pub async fn create(&self, user: &mut User) -> Result<(), AppError> {
        self.run_steps(user, CREATE_STEPS).await?;
        self.store.create(user).await?;
        info!(user_id = user.id, "user created");
        Ok(())
    }

    pub async fn update(&self, user: &mut User) -> Result<(), AppError> {
        self.run_steps(user, UPDATE_STEPS).await?;
        self.store.update(user).await
    }

    /// `NotFound` for an unknown email, `IncorrectPassword` on mismatch.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self.by_email(email).await?;
        if verify_password(password, &self.pepper, &user.password_hash)? {
            Ok(user)
        } else {
            Err(AppError::IncorrectPassword)
        }
    }

    /// Returns the plaintext reset token to be emailed.
    pub async fn initiate_reset(&self, email: &str) -> Result<String, AppError> {
        let user = self.by_email(email).await?;
        let mut reset = PasswordReset {
            user_id: user.id,
            ..Default::default()
        };
        self.resets.create(&mut reset).await?;
        info!(user_id = user.id, "password reset issued");
        reset
            .token
            .ok_or_else(|| AppError::Upstream(anyhow::anyhow!("reset token was not issued")))
    }

    /// Redeems a reset token. The token is consumed only once the new
    /// password has been stored.
    pub async fn complete_reset(&self, token: &str, password: &str) -> Result<User, AppError> {
        if password.is_empty() {
            return Err(ValidationError::PasswordRequired.into());
        }
        let reset = self.resets.by_token(token).await?;
        if self.resets.is_expired(&reset) {
            if let Err(e) = self.resets.delete(reset.id).await {
                warn!(error = %e, reset_id = reset.id, "delete expired reset failed");
            }
            return Err(ValidationError::ResetTokenExpired.into());
        }

        let mut user = self.store.by_id(reset.user_id).await?;
        user.password = Some(password.to_string());
        self.update(&mut user).await?;
        self.resets.delete(reset.id).await?;
        info!(user_id = user.id, "password reset completed");
        Ok(user)
    }

    async fn run_steps(&self, user: &mut User, steps: &[UserStep]) -> Result<(), AppError> {
        for step in steps {
            if let Err(e) = self.apply(*step, user).await {
                debug!(?step, error = %e, "user validation failed");
                return Err(e);
            }
        }
        Ok(())
    }

    async fn apply(&self, step: UserStep, user: &mut User) -> Result<(), AppError> {
        match step {
            UserStep::PasswordMinLength => {
                if let Some(pw) = user.password.as_deref().filter(|p| !p.is_empty()) {
                    if pw.chars().count() < MIN_PASSWORD_LENGTH {
                        return Err(ValidationError::PasswordTooShort.into());
                    }
                }
            }
            UserStep::BcryptPassword => {
                if let Some(pw) = user.password.take().filter(|p| !p.is_empty()) {
                    user.password_hash = hash_password(&pw, &self.pepper, self.bcrypt_cost)?;
                }
            }
            UserStep::PasswordHashRequired => {
                if user.password_hash.is_empty() {
                    return Err(ValidationError::PasswordRequired.into());
                }
            }
            UserStep::SetRememberIfUnset => {
                if user.remember.is_none() {
                    user.remember = Some(tokens::remember_token()?);
                }
            }
            UserStep::HmacRemember => {
                if let Some(token) = &user.remember {
                    user.remember_hash = self.hmac.hash(token);
                }
            }
            UserStep::NormalizeEmail => user.email = normalize_email(&user.email),
            UserStep::RequireEmail => {
                if user.email.is_empty() {
                    return Err(ValidationError::EmailRequired.into());
                }
            }
            UserStep::EmailFormat => {
                if !is_valid_email(&user.email) {
                    return Err(ValidationError::EmailInvalid.into());
                }
            }
            UserStep::EmailIsAvail => match self.store.by_email(&user.email).await {
                Ok(existing) if existing.id != user.id => {
                    return Err(ValidationError::EmailTaken.into());
                }
                Ok(_) | Err(AppError::NotFound) => {}
                Err(e) => return Err(e),
            },
        }
        Ok(())
    }
}
