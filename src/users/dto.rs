use serde::{Deserialize, Serialize};

use super::repo_types::User;

/// Signup form. `age` arrives as free text and is parsed leniently.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl SignupForm {
    pub fn to_user(&self) -> User {
        User {
            name: self.name.trim().to_string(),
            age: self.age.trim().parse().unwrap_or(0),
            email: self.email.clone(),
            password: Some(self.password.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ForgotPwForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ResetPwForm {
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    #[serde(default)]
    pub token: String,
}

/// What templates get to see of the signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}
