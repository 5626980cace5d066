use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
///
/// `password` and `remember` hold plaintext only while a record is in flight
/// through the validation pipeline; they are never persisted.
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub email: String,
    #[sqlx(skip)]
    #[serde(skip)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(skip)]
    #[serde(skip)]
    pub remember: Option<String>,
    #[serde(skip_serializing)]
    pub remember_hash: String,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}
