use sqlx::FromRow;
use time::OffsetDateTime;

/// Single-use password reset token bound to a user. Only the digest is
/// stored; `token` is set while the record is being issued.
#[derive(Debug, Clone, Default, FromRow)]
pub struct PasswordReset {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(skip)]
    pub token: Option<String>,
    pub token_hash: String,
    pub created_at: Option<OffsetDateTime>,
}
