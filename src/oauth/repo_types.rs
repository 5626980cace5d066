use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// A user's token for one third-party service.
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct OAuthConnection {
    pub id: i64,
    pub user_id: i64,
    pub service: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expiry: Option<OffsetDateTime>,
    pub created_at: Option<OffsetDateTime>,
}

impl OAuthConnection {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= now)
    }
}

/// Token material returned by a provider, before it is tied to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderToken {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<OffsetDateTime>,
}
