use anyhow::Context;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RefreshToken, TokenResponse, TokenUrl,
};
use time::OffsetDateTime;

use super::repo_types::ProviderToken;
use crate::config::OAuthConfig;
use crate::error::AppError;

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Authorization-code client for one named service.
#[derive(Clone)]
pub struct OAuthProvider {
    name: String,
    client: ConfiguredClient,
    http: reqwest::Client,
}

impl OAuthProvider {
    /// `default_redirect` is used when the config leaves `redirect_url` empty.
    pub fn from_config(
        name: &str,
        cfg: &OAuthConfig,
        default_redirect: &str,
    ) -> anyhow::Result<Self> {
        let redirect = if cfg.redirect_url.is_empty() {
            default_redirect
        } else {
            &cfg.redirect_url
        };
        let client = BasicClient::new(ClientId::new(cfg.id.clone()))
            .set_client_secret(ClientSecret::new(cfg.secret.clone()))
            .set_auth_uri(AuthUrl::new(cfg.auth_url.clone()).context("auth_url")?)
            .set_token_uri(TokenUrl::new(cfg.token_url.clone()).context("token_url")?)
            .set_redirect_uri(RedirectUrl::new(redirect.to_string()).context("redirect_url")?);

        // Following redirects from the token endpoint opens an SSRF hole.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build oauth http client")?;

        Ok(Self {
            name: name.to_string(),
            client,
            http,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consent page URL carrying `state`.
    pub fn authorize_url(&self, state: &str) -> String {
        let state = state.to_string();
        let (url, _) = self.client.authorize_url(move || CsrfToken::new(state)).url();
        url.to_string()
    }

    pub async fn exchange(&self, code: &str) -> Result<ProviderToken, AppError> {
        let resp = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| AppError::TokenExchange(e.to_string()))?;
        Ok(to_provider_token(&resp, None))
    }

    /// Providers may omit the refresh token on refresh; the old one is kept then.
    pub async fn refresh(&self, refresh_token: &str) -> Result<ProviderToken, AppError> {
        let old = RefreshToken::new(refresh_token.to_string());
        let resp = self
            .client
            .exchange_refresh_token(&old)
            .request_async(&self.http)
            .await
            .map_err(|e| AppError::TokenExchange(e.to_string()))?;
        Ok(to_provider_token(&resp, Some(refresh_token)))
    }
}

fn to_provider_token(resp: &BasicTokenResponse, fallback_refresh: Option<&str>) -> ProviderToken {
    ProviderToken {
        access_token: resp.access_token().secret().clone(),
        token_type: resp.token_type().as_ref().to_string(),
        refresh_token: resp
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| fallback_refresh.map(str::to_string)),
        expiry: resp.expires_in().and_then(expiry_after),
    }
}

/// `None` when `ttl` does not fit in a date; such a token is treated as
/// never expiring.
fn expiry_after(ttl: std::time::Duration) -> Option<OffsetDateTime> {
    let ttl = time::Duration::try_from(ttl).ok()?;
    OffsetDateTime::now_utc().checked_add(ttl)
}
