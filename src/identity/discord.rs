use async_trait::async_trait;
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthUrl, AuthorizationCode, ClientId,
    ClientSecret, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;
use std::time::Duration;

use super::{AuthorizationRequest, ExternalIdentity, IdentityError, IdentityProvider};
use crate::config::IdentityConfig;

const AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
const TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const USER_URL: &str = "https://discord.com/api/users/@me";

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: Option<String>,
    global_name: Option<String>,
}

/// Discord OAuth2 authorization-code flow (PKCE, `identify` scope).
pub struct DiscordProvider {
    /// `None` until a client id and secret are configured.
    oauth: Option<BasicClient>,
    http: reqwest::Client,
}

impl DiscordProvider {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let oauth = if config.discord_client_id.is_empty() || config.discord_client_secret.is_empty() {
            None
        } else {
            let redirect = format!("{}/api/auth/callback/discord", config.public_base_url);
            Some(
                BasicClient::new(
                    ClientId::new(config.discord_client_id.clone()),
                    Some(ClientSecret::new(config.discord_client_secret.clone())),
                    AuthUrl::new(AUTHORIZE_URL.to_string())?,
                    Some(TokenUrl::new(TOKEN_URL.to_string())?),
                )
                .set_redirect_uri(RedirectUrl::new(redirect)?),
            )
        };

        Ok(Self { oauth, http })
    }

    fn oauth(&self) -> Result<&BasicClient, IdentityError> {
        self.oauth.as_ref().ok_or(IdentityError::NotConfigured)
    }
}

#[async_trait]
impl IdentityProvider for DiscordProvider {
    fn id(&self) -> &'static str {
        "discord"
    }

    fn begin(&self) -> Result<AuthorizationRequest, IdentityError> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, csrf_token) = self
            .oauth()?
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("identify".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        Ok(AuthorizationRequest {
            url: url.into(),
            state: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        })
    }

    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<ExternalIdentity, IdentityError> {
        let token = self
            .oauth()?
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| IdentityError::Exchange(e.to_string()))?;

        let response = self
            .http
            .get(USER_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(IdentityError::Rejected(response.status().as_u16()));
        }
        let user: DiscordUser = response.json().await?;

        Ok(ExternalIdentity {
            id: user.id,
            display_name: user.global_name.or(user.username),
        })
    }
}
