// External identity provider used by the sign-in flow.

use async_trait::async_trait;
use thiserror::Error;

pub mod discord;

pub use discord::DiscordProvider;

/// Identity confirmed by the provider after the OAuth code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub id: String,
    pub display_name: Option<String>,
}

/// Provider redirect plus the values the callback must see again.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    /// Opaque CSRF state echoed back by the provider.
    pub state: String,
    /// PKCE code verifier, kept by the browser until the callback.
    pub pkce_verifier: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider is not configured")]
    NotConfigured,
    #[error("identity provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("identity provider rejected the exchange with status {0}")]
    Rejected(u16),
    #[error("code exchange failed: {0}")]
    Exchange(String),
    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Short provider id used in callback paths, e.g. `discord`.
    fn id(&self) -> &'static str;

    /// Start a sign-in: fresh CSRF state, PKCE pair and the provider URL.
    fn begin(&self) -> Result<AuthorizationRequest, IdentityError>;

    /// Exchange an authorization code, proven by the PKCE verifier, for the
    /// caller's identity.
    async fn exchange(&self, code: &str, pkce_verifier: &str) -> Result<ExternalIdentity, IdentityError>;
}
