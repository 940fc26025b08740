use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SecurityConfig, MAX_SESSION_EXPIRY_HOURS};

pub mod cookies;

/// Cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Lifetimes beyond `MAX_SESSION_EXPIRY_HOURS` are clamped.
    pub fn new(subject: String, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let hours = expiry_hours.min(MAX_SESSION_EXPIRY_HOURS) as i64;
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            sub: subject,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// A verified session, attached to the request once the gate allows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
    pub expires_at: i64,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            expires_at: claims.exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session secret not configured")]
    InvalidSecret,
    #[error("no allow-listed identity is configured")]
    NoAllowedIdentity,
    #[error("identity '{0}' is not allowed to sign in")]
    SubjectNotAllowed(String),
    #[error("session token generation failed: {0}")]
    TokenGeneration(String),
}

/// Extracts and verifies a session from request headers.
///
/// Implementations must stay synchronous and bounded: the gate calls this on
/// every protected request and treats `None` as "no session".
pub trait SessionVerifier: Send + Sync + 'static {
    fn verify(&self, headers: &HeaderMap) -> Option<Session>;
}

/// HMAC-signed JWT sessions restricted to a single allow-listed subject.
pub struct JwtSessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    allowed_subject: Option<String>,
}

impl JwtSessionVerifier {
    pub fn new(security: &SecurityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(security.session_secret.as_bytes()),
            validation,
            allowed_subject: security.allowed_user_id.clone(),
        }
    }
}

impl SessionVerifier for JwtSessionVerifier {
    fn verify(&self, headers: &HeaderMap) -> Option<Session> {
        let allowed = self.allowed_subject.as_deref()?;

        // A stale cookie must not shadow a valid Bearer token.
        session_token_candidates(headers)
            .into_iter()
            .find_map(|token| self.verify_token(&token, allowed))
    }
}

impl JwtSessionVerifier {
    fn verify_token(&self, token: &str, allowed: &str) -> Option<Session> {
        let claims = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("rejected session token: {}", e);
                return None;
            }
        };

        if claims.sub != allowed {
            tracing::warn!("session token for non allow-listed subject '{}'", claims.sub);
            return None;
        }

        Some(Session::from(claims))
    }
}

/// Signs session tokens for the allow-listed identity only.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    allowed_subject: Option<String>,
    expiry_hours: u64,
    secret_configured: bool,
}

impl SessionIssuer {
    pub fn new(security: &SecurityConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(security.session_secret.as_bytes()),
            allowed_subject: security.allowed_user_id.clone(),
            expiry_hours: security.session_expiry_hours.min(MAX_SESSION_EXPIRY_HOURS),
            secret_configured: !security.session_secret.is_empty(),
        }
    }

    pub fn expiry_secs(&self) -> i64 {
        self.expiry_hours as i64 * 3600
    }

    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        if !self.secret_configured {
            return Err(AuthError::InvalidSecret);
        }
        let allowed = self
            .allowed_subject
            .as_deref()
            .ok_or(AuthError::NoAllowedIdentity)?;
        if subject != allowed {
            return Err(AuthError::SubjectNotAllowed(subject.to_string()));
        }

        let claims = Claims::new(subject.to_string(), self.expiry_hours);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Issue a token for the configured operator without an external login.
    pub fn issue_for_operator(&self) -> Result<String, AuthError> {
        let subject = self
            .allowed_subject
            .clone()
            .ok_or(AuthError::NoAllowedIdentity)?;
        self.issue(&subject)
    }
}

/// Session tokens in the order they are tried: the session cookie, then a
/// Bearer header.
fn session_token_candidates(headers: &HeaderMap) -> Vec<String> {
    let cookie = cookies::read(headers, SESSION_COOKIE).filter(|token| !token.trim().is_empty());

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    cookie.into_iter().chain(bearer).collect()
}
