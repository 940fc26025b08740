// handlers/auth/callback.rs - GET /api/auth/callback/:provider handler

use axum::{
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::{local_callback, CALLBACK_COOKIE, PKCE_COOKIE, STATE_COOKIE};
use crate::auth::{cookies, AuthError, SESSION_COOKIE};
use crate::middleware::routes::SIGN_IN_PATH;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Finish the provider round trip and, for the allow-listed identity only,
/// start a session.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    if provider != state.identity.id() {
        return sign_in_error("Configuration");
    }
    if let Some(error) = query.error.as_deref() {
        tracing::warn!("provider returned error '{}'", error);
        return sign_in_error("AccessDenied");
    }

    let expected = cookies::read(&headers, STATE_COOKIE);
    let (code, returned) = match (query.code, query.state) {
        (Some(code), Some(returned)) => (code, returned),
        _ => return sign_in_error("OAuthCallback"),
    };
    if expected.as_deref() != Some(returned.as_str()) {
        tracing::warn!("sign-in state mismatch");
        return sign_in_error("OAuthState");
    }
    let Some(pkce_verifier) = cookies::read(&headers, PKCE_COOKIE).filter(|v| !v.is_empty()) else {
        tracing::warn!("sign-in callback without PKCE verifier");
        return sign_in_error("OAuthState");
    };

    let identity = match state.identity.exchange(&code, &pkce_verifier).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("code exchange failed: {}", e);
            return sign_in_error("OAuthCallback");
        }
    };

    let token = match state.sessions.issue(&identity.id) {
        Ok(token) => token,
        Err(AuthError::SubjectNotAllowed(id)) => {
            tracing::warn!("sign-in refused for identity '{}'", id);
            return sign_in_error("AccessDenied");
        }
        Err(e) => {
            tracing::error!("cannot issue session: {}", e);
            return sign_in_error("Configuration");
        }
    };

    tracing::info!("signed in identity '{}'", identity.id);

    let destination = local_callback(cookies::read(&headers, CALLBACK_COOKIE).as_deref());
    let secure = state.config.security.require_https;

    let mut response = Redirect::to(&destination).into_response();
    let set = response.headers_mut();
    for cookie in [
        cookies::build(SESSION_COOKIE, &token, state.sessions.expiry_secs(), secure),
        cookies::expire(STATE_COOKIE, secure),
        cookies::expire(PKCE_COOKIE, secure),
        cookies::expire(CALLBACK_COOKIE, secure),
    ]
    .into_iter()
    .flatten()
    {
        set.append(SET_COOKIE, cookie);
    }
    response
}

fn sign_in_error(kind: &str) -> Response {
    Redirect::to(&format!("{}?error={}", SIGN_IN_PATH, kind)).into_response()
}
