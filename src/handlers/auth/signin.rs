// handlers/auth/signin.rs - GET /api/auth/signin handler

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::{
    encode_component, local_callback, CALLBACK_COOKIE, HANDSHAKE_MAX_AGE, PKCE_COOKIE, STATE_COOKIE,
};
use crate::auth::cookies;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Start the provider sign-in, remembering where the user wanted to go.
pub async fn signin(State(state): State<AppState>, Query(query): Query<SignInQuery>) -> ApiResult<Response> {
    let request = state.identity.begin().map_err(|e| {
        tracing::error!("cannot start sign-in: {}", e);
        ApiError::service_unavailable("Sign-in is not configured on server.")
    })?;

    // Validate now so the cookie never carries a foreign destination.
    let callback = local_callback(query.callback_url.as_deref().map(encode_component).as_deref());

    let secure = state.config.security.require_https;
    let mut response = Redirect::to(&request.url).into_response();
    let headers = response.headers_mut();
    for cookie in [
        cookies::build(STATE_COOKIE, &request.state, HANDSHAKE_MAX_AGE, secure),
        cookies::build(PKCE_COOKIE, &request.pkce_verifier, HANDSHAKE_MAX_AGE, secure),
        cookies::build(CALLBACK_COOKIE, &encode_component(&callback), HANDSHAKE_MAX_AGE, secure),
    ]
    .into_iter()
    .flatten()
    {
        headers.append(SET_COOKIE, cookie);
    }

    Ok(response)
}
