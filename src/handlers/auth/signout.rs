// handlers/auth/signout.rs - GET|POST /api/auth/signout handler

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{cookies, SESSION_COOKIE};
use crate::middleware::routes::SIGN_IN_PATH;
use crate::state::AppState;

/// Drop the session cookie and send the browser back to the sign-in page.
pub async fn signout(State(state): State<AppState>) -> Response {
    let mut response = Redirect::to(SIGN_IN_PATH).into_response();
    if let Some(cookie) = cookies::expire(SESSION_COOKIE, state.config.security.require_https) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
