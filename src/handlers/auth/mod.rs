// handlers/auth/mod.rs - Identity provider routes
//
// Everything under /api/auth is exempt from the request gate. The flow is a
// plain OAuth authorization-code round trip:
//
// 1. GET /api/auth/signin?callbackUrl=/x  → state, PKCE and callback cookies, redirect to provider
// 2. GET /api/auth/callback/:provider     → state check, PKCE code exchange, allow-list check,
//                                            session cookie, redirect back to /x
// 3. GET|POST /api/auth/signout           → session cookie cleared

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

pub mod callback; // GET /api/auth/callback/:provider
pub mod signin;   // GET /api/auth/signin
pub mod signout;  // GET|POST /api/auth/signout

pub use callback::callback;
pub use signin::signin;
pub use signout::signout;

/// Random value binding the provider redirect to this browser.
pub const STATE_COOKIE: &str = "oauth_state";
/// PKCE code verifier for the pending exchange.
pub const PKCE_COOKIE: &str = "oauth_pkce";
/// Where to send the browser after a successful sign-in.
pub const CALLBACK_COOKIE: &str = "oauth_callback";
/// Lifetime of the handshake cookies, in seconds.
pub const HANDSHAKE_MAX_AGE: i64 = 600;

pub(crate) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Only same-origin absolute paths are accepted as post-sign-in destinations.
pub(crate) fn local_callback(raw: Option<&str>) -> String {
    let decoded = raw
        .map(|v| percent_decode_str(v).decode_utf8_lossy().into_owned())
        .unwrap_or_default();

    let is_local = decoded.starts_with('/')
        && !decoded.starts_with("//")
        && !decoded.starts_with("/\\")
        && !decoded.chars().any(char::is_control);

    if is_local {
        decoded
    } else {
        "/".to_string()
    }
}
