// Minimal cookie helpers for the session and OAuth handshake cookies.

use axum::http::{header, HeaderMap, HeaderValue};

/// Read a cookie value by name from the `Cookie` request headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(|value| value.to_string())
}

/// Build a `Set-Cookie` value. `max_age` of zero expires the cookie.
pub fn build(name: &str, value: &str, max_age: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

pub fn expire(name: &str, secure: bool) -> Option<HeaderValue> {
    build(name, "", 0, secure)
}
