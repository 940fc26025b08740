// handlers/pages.rs - Server-rendered pages and the router fallback

use axum::{
    extract::Query,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::auth::{encode_component, local_callback};
use crate::error::ApiError;
use crate::middleware::routes::is_api_path;

const DASHBOARD_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Backup Dashboard</title>
  <link rel="icon" href="/favicon.ico">
  <link rel="stylesheet" href="/static/dashboard.css">
</head>
<body>
  <header>
    <h1>Backup Dashboard</h1>
    <form method="post" action="/api/auth/signout"><button type="submit">Sign out</button></form>
  </header>
  <section>
    <h2>Bot</h2>
    <ul id="processes"></ul>
  </section>
  <section>
    <h2>Backups</h2>
    <button id="create">Create backup</button>
    <table id="backups"><tbody></tbody></table>
  </section>
  <script>
    async function api(method, path) {
      const res = await fetch(path, { method, credentials: "same-origin" });
      if (res.status === 401) { location.href = "/auth/signin?callbackUrl=/"; return null; }
      return res.json();
    }
    async function refresh() {
      const status = await api("GET", "/api/pm2/status");
      const procs = document.getElementById("processes");
      procs.textContent = "";
      for (const p of (status && status.processes) || []) {
        const li = document.createElement("li");
        li.textContent = `${p.name}: ${p.status} (${p.memory} MB, ${p.cpu}% CPU, ${p.restarts} restarts)`;
        procs.appendChild(li);
      }
      const list = await api("GET", "/api/backups/list");
      const body = document.querySelector("#backups tbody");
      body.textContent = "";
      for (const f of (list && list.files) || []) {
        const tr = document.createElement("tr");
        const name = document.createElement("td");
        const link = document.createElement("a");
        link.href = "/api/backups/download?key=" + encodeURIComponent(f.key);
        link.textContent = f.key;
        name.appendChild(link);
        const del = document.createElement("button");
        del.textContent = "Delete";
        del.onclick = async () => {
          await api("DELETE", "/api/backups/delete?key=" + encodeURIComponent(f.key));
          refresh();
        };
        tr.append(name, del);
        body.appendChild(tr);
      }
    }
    document.getElementById("create").onclick = async () => {
      const res = await api("POST", "/api/backups/create");
      if (res) alert(res.message || res.error);
      refresh();
    };
    refresh();
  </script>
</body>
</html>
"##;

pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

#[derive(Debug, Deserialize)]
pub struct SignInPageQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
    pub error: Option<String>,
}

/// Provider error codes shown on the sign-in page. Anything else is ignored
/// so query text is never echoed into the page.
fn error_text(code: &str) -> Option<&'static str> {
    match code {
        "AccessDenied" => Some("This account is not allowed to use the dashboard."),
        "OAuthState" => Some("The sign-in attempt expired. Please try again."),
        "OAuthCallback" => Some("The identity provider rejected the sign-in."),
        "Configuration" => Some("Sign-in is not configured on this server."),
        _ => None,
    }
}

pub async fn signin_page(Query(query): Query<SignInPageQuery>) -> Html<String> {
    // axum has already decoded the query once; re-encode for the link.
    let callback = local_callback(query.callback_url.as_deref().map(encode_component).as_deref());
    let href = format!("/api/auth/signin?callbackUrl={}", encode_component(&callback));

    let notice = query
        .error
        .as_deref()
        .and_then(error_text)
        .map(|text| format!("<p class=\"error\">{}</p>\n  ", text))
        .unwrap_or_default();

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Sign in - Backup Dashboard</title>
  <link rel="stylesheet" href="/static/dashboard.css">
</head>
<body>
  <h1>Backup Dashboard</h1>
  {notice}<a href="{href}">Sign in with Discord</a>
</body>
</html>
"#
    ))
}

/// Unmatched routes that got past the gate.
pub async fn not_found(uri: Uri) -> Response {
    if is_api_path(uri.path()) {
        return ApiError::not_found(format!("Not Found: {}", uri.path())).into_response();
    }
    (StatusCode::NOT_FOUND, Html("<h1>404</h1><p>Page not found.</p>")).into_response()
}
