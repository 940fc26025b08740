use std::path::PathBuf;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::handlers::{auth, backups, pages, process};
use crate::middleware::{request_gate_middleware, routes};
use crate::state::AppState;

/// Build the full router. The request gate wraps every route and the fallback.
pub fn app(state: AppState) -> Router {
    let public_dir = PathBuf::from(&state.config.server.public_dir);

    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route(routes::SIGN_IN_PATH, get(pages::signin_page))
        // Identity provider
        .merge(auth_routes())
        // Protected API
        .merge(backup_routes())
        .merge(process_routes())
        // Static assets
        .nest_service("/static", ServeDir::new(public_dir.join("static")))
        .nest_service("/images", ServeDir::new(public_dir.join("images")))
        .route_service("/favicon.ico", ServeFile::new(public_dir.join("favicon.ico")))
        .route_service("/robots.txt", ServeFile::new(public_dir.join("robots.txt")))
        .fallback(pages::not_found)
        // Global middleware
        .layer(from_fn_with_state(state.gate.clone(), request_gate_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signin", get(auth::signin))
        .route("/api/auth/callback/:provider", get(auth::callback))
        .route("/api/auth/signout", get(auth::signout).post(auth::signout))
}

fn backup_routes() -> Router<AppState> {
    Router::new()
        .route(routes::BACKUPS_LIST, get(backups::list_backups))
        .route(routes::BACKUPS_CREATE, post(backups::create_backup))
        .route(routes::BACKUPS_DELETE, delete(backups::delete_backup))
        .route(routes::BACKUPS_DOWNLOAD, get(backups::download_backup))
}

fn process_routes() -> Router<AppState> {
    Router::new().route(routes::PROCESS_STATUS, get(process::process_status))
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("backup dashboard listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
