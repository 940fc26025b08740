// handlers/backups/download.rs - GET /api/backups/download?key= handler

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Duration;

use super::{required_key, KeyQuery};
use crate::error::ApiResult;
use crate::state::AppState;

/// Redirect (302) to a short-lived presigned URL for the archive.
pub async fn download_backup(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<Response> {
    let key = required_key(query, state.backups.as_ref())?;
    let ttl = Duration::from_secs(state.config.storage.download_url_ttl_secs);

    let url = state.backups.download_url(&key, ttl).await?;
    tracing::info!("issued download URL for '{}'", key);

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

#[cfg(test)]
mod tests {
    use crate::server::app;
    use crate::testing::{send, session_cookie, MemoryStore, TestContext};
    use axum::http::{header, StatusCode};

    #[tokio::test]
    async fn redirects_to_signed_url() {
        let state = TestContext::new().state();
        let cookie = session_cookie(&state);

        let res = send(
            app(state),
            "GET",
            "/api/backups/download?key=backups%2Ffile.tar.gz",
            Some(&cookie),
        )
        .await;

        assert_eq!(res.status, StatusCode::FOUND);
        assert_eq!(
            res.header(header::LOCATION),
            Some("https://s3.example.com/test-bucket/backups/file.tar.gz?expires=300")
        );
    }

    #[tokio::test]
    async fn missing_key_is_400() {
        let state = TestContext::new().state();
        let cookie = session_cookie(&state);

        let res = send(app(state), "GET", "/api/backups/download", Some(&cookie)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert!(res.json()["error"].as_str().unwrap().contains("Missing required"));
    }

    #[tokio::test]
    async fn signing_failure_is_500() {
        let state = TestContext::new()
            .with_store(MemoryStore {
                fail: true,
                ..Default::default()
            })
            .state();
        let cookie = session_cookie(&state);

        let res = send(app(state), "GET", "/api/backups/download?key=a", Some(&cookie)).await;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.json()["error"]
            .as_str()
            .unwrap()
            .contains("Failed to generate download URL"));
    }
}
