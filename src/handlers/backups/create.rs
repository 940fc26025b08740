// handlers/backups/create.rs - POST /api/backups/create handler

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

/// Ask the backup runner to start a new backup.
pub async fn create_backup(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let message = state
        .trigger
        .trigger()
        .await?
        .unwrap_or_else(|| "Backup triggered.".to_string());

    Ok(Json(json!({ "message": message })))
}
