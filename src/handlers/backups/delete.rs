// handlers/backups/delete.rs - DELETE /api/backups/delete?key= handler

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use super::{required_key, KeyQuery};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn delete_backup(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<Json<Value>> {
    let key = required_key(query, state.backups.as_ref())?;
    state.backups.delete(&key).await?;

    Ok(Json(json!({ "message": "Backup deleted.", "key": key })))
}
