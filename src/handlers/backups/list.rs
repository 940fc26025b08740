// handlers/backups/list.rs - GET /api/backups/list handler

use axum::{extract::State, Json};
use chrono::SecondsFormat;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::storage::BackupObject;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    pub key: String,
    pub last_modified: Option<String>,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct BackupList {
    pub files: Vec<BackupFile>,
}

impl From<BackupObject> for BackupFile {
    fn from(object: BackupObject) -> Self {
        Self {
            key: object.key,
            last_modified: object
                .last_modified
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            size: object.size,
        }
    }
}

/// List archives in the bucket, newest first.
///
/// Objects without a modification time sort after dated ones; objects with an
/// empty key are dropped.
pub async fn list_backups(State(state): State<AppState>) -> ApiResult<Json<BackupList>> {
    let mut objects = state
        .backups
        .list(state.config.storage.list_max_keys)
        .await?;

    objects.retain(|o| !o.key.is_empty());
    objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

    Ok(Json(BackupList {
        files: objects.into_iter().map(BackupFile::from).collect(),
    }))
}
