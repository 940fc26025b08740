// handlers/backups/mod.rs - Backup archive handlers

use serde::Deserialize;

use crate::error::ApiError;
use crate::storage::BackupStore;

pub mod create;   // POST /api/backups/create
pub mod delete;   // DELETE /api/backups/delete
pub mod download; // GET /api/backups/download
pub mod list;     // GET /api/backups/list

pub use create::create_backup;
pub use delete::delete_backup;
pub use download::download_backup;
pub use list::list_backups;

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

/// Validate the `key` query parameter against the store's prefix.
pub(crate) fn required_key(query: KeyQuery, store: &dyn BackupStore) -> Result<String, ApiError> {
    let key = query
        .key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required query parameter: key"))?;

    if let Some(prefix) = store.prefix() {
        if !key.starts_with(prefix) {
            tracing::warn!("rejected backup key '{}' outside prefix '{}'", key, prefix);
            return Err(ApiError::bad_request("Key is outside the backup prefix."));
        }
    }

    Ok(key)
}
