//! S3-compatible backup store via object_store.
use async_trait::async_trait;
use axum::http::Method;
use futures::{future, StreamExt, TryStreamExt};
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    path::Path as ObjPath,
    signer::Signer,
    ObjectMeta, ObjectStore,
};
use std::time::Duration;

use super::{BackupObject, BackupStore, StoreError, StoreOperation};
use crate::config::StorageConfig;

pub struct S3BackupStore {
    store: AmazonS3,
    bucket: String,
    prefix: Option<String>,
}

impl S3BackupStore {
    /// Build from configuration. Returns `Ok(None)` when no bucket is set.
    ///
    /// Credentials come from the standard AWS environment variables.
    pub fn from_config(storage: &StorageConfig) -> Result<Option<Self>, object_store::Error> {
        let Some(bucket) = storage.bucket.as_deref() else {
            return Ok(None);
        };

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(region) = storage.region.as_deref() {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = storage.endpoint.as_deref() {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        Ok(Some(Self {
            store: builder.build()?,
            bucket: bucket.to_string(),
            prefix: storage.prefix.clone().filter(|p| !p.is_empty()),
        }))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl From<ObjectMeta> for BackupObject {
    fn from(meta: ObjectMeta) -> Self {
        Self {
            key: meta.location.to_string(),
            last_modified: Some(meta.last_modified),
            size: meta.size as u64,
        }
    }
}

/// Object path for a key exactly as listed. `Path::from` would re-encode
/// characters such as `%` and `~` and address a different object.
pub(crate) fn object_path(key: &str) -> Result<ObjPath, StoreError> {
    ObjPath::parse(key).map_err(|_| StoreError::InvalidKey(key.to_string()))
}

/// Deepest whole directory covered by a plain key prefix.
/// `backups/nightscout-` lists under `backups`; `nightscout-` lists the root.
fn listing_root(prefix: &str) -> Result<Option<ObjPath>, StoreError> {
    match prefix.rsplit_once('/') {
        Some((dir, _)) if !dir.trim_matches('/').is_empty() => ObjPath::parse(dir.trim_matches('/'))
            .map(Some)
            .map_err(|e| StoreError::backend(StoreOperation::List, e)),
        _ => Ok(None),
    }
}

/// List up to `max_keys` objects whose key starts with `prefix` as a plain
/// string, the way S3 `ListObjectsV2` treats it.
pub(crate) async fn list_with_prefix(
    store: &dyn ObjectStore,
    prefix: Option<&str>,
    max_keys: usize,
) -> Result<Vec<ObjectMeta>, StoreError> {
    let root = prefix.map(listing_root).transpose()?.flatten();
    let prefix = prefix.unwrap_or("");

    store
        .list(root.as_ref())
        .try_filter(|meta| future::ready(meta.location.as_ref().starts_with(prefix)))
        .take(max_keys)
        .try_collect()
        .await
        .map_err(|e| StoreError::backend(StoreOperation::List, e))
}

#[async_trait]
impl BackupStore for S3BackupStore {
    async fn list(&self, max_keys: usize) -> Result<Vec<BackupObject>, StoreError> {
        let objects = list_with_prefix(&self.store, self.prefix.as_deref(), max_keys).await?;

        tracing::debug!("listed {} objects from s3://{}", objects.len(), self.bucket);
        Ok(objects.into_iter().map(BackupObject::from).collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.store
            .delete(&object_path(key)?)
            .await
            .map_err(|e| StoreError::backend(StoreOperation::Delete, e))?;

        tracing::info!("deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn download_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        let url = self
            .store
            .signed_url(Method::GET, &object_path(key)?, ttl)
            .await
            .map_err(|e| StoreError::backend(StoreOperation::Sign, e))?;
        Ok(url.to_string())
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    async fn store_with(keys: &[&str]) -> InMemory {
        let store = InMemory::new();
        for key in keys {
            store
                .put(&ObjPath::parse(*key).unwrap(), b"archive".to_vec().into())
                .await
                .unwrap();
        }
        store
    }

    fn keys(objects: Vec<ObjectMeta>) -> Vec<String> {
        let mut keys: Vec<String> = objects.into_iter().map(|m| BackupObject::from(m).key).collect();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn prefix_matches_partial_segment() {
        let store = store_with(&[
            "nightscout-2024-01-01.tar.gz",
            "nightscout-2024-01-02.tar.gz",
            "other/file.tar.gz",
        ])
        .await;

        let listed = list_with_prefix(&store, Some("nightscout-"), 100).await.unwrap();
        assert_eq!(
            keys(listed),
            vec!["nightscout-2024-01-01.tar.gz", "nightscout-2024-01-02.tar.gz"]
        );
    }

    #[tokio::test]
    async fn nested_prefix_lists_only_matching_keys() {
        let store = store_with(&[
            "backups/nightscout-a.tar.gz",
            "backups/mongo-b.tar.gz",
            "backups-old/nightscout-c.tar.gz",
        ])
        .await;

        let listed = list_with_prefix(&store, Some("backups/nightscout-"), 100).await.unwrap();
        assert_eq!(keys(listed), vec!["backups/nightscout-a.tar.gz"]);

        let listed = list_with_prefix(&store, Some("backups/"), 100).await.unwrap();
        assert_eq!(keys(listed).len(), 2);
    }

    #[tokio::test]
    async fn listing_stops_at_max_keys() {
        let store = store_with(&["a-1", "a-2", "a-3"]).await;
        let listed = list_with_prefix(&store, None, 2).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn listed_key_addresses_the_same_object() {
        let raw = "backups/a~b%c.tar.gz";
        let store = store_with(&[raw]).await;

        let listed = keys(list_with_prefix(&store, Some("backups/"), 10).await.unwrap());
        assert_eq!(listed, vec![raw]);

        store.delete(&object_path(&listed[0]).unwrap()).await.unwrap();
        assert!(list_with_prefix(&store, None, 10).await.unwrap().is_empty());
    }

    #[test]
    fn malformed_key_is_rejected() {
        assert!(matches!(object_path("backups//x"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(object_path("backups/../x"), Err(StoreError::InvalidKey(_))));
    }
}
