// Backup archive storage and the companion backup runner.
//
// Handlers only see the traits below; the S3 and HTTP implementations are
// wired up once at startup from `AppConfig`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

pub mod s3;
pub mod trigger;

pub use s3::S3BackupStore;
pub use trigger::HttpBackupTrigger;

/// One archive in the bucket, as reported by the store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupObject {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    List,
    Delete,
    Sign,
}

impl StoreOperation {
    pub fn client_message(&self) -> &'static str {
        match self {
            StoreOperation::List => "Failed to list backups from S3.",
            StoreOperation::Delete => "Failed to delete backup.",
            StoreOperation::Sign => "Failed to generate download URL.",
        }
    }
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreOperation::List => "list",
            StoreOperation::Delete => "delete",
            StoreOperation::Sign => "sign",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backup bucket is not configured")]
    NotConfigured,
    #[error("'{0}' is not a valid object key")]
    InvalidKey(String),
    #[error("{operation} failed: {source}")]
    Backend {
        operation: StoreOperation,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    pub fn backend(
        operation: StoreOperation,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        StoreError::Backend {
            operation,
            source: source.into(),
        }
    }
}

#[async_trait]
pub trait BackupStore: Send + Sync + 'static {
    /// List at most `max_keys` objects under the configured prefix.
    async fn list(&self, max_keys: usize) -> Result<Vec<BackupObject>, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Presigned GET URL for `key`, valid for `ttl`.
    async fn download_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError>;

    /// Key prefix the store is scoped to, if any.
    fn prefix(&self) -> Option<&str> {
        None
    }
}

/// Stand-in used when no bucket is configured; every call fails.
pub struct UnconfiguredStore;

#[async_trait]
impl BackupStore for UnconfiguredStore {
    async fn list(&self, _max_keys: usize) -> Result<Vec<BackupObject>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn download_url(&self, _key: &str, _ttl: Duration) -> Result<String, StoreError> {
        Err(StoreError::NotConfigured)
    }
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("backup API URL is not configured")]
    NotConfigured,
    #[error("backup API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backup API responded with status {0}")]
    Status(u16),
}

/// Starts a new backup run on the companion backup service.
#[async_trait]
pub trait BackupTrigger: Send + Sync + 'static {
    /// Returns the runner's status message, when it sends one.
    async fn trigger(&self) -> Result<Option<String>, TriggerError>;
}

pub struct UnconfiguredTrigger;

#[async_trait]
impl BackupTrigger for UnconfiguredTrigger {
    async fn trigger(&self) -> Result<Option<String>, TriggerError> {
        Err(TriggerError::NotConfigured)
    }
}
