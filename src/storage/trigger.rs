use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{BackupTrigger, TriggerError};
use crate::config::BackupApiConfig;

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    message: Option<String>,
}

/// Triggers runs by POSTing to `<base>/backup` on the backup runner.
pub struct HttpBackupTrigger {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackupTrigger {
    /// Returns `Ok(None)` when no backup API URL is configured.
    pub fn from_config(config: &BackupApiConfig) -> Result<Option<Self>, reqwest::Error> {
        let Some(base) = config.url.as_deref() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            endpoint: format!("{}/backup", base.trim_end_matches('/')),
        }))
    }
}

#[async_trait]
impl BackupTrigger for HttpBackupTrigger {
    async fn trigger(&self) -> Result<Option<String>, TriggerError> {
        let response = self.client.post(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriggerError::Status(status.as_u16()));
        }

        // The runner may answer with an empty or non-JSON body.
        let body = response.bytes().await?;
        let message = serde_json::from_slice::<TriggerResponse>(&body)
            .ok()
            .and_then(|r| r.message);

        tracing::info!("backup run triggered via {}", self.endpoint);
        Ok(message)
    }
}
