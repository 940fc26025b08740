use std::sync::Arc;

use anyhow::Context;

use crate::auth::{JwtSessionVerifier, SessionIssuer};
use crate::config::AppConfig;
use crate::identity::{DiscordProvider, IdentityProvider};
use crate::middleware::{RequestGate, ROUTES};
use crate::process::{Pm2Cli, ProcessManager};
use crate::storage::{
    BackupStore, BackupTrigger, HttpBackupTrigger, S3BackupStore, UnconfiguredStore, UnconfiguredTrigger,
};

/// Shared, read-only application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gate: Arc<RequestGate>,
    pub sessions: Arc<SessionIssuer>,
    pub identity: Arc<dyn IdentityProvider>,
    pub backups: Arc<dyn BackupStore>,
    pub trigger: Arc<dyn BackupTrigger>,
    pub processes: Arc<dyn ProcessManager>,
}

impl AppState {
    /// Wire the production collaborators from a validated configuration.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let verifier = Arc::new(JwtSessionVerifier::new(&config.security));
        let gate = RequestGate::new(&ROUTES, verifier, config.security.test_mode_bypass);

        if config.security.allowed_user_id.is_none() {
            tracing::warn!("ALLOWED_DISCORD_USER_ID is not set; nobody can sign in");
        }

        let identity = DiscordProvider::new(&config.identity).context("failed to build identity provider")?;

        let backups: Arc<dyn BackupStore> = match S3BackupStore::from_config(&config.storage)
            .context("failed to build S3 client")?
        {
            Some(store) => {
                tracing::info!("backups stored in s3://{}", store.bucket());
                Arc::new(store)
            }
            None => {
                tracing::warn!("BACKUP_S3_BUCKET is not set; backup endpoints will return 500");
                Arc::new(UnconfiguredStore)
            }
        };

        let trigger: Arc<dyn BackupTrigger> = match HttpBackupTrigger::from_config(&config.backup_api)
            .context("failed to build backup API client")?
        {
            Some(trigger) => Arc::new(trigger),
            None => {
                tracing::warn!("BACKUP_API_URL is not set; create backup will return 500");
                Arc::new(UnconfiguredTrigger)
            }
        };

        Ok(Self {
            sessions: Arc::new(SessionIssuer::new(&config.security)),
            processes: Arc::new(Pm2Cli::new(&config.process)),
            gate: Arc::new(gate),
            identity: Arc::new(identity),
            backups,
            trigger,
            config: Arc::new(config),
        })
    }
}
