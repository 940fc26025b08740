use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    pub backup_api: BackupApiConfig,
    pub process: ProcessConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub public_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub session_secret: String,
    pub session_expiry_hours: u64,
    /// The single external identity allowed to hold a session.
    pub allowed_user_id: Option<String>,
    pub require_https: bool,
    /// Disables the request gate entirely. Only for automated UI tests.
    pub test_mode_bypass: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub discord_client_id: String,
    #[serde(skip_serializing)]
    pub discord_client_secret: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub list_max_keys: usize,
    pub download_url_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupApiConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub name_filter: String,
    pub pm2_bin: String,
    pub timeout_secs: u64,
}

/// Longest session lifetime accepted from configuration (one year).
pub const MAX_SESSION_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DASHBOARD_TEST_MODE must not be enabled in production")]
    BypassInProduction,
    #[error("SESSION_SECRET is not configured")]
    MissingSessionSecret,
    #[error("SESSION_EXPIRY_HOURS must be between 1 and {max}, got {0}", max = MAX_SESSION_EXPIRY_HOURS)]
    SessionExpiryOutOfRange(u64),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Reject combinations that must never reach a running server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.test_mode_bypass && self.environment == Environment::Production {
            return Err(ConfigError::BypassInProduction);
        }
        if self.security.session_secret.is_empty() && !self.security.test_mode_bypass {
            return Err(ConfigError::MissingSessionSecret);
        }
        let hours = self.security.session_expiry_hours;
        if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&hours) {
            return Err(ConfigError::SessionExpiryOutOfRange(hours));
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            self.server.port = v;
        }
        if let Some(v) = non_empty_var("PUBLIC_DIR") {
            self.server.public_dir = v;
        }

        // Security overrides
        if let Some(v) = non_empty_var("SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Some(v) = non_empty_var("ALLOWED_DISCORD_USER_ID") {
            self.security.allowed_user_id = Some(v);
        }
        if let Ok(v) = env::var("REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Ok(v) = env::var("DASHBOARD_TEST_MODE") {
            self.security.test_mode_bypass = parse_flag(&v);
        }

        // Identity provider overrides
        if let Some(v) = non_empty_var("DISCORD_CLIENT_ID") {
            self.identity.discord_client_id = v;
        }
        if let Some(v) = non_empty_var("DISCORD_CLIENT_SECRET") {
            self.identity.discord_client_secret = v;
        }
        if let Some(v) = non_empty_var("PUBLIC_BASE_URL") {
            self.identity.public_base_url = v.trim_end_matches('/').to_string();
        }

        // Storage overrides
        self.storage.bucket = non_empty_var("BACKUP_S3_BUCKET").or(self.storage.bucket);
        self.storage.prefix = non_empty_var("BACKUP_S3_PREFIX").or(self.storage.prefix);
        self.storage.region = non_empty_var("AWS_REGION").or(self.storage.region);
        self.storage.endpoint = non_empty_var("BACKUP_S3_ENDPOINT").or(self.storage.endpoint);
        if let Ok(v) = env::var("BACKUP_LIST_MAX_KEYS") {
            self.storage.list_max_keys = v.parse().unwrap_or(self.storage.list_max_keys);
        }
        if let Ok(v) = env::var("BACKUP_DOWNLOAD_URL_TTL_SECS") {
            self.storage.download_url_ttl_secs = v.parse().unwrap_or(self.storage.download_url_ttl_secs);
        }

        // Backup runner overrides
        self.backup_api.url = non_empty_var("BACKUP_API_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .or(self.backup_api.url);
        if let Ok(v) = env::var("BACKUP_API_TIMEOUT_SECS") {
            self.backup_api.timeout_secs = v.parse().unwrap_or(self.backup_api.timeout_secs);
        }

        // Process monitor overrides
        if let Some(v) = non_empty_var("BOT_PROCESS_FILTER") {
            self.process.name_filter = v;
        }
        if let Some(v) = non_empty_var("PM2_BIN") {
            self.process.pm2_bin = v;
        }
        if let Ok(v) = env::var("PM2_TIMEOUT_SECS") {
            self.process.timeout_secs = v.parse().unwrap_or(self.process.timeout_secs);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                public_dir: "public".to_string(),
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_expiry_hours: 24 * 7,
                allowed_user_id: None,
                require_https: false,
                test_mode_bypass: false,
            },
            identity: IdentityConfig {
                discord_client_id: String::new(),
                discord_client_secret: String::new(),
                public_base_url: "http://localhost:3000".to_string(),
            },
            storage: StorageConfig {
                bucket: None,
                prefix: None,
                region: None,
                endpoint: None,
                list_max_keys: 200,
                download_url_ttl_secs: 300,
            },
            backup_api: BackupApiConfig {
                url: None,
                timeout_secs: 30,
            },
            process: ProcessConfig {
                name_filter: "bot".to_string(),
                pm2_bin: "pm2".to_string(),
                timeout_secs: 5,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.security.session_expiry_hours = 24;
        config.security.require_https = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.security.session_expiry_hours = 12;
        config.security.require_https = true;
        config.storage.download_url_ttl_secs = 120;
        config
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.list_max_keys, 200);
        assert!(!config.security.test_mode_bypass);
        assert!(!config.security.require_https);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert!(config.security.require_https);
        assert_eq!(config.security.session_expiry_hours, 12);
    }

    #[test]
    fn bypass_is_rejected_in_production() {
        let mut config = AppConfig::production();
        config.security.session_secret = "secret".to_string();
        config.security.test_mode_bypass = true;
        assert_eq!(config.validate(), Err(ConfigError::BypassInProduction));
    }

    #[test]
    fn missing_secret_is_rejected_unless_bypassed() {
        let mut config = AppConfig::development();
        assert_eq!(config.validate(), Err(ConfigError::MissingSessionSecret));

        config.security.test_mode_bypass = true;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn session_expiry_must_stay_in_range() {
        let mut config = AppConfig::development();
        config.security.session_secret = "secret".to_string();

        for hours in [0, MAX_SESSION_EXPIRY_HOURS + 1, u64::MAX] {
            config.security.session_expiry_hours = hours;
            assert_eq!(config.validate(), Err(ConfigError::SessionExpiryOutOfRange(hours)));
        }

        config.security.session_expiry_hours = MAX_SESSION_EXPIRY_HOURS;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn flag_parsing_accepts_common_truthy_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag(" YES "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
