// Process monitor: status of the bot process as reported by pm2.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod pm2;

pub use pm2::Pm2Cli;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One entry of `pm2 jlist`. pm2 omits fields freely, so everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pm2Process {
    pub name: Option<String>,
    pub pm_id: Option<i64>,
    pub pm2_env: Option<Pm2Env>,
    pub monit: Option<Pm2Monit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pm2Env {
    pub status: Option<String>,
    /// Start time in epoch milliseconds.
    pub pm_uptime: Option<i64>,
    pub restart_time: Option<u64>,
    pub version: Option<String>,
    pub used_memory: Option<f64>,
    pub env: Option<Pm2EnvVars>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pm2EnvVars {
    #[serde(rename = "VERSION")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pm2Monit {
    /// Resident memory in bytes.
    pub memory: Option<f64>,
    pub cpu: Option<f64>,
}

/// Status row returned by `GET /api/pm2/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessStatus {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Megabytes, rounded.
    pub memory: u64,
    pub cpu: f64,
    pub restarts: u64,
    /// Seconds since the process started.
    pub uptime: u64,
}

impl ProcessStatus {
    pub fn from_pm2(process: &Pm2Process, now_ms: i64) -> Self {
        let env = process.pm2_env.clone().unwrap_or_default();
        let monit = process.monit.clone().unwrap_or_default();

        let version = env
            .version
            .clone()
            .or_else(|| env.env.as_ref().and_then(|vars| vars.version.clone()));

        let memory_bytes = monit.memory.or(env.used_memory).unwrap_or(0.0);

        let uptime = env
            .pm_uptime
            .map(|started| (now_ms - started).max(0) as u64 / 1000)
            .unwrap_or(0);

        // A process with a pm2 id but no reported status is running.
        let status = match (env.status.clone(), process.pm_id) {
            (Some(status), _) => status,
            (None, Some(_)) => "online".to_string(),
            (None, None) => "unknown".to_string(),
        };

        Self {
            name: process.name.clone().unwrap_or_else(|| "unknown".to_string()),
            status,
            version,
            memory: (memory_bytes / BYTES_PER_MB).round() as u64,
            cpu: monit.cpu.unwrap_or(0.0),
            restarts: env.restart_time.unwrap_or(0),
            uptime,
        }
    }
}

/// Keep processes whose name contains `filter`, ignoring case.
pub fn select_matching<'a>(processes: &'a [Pm2Process], filter: &str) -> Vec<&'a Pm2Process> {
    let filter = filter.to_lowercase();
    processes
        .iter()
        .filter(|p| {
            p.name
                .as_deref()
                .map(|name| name.to_lowercase().contains(&filter))
                .unwrap_or(false)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to run process manager: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("process manager did not answer within {0}s")]
    Timeout(u64),
    #[error("process manager exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },
    #[error("unreadable process list: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait ProcessManager: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Pm2Process>, ProcessError>;
}
