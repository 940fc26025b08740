use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use super::{Pm2Process, ProcessError, ProcessManager};
use crate::config::ProcessConfig;

/// Reads the process list from the `pm2 jlist` command.
pub struct Pm2Cli {
    bin: String,
    timeout: Duration,
}

impl Pm2Cli {
    pub fn new(config: &ProcessConfig) -> Self {
        Self {
            bin: config.pm2_bin.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl ProcessManager for Pm2Cli {
    async fn list(&self) -> Result<Vec<Pm2Process>, ProcessError> {
        let output = Command::new(&self.bin)
            .arg("jlist")
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| ProcessError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            return Err(ProcessError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_jlist(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `pm2 jlist` output. A freshly spawned daemon may log lines before the JSON.
pub fn parse_jlist(stdout: &str) -> Result<Vec<Pm2Process>, ProcessError> {
    let err = match serde_json::from_str::<Option<Vec<Pm2Process>>>(stdout.trim()) {
        Ok(processes) => return Ok(processes.unwrap_or_default()),
        Err(err) => err,
    };

    let mut offset = 0;
    for line in stdout.split_inclusive('\n') {
        offset += line.len();
        if let Ok(processes) = serde_json::from_str::<Option<Vec<Pm2Process>>>(stdout[offset..].trim()) {
            return Ok(processes.unwrap_or_default());
        }
    }

    Err(err.into())
}
