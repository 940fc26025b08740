use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;

/// Validate the configuration and print it. The session secret is never serialized.
pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    config.validate()?;

    let rendered = serde_json::to_string_pretty(config)?;
    utils::output_success(
        &output_format,
        "Configuration is valid",
        Some(&rendered),
        json!({ "config": config }),
    )
}
