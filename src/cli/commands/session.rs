use serde_json::json;

use crate::auth::SessionIssuer;
use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;

/// Print a session token for scripted access (`Authorization: Bearer ...`).
pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    config.validate()?;

    let issuer = SessionIssuer::new(&config.security);
    let token = issuer.issue_for_operator()?;

    utils::output_success(
        &output_format,
        "Session token issued",
        Some(&token),
        json!({
            "token": token,
            "expires_in": issuer.expiry_secs(),
        }),
    )
}
