mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn session_token_command_mints_an_accepted_token() -> Result<()> {
    let output = common::run_cli(&["session-token"])?;
    assert!(output.status.success(), "session-token exited with {}", output.status);

    let token = String::from_utf8(output.stdout)?.trim().to_string();
    assert!(token.starts_with("ey"), "{}", token);

    let server = common::ensure_server()?;
    let res = common::client()
        .get(format!("{}/api/pm2/status", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    // Past the gate; pm2 is missing on purpose.
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[test]
fn check_config_omits_secrets() -> Result<()> {
    let output = common::run_cli(&["--json", "check-config"])?;
    assert!(output.status.success(), "check-config exited with {}", output.status);

    let stdout = String::from_utf8(output.stdout)?;
    assert!(!stdout.contains(common::SESSION_SECRET));

    let body: Value = serde_json::from_str(&stdout)?;
    assert_eq!(body["success"], true);
    assert_eq!(body["config"]["security"]["allowed_user_id"], common::OPERATOR_ID);
    assert!(body["config"]["security"].get("session_secret").is_none());
    Ok(())
}
