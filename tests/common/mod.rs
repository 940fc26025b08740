#![allow(dead_code)]

use std::process::{Command, Stdio};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use backup_dashboard::auth::SessionIssuer;
use backup_dashboard::config::AppConfig;
use backup_dashboard::server::app;
use backup_dashboard::state::AppState;

pub const SESSION_SECRET: &str = "integration-session-secret";
pub const OPERATOR_ID: &str = "operator-1";
pub const MISSING_PM2: &str = "pm2-not-installed-for-tests";

const BIN: &str = env!("CARGO_BIN_EXE_backup-dashboard");

static SERVER: OnceLock<TestServer> = OnceLock::new();
static BYPASS_SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

/// No bucket, no backup API and no pm2 binary, so collaborators report
/// "not configured" instead of reaching real services.
pub fn test_config(bypass: bool) -> AppConfig {
    let mut config = AppConfig::development();
    config.server.public_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/public").to_string();
    config.security.session_secret = SESSION_SECRET.to_string();
    config.security.allowed_user_id = Some(OPERATOR_ID.to_string());
    config.security.test_mode_bypass = bypass;
    config.storage.bucket = None;
    config.backup_api.url = None;
    config.process.pm2_bin = MISSING_PM2.to_string();
    config
}

impl TestServer {
    /// Serve the router on its own thread and runtime. Each `#[tokio::test]`
    /// runtime is dropped when its test returns, so the server cannot live on
    /// one; the thread ends with the test process.
    fn start(bypass: bool) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = test_config(bypass);
        let state = AppState::from_config(config).context("failed to build app state")?;

        // Bound before returning, so requests queue until the loop accepts them.
        let listener = std::net::TcpListener::bind(("127.0.0.1", port))
            .with_context(|| format!("failed to bind {}", base_url))?;
        listener.set_nonblocking(true)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .context("failed to build server runtime")?;

        std::thread::Builder::new()
            .name(format!("test-server-{}", port))
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = tokio::net::TcpListener::from_std(listener)?;
                    axum::serve(listener, app(state)).await
                })
            })
            .context("failed to start server thread")?;

        Ok(Self { port, base_url })
    }
}

pub fn ensure_server() -> Result<&'static TestServer> {
    if let Some(server) = SERVER.get() {
        return Ok(server);
    }
    let server = TestServer::start(false)?;
    Ok(SERVER.get_or_init(|| server))
}

/// A second server running with the test-mode bypass enabled.
pub fn ensure_bypass_server() -> Result<&'static TestServer> {
    if let Some(server) = BYPASS_SERVER.get() {
        return Ok(server);
    }
    let server = TestServer::start(true)?;
    Ok(BYPASS_SERVER.get_or_init(|| server))
}

/// Mint an operator session with the same issuer the server uses.
pub fn operator_token() -> Result<String> {
    SessionIssuer::new(&test_config(false).security)
        .issue_for_operator()
        .context("failed to issue operator token")
}

/// Run the built binary to completion with its output captured.
pub fn run_cli(args: &[&str]) -> Result<std::process::Output> {
    Command::new(BIN)
        .args(args)
        .env("APP_ENV", "development")
        .env("SESSION_SECRET", SESSION_SECRET)
        .env("ALLOWED_DISCORD_USER_ID", OPERATOR_ID)
        .env("PM2_BIN", MISSING_PM2)
        .env("RUST_LOG", "off")
        .env_remove("DASHBOARD_TEST_MODE")
        .env_remove("BACKUP_S3_BUCKET")
        .env_remove("BACKUP_API_URL")
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run {:?}", args))
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}
