use crate::config::AppConfig;
use crate::server;
use crate::state::AppState;

pub async fn handle(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting backup dashboard in {:?} mode", config.environment);
    if config.security.test_mode_bypass {
        tracing::warn!("DASHBOARD_TEST_MODE is on; every request is treated as authenticated");
    }

    let port = config.server.port;
    let state = AppState::from_config(config)?;
    server::serve(state, port).await
}
