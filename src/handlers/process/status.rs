// handlers/process/status.rs - GET /api/pm2/status handler

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::process::{select_matching, ProcessStatus};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProcessList {
    pub processes: Vec<ProcessStatus>,
}

/// Report every pm2 process whose name matches the configured bot filter.
pub async fn process_status(State(state): State<AppState>) -> ApiResult<Json<ProcessList>> {
    let all = state.processes.list().await?;
    let now_ms = Utc::now().timestamp_millis();

    let processes: Vec<ProcessStatus> = select_matching(&all, &state.config.process.name_filter)
        .into_iter()
        .map(|p| ProcessStatus::from_pm2(p, now_ms))
        .collect();

    if processes.is_empty() {
        return Err(ApiError::not_found("No Discord bot process found."));
    }

    Ok(Json(ProcessList { processes }))
}
