//! Runtime control of the background schedulers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Live enabled flags of the background loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub cleanup_enabled: bool,
    pub cookie_monitor_enabled: bool,
}

/// Partial update; absent fields are left as they are.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerUpdate {
    pub cleanup_enabled: Option<bool>,
    pub cookie_monitor_enabled: Option<bool>,
}

fn current(state: &AppState) -> SchedulerStatus {
    SchedulerStatus {
        cleanup_enabled: state.cleanup.is_enabled(),
        cookie_monitor_enabled: state.cookie_monitor.is_enabled(),
    }
}

pub async fn get_schedulers(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(current(&state))
}

/// Flip scheduler flags. Takes effect from the next tick.
pub async fn update_schedulers(
    State(state): State<AppState>,
    Json(update): Json<SchedulerUpdate>,
) -> Json<SchedulerStatus> {
    if let Some(enabled) = update.cleanup_enabled {
        state.cleanup.set_enabled(enabled);
    }
    if let Some(enabled) = update.cookie_monitor_enabled {
        state.cookie_monitor.set_enabled(enabled);
    }

    Json(current(&state))
}
