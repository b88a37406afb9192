//! Job status handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use ytclip_models::{Job, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `?jobId=` query shared by job-addressed routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub job_id: Option<String>,
}

impl JobQuery {
    pub fn require(self) -> ApiResult<JobId> {
        match self.job_id {
            Some(id) if !id.trim().is_empty() => Ok(JobId::from(id)),
            _ => Err(ApiError::bad_request("jobId is required")),
        }
    }
}

/// Snapshot of a job's current state.
pub async fn job_status(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Json<Job>> {
    let id = query.require()?;
    state
        .registry
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", id)))
}
