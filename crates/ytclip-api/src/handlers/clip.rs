//! Clip submission and delivery.

use std::path::Path;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{info, warn};
use ytclip_models::{ClipRequest, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::handlers::jobs::JobQuery;
use crate::state::AppState;

/// Validate a clip request and queue it. Responds with the job id as text.
pub async fn create_clip(
    State(state): State<AppState>,
    payload: Result<Json<ClipRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Malformed clip request");
        ApiError::bad_request("Invalid input")
    })?;

    request.validate()?;

    let id = state.processor.submit(request);
    info!(job_id = %id, "Clip job queued");

    Ok((StatusCode::CREATED, id.to_string()))
}

/// Stream a finished clip as an attachment.
pub async fn download_clip(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
    request: Request<Body>,
) -> ApiResult<Response> {
    let id = query.require()?;
    let file_path = state
        .registry
        .get(&id)
        .filter(|job| job.status == JobStatus::Completed)
        .and_then(|job| job.file_path)
        .ok_or_else(|| ApiError::not_found("File not available"))?;

    let path = Path::new(&file_path);
    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        warn!(job_id = %id, path = %file_path, "Completed clip is missing on disk");
        return Err(ApiError::not_found("File not available"));
    }

    let mut response = response.map(Body::new);
    if let Some(disposition) = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name)).ok())
    {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok(response)
}
