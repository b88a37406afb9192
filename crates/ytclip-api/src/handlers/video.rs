//! Video metadata handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::warn;
use ytclip_models::clip::is_valid_youtube_url;
use ytclip_models::FormatRecord;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    pub youtube_url: Option<String>,
}

impl VideoQuery {
    fn require_url(self) -> ApiResult<String> {
        let url = self
            .youtube_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::bad_request("URL is required"))?;

        if !is_valid_youtube_url(&url) {
            warn!(url = %url, "Rejected invalid YouTube URL");
            return Err(ApiError::bad_request("Invalid YouTube URL"));
        }
        Ok(url)
    }
}

/// Total video length in seconds.
pub async fn video_duration(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<Json<u64>> {
    let url = query.require_url()?;
    let seconds = state
        .source
        .video_duration_seconds(&url)
        .await
        .map_err(|e| ApiError::media("Failed to get video duration", e))?;
    Ok(Json(seconds))
}

/// Formats yt-dlp offers for the video, throttled ones excluded.
pub async fn video_formats(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<Json<Vec<FormatRecord>>> {
    let url = query.require_url()?;
    let formats = state
        .source
        .list_formats(&url)
        .await
        .map_err(|e| ApiError::media("Failed to fetch formats", e))?;
    Ok(Json(formats))
}
