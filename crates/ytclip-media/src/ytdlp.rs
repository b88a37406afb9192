//! High-level yt-dlp operations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use ytclip_models::FormatRecord;

use crate::config::YtDlpConfig;
use crate::error::{MediaError, MediaResult};
use crate::invocation::InvocationEngine;
use crate::parser::{extract_duration_substring, parse_duration, parse_formats};

/// A time-sliced download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutRequest {
    pub url: String,
    pub format_id: String,
    /// Start offset, `HH:MM:SS`
    pub from: String,
    /// End offset, `HH:MM:SS`
    pub to: String,
    pub output_path: PathBuf,
}

/// Source of format listings, clips and durations.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Available formats for `url`, throttled formats excluded.
    async fn list_formats(&self, url: &str) -> MediaResult<Vec<FormatRecord>>;

    /// Download the requested range into `request.output_path`.
    async fn download_and_cut(&self, request: &CutRequest) -> MediaResult<()>;

    /// Total duration of the video in seconds.
    async fn video_duration_seconds(&self, url: &str) -> MediaResult<u64>;
}

/// [`VideoSource`] that shells out to yt-dlp through an [`InvocationEngine`].
pub struct YtDlpClient {
    engine: InvocationEngine,
    download_timeout: Duration,
    max_filesize_bytes: u64,
}

impl YtDlpClient {
    pub fn new(config: &YtDlpConfig) -> Self {
        Self::with_engine(InvocationEngine::from_config(config), config)
    }

    pub fn with_engine(engine: InvocationEngine, config: &YtDlpConfig) -> Self {
        Self {
            engine,
            download_timeout: config.download_timeout,
            max_filesize_bytes: config.max_filesize_bytes(),
        }
    }

    pub fn engine(&self) -> &InvocationEngine {
        &self.engine
    }

    /// Verify yt-dlp and FFmpeg are installed.
    pub fn check_dependencies(&self) -> MediaResult<()> {
        check_dependencies(self.engine.program())
    }
}

/// Verify the given yt-dlp binary and FFmpeg are on `PATH`.
pub fn check_dependencies(ytdlp_binary: &str) -> MediaResult<()> {
    which::which(ytdlp_binary).map_err(|_| MediaError::YtDlpNotFound)?;
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;
    Ok(())
}

#[async_trait]
impl VideoSource for YtDlpClient {
    async fn list_formats(&self, url: &str) -> MediaResult<Vec<FormatRecord>> {
        let args = vec!["-F".to_string(), url.to_string()];
        let output = self.engine.invoke(&args).await?;

        let formats = parse_formats(&output.stdout);
        debug!(url, count = formats.len(), "Parsed format listing");
        Ok(formats)
    }

    async fn download_and_cut(&self, request: &CutRequest) -> MediaResult<()> {
        let args = download_args(request, self.max_filesize_bytes);

        info!(
            url = %request.url,
            format = %request.format_id,
            from = %request.from,
            to = %request.to,
            "Downloading clip"
        );

        self.engine
            .invoke_with_timeout(&args, self.download_timeout)
            .await?;

        ensure_output_exists(&request.output_path).await
    }

    async fn video_duration_seconds(&self, url: &str) -> MediaResult<u64> {
        let args = vec![
            "--get-duration".to_string(),
            "--no-warnings".to_string(),
            url.to_string(),
        ];
        let output = self.engine.invoke(&args).await?;
        duration_from_output(&output.stdout)
    }
}

fn download_args(request: &CutRequest, max_filesize_bytes: u64) -> Vec<String> {
    vec![
        "-o".to_string(),
        request.output_path.display().to_string(),
        "-f".to_string(),
        request.format_id.clone(),
        "-v".to_string(),
        "--max-filesize".to_string(),
        max_filesize_bytes.to_string(),
        "--downloader".to_string(),
        "ffmpeg".to_string(),
        "--downloader-args".to_string(),
        format!("ffmpeg_i:-ss {} -to {}", request.from, request.to),
        request.url.clone(),
    ]
}

async fn ensure_output_exists(path: &Path) -> MediaResult<()> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(MediaError::download_failed(format!(
            "output file was not created: {}",
            path.display()
        )))
    }
}

/// Duration from `--get-duration` output, accepting a bare seconds line.
fn duration_from_output(stdout: &str) -> MediaResult<u64> {
    let found = extract_duration_substring(stdout);
    if !found.is_empty() {
        return parse_duration(found);
    }

    let last_line = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("");

    if !last_line.is_empty() && last_line.bytes().all(|b| b.is_ascii_digit()) {
        return parse_duration(last_line);
    }

    Err(MediaError::DurationNotFound)
}
