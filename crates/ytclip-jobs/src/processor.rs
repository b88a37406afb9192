//! Asynchronous clip job driver.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{error, Instrument};
use ytclip_media::{CutRequest, MediaError, VideoSource};
use ytclip_models::{ClipRequest, JobId};

use crate::config::ProcessorConfig;
use crate::error::{JobsError, JobsResult};
use crate::logging::JobLogger;
use crate::registry::JobRegistry;

/// Turns accepted clip requests into finished clip files.
///
/// Each submission runs on its own task. A semaphore caps how many jobs are
/// past `Queued` at once; the rest wait for a permit.
#[derive(Clone)]
pub struct ClipProcessor {
    registry: Arc<JobRegistry>,
    source: Arc<dyn VideoSource>,
    permits: Arc<Semaphore>,
    clip_dir: PathBuf,
}

impl ClipProcessor {
    pub fn new(
        registry: Arc<JobRegistry>,
        source: Arc<dyn VideoSource>,
        config: &ProcessorConfig,
    ) -> Self {
        Self {
            registry,
            source,
            permits: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
            clip_dir: config.clip_dir.clone(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Create a queued job and process it in the background.
    pub fn submit(&self, request: ClipRequest) -> JobId {
        let id = self.registry.create();
        metrics::counter!("ytclip_jobs_created_total").increment(1);

        let processor = self.clone();
        let job_id = id.clone();
        let span = JobLogger::new(&id, "clip").span();
        tokio::spawn(async move { processor.process(job_id, request).await }.instrument(span));

        id
    }

    /// Drive one job to a terminal state. Errors end up on the job record.
    pub async fn process(&self, id: JobId, request: ClipRequest) {
        let logger = JobLogger::new(&id, "clip");

        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                logger.log_error("processing pool closed");
                self.record_failure(&id, "Processing pool closed");
                return;
            }
        };

        let started = Instant::now();
        match self.run(&id, &request, &logger).await {
            Ok(path) => {
                metrics::counter!("ytclip_jobs_completed_total").increment(1);
                metrics::histogram!("ytclip_job_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                logger.log_completion(&path);
            }
            Err(e) => {
                metrics::counter!("ytclip_jobs_failed_total").increment(1);
                let message = e.to_string();
                logger.log_error(&message);
                if let Some(output) = error_output(&e) {
                    tracing::debug!(job_id = %id, output, "yt-dlp output of failed job");
                }
                self.record_failure(&id, message);
            }
        }
    }

    async fn run(&self, id: &JobId, request: &ClipRequest, logger: &JobLogger) -> JobsResult<String> {
        self.registry.start(id)?;
        logger.log_start(&format!("{} [{} - {}]", request.url, request.from, request.to));

        let formats = self.source.list_formats(&request.url).await?;
        let format = formats
            .iter()
            .find(|f| f.id == request.format)
            .ok_or_else(|| MediaError::UnsupportedFormat(request.format.clone()))?;
        logger.log_progress(&format!("format {} ({}, {})", format.id, format.extension, format.label));

        tokio::fs::create_dir_all(&self.clip_dir).await?;
        let output_path = self
            .clip_dir
            .join(format!("{}{}", id, format.dotted_extension()));

        let cut = CutRequest {
            url: request.url.clone(),
            format_id: format.id.clone(),
            from: request.from.clone(),
            to: request.to.clone(),
            output_path: output_path.clone(),
        };
        self.source.download_and_cut(&cut).await?;

        let path = output_path.display().to_string();
        self.registry.complete(id, path.clone())?;
        Ok(path)
    }

    fn record_failure(&self, id: &JobId, message: impl Into<String>) {
        if let Err(e) = self.registry.fail(id, message) {
            error!(job_id = %id, "Failed to record job failure: {}", e);
        }
    }
}

fn error_output(error: &JobsError) -> Option<&str> {
    match error {
        JobsError::Media(media) => media.output(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use ytclip_media::MediaResult;
    use ytclip_models::{FormatRecord, FormatType, Job, JobStatus};

    struct FakeSource {
        gate: Option<Arc<Semaphore>>,
        fail_download: bool,
    }

    impl FakeSource {
        fn ok() -> Self {
            Self {
                gate: None,
                fail_download: false,
            }
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn list_formats(&self, _url: &str) -> MediaResult<Vec<FormatRecord>> {
            Ok(vec![FormatRecord {
                id: "18".into(),
                extension: "mp4".into(),
                label: "640x360".into(),
                codec: "avc1".into(),
                bitrate: "10.50MiB".into(),
                format_type: FormatType::AudioAndVideo,
                raw_remainder: String::new(),
            }])
        }

        async fn download_and_cut(&self, request: &CutRequest) -> MediaResult<()> {
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if self.fail_download {
                return Err(MediaError::download_failed("network unreachable"));
            }
            tokio::fs::write(&request.output_path, b"clip").await?;
            Ok(())
        }

        async fn video_duration_seconds(&self, _url: &str) -> MediaResult<u64> {
            Ok(60)
        }
    }

    fn request(format: &str) -> ClipRequest {
        ClipRequest::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "00:00:10", "00:00:20", format)
    }

    fn processor(source: FakeSource, dir: &std::path::Path, max: usize) -> ClipProcessor {
        let config = ProcessorConfig {
            clip_dir: dir.to_path_buf(),
            max_concurrent_jobs: max,
        };
        ClipProcessor::new(Arc::new(JobRegistry::new()), Arc::new(source), &config)
    }

    async fn wait_terminal(processor: &ClipProcessor, id: &JobId) -> Job {
        for _ in 0..200 {
            let job = processor.registry().get(id).unwrap();
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never finished");
    }

    #[tokio::test]
    async fn test_submit_is_queued_then_completes() {
        let dir = tempfile::tempdir().unwrap();
        let processor = processor(FakeSource::ok(), dir.path(), 4);

        let id = processor.submit(request("18"));
        assert_eq!(processor.registry().get(&id).unwrap().status, JobStatus::Queued);

        let job = wait_terminal(&processor, &id).await;
        assert_eq!(job.status, JobStatus::Completed);

        let expected = dir.path().join(format!("{id}.mp4"));
        assert_eq!(job.file_path, Some(expected.display().to_string()));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let processor = processor(FakeSource::ok(), dir.path(), 4);

        let id = processor.submit(request("99"));
        let job = wait_terminal(&processor, &id).await;

        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error_message.as_deref(), Some("Unsupported format ID: 99"));
    }

    #[tokio::test]
    async fn test_download_failure_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource {
            gate: None,
            fail_download: true,
        };
        let processor = processor(source, dir.path(), 4);

        let id = processor.submit(request("18"));
        let job = wait_terminal(&processor, &id).await;

        assert_eq!(job.status, JobStatus::Error);
        assert!(job.error_message.unwrap().contains("network unreachable"));
        assert!(job.file_path.is_none());
    }

    #[tokio::test]
    async fn test_concurrency_bound_keeps_extra_jobs_queued() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource {
            gate: Some(gate.clone()),
            fail_download: false,
        };
        let processor = processor(source, dir.path(), 1);

        let first = processor.submit(request("18"));
        let second = processor.submit(request("18"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let statuses = [
            processor.registry().get(&first).unwrap().status,
            processor.registry().get(&second).unwrap().status,
        ];
        assert!(statuses.contains(&JobStatus::Processing));
        assert!(statuses.contains(&JobStatus::Queued));

        gate.add_permits(2);
        assert_eq!(wait_terminal(&processor, &first).await.status, JobStatus::Completed);
        assert_eq!(wait_terminal(&processor, &second).await.status, JobStatus::Completed);
    }
}
