//! Job error types.

use thiserror::Error;
use ytclip_media::MediaError;
use ytclip_models::{JobId, TransitionError};

pub type JobsResult<T> = Result<T, JobsError>;

#[derive(Debug, Error)]
pub enum JobsError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {id}: {source}")]
    InvalidTransition {
        id: JobId,
        #[source]
        source: TransitionError,
    },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
