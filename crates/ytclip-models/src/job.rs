//! Clip job records and their state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a clip job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Job lifecycle status.
///
/// Transitions only move forward: `Queued -> Processing -> Completed | Error`,
/// with `Queued -> Error` allowed for jobs that fail before they start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Queued, JobStatus::Error)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Error)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal job transition {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// A single clip request's lifecycle record.
///
/// `file_path` is only set once the job is `Completed`, `error_message` only
/// once it is in `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new queued job with a fresh ID.
    pub fn new() -> Self {
        Self::with_id(JobId::new())
    }

    pub fn with_id(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            file_path: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Mark the job as processing.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(JobStatus::Processing)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the job as completed with the produced clip.
    pub fn complete(&mut self, file_path: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(JobStatus::Completed)?;
        self.file_path = Some(file_path.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the job as failed with an error message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(JobStatus::Error)?;
        self.error_message = Some(message.into());
        self.failed_at = Some(Utc::now());
        Ok(())
    }

    /// Time the job reached a terminal state, if it has.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            JobStatus::Completed => self.completed_at,
            JobStatus::Error => self.failed_at,
            _ => None,
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_queued() {
        let job = Job::new();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.file_path.is_none());
        assert!(job.error_message.is_none());
        assert!(job.started_at.is_none());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = Job::new();
        job.start().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.started_at.is_some());

        job.complete("/videos/a.mp4").unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.file_path.as_deref(), Some("/videos/a.mp4"));
        assert!(job.completed_at.is_some());
        assert_eq!(job.finished_at(), job.completed_at);
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut job = Job::new();
        job.start().unwrap();
        job.complete("clip.mp4").unwrap();

        let err = job.start().unwrap_err();
        assert_eq!(err.from, JobStatus::Completed);
        assert_eq!(err.to, JobStatus::Processing);
        assert!(job.fail("late").is_err());
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error_message.is_none());
    }

    #[test]
    fn test_queued_job_can_fail_but_not_complete() {
        let mut job = Job::new();
        assert!(job.complete("clip.mp4").is_err());
        assert_eq!(job.status, JobStatus::Queued);

        job.fail("formats unavailable").unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error_message.as_deref(), Some("formats unavailable"));
        assert!(job.file_path.is_none());
        assert_eq!(job.finished_at(), job.failed_at);
    }

    #[test]
    fn test_job_serialization() {
        let mut job = Job::with_id(JobId::from_string("abc"));
        job.start().unwrap();
        job.complete("videos/abc.mp4").unwrap();

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["filePath"], "videos/abc.mp4");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }
}
