pub mod resolver;
pub mod runner;

use std::fmt;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::errors::JobError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobKind {
    FetchVideo,
    FetchAudio,
    Convert,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::FetchVideo => "fetch-video",
            JobKind::FetchAudio => "fetch-audio",
            JobKind::Convert => "convert",
        };
        f.write_str(name)
    }
}

/// One unit of work. Built by the resolver and consumed once by the runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRequest {
    pub kind: JobKind,
    /// Item URL/identifier for fetch jobs, local file path for conversions.
    pub source: String,
    pub destination_dir: PathBuf,
    pub target_format: Option<String>,
}

impl JobRequest {
    pub fn fetch(source: impl Into<String>, destination_dir: impl Into<PathBuf>, audio_only: bool) -> Self {
        Self {
            kind: if audio_only { JobKind::FetchAudio } else { JobKind::FetchVideo },
            source: source.into(),
            destination_dir: destination_dir.into(),
            target_format: None,
        }
    }

    pub fn convert(input: impl Into<String>, output_dir: impl Into<PathBuf>, target_format: Option<String>) -> Self {
        Self {
            kind: JobKind::Convert,
            source: input.into(),
            destination_dir: output_dir.into(),
            target_format,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failure,
}

/// Lifecycle of a job inside the runner. There are no retries, so each job
/// moves forward exactly once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResult {
    pub request: JobRequest,
    pub outcome: JobOutcome,
    pub message: String,
    pub produced_path: Option<PathBuf>,
    pub error: Option<JobError>,
}

impl JobResult {
    pub fn success(request: JobRequest, message: impl Into<String>, produced_path: PathBuf) -> Self {
        Self {
            request,
            outcome: JobOutcome::Success,
            message: message.into(),
            produced_path: Some(produced_path),
            error: None,
        }
    }

    pub fn failure(request: JobRequest, error: JobError) -> Self {
        Self {
            request,
            outcome: JobOutcome::Failure,
            message: error.to_string(),
            produced_path: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == JobOutcome::Success
    }

    pub fn final_state(&self) -> JobState {
        match self.outcome {
            JobOutcome::Success => JobState::Succeeded,
            JobOutcome::Failure => JobState::Failed,
        }
    }
}

/// A strategy that knows how to carry out some kinds of job. Executors never
/// return errors; every failure is folded into the `JobResult`.
#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, job: &JobRequest) -> JobResult;
    fn handles(&self, kind: JobKind) -> bool;
    fn get_name(&self) -> &str;
}
