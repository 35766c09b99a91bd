use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use log::{error, info};
use crate::config::LoggingConfig;
use crate::errors::{AppError, Result};
use crate::jobs::{JobOutcome, JobRequest, JobResult};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Sets up the process-wide log sink. May only be called once; the returned
/// handle is what the job runner reports through.
pub fn init(config: &LoggingConfig) -> Result<JobLog> {
    let file = match &config.file {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::Logging(format!("cannot open log file {:?}: {}", path, e)))?,
        ),
        None => None,
    };

    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(AppError::Logging("logging already initialized".to_string()));
    }

    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    let mut builder = env_logger::Builder::from_env(env);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {} {}",
            chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    info!("Logging initialized (level: {}, sink: {})", config.level,
        config.file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "stderr".to_string()));

    Ok(JobLog::new())
}

/// Per-job diagnostic records.
#[derive(Debug, Clone)]
pub struct JobLog {
    _private: (),
}

impl JobLog {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    pub fn job_started(&self, index: usize, total: usize, request: &JobRequest) {
        info!("▶️ [RUNNER] Job {}/{} started: {} {}", index + 1, total, request.kind, request.source);
    }

    pub fn job_finished(&self, index: usize, total: usize, result: &JobResult) {
        match (&result.outcome, &result.error) {
            (JobOutcome::Success, _) => info!(
                "✅ [RUNNER] Job {}/{} succeeded: {} {} -> {}",
                index + 1,
                total,
                result.request.kind,
                result.request.source,
                result.message
            ),
            (JobOutcome::Failure, Some(err)) => error!(
                "❌ [RUNNER] Job {}/{} failed [{}]: {} {}: {}",
                index + 1,
                total,
                err.kind(),
                result.request.kind,
                result.request.source,
                result.message
            ),
            (JobOutcome::Failure, None) => error!(
                "❌ [RUNNER] Job {}/{} failed: {} {}: {}",
                index + 1,
                total,
                result.request.kind,
                result.request.source,
                result.message
            ),
        }
    }

    pub fn batch_finished(&self, results: &[JobResult]) {
        let failed = results.iter().filter(|r| r.outcome == JobOutcome::Failure).count();
        info!(
            "🏁 [RUNNER] Batch finished: {} job(s), {} succeeded, {} failed",
            results.len(),
            results.len() - failed,
            failed
        );
    }
}
