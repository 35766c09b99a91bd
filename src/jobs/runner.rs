use std::sync::Arc;
use crate::errors::JobError;
use crate::jobs::{Executor, JobRequest, JobResult, JobState};
use crate::logging::JobLog;

/// Runs jobs one at a time, in order. A failing job never stops the batch,
/// and every submitted job yields exactly one result.
pub struct JobRunner {
    executors: Vec<Arc<dyn Executor>>,
    log: JobLog,
}

impl JobRunner {
    pub fn new(log: JobLog) -> Self {
        Self {
            executors: Vec::new(),
            log,
        }
    }

    pub fn add_executor(&mut self, executor: Arc<dyn Executor>) {
        self.executors.push(executor);
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.add_executor(executor);
        self
    }

    pub async fn run(&self, jobs: Vec<JobRequest>) -> Vec<JobResult> {
        let total = jobs.len();
        let mut results = Vec::with_capacity(total);

        for (index, job) in jobs.into_iter().enumerate() {
            log::debug!("[RUNNER] Job {}/{} {:?} -> {:?}", index + 1, total, JobState::Pending, JobState::Running);
            self.log.job_started(index, total, &job);

            let result = match self.executors.iter().find(|e| e.handles(job.kind)) {
                Some(executor) => {
                    log::debug!("[RUNNER] Dispatching to {} executor", executor.get_name());
                    executor.execute(&job).await
                }
                None => JobResult::failure(
                    job.clone(),
                    JobError::InvalidRequest(format!("no executor registered for {}", job.kind)),
                ),
            };

            log::debug!("[RUNNER] Job {}/{} {:?} -> {:?}", index + 1, total, JobState::Running, result.final_state());
            self.log.job_finished(index, total, &result);
            results.push(result);
        }

        self.log.batch_finished(&results);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConvertExecutor;
    use crate::fetch::executor::FetchExecutor;
    use crate::jobs::resolver::{resolve, UserRequest};
    use crate::jobs::{JobKind, JobOutcome};
    use crate::test_support::{files_with_extension, variant, FakeSource, FakeTranscoder};
    use std::path::Path;
    use tempfile::tempdir;

    fn runner(source: Arc<FakeSource>, transcoder: Arc<FakeTranscoder>) -> JobRunner {
        JobRunner::new(JobLog::new())
            .with_executor(Arc::new(FetchExecutor::new(
                source,
                transcoder.clone(),
                "mp4".to_string(),
                "mp3".to_string(),
            )))
            .with_executor(Arc::new(ConvertExecutor::new(transcoder, "mp4".to_string())))
    }

    fn default_runner() -> JobRunner {
        runner(
            Arc::new(FakeSource::new("Clip", vec![variant("140", "mp4", true, false), variant("22", "mp4", true, true)])),
            Arc::new(FakeTranscoder::ok()),
        )
    }

    #[tokio::test]
    async fn empty_batch_gives_empty_results() {
        assert!(default_runner().run(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn results_match_input_order_and_failures_do_not_stop_batch() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("real.mov");
        std::fs::write(&existing, b"mov").unwrap();
        let out_dir = dir.path().join("converted");
        let downloads = dir.path().join("downloads");

        let jobs = vec![
            JobRequest::convert(dir.path().join("missing.mp4").to_string_lossy(), &out_dir, None),
            JobRequest::fetch("https://video.example/watch?id=1", &downloads, false),
            JobRequest::convert(existing.to_string_lossy(), &out_dir, Some("mkv".to_string())),
            JobRequest::fetch("https://video.example/watch?id=2", &downloads, true),
        ];

        let results = default_runner().run(jobs.clone()).await;

        assert_eq!(results.len(), jobs.len());
        for (job, result) in jobs.iter().zip(&results) {
            assert_eq!(&result.request, job);
        }
        let outcomes: Vec<_> = results.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            [JobOutcome::Failure, JobOutcome::Success, JobOutcome::Success, JobOutcome::Success]
        );
        assert!(matches!(results[0].error, Some(JobError::PathNotFound(_))));
        assert_eq!(results[0].final_state(), JobState::Failed);
    }

    #[tokio::test]
    async fn unhandled_kind_fails_that_job_only() {
        let dir = tempdir().unwrap();
        let only_convert = JobRunner::new(JobLog::new())
            .with_executor(Arc::new(ConvertExecutor::new(Arc::new(FakeTranscoder::ok()), "mp4".to_string())));

        let results = only_convert
            .run(vec![
                JobRequest::fetch("https://video.example/watch?id=1", dir.path(), false),
                JobRequest::convert(dir.path().join("nope.avi").to_string_lossy(), dir.path(), None),
            ])
            .await;

        assert_eq!(results.len(), 2);
        assert!(matches!(results[0].error, Some(JobError::InvalidRequest(_))));
        assert!(matches!(results[1].error, Some(JobError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn audio_fetch_scenario_end_to_end() {
        let dir = tempdir().unwrap();
        let source = Arc::new(FakeSource::new("Clip", vec![variant("140", "mp4", true, false)]));
        let runner = runner(source.clone(), Arc::new(FakeTranscoder::ok()));
        let request = UserRequest::Fetch {
            url: "https://video.example/watch?id=abc".to_string(),
            audio_only: true,
            destination: dir.path().to_path_buf(),
        };

        let jobs = resolve(&request, &*source).await.unwrap();
        let results = runner.run(jobs).await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_success());
        assert_eq!(files_with_extension(dir.path(), "mp3").len(), 1);
        assert!(files_with_extension(dir.path(), "mp4").is_empty());
    }

    #[tokio::test]
    async fn playlist_batch_fetches_every_item() {
        let dir = tempdir().unwrap();
        let source = Arc::new(
            FakeSource::new("Clip", vec![variant("22", "mp4", true, true)]).with_playlist(&["a", "b", "c"]),
        );
        let runner = runner(source.clone(), Arc::new(FakeTranscoder::ok()));
        let request = UserRequest::Fetch {
            url: "https://video.example/playlist?list=PL1".to_string(),
            audio_only: false,
            destination: dir.path().to_path_buf(),
        };

        let jobs = resolve(&request, &*source).await.unwrap();
        let results = runner.run(jobs).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_success() && r.request.kind == JobKind::FetchVideo));
        assert_eq!(source.download_count(), 3);
    }

    #[tokio::test]
    async fn audio_fetch_after_video_fetch_keeps_the_video() {
        let dir = tempdir().unwrap();
        let source = Arc::new(FakeSource::new(
            "Clip",
            vec![variant("22", "mp4", true, true), variant("140", "mp4", true, false)],
        ));
        let runner = runner(source, Arc::new(FakeTranscoder::ok()));

        let results = runner
            .run(vec![
                JobRequest::fetch("https://video.example/watch?id=abc", dir.path(), false),
                JobRequest::fetch("https://video.example/watch?id=abc", dir.path(), true),
            ])
            .await;

        assert!(results.iter().all(|r| r.is_success()));
        assert_eq!(files_with_extension(dir.path(), "mp4").len(), 1);
        assert_eq!(files_with_extension(dir.path(), "mp3").len(), 1);
    }

    #[tokio::test]
    async fn missing_convert_input_does_not_create_output_dir() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("converted");
        let request = UserRequest::Convert {
            input: "missing.mp4".to_string(),
            format: None,
            output_dir: out_dir.clone(),
        };
        let source = FakeSource::new("Clip", vec![]);

        let jobs = resolve(&request, &source).await.unwrap();
        let results = default_runner().run(jobs).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, JobOutcome::Failure);
        assert!(matches!(results[0].error, Some(JobError::PathNotFound(_))));
        assert!(!Path::new(&out_dir).exists());
    }
}
