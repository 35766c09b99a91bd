use std::path::{Path, PathBuf};
use std::sync::Arc;
use async_trait::async_trait;
use crate::errors::JobError;
use crate::fetch::{MediaSource, StreamQuery};
use crate::jobs::{Executor, JobKind, JobRequest, JobResult};
use crate::transcode::Transcoder;
use crate::utils::{ensure_dir_exists, remove_file_best_effort};

/// Downloads remote items, extracting audio through the transcoder for
/// audio-only jobs.
pub struct FetchExecutor {
    source: Arc<dyn MediaSource>,
    transcoder: Arc<dyn Transcoder>,
    video_container: String,
    audio_format: String,
}

impl FetchExecutor {
    pub fn new(
        source: Arc<dyn MediaSource>,
        transcoder: Arc<dyn Transcoder>,
        video_container: String,
        audio_format: String,
    ) -> Self {
        Self {
            source,
            transcoder,
            video_container,
            audio_format,
        }
    }

    fn query_for(&self, kind: JobKind) -> StreamQuery {
        match kind {
            JobKind::FetchAudio => StreamQuery::AudioOnly,
            _ => StreamQuery::Progressive {
                container: self.video_container.clone(),
            },
        }
    }

    async fn fetch(&self, job: &JobRequest) -> Result<(PathBuf, String), JobError> {
        ensure_dir_exists(&job.destination_dir)
            .await
            .map_err(|e| JobError::FetchFailed(format!("cannot create {:?}: {}", job.destination_dir, e)))?;

        let item = self
            .source
            .resolve_item(&job.source)
            .await
            .map_err(|e| JobError::FetchFailed(e.to_string()))?;
        log::info!("🎬 [FETCH] {} offers {} stream(s)", item.title, item.streams.len());

        let query = self.query_for(job.kind);
        let variant = item.find_stream(&query).ok_or_else(|| {
            JobError::NoMatchingStream(match &query {
                StreamQuery::Progressive { container } => {
                    format!("no progressive {} stream for '{}'", container, item.title)
                }
                StreamQuery::AudioOnly => format!("no audio-only stream for '{}'", item.title),
            })
        })?;
        log::info!("🎯 [FETCH] Selected format {} ({})", variant.format_id, variant.ext);

        let planned = self.source.download_path(&item, variant, &job.destination_dir);
        let preexisting = planned.exists();

        let raw = self
            .source
            .download_stream(&item, variant, &job.destination_dir)
            .await
            .map_err(|e| JobError::FetchFailed(e.to_string()))?;
        log::info!("⬇️ [FETCH] Downloaded {:?}", raw);

        if job.kind != JobKind::FetchAudio {
            return Ok((raw, format!("downloaded '{}'", item.title)));
        }

        // A file that was there before this job (say, an earlier video fetch
        // of the same title) is not an intermediate and is never deleted.
        let keep_raw = preexisting && raw == planned;
        let audio = self.extract_audio(&raw, keep_raw).await?;
        Ok((audio, format!("extracted audio of '{}'", item.title)))
    }

    /// Transcodes the raw download next to itself, then deletes the raw file
    /// unless `keep_raw`. The raw file is left in place when transcoding fails.
    async fn extract_audio(&self, raw: &Path, keep_raw: bool) -> Result<PathBuf, JobError> {
        let output = raw.with_extension(&self.audio_format);
        if output == raw {
            log::info!("🎵 [FETCH] Stream is already {}, no transcode needed", self.audio_format);
            return Ok(output);
        }

        self.transcoder
            .transcode(raw, &output)
            .await
            .map_err(|e| JobError::TranscodeFailed(e.to_string()))?;
        log::info!("🎵 [FETCH] Audio written to {:?}", output);

        if keep_raw {
            log::info!("📦 [FETCH] Keeping {:?}, it predates this job", raw);
            return Ok(output);
        }

        // A failed delete is retried once; the job still succeeds either way.
        if !remove_file_best_effort(raw).await && !remove_file_best_effort(raw).await {
            log::warn!("⚠️ [FETCH] Intermediate file {:?} left behind", raw);
        }
        Ok(output)
    }
}

#[async_trait]
impl Executor for FetchExecutor {
    async fn execute(&self, job: &JobRequest) -> JobResult {
        if !self.handles(job.kind) {
            return JobResult::failure(
                job.clone(),
                JobError::InvalidRequest(format!("{} is not a fetch job", job.kind)),
            );
        }

        match self.fetch(job).await {
            Ok((path, message)) => JobResult::success(job.clone(), message, path),
            Err(e) => JobResult::failure(job.clone(), e),
        }
    }

    fn handles(&self, kind: JobKind) -> bool {
        matches!(kind, JobKind::FetchVideo | JobKind::FetchAudio)
    }

    fn get_name(&self) -> &str {
        "fetch"
    }
}
