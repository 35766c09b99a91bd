use std::path::{Path, PathBuf};
use std::sync::Arc;
use async_trait::async_trait;
use crate::errors::JobError;
use crate::jobs::{Executor, JobKind, JobRequest, JobResult};
use crate::transcode::Transcoder;
use crate::utils::ensure_dir_exists;

const OUTPUT_STEM: &str = "converted";

/// Converts local files into the fixed output directory. Every conversion to
/// the same format writes `<dir>/converted.<format>`, replacing any earlier
/// output there.
pub struct ConvertExecutor {
    transcoder: Arc<dyn Transcoder>,
    default_format: String,
}

impl ConvertExecutor {
    pub fn new(transcoder: Arc<dyn Transcoder>, default_format: String) -> Self {
        Self {
            transcoder,
            default_format,
        }
    }

    pub fn output_path(&self, output_dir: &Path, target_format: Option<&str>) -> PathBuf {
        let format = target_format
            .map(|f| f.trim().trim_start_matches('.'))
            .filter(|f| !f.is_empty())
            .unwrap_or(self.default_format.as_str());
        output_dir.join(format!("{}.{}", OUTPUT_STEM, format))
    }

    async fn convert(&self, job: &JobRequest) -> Result<PathBuf, JobError> {
        let input = Path::new(&job.source);
        if !input.exists() {
            return Err(JobError::PathNotFound(job.source.clone()));
        }

        ensure_dir_exists(&job.destination_dir)
            .await
            .map_err(|e| JobError::ConvertFailed(format!("cannot create {:?}: {}", job.destination_dir, e)))?;

        let output = self.output_path(&job.destination_dir, job.target_format.as_deref());
        if output.exists() {
            log::warn!("⚠️ [CONVERT] Overwriting existing {:?}", output);
        }

        self.transcoder
            .transcode(input, &output)
            .await
            .map_err(|e| JobError::ConvertFailed(e.to_string()))?;

        Ok(output)
    }
}

#[async_trait]
impl Executor for ConvertExecutor {
    async fn execute(&self, job: &JobRequest) -> JobResult {
        if !self.handles(job.kind) {
            return JobResult::failure(
                job.clone(),
                JobError::InvalidRequest(format!("{} is not a convert job", job.kind)),
            );
        }

        log::info!("🔄 [CONVERT] Converting {}", job.source);
        match self.convert(job).await {
            Ok(output) => {
                let message = format!("converted to {}", output.display());
                JobResult::success(job.clone(), message, output)
            }
            Err(e) => JobResult::failure(job.clone(), e),
        }
    }

    fn handles(&self, kind: JobKind) -> bool {
        kind == JobKind::Convert
    }

    fn get_name(&self) -> &str {
        "convert"
    }
}
