use std::path::Path;
use std::time::Duration;
use async_trait::async_trait;
use crate::errors::CollaboratorError;
use crate::utils::run_tool;

/// External media-processing tool: re-encodes or re-muxes `input` into
/// `output`, picking the encoding from the output extension.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), CollaboratorError>;
    fn get_name(&self) -> &str;
}

/// Runs the `ffmpeg` binary. Paths are handed over as separate argv entries,
/// never through a shell, so spaces and quotes in file names need no escaping.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    timeout: Option<Duration>,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: Option<String>, timeout: Option<Duration>) -> Self {
        let ffmpeg_path = ffmpeg_path.unwrap_or_else(|| "ffmpeg".to_string());
        Self { ffmpeg_path, timeout }
    }

    fn build_args(input: &Path, output: &Path) -> Vec<std::ffi::OsString> {
        vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.as_os_str().to_os_string(),
            output.as_os_str().to_os_string(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), CollaboratorError> {
        log::info!("🎞️ [FFMPEG] {:?} -> {:?}", input, output);
        let result = run_tool(&self.ffmpeg_path, Self::build_args(input, output), self.timeout).await?;
        if !result.stderr.trim().is_empty() {
            log::debug!("[FFMPEG] stderr: {}", result.stderr.trim());
        }
        Ok(())
    }

    fn get_name(&self) -> &str {
        "ffmpeg"
    }
}
