use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use log::warn;
use crate::config::AppConfig;
use crate::convert::ConvertExecutor;
use crate::errors::JobError;
use crate::fetch::executor::FetchExecutor;
use crate::fetch::ytdlp::YtDlpSource;
use crate::fetch::MediaSource;
use crate::jobs::resolver::{resolve, UserRequest};
use crate::jobs::runner::JobRunner;
use crate::jobs::{JobOutcome, JobResult};
use crate::logging::JobLog;
use crate::transcode::{FfmpegTranscoder, Transcoder};
use crate::utils::tool_available;

#[derive(Debug, Parser)]
#[command(name = "media-multitool", version, about = "Download videos or audio and convert local media files")]
pub struct Cli {
    /// JSON config file (defaults to the per-user config location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Append log records to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download one video, or every video of a playlist
    Fetch {
        #[arg(long)]
        url: String,
        /// Keep only the audio track
        #[arg(long)]
        audio: bool,
        /// Download directory (overrides the configured one)
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Convert a local media file into the `converted` directory
    Convert {
        #[arg(long)]
        input: String,
        #[arg(long)]
        format: Option<String>,
    },
    /// Interactive menu
    Menu,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(path) = &self.log_file {
            config.logging.file = Some(path.clone());
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}

/// Wires the collaborators, executors and runner for one process.
pub struct App {
    config: AppConfig,
    source: Arc<dyn MediaSource>,
    transcoder: Arc<dyn Transcoder>,
    runner: JobRunner,
}

impl App {
    pub fn from_config(config: AppConfig, log: JobLog) -> Self {
        let timeout = config.collaborator_timeout();
        let source = Arc::new(
            YtDlpSource::new()
                .with_ytdlp_path(config.ytdlp_path.clone())
                .with_timeout(timeout),
        );
        let transcoder = Arc::new(FfmpegTranscoder::new(config.ffmpeg_path.clone(), timeout));
        Self::new(config, log, source, transcoder)
    }

    pub fn new(config: AppConfig, log: JobLog, source: Arc<dyn MediaSource>, transcoder: Arc<dyn Transcoder>) -> Self {
        let runner = JobRunner::new(log)
            .with_executor(Arc::new(FetchExecutor::new(
                source.clone(),
                transcoder.clone(),
                config.video_container.clone(),
                config.audio_format.clone(),
            )))
            .with_executor(Arc::new(ConvertExecutor::new(
                transcoder.clone(),
                config.default_convert_format.clone(),
            )));

        Self {
            config,
            source,
            transcoder,
            runner,
        }
    }

    /// Logs a warning for each external tool that does not answer `--version`.
    pub async fn check_tools(&self) {
        if !tool_available(&self.config.ytdlp_path, "--version").await {
            warn!("⚠️ [STARTUP] {} not found; fetch jobs will fail", self.config.ytdlp_path);
        }
        let ffmpeg = self.config.ffmpeg_path.as_deref().unwrap_or("ffmpeg");
        if !tool_available(ffmpeg, "-version").await {
            warn!("⚠️ [STARTUP] {} ({}) not found; audio extraction and conversion will fail",
                ffmpeg, self.transcoder.get_name());
        }
    }

    pub fn fetch_request(&self, url: String, audio_only: bool, dest: Option<PathBuf>) -> UserRequest {
        UserRequest::Fetch {
            url,
            audio_only,
            destination: dest.unwrap_or_else(|| self.config.download_path.clone()),
        }
    }

    pub fn convert_request(&self, input: String, format: Option<String>) -> UserRequest {
        UserRequest::Convert {
            input,
            format,
            output_dir: self.config.converted_path.clone(),
        }
    }

    /// Resolves and runs one request. Only resolution can fail; job failures
    /// are reported inside the results.
    pub async fn execute(&self, request: &UserRequest) -> Result<Vec<JobResult>, JobError> {
        let jobs = resolve(request, &*self.source).await?;
        if jobs.is_empty() {
            log::info!("[RUNNER] Nothing to do");
        }
        Ok(self.runner.run(jobs).await)
    }

    /// The interactive loop: fetch, convert, or exit. Returns on `3` or end
    /// of input. Resolution errors are printed and the menu shown again.
    pub async fn menu<R: BufRead, W: Write>(&self, input: &mut R, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "Welcome to the Multitool!")?;
        loop {
            writeln!(out, "1. Download video (or audio)")?;
            writeln!(out, "2. Convert video file")?;
            writeln!(out, "3. Exit")?;
            let Some(choice) = prompt(input, out, "Select an option: ")? else {
                break;
            };

            let request = match choice.as_str() {
                "1" => {
                    let Some(url) = prompt(input, out, "Enter the video or playlist URL: ")? else {
                        break;
                    };
                    let Some(audio) = prompt(input, out, "Audio only? [y/N]: ")? else {
                        break;
                    };
                    let audio_only = matches!(audio.to_ascii_lowercase().as_str(), "y" | "yes");
                    self.fetch_request(url, audio_only, None)
                }
                "2" => {
                    let Some(path) = prompt(input, out, "Enter the path of the input video file: ")? else {
                        break;
                    };
                    let Some(format) = prompt(
                        input,
                        out,
                        &format!("Enter the output format ({} by default): ", self.config.default_convert_format),
                    )?
                    else {
                        break;
                    };
                    self.convert_request(path, Some(format).filter(|f| !f.is_empty()))
                }
                "3" => {
                    writeln!(out, "Exiting...")?;
                    break;
                }
                _ => {
                    writeln!(out, "Invalid option. Please try again.")?;
                    continue;
                }
            };

            match self.execute(&request).await {
                Ok(results) => print_results(out, &results)?,
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
        }
        Ok(())
    }
}

/// Prints a prompt and reads one trimmed line; `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> std::io::Result<Option<String>> {
    write!(out, "{}", text)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub fn format_result(result: &JobResult) -> String {
    match (&result.outcome, &result.produced_path) {
        (JobOutcome::Success, Some(path)) => format!(
            "ok      {} {} -> {}",
            result.request.kind,
            result.request.source,
            path.display()
        ),
        (JobOutcome::Success, None) => format!("ok      {} {}", result.request.kind, result.request.source),
        (JobOutcome::Failure, _) => format!(
            "failed  {} {} [{}] {}",
            result.request.kind,
            result.request.source,
            result.error.as_ref().map(|e| e.kind()).unwrap_or("Unknown"),
            result.message
        ),
    }
}

pub fn print_results<W: Write>(out: &mut W, results: &[JobResult]) -> std::io::Result<()> {
    if results.is_empty() {
        writeln!(out, "No jobs to run.")?;
    }
    for result in results {
        writeln!(out, "{}", format_result(result))?;
    }
    Ok(())
}
