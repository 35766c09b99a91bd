use std::path::{Path, PathBuf};
use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::errors::CollaboratorError;
use crate::fetch::{ItemMetadata, MediaSource, SourceResult, StreamVariant};
use crate::utils::run_tool;

/// `yt-dlp` backed implementation of the fetch collaborator.
pub struct YtDlpSource {
    ytdlp_path: String,
    timeout: Option<Duration>,
}

impl YtDlpSource {
    pub fn new() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            timeout: None,
        }
    }

    pub fn with_ytdlp_path(mut self, path: String) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: &[&str]) -> SourceResult<String> {
        log::info!("🚀 [YTDLP] Running: {} {}", self.ytdlp_path, args.join(" "));
        let output = run_tool(&self.ytdlp_path, args, self.timeout).await?;
        Ok(output.stdout)
    }
}

/// Video information from yt-dlp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub webpage_url: Option<String>,
    pub original_url: Option<String>,
    pub formats: Option<Vec<FormatInfo>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
    pub abr: Option<f64>,
    pub height: Option<u32>,
}

/// One line of `--flat-playlist` output.
#[derive(Debug, Clone, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
}

fn codec_present(codec: &Option<String>) -> bool {
    matches!(codec.as_deref(), Some(c) if !c.is_empty() && c != "none")
}

impl From<&FormatInfo> for StreamVariant {
    fn from(format: &FormatInfo) -> Self {
        StreamVariant {
            format_id: format.format_id.clone(),
            ext: format.ext.clone(),
            has_audio: codec_present(&format.acodec),
            has_video: codec_present(&format.vcodec),
            audio_bitrate: format.abr.map(|abr| abr.round() as u32),
            height: format.height,
        }
    }
}

impl VideoInfo {
    /// yt-dlp lists formats worst to best; streams are exposed best first.
    pub fn into_metadata(self, requested: &str) -> ItemMetadata {
        let streams = self
            .formats
            .as_deref()
            .unwrap_or_default()
            .iter()
            .rev()
            .map(StreamVariant::from)
            .collect();

        ItemMetadata {
            source_url: self
                .webpage_url
                .or(self.original_url)
                .unwrap_or_else(|| requested.to_string()),
            id: self.id,
            title: self.title,
            streams,
        }
    }
}

pub(crate) fn parse_collection(json_lines: &str) -> Vec<String> {
    json_lines
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .filter_map(|(i, line)| match serde_json::from_str::<FlatEntry>(line) {
            Ok(entry) => {
                let identifier = entry.url.or(entry.webpage_url).or(entry.id);
                if identifier.is_none() {
                    log::warn!("⚠️ [YTDLP] Playlist entry {} has no identifier", i + 1);
                }
                identifier
            }
            Err(e) => {
                log::warn!("⚠️ [YTDLP] Failed to parse playlist entry {}: {}", i + 1, e);
                None
            }
        })
        .collect()
}

/// `%` starts a yt-dlp output template field, so literal ones are doubled.
fn output_template(path: &Path) -> String {
    path.to_string_lossy().replace('%', "%%")
}

#[async_trait]
impl MediaSource for YtDlpSource {
    async fn resolve_item(&self, url_or_id: &str) -> SourceResult<ItemMetadata> {
        let stdout = self
            .run(&["--dump-json", "--no-playlist", "--no-warnings", url_or_id])
            .await?;

        let info: VideoInfo = serde_json::from_str(stdout.trim())
            .map_err(|e| CollaboratorError(format!("unreadable yt-dlp metadata: {}", e)))?;
        log::info!("✅ [YTDLP] Resolved item: {} ({} formats)", info.title,
            info.formats.as_ref().map(|f| f.len()).unwrap_or(0));

        Ok(info.into_metadata(url_or_id))
    }

    async fn resolve_collection(&self, url_or_id: &str) -> SourceResult<Vec<String>> {
        let stdout = self
            .run(&["--flat-playlist", "--dump-json", "--no-warnings", url_or_id])
            .await?;
        let items = parse_collection(&stdout);
        log::info!("📋 [YTDLP] Collection {} has {} item(s)", url_or_id, items.len());
        Ok(items)
    }

    async fn download_stream(
        &self,
        item: &ItemMetadata,
        variant: &StreamVariant,
        destination_dir: &Path,
    ) -> SourceResult<PathBuf> {
        let path = self.download_path(item, variant, destination_dir);
        let template = output_template(&path);

        self.run(&[
            "-f",
            variant.format_id.as_str(),
            "-o",
            template.as_str(),
            "--no-playlist",
            "--no-warnings",
            "--no-part",
            item.source_url.as_str(),
        ])
        .await?;

        if !path.exists() {
            return Err(CollaboratorError(format!(
                "yt-dlp reported success but {:?} is missing",
                path
            )));
        }
        Ok(path)
    }

    fn get_name(&self) -> &str {
        "yt-dlp"
    }
}
