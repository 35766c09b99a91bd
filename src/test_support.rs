//! Collaborator doubles shared by the unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use async_trait::async_trait;
use crate::errors::CollaboratorError;
use crate::fetch::{ItemMetadata, MediaSource, SourceResult, StreamVariant};
use crate::transcode::Transcoder;

pub fn variant(format_id: &str, ext: &str, has_audio: bool, has_video: bool) -> StreamVariant {
    StreamVariant {
        format_id: format_id.to_string(),
        ext: ext.to_string(),
        has_audio,
        has_video,
        audio_bitrate: None,
        height: None,
    }
}

/// Serves one fixed item for every URL and a fixed playlist.
pub struct FakeSource {
    pub title: String,
    pub streams: Vec<StreamVariant>,
    pub playlist: Vec<String>,
    pub fail_resolve: Option<String>,
    pub fail_download: Option<String>,
    pub downloads: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(title: &str, streams: Vec<StreamVariant>) -> Self {
        Self {
            title: title.to_string(),
            streams,
            playlist: Vec::new(),
            fail_resolve: None,
            fail_download: None,
            downloads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_playlist(mut self, items: &[&str]) -> Self {
        self.playlist = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn resolve_item(&self, url_or_id: &str) -> SourceResult<ItemMetadata> {
        if let Some(message) = &self.fail_resolve {
            return Err(CollaboratorError(message.clone()));
        }
        Ok(ItemMetadata {
            id: url_or_id.to_string(),
            title: self.title.clone(),
            source_url: url_or_id.to_string(),
            streams: self.streams.clone(),
        })
    }

    async fn resolve_collection(&self, _url_or_id: &str) -> SourceResult<Vec<String>> {
        Ok(self.playlist.clone())
    }

    async fn download_stream(
        &self,
        item: &ItemMetadata,
        variant: &StreamVariant,
        destination_dir: &Path,
    ) -> SourceResult<PathBuf> {
        if let Some(message) = &self.fail_download {
            return Err(CollaboratorError(message.clone()));
        }
        self.downloads.lock().unwrap().push(variant.format_id.clone());
        let path = self.download_path(item, variant, destination_dir);
        std::fs::write(&path, b"raw media").map_err(|e| CollaboratorError(e.to_string()))?;
        Ok(path)
    }

    fn get_name(&self) -> &str {
        "fake-source"
    }
}

/// Writes a placeholder output file, or fails without touching disk.
pub struct FakeTranscoder {
    pub fail_with: Option<String>,
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeTranscoder {
    pub fn ok() -> Self {
        Self { fail_with: None, calls: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: &str) -> Self {
        Self { fail_with: Some(message.to_string()), calls: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), CollaboratorError> {
        self.calls.lock().unwrap().push((input.to_path_buf(), output.to_path_buf()));
        if let Some(message) = &self.fail_with {
            return Err(CollaboratorError(message.clone()));
        }
        let data = std::fs::read(input).map_err(|e| CollaboratorError(e.to_string()))?;
        std::fs::write(output, data).map_err(|e| CollaboratorError(e.to_string()))?;
        Ok(())
    }

    fn get_name(&self) -> &str {
        "fake-transcoder"
    }
}

pub fn files_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ext))
                .collect()
        })
        .unwrap_or_default()
}
