pub mod executor;
pub mod ytdlp;

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::errors::CollaboratorError;
use crate::utils::sanitize_filename;

pub type SourceResult<T> = std::result::Result<T, CollaboratorError>;

/// One encoded rendition of a remote item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamVariant {
    pub format_id: String,
    /// Container extension, e.g. `mp4`, `webm`, `m4a`.
    pub ext: String,
    pub has_audio: bool,
    pub has_video: bool,
    pub audio_bitrate: Option<u32>,
    pub height: Option<u32>,
}

impl StreamVariant {
    /// Audio and video in one container, no muxing needed.
    pub fn is_progressive(&self) -> bool {
        self.has_audio && self.has_video
    }

    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemMetadata {
    pub id: String,
    pub title: String,
    /// Canonical URL the collaborator should download from.
    pub source_url: String,
    /// Ordered by the collaborator's own ranking, best first.
    pub streams: Vec<StreamVariant>,
}

/// What a fetch job needs from the list of variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamQuery {
    Progressive { container: String },
    AudioOnly,
}

impl StreamQuery {
    pub fn matches(&self, variant: &StreamVariant) -> bool {
        match self {
            StreamQuery::Progressive { container } => {
                variant.is_progressive() && variant.ext.eq_ignore_ascii_case(container)
            }
            StreamQuery::AudioOnly => variant.is_audio_only(),
        }
    }
}

impl ItemMetadata {
    /// First variant, in collaborator order, that satisfies the query. Ties
    /// are never re-ranked here: if the collaborator lists two matching
    /// variants, the earlier one wins.
    pub fn find_stream(&self, query: &StreamQuery) -> Option<&StreamVariant> {
        self.streams.iter().find(|variant| query.matches(variant))
    }
}

/// The video-hosting integration. Implementations are black boxes whose
/// failures are only ever reported by message.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    async fn resolve_item(&self, url_or_id: &str) -> SourceResult<ItemMetadata>;

    /// Ordered item identifiers of a collection. Re-querying may return a
    /// different list if the remote playlist changed.
    async fn resolve_collection(&self, url_or_id: &str) -> SourceResult<Vec<String>>;

    /// Where `download_stream` writes `variant` of `item`: the sanitised
    /// title plus the container extension.
    fn download_path(&self, item: &ItemMetadata, variant: &StreamVariant, destination_dir: &Path) -> PathBuf {
        destination_dir.join(format!("{}.{}", sanitize_filename(&item.title), variant.ext))
    }

    /// Downloads `variant` of `item` to `download_path` and returns that path.
    async fn download_stream(
        &self,
        item: &ItemMetadata,
        variant: &StreamVariant,
        destination_dir: &Path,
    ) -> SourceResult<PathBuf>;

    fn get_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, ext: &str, audio: bool, video: bool) -> StreamVariant {
        StreamVariant {
            format_id: id.to_string(),
            ext: ext.to_string(),
            has_audio: audio,
            has_video: video,
            audio_bitrate: None,
            height: None,
        }
    }

    fn item(streams: Vec<StreamVariant>) -> ItemMetadata {
        ItemMetadata {
            id: "abc".to_string(),
            title: "Clip".to_string(),
            source_url: "https://video.example/watch?id=abc".to_string(),
            streams,
        }
    }

    #[test]
    fn progressive_query_takes_first_matching_container() {
        let item = item(vec![
            variant("video-only", "mp4", false, true),
            variant("webm-prog", "webm", true, true),
            variant("mp4-720", "mp4", true, true),
            variant("mp4-360", "mp4", true, true),
        ]);
        let query = StreamQuery::Progressive { container: "mp4".to_string() };
        assert_eq!(item.find_stream(&query).unwrap().format_id, "mp4-720");
    }

    #[test]
    fn audio_query_skips_muxed_variants() {
        let item = item(vec![
            variant("mp4-720", "mp4", true, true),
            variant("opus", "webm", true, false),
            variant("m4a", "m4a", true, false),
        ]);
        assert_eq!(item.find_stream(&StreamQuery::AudioOnly).unwrap().format_id, "opus");
    }

    #[test]
    fn no_match_yields_none() {
        let item = item(vec![variant("video-only", "mp4", false, true)]);
        assert!(item.find_stream(&StreamQuery::AudioOnly).is_none());
        assert!(item
            .find_stream(&StreamQuery::Progressive { container: "mp4".to_string() })
            .is_none());
    }
}
