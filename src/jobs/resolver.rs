use std::path::PathBuf;
use url::Url;
use crate::errors::JobError;
use crate::fetch::MediaSource;
use crate::jobs::JobRequest;

/// What the user asked for, before expansion into jobs.
#[derive(Debug, Clone, PartialEq)]
pub enum UserRequest {
    Fetch {
        url: String,
        audio_only: bool,
        destination: PathBuf,
    },
    Convert {
        input: String,
        format: Option<String>,
        output_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteTarget {
    Item,
    Playlist,
}

/// Recognises remote URLs: absolute `http(s)` with a host. A URL is a
/// playlist when its first path segment is `playlist`, or when it carries a
/// non-empty `list` query parameter on an empty or `/watch` path without an
/// item selector. A path naming one video or a `v`/`id` parameter makes it
/// an item, whatever `list` says.
pub fn classify_remote(input: &str) -> Option<RemoteTarget> {
    let url = Url::parse(input.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => return None,
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    if segments.first().is_some_and(|s| s.eq_ignore_ascii_case("playlist")) {
        return Some(RemoteTarget::Playlist);
    }

    let mut has_list = false;
    let mut has_item = false;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "list" if !value.is_empty() => has_list = true,
            "v" | "id" if !value.is_empty() => has_item = true,
            _ => {}
        }
    }

    if has_item || path_names_video(&host, &segments) {
        return Some(RemoteTarget::Item);
    }

    let bare_list_path = match segments.as_slice() {
        [] => true,
        [only] => only.eq_ignore_ascii_case("watch"),
        _ => false,
    };
    if has_list && bare_list_path {
        Some(RemoteTarget::Playlist)
    } else {
        Some(RemoteTarget::Item)
    }
}

/// `youtu.be/<id>`, or `/shorts/<id>`, `/embed/<id>`, `/live/<id>`, `/v/<id>`.
fn path_names_video(host: &str, segments: &[&str]) -> bool {
    if host == "youtu.be" || host.ends_with(".youtu.be") {
        return !segments.is_empty();
    }
    match segments {
        [prefix, _id, ..] => ["shorts", "embed", "live", "v"]
            .iter()
            .any(|p| prefix.eq_ignore_ascii_case(p)),
        _ => false,
    }
}

fn validate_local_path(input: &str) -> Result<(), JobError> {
    if input.trim().is_empty() {
        return Err(JobError::InvalidRequest("input path cannot be empty".to_string()));
    }
    if input.contains('\0') {
        return Err(JobError::InvalidRequest("null bytes not allowed in file path".to_string()));
    }
    if classify_remote(input).is_some() {
        return Err(JobError::InvalidRequest(format!(
            "'{}' is a remote URL, not a local file",
            input
        )));
    }
    Ok(())
}

/// Turns a user request into a flat, ordered list of jobs. Playlists are
/// expanded here, once, through the collaborator; an empty playlist gives an
/// empty list. Local paths are not checked for existence until execution.
pub async fn resolve(request: &UserRequest, source: &dyn MediaSource) -> Result<Vec<JobRequest>, JobError> {
    match request {
        UserRequest::Fetch {
            url,
            audio_only,
            destination,
        } => {
            let url = url.trim();
            match classify_remote(url) {
                Some(RemoteTarget::Item) => {
                    log::info!("🔗 [RESOLVE] Single item: {}", url);
                    Ok(vec![JobRequest::fetch(url, destination.clone(), *audio_only)])
                }
                Some(RemoteTarget::Playlist) => {
                    log::info!("📋 [RESOLVE] Expanding playlist via {}: {}", source.get_name(), url);
                    let items = source
                        .resolve_collection(url)
                        .await
                        .map_err(|e| JobError::FetchFailed(format!("playlist lookup failed: {}", e)))?;
                    log::info!("📋 [RESOLVE] Playlist expanded to {} job(s)", items.len());
                    Ok(items
                        .into_iter()
                        .map(|item| JobRequest::fetch(item, destination.clone(), *audio_only))
                        .collect())
                }
                None => Err(JobError::InvalidRequest(format!(
                    "'{}' is not a recognised http(s) URL",
                    url
                ))),
            }
        }
        UserRequest::Convert {
            input,
            format,
            output_dir,
        } => {
            validate_local_path(input)?;
            let format = format
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string);
            Ok(vec![JobRequest::convert(input.clone(), output_dir.clone(), format)])
        }
    }
}
