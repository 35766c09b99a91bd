use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::errors::{AppError, Result};

const ENV_PREFIX: &str = "MULTITOOL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub download_path: PathBuf,
    pub converted_path: PathBuf,
    pub video_container: String,
    pub audio_format: String,
    pub default_convert_format: String,
    pub ytdlp_path: String,
    pub ffmpeg_path: Option<String>,
    pub collaborator_timeout_secs: Option<u64>,
    pub proxy: Option<String>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_path: PathBuf::from("./downloads"),
            converted_path: PathBuf::from("./converted"),
            video_container: "mp4".to_string(),
            audio_format: "mp3".to_string(),
            default_convert_format: "mp4".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: None,
            collaborator_timeout_secs: None,
            proxy: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the JSON config file (the explicit path, or the
    /// per-user one if it exists), then `MULTITOOL_*` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::get_config_path().ok(),
        };
        Self::load_layered(path.as_deref(), None)
    }

    /// First-run helper: writes the defaults to `path` unless a file is
    /// already there. Returns whether a file was written.
    pub fn save_defaults_if_missing(path: &Path) -> bool {
        if path.exists() {
            return false;
        }
        match AppConfig::default().save(path) {
            Ok(()) => {
                info!("📝 [CONFIG] Wrote default config to {:?}", path);
                true
            }
            Err(e) => {
                // Read-only config dirs are fine, defaults still apply
                warn!("⚠️ [CONFIG] Could not write default config to {:?}: {}", path, e);
                false
            }
        }
    }

    /// `env` replaces the process environment when given; used by tests.
    pub fn load_layered(file: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = builder.build()?.try_deserialize::<AppConfig>()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(config_dir) = path.parent() {
            if !config_dir.as_os_str().is_empty() {
                std::fs::create_dir_all(config_dir)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::Config(config::ConfigError::Message("Could not find config directory".to_string())))?;

        Ok(config_dir.join("media-multitool").join("config.json"))
    }

    pub fn collaborator_timeout(&self) -> Option<std::time::Duration> {
        self.collaborator_timeout_secs
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn empty_env() -> Option<config::Map<String, String>> {
        Some(config::Map::new())
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = AppConfig::load_layered(None, empty_env()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.converted_path, PathBuf::from("./converted"));
        assert_eq!(config.default_convert_format, "mp4");
    }

    #[test]
    fn file_overrides_defaults_partially() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "audio_format": "m4a", "logging": { "level": "debug" } }"#).unwrap();

        let config = AppConfig::load_layered(Some(&path), empty_env()).unwrap();
        assert_eq!(config.audio_format, "m4a");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.video_container, "mp4");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_layered(Some(&dir.path().join("nope.json")), empty_env()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "download_path": "/from/file" }"#).unwrap();

        let mut env = config::Map::new();
        env.insert("MULTITOOL_DOWNLOAD_PATH".to_string(), "/from/env".to_string());
        env.insert("MULTITOOL_COLLABORATOR_TIMEOUT_SECS".to_string(), "30".to_string());

        let config = AppConfig::load_layered(Some(&path), Some(env)).unwrap();
        assert_eq!(config.download_path, PathBuf::from("/from/env"));
        assert_eq!(config.collaborator_timeout(), Some(std::time::Duration::from_secs(30)));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            ytdlp_path: "/opt/bin/yt-dlp".to_string(),
            ..AppConfig::default()
        };

        config.save(&path).unwrap();
        let loaded = AppConfig::load_layered(Some(&path), empty_env()).unwrap();
        assert_eq!(loaded.ytdlp_path, "/opt/bin/yt-dlp");
    }

    #[test]
    fn defaults_written_once_and_never_over_an_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("media-multitool").join("config.json");

        assert!(AppConfig::save_defaults_if_missing(&path));
        let written = AppConfig::load_layered(Some(&path), empty_env()).unwrap();
        assert_eq!(written, AppConfig::default());

        std::fs::write(&path, r#"{ "audio_format": "opus" }"#).unwrap();
        assert!(!AppConfig::save_defaults_if_missing(&path));
        let kept = AppConfig::load_layered(Some(&path), empty_env()).unwrap();
        assert_eq!(kept.audio_format, "opus");
    }

    #[test]
    fn unwritable_config_location_is_not_fatal() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        assert!(!AppConfig::save_defaults_if_missing(&blocker.join("config.json")));
    }

    #[test]
    fn zero_timeout_means_unbounded() {
        let config = AppConfig {
            collaborator_timeout_secs: Some(0),
            ..AppConfig::default()
        };
        assert_eq!(config.collaborator_timeout(), None);
    }
}
