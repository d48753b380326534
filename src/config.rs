//! Client configuration
//!
//! Resolved in order: built-in defaults, a YAML file, then environment
//! variables. Command-line flags are layered on top by the binary.

use crate::layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const ENV_API_BASE: &str = "PAPERSCOPE_API_BASE";
pub const ENV_PROVIDER: &str = "PAPERSCOPE_PROVIDER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the research service
    pub api_base: String,
    pub default_provider: String,
    pub default_source: String,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub notice_lifetime_ms: u64,
    pub max_notices: usize,
    pub layout: LayoutConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            default_provider: "gemini".to_string(),
            default_source: "hysts".to_string(),
            page_size: 10,
            request_timeout_secs: 60,
            notice_lifetime_ms: 4000,
            max_notices: 5,
            layout: LayoutConfig::default(),
        }
    }
}

impl ClientConfig {
    /// `<config_dir>/paperscope/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("paperscope").join("config.yaml"))
    }

    /// Load defaults, then the file, then the environment.
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// used if present.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // An empty file is an empty mapping
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Override from environment variables, read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            self.api_base = base.trim().to_string();
        }
        if let Some(provider) = lookup(ENV_PROVIDER).filter(|v| !v.trim().is_empty()) {
            self.default_provider = provider.trim().to_string();
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "api_base",
                message: format!("'{}' is not an http(s) URL", self.api_base),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "page_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.layout.min_zoom <= 0.0 || self.layout.min_zoom > self.layout.max_zoom {
            return Err(ConfigError::Invalid {
                key: "layout.min_zoom",
                message: format!(
                    "zoom range [{}, {}] is empty",
                    self.layout.min_zoom, self.layout.max_zoom
                ),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notice_lifetime(&self) -> Duration {
        Duration::from_millis(self.notice_lifetime_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_overrides_defaults() {
        let file = write_config("api_base: https://research.example.org\npage_size: 25\nlayout:\n  link_distance: 60\n");
        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_base, "https://research.example.org");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.layout.link_distance, 60.0);
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("api_base: http://localhost:9000\npagesize: 5\n");
        let err = ClientConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn empty_file_is_defaults() {
        let file = write_config("\n");
        assert_eq!(ClientConfig::from_file(file.path()).unwrap(), ClientConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn environment_wins_over_file() {
        let file = write_config("api_base: http://file:8000\ndefault_provider: openai\n");
        let mut config = ClientConfig::from_file(file.path()).unwrap();
        config.apply_env(|key| match key {
            ENV_API_BASE => Some("http://env:8000".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base, "http://env:8000");
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn validation_catches_bad_values() {
        let config = ClientConfig {
            page_size: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { key: "page_size", .. })));

        let config = ClientConfig {
            api_base: "localhost:8000".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
