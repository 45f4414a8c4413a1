use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::sync::DEFAULT_PAGE_SIZE;
use crate::utils::parse_base_url;

pub const ENV_API_URL: &str = "CHATLINE_API_URL";
pub const ENV_API_TOKEN: &str = "CHATLINE_API_TOKEN";
pub const ENV_AUTHOR: &str = "CHATLINE_AUTHOR";
pub const ENV_PAGE_SIZE: &str = "CHATLINE_PAGE_SIZE";

const DEFAULT_AUTHOR: &str = "You";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {0}: set it in the environment or in chatline.toml")]
    Missing(&'static str),
    #[error("invalid base URL {0}")]
    InvalidUrl(String),
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("cannot parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

/// Optional on-disk settings, all of which the environment can override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub author: Option<String>,
    pub page_size: Option<usize>,
}

/// Validated settings the client starts with.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: Url,
    pub token: String,
    pub author: String,
    pub page_size: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("author", &self.author)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl AppConfig {
    /// `<config dir>/chatline.toml`, e.g. `~/.config/chatline.toml` on Linux.
    pub fn file_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("chatline.toml"))
    }

    /// Reads the config file. A missing file is not an error.
    pub fn read_file(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        toml::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Loads the file (if any) and overlays the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match Self::file_path() {
            Some(path) => Self::read_file(&path)?,
            None => None,
        };
        Self::from_sources(file.unwrap_or_default(), |key| std::env::var(key).ok())
    }

    /// Layers `env` over `file` and validates the result.
    pub fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let pick = |key: &str, fallback: Option<String>| {
            env(key).filter(|v| !v.trim().is_empty()).or(fallback.filter(|v| !v.trim().is_empty()))
        };

        let raw_url = pick(ENV_API_URL, file.base_url).ok_or(ConfigError::Missing(ENV_API_URL))?;
        let base_url = parse_base_url(&raw_url).map_err(ConfigError::InvalidUrl)?;
        let token = pick(ENV_API_TOKEN, file.token)
            .map(|t| t.trim().to_string())
            .ok_or(ConfigError::Missing(ENV_API_TOKEN))?;
        let author = pick(ENV_AUTHOR, file.author)
            .map(|a| a.trim().to_string())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        let page_size = match env(ENV_PAGE_SIZE).filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid { name: ENV_PAGE_SIZE, value: raw })?,
            None => match file.page_size {
                Some(0) => {
                    return Err(ConfigError::Invalid { name: "page_size", value: "0".into() });
                }
                Some(n) => n,
                None => DEFAULT_PAGE_SIZE,
            },
        };

        Ok(Self { base_url, token, author, page_size })
    }
}
