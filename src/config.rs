use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://picasaweb.google.com/data/feed/api";
pub const DEFAULT_PAGE_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can not read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(#[from] toml::de::Error),

    #[error("page_size must be positive")]
    ZeroPageSize,
}

/// Process-wide settings, loaded once at startup and handed to
/// [`GalleryClient::new`](crate::gallery_client::GalleryClient::new).
///
/// ```toml
/// default_user = "someone"
/// analytics = "UA-0000"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryConfig {
    pub default_user: String,
    #[serde(default)]
    pub analytics: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl GalleryConfig {
    pub fn new(default_user: impl Into<String>) -> Self {
        GalleryConfig {
            default_user: default_user.into(),
            analytics: None,
            base_url: default_base_url(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        raw.parse()
    }
}

impl FromStr for GalleryConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config: GalleryConfig = toml::from_str(s)?;
        if config.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        config.base_url = config.base_url.trim_end_matches('/').to_owned();
        Ok(config)
    }
}
