//! Encyclopedia API and cache location configuration.
//!
//! Values come from built-in defaults, then environment variables, then
//! whatever the caller overrides explicitly (the CLI maps its flags onto the
//! public fields).
//!
//! # Environment Variables
//!
//! - `SHIPSPEC_API_URL`: API base URL (default: [`DEFAULT_API_URL`])
//! - `SHIPSPEC_API_KEY`: application id sent with every request
//! - `SHIPSPEC_API_LANGUAGE`: response language (default: `en`)
//! - `SHIPSPEC_CACHE_DIR`: directory holding the cached JSON blobs

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::error::{Error, Result};

/// Default encyclopedia API base; endpoints are appended below it.
pub const DEFAULT_API_URL: &str = "https://api.worldofwarships.eu/wows";
/// Records requested per page.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
/// Minimum spacing between two requests (5 requests per second).
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(200);
/// Per-request deadline applied by the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_URL_ENV: &str = "SHIPSPEC_API_URL";
const API_KEY_ENV: &str = "SHIPSPEC_API_KEY";
const API_LANGUAGE_ENV: &str = "SHIPSPEC_API_LANGUAGE";
const CACHE_DIR_ENV: &str = "SHIPSPEC_CACHE_DIR";

/// Connection settings for the encyclopedia API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub application_id: Option<String>,
    pub language: String,
    pub page_limit: u32,
    pub request_timeout: Duration,
    pub cooldown: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            application_id: None,
            language: "en".to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl ApiConfig {
    /// Build a configuration from defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = non_empty_var(API_URL_ENV) {
            config.base_url = url;
        }
        config.application_id = non_empty_var(API_KEY_ENV);
        if let Some(language) = non_empty_var(API_LANGUAGE_ENV) {
            config.language = language;
        }
        config
    }

    /// The configured application id, or [`Error::MissingApiKey`].
    pub fn require_application_id(&self) -> Result<&str> {
        self.application_id
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingApiKey)
    }
}

/// Resolve the directory holding cached catalog blobs.
///
/// `SHIPSPEC_CACHE_DIR` wins over the platform cache directory.
pub fn default_cache_dir() -> Result<PathBuf> {
    if let Some(override_dir) = env::var_os(CACHE_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }

    let dirs =
        ProjectDirs::from("net", "shipspec", "shipspec").ok_or(Error::CacheDirsUnavailable)?;
    Ok(dirs.cache_dir().to_path_buf())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
