//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::constants::DEFAULT_API_BASE_URL;
use crate::error::ConfigError;
use reqwest::Url;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Local download configuration
    pub download: DownloadConfig,
}

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the file backend
    pub base_url: Url,
    /// Request timeout in seconds; `None` keeps the HTTP client default
    pub timeout_secs: Option<u64>,
}

/// Local download configuration
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directory that triggered downloads are saved into
    pub dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables with defaults
    ///
    /// * `FILE_MANAGER_API_URL` - backend base URL (default `http://localhost:8000`)
    /// * `FILE_MANAGER_TIMEOUT_SECS` - request timeout, unset for none
    /// * `FILE_MANAGER_DOWNLOAD_DIR` - download directory (default `.`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("FILE_MANAGER_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let timeout_secs = match env::var("FILE_MANAGER_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_timeout(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            api: ApiConfig {
                base_url: parse_base_url(&base_url)?,
                timeout_secs,
            },
            download: DownloadConfig {
                dir: env::var_os("FILE_MANAGER_DOWNLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(".")),
            },
        })
    }

    /// Configuration pointing at the given backend, other values defaulted
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api: ApiConfig {
                base_url: parse_base_url(base_url)?,
                timeout_secs: None,
            },
            download: DownloadConfig {
                dir: PathBuf::from("."),
            },
        })
    }

    /// Build the shared HTTP client for this configuration
    pub fn build_http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.api.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

/// Parse and validate a backend base URL
///
/// The URL must be absolute, use http or https, and be able to carry path
/// segments.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidBaseUrl(format!("{raw} - {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }

    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
