//! Error types for the transfer client
//!
//! Upload errors are returned to callers. Listing and download errors are
//! only used internally: they are logged and turned into notifications.

use thiserror::Error;

/// Errors produced by [`crate::services::transfer::TransferService`]
#[derive(Error, Debug)]
pub enum TransferServiceError {
    /// The upload handshake failed
    ///
    /// Displays exactly the message extracted from the server's error body,
    /// or the generic fallback when none was present.
    #[error("{0}")]
    Initialization(String),

    /// The byte transfer to the upload URL failed
    #[error("File transfer failed: {0}")]
    Transfer(#[source] reqwest::Error),

    /// The listing request failed or returned an unexpected body
    #[error("Failed to list files: {0}")]
    List(#[source] reqwest::Error),

    /// Resolving a download ticket failed
    #[error("Failed to resolve download: {0}")]
    DownloadResolution(#[source] reqwest::Error),

    /// A URL could not be built or parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The download trigger rejected the resolved URL
    #[error("Download trigger failed: {0}")]
    Trigger(#[from] TriggerError),
}

/// Synchronous failures of a [`crate::trigger::DownloadTrigger`]
#[derive(Error, Debug)]
pub enum TriggerError {
    /// URL scheme is not one the trigger can fetch
    #[error("Unsupported download URL: {0}")]
    UnsupportedUrl(String),

    /// No file name could be derived from the URL
    #[error("Cannot derive a file name from URL: {0}")]
    NoFileName(String),

    /// Destination directory is missing or unusable
    #[error("Download destination unavailable: {0}")]
    Destination(#[from] std::io::Error),

    /// Destination path exists but is not a directory
    #[error("Download destination is not a directory: {0}")]
    NotADirectory(String),

    /// No async runtime is available to run the download
    #[error("No runtime available for download: {0}")]
    Runtime(String),
}

/// Invalid configuration values
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is not an absolute http(s) URL
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// Timeout is not a positive number of seconds
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}
