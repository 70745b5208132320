//! Transfer service constants
//!
//! Endpoint paths and the fixed user-facing notification texts.

/// Default backend base URL
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Collection endpoint segment for files
pub const FILES_SEGMENT: &str = "files";

/// Shown after a successful byte transfer
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

/// Shown when the byte transfer to the upload URL fails
pub const UPLOAD_FAILURE_MESSAGE: &str = "Failed to upload the file";

/// Shown when the listing request fails
pub const LIST_FAILURE_MESSAGE: &str = "Failed to fetch files";

/// Shown when resolving or triggering a download fails
pub const DOWNLOAD_FAILURE_MESSAGE: &str = "Failed to download file";

/// Initialization error text when the server gives no `message`
pub const UPLOAD_INIT_FALLBACK_MESSAGE: &str = "Failed to initialize upload";

/// Content type used when none can be guessed
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
