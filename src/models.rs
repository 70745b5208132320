//! Wire and domain types for the file backend
//!
//! Request bodies, server-issued tickets, and the opaque file record.

use crate::constants::FALLBACK_CONTENT_TYPE;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use std::path::Path;

/// Upload handshake body: the file's name and MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// File name as shown to users
    pub name: String,
    /// MIME content type
    #[serde(rename = "type")]
    pub content_type: String,
}

/// Server-issued, single-use target for the raw byte transfer
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTicket {
    /// Signed URL accepting one PUT
    pub upload_url: String,
}

/// Server-issued download location for one file path
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadTicket {
    /// Signed URL the download trigger fetches
    pub download_url: String,
}

/// A file entry as returned by the backend
///
/// The shape is server-defined and passed through untouched. The accessors
/// only read well-known fields and return `None` when a field is absent or
/// has an unexpected type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRecord(Value);

impl FileRecord {
    /// Wrap a raw JSON value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the record, returning the raw JSON value
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Server identifier (number or string, as sent)
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id").filter(|v| !v.is_null())
    }

    /// Display name
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Storage path, used as the download key
    pub fn path(&self) -> Option<&str> {
        self.str_field("path")
    }

    /// MIME type
    pub fn content_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    /// Creation timestamp, if present and RFC 3339
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.str_field("created_at")
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// Listing body: a bare array, or the `{ files, count }` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum FileListing {
    Records(Vec<FileRecord>),
    Envelope { files: Vec<FileRecord> },
}

impl FileListing {
    pub(crate) fn into_records(self) -> Vec<FileRecord> {
        match self {
            FileListing::Records(records) => records,
            FileListing::Envelope { files } => files,
        }
    }
}

/// A local file to upload: name, content type and raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// File name sent in the handshake
    pub name: String,
    /// MIME type sent in the handshake and as the PUT content type
    pub content_type: String,
    /// Raw content
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Create a file from in-memory content
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk
    ///
    /// The name is the path's file name; the content type is guessed from the
    /// extension and falls back to `application/octet-stream`.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Path has no usable file name: {}", path.display()),
                )
            })?
            .to_string();

        let content_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        let bytes = tokio::fs::read(path).await?;

        Ok(Self {
            name,
            content_type,
            bytes,
        })
    }

    /// Handshake body describing this file
    pub fn descriptor(&self) -> FileDescriptor {
        FileDescriptor {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
        }
    }
}
