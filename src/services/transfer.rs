//! File transfer service
//!
//! Uploads, lists and downloads files against the REST backend. Every
//! operation reports its outcome through the injected [`Notifier`].
//!
//! Error propagation differs per operation:
//! * `upload_file` returns errors to the caller (after notifying on transfer failure)
//! * `get_files` and `download_file` notify and swallow errors

use crate::config::Config;
use crate::constants::{
    DOWNLOAD_FAILURE_MESSAGE, FILES_SEGMENT, LIST_FAILURE_MESSAGE, UPLOAD_FAILURE_MESSAGE,
    UPLOAD_INIT_FALLBACK_MESSAGE, UPLOAD_SUCCESS_MESSAGE,
};
use crate::error::TransferServiceError;
use crate::models::{DownloadTicket, FileListing, FileRecord, LocalFile, UploadTicket};
use crate::notify::{Notifier, Severity};
use crate::trigger::DownloadTrigger;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Mediates all file movement between this client and the backend
pub struct TransferService {
    client: reqwest::Client,
    base_url: Url,
    notifier: Arc<dyn Notifier>,
    trigger: Arc<dyn DownloadTrigger>,
}

impl TransferService {
    /// Create a service using a shared HTTP client (connection pooling)
    pub fn new(
        client: reqwest::Client,
        base_url: Url,
        notifier: Arc<dyn Notifier>,
        trigger: Arc<dyn DownloadTrigger>,
    ) -> Self {
        Self {
            client,
            base_url,
            notifier,
            trigger,
        }
    }

    /// Create a service from configuration, building its own HTTP client
    pub fn from_config(
        config: &Config,
        notifier: Arc<dyn Notifier>,
        trigger: Arc<dyn DownloadTrigger>,
    ) -> reqwest::Result<Self> {
        Ok(Self::new(
            config.build_http_client()?,
            config.api.base_url.clone(),
            notifier,
            trigger,
        ))
    }

    /// Backend base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Upload a file: request an upload ticket, then PUT the bytes to it
    ///
    /// # Returns
    /// * `Ok(String)` - The transfer response body
    /// * `Err(TransferServiceError)` - If either step failed
    ///
    /// # Errors
    /// * `Initialization` if the handshake failed. Its message is the server's
    ///   `message` field when present. No notification is emitted.
    /// * `Transfer` if the PUT failed. A danger notification is emitted first.
    pub async fn upload_file(&self, file: &LocalFile) -> Result<String, TransferServiceError> {
        let span = info_span!(
            "upload_file",
            op_id = %Uuid::new_v4(),
            name = %file.name,
            content_type = %file.content_type,
        );

        async move {
            let ticket = self.initiate_upload(file).await?;
            self.transfer(file, ticket).await
        }
        .instrument(span)
        .await
    }

    /// Fetch the list of remote files
    ///
    /// Returns the records in server order. On failure a danger notification
    /// is emitted and `None` is returned, so `None` means "failed, state
    /// unknown" rather than "no files".
    pub async fn get_files(&self) -> Option<Vec<FileRecord>> {
        let span = info_span!("get_files", op_id = %Uuid::new_v4());

        async move {
            match self.fetch_listing().await {
                Ok(records) => {
                    tracing::debug!(count = records.len(), "Fetched file listing");
                    Some(records)
                }
                Err(e) => {
                    tracing::error!(error = %e, "File listing failed");
                    self.notifier.notify(LIST_FAILURE_MESSAGE, Severity::Danger);
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Resolve a download URL for `path` and hand it to the download trigger
    ///
    /// Fire-and-forget: completion of the actual download is not observed.
    /// Any failure emits a danger notification and is otherwise swallowed.
    pub async fn download_file(&self, path: &str) {
        let span = info_span!("download_file", op_id = %Uuid::new_v4(), path = %path);

        async move {
            if let Err(e) = self.resolve_and_trigger(path).await {
                tracing::error!(error = %e, "Download failed");
                self.notifier
                    .notify(DOWNLOAD_FAILURE_MESSAGE, Severity::Danger);
            }
        }
        .instrument(span)
        .await
    }

    async fn initiate_upload(&self, file: &LocalFile) -> Result<UploadTicket, TransferServiceError> {
        let url = self.endpoint(&[FILES_SEGMENT]).map_err(|e| {
            tracing::error!(error = %e, "Cannot build upload endpoint");
            init_error(None)
        })?;

        tracing::debug!(url = %url, "Requesting upload ticket");

        let response = self
            .client
            .post(url.clone())
            .json(&file.descriptor())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Upload initialization request failed");
                init_error(None)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();

            tracing::error!(
                status_code = status.as_u16(),
                error_body = %error_body,
                "Upload initialization rejected"
            );

            return Err(init_error(extract_error_message(&error_body)));
        }

        response.json::<UploadTicket>().await.map_err(|e| {
            tracing::error!(error = %e, "Upload ticket could not be decoded");
            init_error(None)
        })
    }

    // The ticket is taken by value: one ticket, one transfer attempt.
    async fn transfer(
        &self,
        file: &LocalFile,
        ticket: UploadTicket,
    ) -> Result<String, TransferServiceError> {
        match self.put_bytes(file, &ticket.upload_url).await {
            Ok(body) => {
                tracing::info!(bytes = file.bytes.len(), "File uploaded");
                self.notifier
                    .notify(UPLOAD_SUCCESS_MESSAGE, Severity::Success);
                Ok(body)
            }
            Err(e) => {
                tracing::error!(upload_url = %ticket.upload_url, error = %e, "File transfer failed");
                self.notifier
                    .notify(UPLOAD_FAILURE_MESSAGE, Severity::Danger);
                Err(e)
            }
        }
    }

    async fn put_bytes(&self, file: &LocalFile, upload_url: &str) -> Result<String, TransferServiceError> {
        let response = self
            .client
            .put(upload_url)
            .header(CONTENT_TYPE, file.content_type.as_str())
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(TransferServiceError::Transfer)?
            .error_for_status()
            .map_err(TransferServiceError::Transfer)?;

        response.text().await.map_err(TransferServiceError::Transfer)
    }

    async fn fetch_listing(&self) -> Result<Vec<FileRecord>, TransferServiceError> {
        let url = self.endpoint(&[FILES_SEGMENT])?;

        let listing: FileListing = self
            .client
            .get(url)
            .send()
            .await
            .map_err(TransferServiceError::List)?
            .error_for_status()
            .map_err(TransferServiceError::List)?
            .json()
            .await
            .map_err(TransferServiceError::List)?;

        Ok(listing.into_records())
    }

    async fn resolve_and_trigger(&self, path: &str) -> Result<(), TransferServiceError> {
        let url = self.endpoint(&[FILES_SEGMENT, path])?;

        tracing::debug!(url = %url, "Resolving download ticket");

        let ticket: DownloadTicket = self
            .client
            .get(url)
            .send()
            .await
            .map_err(TransferServiceError::DownloadResolution)?
            .error_for_status()
            .map_err(TransferServiceError::DownloadResolution)?
            .json()
            .await
            .map_err(TransferServiceError::DownloadResolution)?;

        // Relative tickets resolve against the backend; absolute ones pass through.
        let download_url = self.base_url.join(&ticket.download_url).map_err(|e| {
            TransferServiceError::InvalidUrl(format!("{} - {}", ticket.download_url, e))
        })?;

        self.trigger.trigger(&download_url)?;

        tracing::debug!(download_url = %download_url, "Download triggered");
        Ok(())
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransferServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransferServiceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn init_error(message: Option<String>) -> TransferServiceError {
    TransferServiceError::Initialization(
        message.unwrap_or_else(|| UPLOAD_INIT_FALLBACK_MESSAGE.to_string()),
    )
}

/// `message` field of a JSON error body, if any
fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
