//! Download triggers
//!
//! A [`DownloadTrigger`] starts saving a file from a resolved URL and returns
//! immediately. Only failures detected before the save starts are reported;
//! the eventual outcome of the save is not.

use crate::error::TriggerError;
use anyhow::Context;
use percent_encoding::percent_decode_str;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinSet;

/// Fire-and-forget "save the file at this URL" capability
pub trait DownloadTrigger: Send + Sync {
    /// Start saving the file behind `url`
    fn trigger(&self, url: &Url) -> Result<(), TriggerError>;
}

/// Saves triggered downloads into a local directory
///
/// Each trigger spawns a background fetch on the current tokio runtime.
/// Call [`DirectoryDownloader::wait_idle`] before shutting down to let pending
/// saves finish.
pub struct DirectoryDownloader {
    client: reqwest::Client,
    dir: PathBuf,
    pending: Mutex<JoinSet<()>>,
}

impl DirectoryDownloader {
    /// Create a downloader writing into `dir`
    ///
    /// The directory is created on first use if it does not exist.
    pub fn new(client: reqwest::Client, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dir: dir.into(),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Destination directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait until every download started so far has finished
    pub async fn wait_idle(&self) {
        let mut pending = {
            let mut guard = self
                .pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *guard)
        };

        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Download task did not complete");
            }
        }
    }

    fn prepare_dir(&self) -> Result<(), TriggerError> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(TriggerError::NotADirectory(
                self.dir.display().to_string(),
            ));
        }
        // Blocking, but a single mkdir on a synchronous trigger path.
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Number of spawned downloads not yet reaped
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Join every finished download so the set only holds running ones
fn reap_finished(pending: &mut JoinSet<()>) {
    while let Some(joined) = pending.try_join_next() {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Download task did not complete");
        }
    }
}

impl DownloadTrigger for DirectoryDownloader {
    fn trigger(&self, url: &Url) -> Result<(), TriggerError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TriggerError::UnsupportedUrl(url.to_string()));
        }

        let file_name = file_name_from_url(url)?;
        self.prepare_dir()?;

        let handle = Handle::try_current()
            .map_err(|e| TriggerError::Runtime(e.to_string()))?;

        let target = self.dir.join(&file_name);
        let client = self.client.clone();
        let url = url.clone();

        tracing::debug!(url = %url, target = %target.display(), "Starting download");

        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        reap_finished(&mut pending);
        pending.spawn_on(
            async move {
                match fetch_to_file(&client, &url, &target).await {
                    Ok(len) => tracing::info!(
                        target = %target.display(),
                        bytes = len,
                        "Download saved"
                    ),
                    Err(e) => tracing::error!(
                        url = %url,
                        error = %format!("{:#}", e),
                        "Download failed"
                    ),
                }
            },
            &handle,
        );

        Ok(())
    }
}

async fn fetch_to_file(client: &reqwest::Client, url: &Url, target: &Path) -> anyhow::Result<usize> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .context("request failed")?
        .error_for_status()
        .context("server rejected download")?;

    let body = response.bytes().await.context("failed to read body")?;

    tokio::fs::write(target, &body)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;

    Ok(body.len())
}

/// Last non-empty path segment of `url`, percent-decoded, used as the saved file name
///
/// Names that could leave the destination directory after decoding are rejected.
pub fn file_name_from_url(url: &Url) -> Result<String, TriggerError> {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .filter(|name| {
            !name.is_empty()
                && name != "."
                && name != ".."
                && !name.contains(['/', '\\'])
        })
        .ok_or_else(|| TriggerError::NoFileName(url.to_string()))
}

/// Records triggered URLs without fetching anything
#[derive(Debug, Default)]
pub struct RecordingTrigger {
    urls: Mutex<Vec<Url>>,
    reject: bool,
}

impl RecordingTrigger {
    /// A trigger that accepts every URL
    pub fn new() -> Self {
        Self::default()
    }

    /// A trigger that records, then rejects every URL
    pub fn rejecting() -> Self {
        Self {
            urls: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    /// URLs triggered so far, in order
    pub fn urls(&self) -> Vec<Url> {
        self.urls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl DownloadTrigger for RecordingTrigger {
    fn trigger(&self, url: &Url) -> Result<(), TriggerError> {
        self.urls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.clone());

        if self.reject {
            return Err(TriggerError::UnsupportedUrl(url.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_file_name_from_url() {
        let url = Url::parse("http://localhost:4566/bucket/abc_report.pdf?X-Amz-Signature=1").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "abc_report.pdf");

        let trailing = Url::parse("http://localhost/download/dummyFile.txt/").unwrap();
        assert_eq!(file_name_from_url(&trailing).unwrap(), "dummyFile.txt");
    }

    #[test]
    fn test_file_name_from_url_decodes_segment() {
        let url = Url::parse("http://localhost:4566/bucket/abc_my report.txt").unwrap();
        assert_eq!(url.path(), "/bucket/abc_my%20report.txt");
        assert_eq!(file_name_from_url(&url).unwrap(), "abc_my report.txt");

        let unicode = Url::parse("http://localhost:4566/bucket/abc_r%C3%A9sum%C3%A9.pdf").unwrap();
        assert_eq!(file_name_from_url(&unicode).unwrap(), "abc_résumé.pdf");
    }

    #[test]
    fn test_file_name_from_url_rejects_escaping_names() {
        for raw in [
            "http://localhost/bucket/..%2Fsecret.txt",
            "http://localhost/bucket/a%5Cb.txt",
            "http://localhost/bucket/%2E%2E",
        ] {
            let url = Url::parse(raw).unwrap();
            assert!(
                matches!(file_name_from_url(&url), Err(TriggerError::NoFileName(_))),
                "Expected NoFileName for {}",
                raw
            );
        }
    }

    #[test]
    fn test_file_name_from_url_without_path() {
        let url = Url::parse("http://localhost:8000/").unwrap();
        assert!(matches!(
            file_name_from_url(&url),
            Err(TriggerError::NoFileName(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_downloader_saves_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/download/dummyFile.txt")
            .with_status(200)
            .with_body("file contents")
            .create_async()
            .await;

        let temp_dir = tempdir().expect("Failed to create temp dir");
        let downloader = DirectoryDownloader::new(reqwest::Client::new(), temp_dir.path());
        let url = Url::parse(&format!("{}/download/dummyFile.txt", server.url())).unwrap();

        downloader.trigger(&url).expect("trigger should start the download");
        downloader.wait_idle().await;

        mock.assert_async().await;
        let saved = std::fs::read_to_string(temp_dir.path().join("dummyFile.txt"))
            .expect("downloaded file should exist");
        assert_eq!(saved, "file contents");
    }

    #[tokio::test]
    async fn test_directory_downloader_saves_decoded_name() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/bucket/abc_my".to_string()))
            .with_status(200)
            .with_body("spaced")
            .create_async()
            .await;

        let temp_dir = tempdir().expect("Failed to create temp dir");
        let downloader = DirectoryDownloader::new(reqwest::Client::new(), temp_dir.path());
        let url = Url::parse(&format!("{}/bucket/abc_my report.txt", server.url())).unwrap();

        downloader.trigger(&url).expect("trigger should start the download");
        downloader.wait_idle().await;

        let saved = std::fs::read_to_string(temp_dir.path().join("abc_my report.txt"))
            .expect("file should be saved under its decoded name");
        assert_eq!(saved, "spaced");
    }

    #[tokio::test]
    async fn test_directory_downloader_reaps_finished_downloads() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/download/".to_string()))
            .with_status(200)
            .with_body("x")
            .create_async()
            .await;

        let temp_dir = tempdir().expect("Failed to create temp dir");
        let downloader = DirectoryDownloader::new(reqwest::Client::new(), temp_dir.path());

        for i in 0..20 {
            let url = Url::parse(&format!("{}/download/file{}.txt", server.url(), i)).unwrap();
            downloader.trigger(&url).expect("trigger should start the download");
        }

        tokio::time::timeout(Duration::from_secs(10), async {
            while (0..20).any(|i| !temp_dir.path().join(format!("file{}.txt", i)).exists()) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("downloads should finish");
        // Let the tasks return after their final write
        tokio::time::sleep(Duration::from_millis(200)).await;

        let url = Url::parse(&format!("{}/download/last.txt", server.url())).unwrap();
        downloader.trigger(&url).expect("trigger should start the download");

        assert_eq!(downloader.pending_count(), 1);
        downloader.wait_idle().await;
        assert_eq!(downloader.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_directory_downloader_creates_missing_dir() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/a.bin")
            .with_status(200)
            .with_body("x")
            .create_async()
            .await;

        let temp_dir = tempdir().expect("Failed to create temp dir");
        let nested = temp_dir.path().join("nested").join("downloads");
        let downloader = DirectoryDownloader::new(reqwest::Client::new(), &nested);
        let url = Url::parse(&format!("{}/a.bin", server.url())).unwrap();

        downloader.trigger(&url).expect("trigger should start the download");
        downloader.wait_idle().await;

        assert!(nested.join("a.bin").exists());
    }

    #[tokio::test]
    async fn test_directory_downloader_server_error_writes_nothing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.txt")
            .with_status(404)
            .create_async()
            .await;

        let temp_dir = tempdir().expect("Failed to create temp dir");
        let downloader = DirectoryDownloader::new(reqwest::Client::new(), temp_dir.path());
        let url = Url::parse(&format!("{}/missing.txt", server.url())).unwrap();

        // Failure happens in the background, the trigger itself succeeds
        assert!(downloader.trigger(&url).is_ok());
        downloader.wait_idle().await;

        assert!(!temp_dir.path().join("missing.txt").exists());
    }

    #[tokio::test]
    async fn test_directory_downloader_rejects_file_destination() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("not_a_dir");
        std::fs::write(&file_path, "content").expect("Failed to create file");

        let downloader = DirectoryDownloader::new(reqwest::Client::new(), &file_path);
        let url = Url::parse("http://localhost:8000/download/a.txt").unwrap();

        match downloader.trigger(&url) {
            Err(TriggerError::NotADirectory(_)) => {}
            other => panic!("Expected NotADirectory error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_directory_downloader_rejects_non_http() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let downloader = DirectoryDownloader::new(reqwest::Client::new(), temp_dir.path());
        let url = Url::parse("file:///etc/passwd").unwrap();

        assert!(matches!(
            downloader.trigger(&url),
            Err(TriggerError::UnsupportedUrl(_))
        ));
    }

    #[test]
    fn test_recording_trigger() {
        let trigger = RecordingTrigger::rejecting();
        let url = Url::parse("http://localhost/x.txt").unwrap();
        assert!(trigger.trigger(&url).is_err());
        assert_eq!(trigger.urls(), vec![url]);
    }
}
