//! File Manager Client
//!
//! Bootstraps the transfer service (configuration, logging, notifications,
//! download directory) and runs a single command against the backend.

use anyhow::Context;
use file_manager_client::notify::ConsoleNotifier;
use file_manager_client::trigger::DirectoryDownloader;
use file_manager_client::{Config, FileRecord, LocalFile, TransferService};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "usage: file-manager-client <upload FILE | list | download PATH>";

/// One invocation of the client
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Upload(PathBuf),
    List,
    Download(String),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, String> {
        match args {
            [cmd, file] if cmd == "upload" => Ok(Command::Upload(PathBuf::from(file))),
            [cmd] if cmd == "list" => Ok(Command::List),
            [cmd, path] if cmd == "download" => Ok(Command::Download(path.clone())),
            _ => Err(USAGE.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing (stderr, so listings on stdout stay clean)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{}", usage);
            return Ok(ExitCode::from(2));
        }
    };

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config);

    let client = config
        .build_http_client()
        .context("Failed to build HTTP client")?;
    let downloader = Arc::new(DirectoryDownloader::new(
        client.clone(),
        config.download.dir.clone(),
    ));
    let service = TransferService::new(
        client,
        config.api.base_url.clone(),
        Arc::new(ConsoleNotifier),
        downloader.clone(),
    );

    match command {
        Command::Upload(path) => {
            let file = LocalFile::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let body = service.upload_file(&file).await?;
            if !body.is_empty() {
                println!("{}", body);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::List => match service.get_files().await {
            Some(files) => {
                for record in &files {
                    println!("{}", describe(record));
                }
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(ExitCode::FAILURE),
        },
        Command::Download(path) => {
            service.download_file(&path).await;
            downloader.wait_idle().await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One listing line; records without a name are printed as raw JSON
fn describe(record: &FileRecord) -> String {
    let Some(name) = record.name() else {
        return record.as_value().to_string();
    };

    let id = record
        .id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let created = record
        .created_at()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let path = record.path().unwrap_or("-");

    format!("{:>6}  {:<16}  {}  ({})", id, created, name, path)
}
