//! File Manager Transfer Client Library
//!
//! Client-side service layer for a REST-backed file manager: upload handshake
//! and byte transfer, file listing, and download resolution.
//! The bootstrap binary is in `src/main.rs`.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod notify;
pub mod services;
pub mod trigger;

pub use config::Config;
pub use error::{TransferServiceError, TriggerError};
pub use models::{FileRecord, LocalFile};
pub use notify::{Notifier, Severity};
pub use services::transfer::TransferService;
pub use trigger::DownloadTrigger;
