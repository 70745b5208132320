//! User-facing notifications
//!
//! The transfer service reports outcomes through a [`Notifier`] rather than a
//! global toast function, so callers choose where messages go.

use std::fmt;
use std::sync::Mutex;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Operation completed
    Success,
    /// Operation failed
    Danger,
}

impl Severity {
    /// Style name used by toast front ends
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Danger => "danger",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient, non-blocking message sink
pub trait Notifier: Send + Sync {
    /// Show `message` with the given severity
    fn notify(&self, message: &str, severity: Severity);
}

/// Prints notifications to stderr, one line each
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let marker = match severity {
            Severity::Success => "✓",
            Severity::Danger => "✗",
        };
        tracing::debug!(severity = %severity, "{}", message);
        eprintln!("{} {}", marker, message);
    }
}

/// A notification captured by [`MemoryNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Message text
    pub message: String,
    /// Severity
    pub severity: Severity,
}

/// Records notifications in memory, in emission order
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Forget recorded notifications
    pub fn clear(&self) {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Notification {
                message: message.to_string(),
                severity,
            });
    }
}
