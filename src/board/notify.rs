use std::fmt;
use std::sync::Mutex;

/// How loudly a notice should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "ok"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Receives user-facing notices. Fire-and-forget: the board never looks at
/// what happens to a notice after handing it over.
pub trait Notifier {
    fn notify(&self, message: &str, severity: Severity);
}

/// Emits notices as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => tracing::info!(%severity, "{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }
    }
}

/// Prints notices to stderr for the command-line front end
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    /// Suppress info/success lines (errors and warnings still print)
    pub quiet: bool,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        LogNotifier.notify(message, severity);
        match severity {
            Severity::Info | Severity::Success if self.quiet => {}
            Severity::Info | Severity::Success => eprintln!("{}", message),
            Severity::Warning | Severity::Error => eprintln!("{}: {}", severity, message),
        }
    }
}

/// Keeps every notice in memory, in arrival order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(String, Severity)> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// The most recent notice, if any
    pub fn last(&self) -> Option<(String, Severity)> {
        self.notices().pop()
    }

    pub fn clear(&self) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push((message.to_string(), severity));
        }
    }
}
