//! User-facing notifications.
//!
//! The store and the aggregation engine never render anything; they report outcomes
//! through a [`Notifier`] handle passed in by the caller. [`TracingNotifier`] is the
//! implementation used by the binary.

use std::fmt;
use tracing::{error, info, warn};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Title used when the caller does not supply one.
    #[must_use]
    pub const fn default_title(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_title())
    }
}

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    /// Presents `message` under `title`.
    fn notify(&self, severity: Severity, message: &str, title: &str);

    fn success(&self, message: &str) {
        self.notify(Severity::Success, message, Severity::Success.default_title());
    }

    fn error(&self, message: &str) {
        // An empty message still has to tell the user something went wrong
        let message = if message.is_empty() {
            "An error occurred"
        } else {
            message
        };
        self.notify(Severity::Error, message, Severity::Error.default_title());
    }

    fn warning(&self, message: &str) {
        self.notify(Severity::Warning, message, Severity::Warning.default_title());
    }

    fn info(&self, message: &str) {
        self.notify(Severity::Info, message, Severity::Info.default_title());
    }
}

/// Writes notifications to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str, title: &str) {
        match severity {
            Severity::Error => error!(target: "salesbook::notify", %title, "{message}"),
            Severity::Warning => warn!(target: "salesbook::notify", %title, "{message}"),
            Severity::Success | Severity::Info => {
                info!(target: "salesbook::notify", %title, %severity, "{message}");
            }
        }
    }
}
