//! Notification sink for transient user-facing messages.
//!
//! The controller reports every outcome (success, warning, error) through an
//! injected [`Arc<dyn NotificationSink>`]. How a notification is shown (a
//! toast, a status line, a log record) is up to the host; the library only
//! fixes the contract: a message, a severity and an optional auto-dismiss
//! delay.
//!
//! # Example
//!
//! ```rust
//! use imgtext::{Notification, NotificationSink, Severity};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct StatusLine {
//!     last: Mutex<Option<String>>,
//! }
//!
//! impl NotificationSink for StatusLine {
//!     fn notify(&self, notification: &Notification) {
//!         *self.last.lock().unwrap() = Some(notification.message.clone());
//!     }
//! }
//!
//! let line = StatusLine::default();
//! line.notify(&Notification::new(Severity::Success, "Image uploaded", None));
//! assert_eq!(line.last.lock().unwrap().as_deref(), Some("Image uploaded"));
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A single transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    /// `None` keeps the message until the user dismisses it.
    pub auto_dismiss: Option<Duration>,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>, auto_dismiss: Option<Duration>) -> Self {
        Self {
            severity,
            message: message.into(),
            auto_dismiss,
        }
    }
}

/// Receives notifications from the workflow controller.
///
/// Implementations must be `Send + Sync`; the controller holds the sink in
/// an `Arc` and may be shared across tasks.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Default sink: forwards each notification to `tracing` at a level that
/// matches its severity.
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Success => tracing::info!(target: "imgtext::notify", "{}", notification.message),
            Severity::Warning => tracing::warn!(target: "imgtext::notify", "{}", notification.message),
            Severity::Error => tracing::error!(target: "imgtext::notify", "{}", notification.message),
        }
    }
}

/// Convenience alias matching the type held by the controller.
pub type SharedNotificationSink = Arc<dyn NotificationSink>;
