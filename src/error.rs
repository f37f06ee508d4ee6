//! Error types for the imgtext library.
//!
//! Two layers reflect where a failure is caught:
//!
//! * [`ValidationError`]: **Local**: the requested action is not legal in
//!   the current state (wrong file type, nothing staged, nothing to export).
//!   These are detected before any request is built and never reach the
//!   network.
//!
//! * [`WorkflowError`]: everything an operation can fail with, including
//!   camera access, transport failures and errors reported by the server.
//!
//! The [`crate::controller::WorkflowController`] turns every error into a
//! notification at its boundary and still returns it, so a caller that
//! drives the workflow programmatically can branch on the outcome.

use crate::client::Endpoint;
use crate::controller::Action;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the imgtext library.
#[derive(Debug, Error)]
pub enum WorkflowError {
    // ── Local errors ──────────────────────────────────────────────────────
    /// The action was rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A request of the same kind is still in flight.
    #[error("{0} is already in progress")]
    Busy(Action),

    /// The response arrived after the session moved on and was dropped.
    #[error("{0} response was superseded by a newer session state")]
    Superseded(Action),

    // ── Camera errors ─────────────────────────────────────────────────────
    /// The platform refused camera access.
    #[error("Camera access was denied: {detail}")]
    PermissionDenied { detail: String },

    /// No usable camera exists, or it is held by another application.
    #[error("No camera available: {detail}")]
    DeviceUnavailable { detail: String },

    /// A captured frame could not be encoded for submission.
    #[error("Failed to encode captured frame: {0}")]
    Encode(String),

    // ── Local file errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The request never produced an HTTP response.
    #[error("Network error calling {endpoint}: {reason}")]
    Network { endpoint: Endpoint, reason: String },

    /// The configured request timeout elapsed.
    #[error("Request to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: Endpoint, secs: u64 },

    /// The server answered with an `error` field or a failure status.
    #[error("Server error from {endpoint}: {message}")]
    Server { endpoint: Endpoint, message: String },

    /// The server answered successfully but not with the documented body.
    #[error("Unexpected response from {endpoint}: {detail}")]
    MalformedResponse { endpoint: Endpoint, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WorkflowError {
    /// Whether the failure was caught locally, before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }

    /// Whether the failure came from the remote side of the boundary.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            WorkflowError::Network { .. }
                | WorkflowError::Timeout { .. }
                | WorkflowError::Server { .. }
                | WorkflowError::MalformedResponse { .. }
        )
    }
}

/// An action that is not legal in the current session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Only `image/*` content may be staged.
    #[error("Please select an image file (got '{mime}')")]
    NotAnImage { mime: String },

    #[error("The selected file '{name}' is empty")]
    EmptyFile { name: String },

    /// The server rejects request bodies above its content-length cap.
    #[error("'{name}' is {size} bytes; the limit is {limit} bytes")]
    TooLarge { name: String, size: usize, limit: usize },

    #[error("No file was dropped")]
    NoFileDropped,

    /// Convert requires an artifact on the server.
    #[error("Please upload or capture an image first")]
    NoArtifact,

    /// Export requires both an artifact and non-empty extracted text.
    #[error("Please extract text from an image before exporting")]
    NothingToExport,

    #[error("The camera is not open")]
    CameraNotOpen,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_converts_transparently() {
        let e: WorkflowError = ValidationError::NoArtifact.into();
        assert!(e.is_validation());
        assert!(!e.is_remote());
        assert_eq!(e.to_string(), ValidationError::NoArtifact.to_string());
    }

    #[test]
    fn server_error_display() {
        let e = WorkflowError::Server {
            endpoint: Endpoint::Capture,
            message: "bad frame".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/capture"), "got: {msg}");
        assert!(msg.contains("bad frame"), "got: {msg}");
        assert!(e.is_remote());
    }

    #[test]
    fn not_an_image_names_the_mime() {
        let e = ValidationError::NotAnImage {
            mime: "application/pdf".into(),
        };
        assert!(e.to_string().contains("application/pdf"));
    }

    #[test]
    fn busy_names_the_action() {
        let e = WorkflowError::Busy(Action::Convert);
        assert_eq!(e.to_string(), "convert is already in progress");
    }
}
