//! Presentation collaborator.
//!
//! The controller never touches widgets. After each transition it issues
//! "render state X" commands to an injected [`WorkflowView`]; a browser
//! binding maps them onto the DOM, the CLI maps them onto a spinner and
//! stderr, tests record them. All methods default to no-ops so a host only
//! overrides what it displays.

use crate::controller::Action;
use crate::export::{ExportKind, TextStats};
use reqwest::Url;

/// What the image panel should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview<'a> {
    /// Bytes read locally, shown before the upload finishes.
    Local { mime: &'a str, bytes: &'a [u8] },
    /// The artifact as served by `GET /image/{filename}`.
    Remote(&'a Url),
}

/// Render commands issued by the controller.
pub trait WorkflowView: Send + Sync {
    fn show_preview(&self, preview: Preview<'_>) {
        let _ = preview;
    }

    fn clear_preview(&self) {}

    /// Replace the text output area. An empty `text` clears it.
    fn show_text(&self, text: &str, stats: &TextStats) {
        let _ = (text, stats);
    }

    fn set_exports_enabled(&self, enabled: bool) {
        let _ = enabled;
    }

    /// Disable (`busy = true`) or re-enable the control that triggers `action`.
    fn set_busy(&self, action: Action, busy: bool) {
        let _ = (action, busy);
    }

    /// Show the camera modal with the live stream.
    fn show_camera(&self) {}

    fn hide_camera(&self) {}

    /// Open an export link in a new viewing context.
    fn open_export(&self, kind: ExportKind, url: &Url) {
        let _ = (kind, url);
    }
}

/// A view that renders nothing. Default for headless use.
pub struct NoopView;

impl WorkflowView for NoopView {}
