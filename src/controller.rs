//! Workflow controller: the session state machine.
//!
//! ## States
//!
//! ```text
//!            select / drop / capture ok
//!   Empty ──────────────────────────────▶ ImageStaged
//!     ▲                                     │   ▲
//!     │ clear (from any state)      convert │   │ convert → "" / new image
//!     │                                     ▼   │
//!     └──────────────────────────────── TextExtracted ──▶ export (no change)
//! ```
//!
//! The phase is never stored; it is derived from the [`Session`]. Every
//! user action maps to one async method on [`WorkflowController`]. Methods
//! take `&self` so a host can have several actions outstanding at once; the
//! session lock is only held between suspension points, never across one.
//!
//! ## Error policy
//!
//! Failures are turned into notifications here and also returned to the
//! caller. Two outcomes are returned without a notification:
//! [`WorkflowError::Busy`] (the control is already disabled) and
//! [`WorkflowError::Superseded`] (the response is obsolete).

use crate::client::ArtifactService;
use crate::config::WorkflowConfig;
use crate::error::{ValidationError, WorkflowError};
use crate::export::{ExportKind, TextStats};
use crate::media::camera::{CameraDevice, CameraManager};
use crate::media::encode::{encode_frame_jpeg, jpeg_data_uri, JPEG_MIME};
use crate::media::input::{validate_image, ImageFile};
use crate::notify::{Notification, Severity, SharedNotificationSink, TracingNotificationSink};
use crate::session::{Phase, Session};
use crate::view::{NoopView, Preview, WorkflowView};
use reqwest::Url;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// A user action backed by a remote call that must not overlap itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Upload,
    Convert,
    Capture,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Upload => "upload",
            Action::Convert => "convert",
            Action::Capture => "capture",
        })
    }
}

/// Which controls currently have a request in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusyFlags {
    pub upload: bool,
    pub convert: bool,
    pub capture: bool,
}

impl BusyFlags {
    pub fn is_busy(&self, action: Action) -> bool {
        *self.slot(action)
    }

    fn slot_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Upload => &mut self.upload,
            Action::Convert => &mut self.convert,
            Action::Capture => &mut self.capture,
        }
    }

    fn slot(&self, action: Action) -> &bool {
        match action {
            Action::Upload => &self.upload,
            Action::Convert => &self.convert,
            Action::Capture => &self.capture,
        }
    }
}

/// Point-in-time view of the controller for UI binding.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStatus {
    pub session: Session,
    pub phase: Phase,
    pub can_export: bool,
    pub busy: BusyFlags,
}

#[derive(Debug, Default)]
struct ControllerState {
    session: Session,
    busy: BusyFlags,
}

/// Clears a busy flag when the owning action finishes, on every path.
struct BusyGuard<'a> {
    controller: &'a WorkflowController,
    action: Action,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.controller.state().busy.slot_mut(self.action) = false;
        self.controller.view.set_busy(self.action, false);
    }
}

/// Coordinates user actions, remote calls and the camera for one session.
pub struct WorkflowController {
    config: WorkflowConfig,
    service: Arc<dyn ArtifactService>,
    sink: SharedNotificationSink,
    view: Arc<dyn WorkflowView>,
    state: Mutex<ControllerState>,
    camera: tokio::sync::Mutex<CameraManager>,
}

impl fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowController")
            .field("config", &self.config)
            .field("service", &"<dyn ArtifactService>")
            .field("sink", &"<dyn NotificationSink>")
            .field("view", &"<dyn WorkflowView>")
            .field("state", &*self.state())
            .finish()
    }
}

impl WorkflowController {
    /// Create a controller with an empty session, logging notifications
    /// through `tracing` and rendering nothing.
    pub fn new(
        config: WorkflowConfig,
        service: Arc<dyn ArtifactService>,
        camera: Arc<dyn CameraDevice>,
    ) -> Self {
        let camera = CameraManager::new(camera, config.camera);
        Self {
            config,
            service,
            sink: Arc::new(TracingNotificationSink),
            view: Arc::new(NoopView),
            state: Mutex::new(ControllerState::default()),
            camera: tokio::sync::Mutex::new(camera),
        }
    }

    pub fn with_notifications(mut self, sink: SharedNotificationSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_view(mut self, view: Arc<dyn WorkflowView>) -> Self {
        self.view = view;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // ── Observation ──────────────────────────────────────────────────────

    pub fn session(&self) -> Session {
        self.state().session.clone()
    }

    pub fn can_export(&self) -> bool {
        self.state().session.can_export()
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.state().busy.is_busy(action)
    }

    pub fn status(&self) -> WorkflowStatus {
        let st = self.state();
        WorkflowStatus {
            session: st.session.clone(),
            phase: st.session.phase(),
            can_export: st.session.can_export(),
            busy: st.busy,
        }
    }

    pub async fn is_camera_open(&self) -> bool {
        self.camera.lock().await.is_active()
    }

    // ── Image acquisition ────────────────────────────────────────────────

    /// Stage a selected file: validate, preview locally, upload.
    ///
    /// Returns the server filename. On upload failure the preview goes back
    /// to whatever artifact was staged before, or is cleared.
    pub async fn select_file(&self, file: ImageFile) -> Result<String, WorkflowError> {
        if let Err(e) = validate_image(&file, self.config.max_upload_bytes) {
            return Err(self.fail(e.into()));
        }

        let _busy = self.begin(Action::Upload)?;
        self.view.show_preview(Preview::Local {
            mime: file.mime(),
            bytes: file.bytes(),
        });

        let generation = self.state().session.generation();
        match self.service.upload(&file).await {
            Ok(filename) => {
                self.stage_artifact(Action::Upload, generation, &filename)?;
                self.notify(Severity::Success, "Image uploaded successfully");
                Ok(filename)
            }
            Err(e) => {
                self.restore_preview();
                Err(self.fail(e))
            }
        }
    }

    /// Stage the first of a set of dropped files.
    pub async fn drop_files(&self, files: Vec<ImageFile>) -> Result<String, WorkflowError> {
        match files.into_iter().next() {
            Some(file) => self.select_file(file).await,
            None => Err(self.fail(ValidationError::NoFileDropped.into())),
        }
    }

    // ── Camera ───────────────────────────────────────────────────────────

    /// Open the camera and show the live preview.
    pub async fn open_camera(&self) -> Result<(), WorkflowError> {
        let result = self.camera.lock().await.acquire().await;
        match result {
            Ok(()) => {
                self.view.show_camera();
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Close the camera modal: close button, outside click or unload.
    pub async fn close_camera(&self) {
        self.camera.lock().await.release();
        self.view.hide_camera();
    }

    /// Snapshot the live frame, submit it and close the camera.
    ///
    /// The camera is closed whether or not the submission succeeds.
    pub async fn capture(&self) -> Result<String, WorkflowError> {
        let _busy = self.begin(Action::Capture)?;
        let generation = self.state().session.generation();

        let submitted = self.snapshot_and_submit().await;
        self.close_camera().await;

        match submitted {
            Ok(filename) => {
                self.stage_artifact(Action::Capture, generation, &filename)?;
                self.notify(Severity::Success, "Image captured successfully");
                Ok(filename)
            }
            Err(e) => {
                self.restore_preview();
                Err(self.fail(e))
            }
        }
    }

    /// Encode the live frame, preview it locally, then submit it.
    async fn snapshot_and_submit(&self) -> Result<String, WorkflowError> {
        let frame = self.camera.lock().await.snapshot()?;
        let jpeg = encode_frame_jpeg(&frame, self.config.capture_jpeg_quality)?;
        self.view.show_preview(Preview::Local {
            mime: JPEG_MIME,
            bytes: &jpeg,
        });
        self.service.capture_submit(&jpeg_data_uri(&jpeg)).await
    }

    // ── Extraction and export ────────────────────────────────────────────

    /// Extract text from the staged artifact.
    ///
    /// An empty result is a success: exports stay disabled and a warning is
    /// shown. Re-running replaces the previous text.
    pub async fn convert(&self) -> Result<String, WorkflowError> {
        let filename = self.state().session.current_filename().map(str::to_owned);
        let Some(filename) = filename else {
            return Err(self.fail(ValidationError::NoArtifact.into()));
        };

        let _busy = self.begin(Action::Convert)?;
        let generation = self.state().session.generation();

        let text = match self.service.convert(&filename).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(e)),
        };

        let can_export = {
            let mut st = self.state();
            if self.is_stale(&st, generation) {
                debug!("Dropping extraction for {} (session moved on)", filename);
                return Err(WorkflowError::Superseded(Action::Convert));
            }
            st.session.set_extracted_text(text.clone());
            st.session.can_export()
        };

        self.view.show_text(&text, &TextStats::from_text(&text));
        self.view.set_exports_enabled(can_export);
        if text.is_empty() {
            self.notify(Severity::Warning, "No text detected in the image");
        } else {
            info!("Extracted {} characters from {}", text.chars().count(), filename);
            self.notify(Severity::Success, "Text extracted successfully");
        }
        Ok(text)
    }

    /// Open the export link for `kind`. Leaves the session unchanged.
    pub fn export(&self, kind: ExportKind) -> Result<Url, WorkflowError> {
        let filename = {
            let st = self.state();
            st.session
                .current_filename()
                .filter(|_| st.session.can_export())
                .map(str::to_owned)
        };
        let Some(filename) = filename else {
            return Err(self.fail(ValidationError::NothingToExport.into()));
        };

        let url = self
            .service
            .export_url(kind, &filename)
            .map_err(|e| self.fail(e))?;
        info!("Opening {} export: {}", kind, url);
        self.view.open_export(kind, &url);
        Ok(url)
    }

    // ── Reset ────────────────────────────────────────────────────────────

    /// Reset the session and ask the server to drop its artifacts.
    ///
    /// The local reset always happens. A failed cleanup is only logged and
    /// mentioned in the (success-toned) notification.
    pub async fn clear(&self) {
        self.state().session.reset();
        self.view.clear_preview();
        self.view.show_text("", &TextStats::from_text(""));
        self.view.set_exports_enabled(false);

        match self.service.cleanup().await {
            Ok(()) => self.notify(Severity::Success, "All cleared"),
            Err(e) => {
                warn!("Server cleanup failed: {}", e);
                self.notify(Severity::Success, "Cleared (server files could not be removed)");
            }
        }
    }

    /// Page teardown: release the camera and forget the session.
    pub async fn teardown(&self) {
        self.close_camera().await;
        self.state().session.reset();
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, action: Action) -> Result<BusyGuard<'_>, WorkflowError> {
        {
            let mut st = self.state();
            let slot = st.busy.slot_mut(action);
            if *slot {
                debug!("Ignoring {}: already in flight", action);
                return Err(WorkflowError::Busy(action));
            }
            *slot = true;
        }
        self.view.set_busy(action, true);
        Ok(BusyGuard {
            controller: self,
            action,
        })
    }

    fn is_stale(&self, st: &ControllerState, generation: u64) -> bool {
        self.config.discard_stale_responses && st.session.generation() != generation
    }

    /// Apply a newly created server artifact and render it.
    fn stage_artifact(
        &self,
        action: Action,
        generation: u64,
        filename: &str,
    ) -> Result<(), WorkflowError> {
        {
            let mut st = self.state();
            if self.is_stale(&st, generation) {
                debug!("Dropping {} result {} (session moved on)", action, filename);
                return Err(WorkflowError::Superseded(action));
            }
            st.session.set_artifact(filename);
        }
        info!("Staged artifact {}", filename);

        match self.service.image_url(filename) {
            Ok(url) => self.view.show_preview(Preview::Remote(&url)),
            Err(e) => warn!("No preview URL for {}: {}", filename, e),
        }
        self.view.show_text("", &TextStats::from_text(""));
        self.view.set_exports_enabled(false);
        Ok(())
    }

    /// Put the preview back in line with the session after a failed upload.
    fn restore_preview(&self) {
        let current = self.state().session.current_filename().map(str::to_owned);
        match current.map(|f| self.service.image_url(&f)) {
            Some(Ok(url)) => self.view.show_preview(Preview::Remote(&url)),
            _ => self.view.clear_preview(),
        }
    }

    fn notify(&self, severity: Severity, message: impl Into<String>) {
        self.sink.notify(&Notification::new(
            severity,
            message,
            self.config.notification_dismiss(),
        ));
    }

    /// Report `e` to the user and hand it back for returning.
    fn fail(&self, e: WorkflowError) -> WorkflowError {
        match e {
            WorkflowError::Busy(_) | WorkflowError::Superseded(_) => {}
            ref other => {
                if other.is_validation() {
                    debug!("Rejected: {}", other);
                } else {
                    warn!("{}", other);
                }
                self.notify(Severity::Error, other.to_string());
            }
        }
        e
    }
}
