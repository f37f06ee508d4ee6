//! Camera stream lifecycle.
//!
//! [`CameraManager`] is the sole owner of the live stream. Every path that
//! ends camera use (close button, outside click, finished capture, teardown)
//! goes through [`CameraManager::release`], which stops all tracks and is a
//! no-op when nothing is held. Dropping the manager releases as well.
//!
//! The device itself sits behind the [`CameraDevice`] trait so the platform
//! binding (a browser `getUserMedia` shim, a V4L2 capture, a test double) is
//! injected by the host.

use crate::error::{ValidationError, WorkflowError};
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolution hint passed to the device when the stream is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// A platform camera that can be asked for a live stream.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Request a stream. Suspends until the permission prompt resolves.
    ///
    /// Implementations report a refused prompt as
    /// [`WorkflowError::PermissionDenied`] and a missing or busy device as
    /// [`WorkflowError::DeviceUnavailable`].
    async fn open(&self, constraints: &VideoConstraints)
        -> Result<Box<dyn MediaStream>, WorkflowError>;
}

/// A live stream handed out by a [`CameraDevice`].
pub trait MediaStream: Send {
    /// Copy of the frame currently shown.
    fn current_frame(&self) -> Result<DynamicImage, WorkflowError>;

    /// Stop every track of the stream. Called exactly once per stream.
    fn stop_all_tracks(&mut self);
}

/// Exclusive owner of at most one live camera stream.
pub struct CameraManager {
    device: Arc<dyn CameraDevice>,
    constraints: VideoConstraints,
    stream: Option<Box<dyn MediaStream>>,
}

impl fmt::Debug for CameraManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraManager")
            .field("device", &"<dyn CameraDevice>")
            .field("constraints", &self.constraints)
            .field("active", &self.is_active())
            .finish()
    }
}

impl CameraManager {
    pub fn new(device: Arc<dyn CameraDevice>, constraints: VideoConstraints) -> Self {
        Self {
            device,
            constraints,
            stream: None,
        }
    }

    /// Open the camera unless a stream is already held.
    ///
    /// On failure nothing is held.
    pub async fn acquire(&mut self) -> Result<(), WorkflowError> {
        if self.stream.is_some() {
            debug!("Camera already active; reusing stream");
            return Ok(());
        }

        info!(
            "Requesting camera at {}x{}",
            self.constraints.ideal_width, self.constraints.ideal_height
        );
        let stream = self.device.open(&self.constraints).await?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop all tracks and drop the stream. Returns whether one was held.
    pub fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop_all_tracks();
                info!("Camera released");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Grab the frame currently on screen.
    pub fn snapshot(&self) -> Result<DynamicImage, WorkflowError> {
        match &self.stream {
            Some(stream) => stream.current_frame(),
            None => Err(ValidationError::CameraNotOpen.into()),
        }
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}
