//! # imgtext
//!
//! Client-side workflow controller for an image-to-text service: stage an
//! image (file, drag-drop or camera), have the server extract its text, and
//! open server-rendered PDF/JSON/XML exports.
//!
//! ## Why a controller crate?
//!
//! The interesting part of such a tool is not the widgets but the rules
//! between them: which actions are legal in which state, what happens when
//! a response arrives after the user moved on, and how the camera stream and
//! the server-side artifact stay consistent with what is on screen. This
//! crate holds those rules in one place, free of any UI toolkit, so they can
//! be unit-tested deterministically and bound to any front end.
//!
//! ## Flow
//!
//! ```text
//! user action
//!  │
//!  ├─ 1. Controller  check the action is legal, mark its control busy
//!  ├─ 2. Media       read / validate the file, or snapshot the camera
//!  ├─ 3. Client      upload · capture · convert · cleanup (async)
//!  ├─ 4. Session     apply the response (new artifact clears old text)
//!  └─ 5. View/Sink   render commands + a transient notification
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgtext::{HttpArtifactClient, ImageFile, WorkflowConfig, WorkflowController};
//! # use imgtext::{CameraDevice, MediaStream, VideoConstraints, WorkflowError};
//! # use std::sync::Arc;
//! # struct NoCamera;
//! # #[async_trait::async_trait]
//! # impl CameraDevice for NoCamera {
//! #     async fn open(&self, _: &VideoConstraints) -> Result<Box<dyn MediaStream>, WorkflowError> {
//! #         Err(WorkflowError::DeviceUnavailable { detail: "none".into() })
//! #     }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkflowConfig::builder()
//!         .base_url("http://localhost:5000")
//!         .build()?;
//!     let client = Arc::new(HttpArtifactClient::new(&config)?);
//!     let controller = WorkflowController::new(config, client, Arc::new(NoCamera));
//!
//!     controller.select_file(ImageFile::from_path("receipt.png").await?).await?;
//!     let text = controller.convert().await?;
//!     println!("{text}");
//!     controller.clear().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `imgtext` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod media;
pub mod notify;
pub mod session;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{ArtifactService, Endpoint, HttpArtifactClient};
pub use config::{WorkflowConfig, WorkflowConfigBuilder};
pub use controller::{Action, BusyFlags, WorkflowController, WorkflowStatus};
pub use error::{ValidationError, WorkflowError};
pub use export::{ExportKind, TextStats};
pub use media::camera::{CameraDevice, CameraManager, MediaStream, VideoConstraints};
pub use media::input::ImageFile;
pub use notify::{
    Notification, NotificationSink, Severity, SharedNotificationSink, TracingNotificationSink,
};
pub use reqwest::Url;
pub use session::{Phase, Session};
pub use view::{NoopView, Preview, WorkflowView};
