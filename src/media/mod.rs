//! Local media handling: everything that happens before a request is sent.
//!
//! ## Data Flow
//!
//! ```text
//! file / drop ──▶ input  ──┐
//!                          ├──▶ client (upload / capture)
//! camera ──▶ encode ───────┘
//! ```
//!
//! 1. [`input`] : read a local file, determine its MIME type and validate
//!    that it may be staged
//! 2. [`camera`]: own the live camera stream; the only place it is opened
//!    or stopped
//! 3. [`encode`]: JPEG-encode a camera frame and wrap it as a data URI for
//!    the capture endpoint

pub mod camera;
pub mod encode;
pub mod input;
