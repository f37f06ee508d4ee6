//! Configuration types for the capture/convert/export workflow.
//!
//! All client behaviour is controlled through [`WorkflowConfig`], built via
//! its [`WorkflowConfigBuilder`]. The same config value is handed to the
//! HTTP client and to the controller so both agree on the server address,
//! limits and notification timing.

use crate::error::WorkflowError;
use crate::media::camera::VideoConstraints;
use reqwest::Url;
use std::time::Duration;

/// Largest request body the server accepts (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Configuration for a workflow session.
///
/// # Example
/// ```rust
/// use imgtext::WorkflowConfig;
///
/// let config = WorkflowConfig::builder()
///     .base_url("http://localhost:5000")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url.as_str(), "http://localhost:5000/");
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Root URL of the extraction server. Default: `http://127.0.0.1:5000/`.
    pub base_url: Url,

    /// Per-request timeout in seconds. Default: none.
    ///
    /// Without a timeout a hung request keeps its control busy until the
    /// connection settles.
    pub request_timeout_secs: Option<u64>,

    /// Resolution requested when opening the camera. Default: 1280×720.
    pub camera: VideoConstraints,

    /// JPEG quality (1–100) for captured frames. Default: 92.
    pub capture_jpeg_quality: u8,

    /// Files larger than this are rejected locally. Default: 16 MiB.
    pub max_upload_bytes: usize,

    /// How long notifications stay visible, in milliseconds. Default: 3000.
    ///
    /// `None` leaves dismissal to the user.
    pub notification_dismiss_ms: Option<u64>,

    /// Drop responses whose request started before the last artifact
    /// change or reset. Default: false (last response wins).
    pub discard_stale_responses: bool,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
            camera: VideoConstraints::default(),
            capture_jpeg_quality: 92,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            notification_dismiss_ms: Some(3000),
            discard_stale_responses: false,
            user_agent: concat!("imgtext/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("http://127.0.0.1:5000/").unwrap_or_else(|_| unreachable!("static URL parses"))
}

impl WorkflowConfig {
    /// Create a new builder for `WorkflowConfig`.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
            base_url: None,
        }
    }

    /// Auto-dismiss delay as a [`Duration`].
    pub fn notification_dismiss(&self) -> Option<Duration> {
        self.notification_dismiss_ms.map(Duration::from_millis)
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
    base_url: Option<String>,
}

impl WorkflowConfigBuilder {
    /// Server root, e.g. `http://localhost:5000` or `https://host/ocr/`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn camera(mut self, constraints: VideoConstraints) -> Self {
        self.config.camera = constraints;
        self
    }

    pub fn capture_jpeg_quality(mut self, quality: u8) -> Self {
        self.config.capture_jpeg_quality = quality;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn notification_dismiss_ms(mut self, ms: Option<u64>) -> Self {
        self.config.notification_dismiss_ms = ms;
        self
    }

    pub fn discard_stale_responses(mut self, v: bool) -> Self {
        self.config.discard_stale_responses = v;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<WorkflowConfig, WorkflowError> {
        if let Some(raw) = self.base_url.take() {
            self.config.base_url = parse_base_url(&raw)?;
        }

        let c = &self.config;
        if c.capture_jpeg_quality == 0 || c.capture_jpeg_quality > 100 {
            return Err(WorkflowError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.capture_jpeg_quality
            )));
        }
        if c.max_upload_bytes == 0 {
            return Err(WorkflowError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(WorkflowError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.camera.ideal_width == 0 || c.camera.ideal_height == 0 {
            return Err(WorkflowError::InvalidConfig(format!(
                "Camera resolution must be non-zero, got {}x{}",
                c.camera.ideal_width, c.camera.ideal_height
            )));
        }
        Ok(self.config)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, WorkflowError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| WorkflowError::InvalidConfig(format!("Invalid server URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(WorkflowError::InvalidConfig(format!(
            "Server URL must be http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() {
        return Err(WorkflowError::InvalidConfig(format!(
            "Server URL '{raw}' cannot carry a path"
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = WorkflowConfig::default();
        assert_eq!(c.base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(c.request_timeout_secs, None);
        assert_eq!(c.camera.ideal_width, 1280);
        assert_eq!(c.camera.ideal_height, 720);
        assert_eq!(c.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(c.notification_dismiss(), Some(Duration::from_secs(3)));
        assert!(!c.discard_stale_responses);
        assert!(c.user_agent.starts_with("imgtext/"));
    }

    #[test]
    fn builder_parses_base_url() {
        let c = WorkflowConfig::builder()
            .base_url("https://ocr.example.com/app/")
            .build()
            .unwrap();
        assert_eq!(c.base_url.as_str(), "https://ocr.example.com/app/");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = WorkflowConfig::builder()
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_garbage_url() {
        assert!(WorkflowConfig::builder().base_url("not a url").build().is_err());
    }

    #[test]
    fn rejects_out_of_range_quality() {
        assert!(WorkflowConfig::builder().capture_jpeg_quality(0).build().is_err());
        assert!(WorkflowConfig::builder().capture_jpeg_quality(101).build().is_err());
        assert!(WorkflowConfig::builder().capture_jpeg_quality(100).build().is_ok());
    }

    #[test]
    fn rejects_zero_timeout_and_limit() {
        assert!(WorkflowConfig::builder().request_timeout_secs(0).build().is_err());
        assert!(WorkflowConfig::builder().max_upload_bytes(0).build().is_err());
    }
}
