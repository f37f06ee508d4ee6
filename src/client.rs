//! Remote artifact client: the four server endpoints plus export links.
//!
//! [`ArtifactService`] is the seam the controller talks to;
//! [`HttpArtifactClient`] implements it over `reqwest`. Every call is a
//! single request with no retry: the controller's busy flags already make
//! each user action fire once, and a retried upload would create a second
//! artifact on the server.
//!
//! ## Response decoding
//!
//! The server answers JSON on both success and failure paths:
//!
//! | Body | Status | Result |
//! |------|--------|--------|
//! | `{"error": "…"}` (non-empty) | any | [`WorkflowError::Server`] |
//! | not JSON | non-2xx | [`WorkflowError::Server`] with `HTTP <status>` |
//! | not JSON, or required field missing | 2xx | [`WorkflowError::MalformedResponse`] |
//! | documented shape | 2xx | `Ok` |

use crate::config::WorkflowConfig;
use crate::error::{ValidationError, WorkflowError};
use crate::export::ExportKind;
use crate::media::input::ImageFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Server endpoint, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Upload,
    Capture,
    Convert,
    Cleanup,
    Image,
    Export,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Upload => "/upload",
            Endpoint::Capture => "/capture",
            Endpoint::Convert => "/convert",
            Endpoint::Cleanup => "/cleanup",
            Endpoint::Image => "/image",
            Endpoint::Export => "/export",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The remote operations the workflow depends on.
#[async_trait]
pub trait ArtifactService: Send + Sync {
    /// `POST /upload`: returns the server filename of the new artifact.
    async fn upload(&self, file: &ImageFile) -> Result<String, WorkflowError>;

    /// `POST /capture` with a JPEG data URI: returns the server filename.
    async fn capture_submit(&self, data_uri: &str) -> Result<String, WorkflowError>;

    /// `POST /convert`: returns the extracted text, possibly empty.
    async fn convert(&self, filename: &str) -> Result<String, WorkflowError>;

    /// `POST /cleanup`: deletes the server-side artifacts.
    async fn cleanup(&self) -> Result<(), WorkflowError>;

    /// `GET /image/{filename}`: raw image bytes.
    async fn fetch_image(&self, filename: &str) -> Result<Vec<u8>, WorkflowError>;

    /// Link to the served artifact. No network call.
    fn image_url(&self, filename: &str) -> Result<Url, WorkflowError>;

    /// Link to a server-rendered export. No network call.
    fn export_url(&self, kind: ExportKind, filename: &str) -> Result<Url, WorkflowError>;
}

/// Append path segments to `base`, percent-encoding each one.
///
/// ```rust
/// use imgtext::client::endpoint_url;
/// use reqwest::Url;
///
/// let base = Url::parse("http://localhost:5000/ocr/").unwrap();
/// let url = endpoint_url(&base, &["export", "pdf", "a b.png"]).unwrap();
/// assert_eq!(url.as_str(), "http://localhost:5000/ocr/export/pdf/a%20b.png");
/// ```
pub fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, WorkflowError> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            WorkflowError::InvalidConfig(format!("Server URL '{base}' cannot carry a path"))
        })?;
        path.pop_if_empty().extend(segments);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// JSON body shared by every endpoint; each reads the fields it documents.
#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct CaptureRequest<'a> {
    image: &'a str,
}

#[derive(Serialize)]
struct ConvertRequest<'a> {
    filename: &'a str,
}

/// [`ArtifactService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpArtifactClient {
    http: Client,
    base_url: Url,
    timeout_secs: Option<u64>,
}

impl HttpArtifactClient {
    pub fn new(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| WorkflowError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Download a server-rendered export with this client's timeout and
    /// user agent.
    pub async fn fetch_export(
        &self,
        kind: ExportKind,
        filename: &str,
    ) -> Result<Vec<u8>, WorkflowError> {
        let url = self.export_url(kind, filename)?;
        info!("Downloading {} export of {}", kind, filename);
        self.get_bytes(Endpoint::Export, url).await
    }

    /// `GET` a raw body. Error bodies are JSON and go through the shared
    /// decoding for the message.
    async fn get_bytes(&self, endpoint: Endpoint, url: Url) -> Result<Vec<u8>, WorkflowError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        if !response.status().is_success() {
            return match self.read_json(endpoint, response).await {
                Err(e) => Err(e),
                Ok(_) => Err(WorkflowError::MalformedResponse {
                    endpoint,
                    detail: "failure status with a success body".into(),
                }),
            };
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;
        Ok(bytes.to_vec())
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url, WorkflowError> {
        endpoint_url(&self.base_url, &[endpoint.path().trim_start_matches('/')])
    }

    fn transport_error(&self, endpoint: Endpoint, e: reqwest::Error) -> WorkflowError {
        match self.timeout_secs {
            Some(secs) if e.is_timeout() => WorkflowError::Timeout { endpoint, secs },
            _ => WorkflowError::Network {
                endpoint,
                reason: e.to_string(),
            },
        }
    }

    async fn read_json(
        &self,
        endpoint: Endpoint,
        response: Response,
    ) -> Result<ApiResponse, WorkflowError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;
        debug!("{} → HTTP {} ({} bytes)", endpoint, status, body.len());

        match serde_json::from_slice::<ApiResponse>(&body) {
            Ok(ApiResponse {
                error: Some(message),
                ..
            }) if !message.is_empty() => Err(WorkflowError::Server { endpoint, message }),
            Ok(parsed) if status.is_success() => Ok(parsed),
            Ok(_) => Err(WorkflowError::Server {
                endpoint,
                message: format!("HTTP {status}"),
            }),
            Err(_) if !status.is_success() => Err(WorkflowError::Server {
                endpoint,
                message: format!("HTTP {status}"),
            }),
            Err(e) => Err(WorkflowError::MalformedResponse {
                endpoint,
                detail: format!("body is not valid JSON: {e}"),
            }),
        }
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: &T,
    ) -> Result<ApiResponse, WorkflowError> {
        let response = self
            .http
            .post(self.url(endpoint)?)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;
        self.read_json(endpoint, response).await
    }
}

fn require_filename(endpoint: Endpoint, parsed: ApiResponse) -> Result<String, WorkflowError> {
    match parsed.filename {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(WorkflowError::MalformedResponse {
            endpoint,
            detail: "missing 'filename'".into(),
        }),
    }
}

#[async_trait]
impl ArtifactService for HttpArtifactClient {
    async fn upload(&self, file: &ImageFile) -> Result<String, WorkflowError> {
        let endpoint = Endpoint::Upload;
        info!("Uploading {} ({} bytes, {})", file.name(), file.len(), file.mime());

        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime())
            .map_err(|_| {
                WorkflowError::from(ValidationError::NotAnImage {
                    mime: file.mime().to_string(),
                })
            })?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.url(endpoint)?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let parsed = self.read_json(endpoint, response).await?;
        require_filename(endpoint, parsed)
    }

    async fn capture_submit(&self, data_uri: &str) -> Result<String, WorkflowError> {
        let endpoint = Endpoint::Capture;
        info!("Submitting captured frame ({} bytes)", data_uri.len());

        let parsed = self
            .post_json(endpoint, &CaptureRequest { image: data_uri })
            .await?;
        if parsed.success == Some(false) {
            return Err(WorkflowError::Server {
                endpoint,
                message: "capture was rejected".into(),
            });
        }
        require_filename(endpoint, parsed)
    }

    async fn convert(&self, filename: &str) -> Result<String, WorkflowError> {
        let endpoint = Endpoint::Convert;
        info!("Requesting text extraction for {}", filename);

        let parsed = self
            .post_json(endpoint, &ConvertRequest { filename })
            .await?;
        parsed.text.ok_or_else(|| WorkflowError::MalformedResponse {
            endpoint,
            detail: "missing 'text'".into(),
        })
    }

    async fn cleanup(&self) -> Result<(), WorkflowError> {
        let endpoint = Endpoint::Cleanup;
        info!("Requesting server cleanup");

        let response = self
            .http
            .post(self.url(endpoint)?)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let parsed = self.read_json(endpoint, response).await?;
        if parsed.success == Some(false) {
            return Err(WorkflowError::Server {
                endpoint,
                message: "cleanup reported failure".into(),
            });
        }
        Ok(())
    }

    async fn fetch_image(&self, filename: &str) -> Result<Vec<u8>, WorkflowError> {
        let bytes = self
            .get_bytes(Endpoint::Image, self.image_url(filename)?)
            .await?;
        debug!("Fetched {} ({} bytes)", filename, bytes.len());
        Ok(bytes)
    }

    fn image_url(&self, filename: &str) -> Result<Url, WorkflowError> {
        endpoint_url(&self.base_url, &["image", filename])
    }

    fn export_url(&self, kind: ExportKind, filename: &str) -> Result<Url, WorkflowError> {
        endpoint_url(&self.base_url, &["export", kind.as_str(), filename])
    }
}
