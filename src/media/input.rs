//! Input handling: turn a selected or dropped file into an [`ImageFile`].
//!
//! The MIME type decides whether a file may be staged at all. When the
//! caller knows it (a browser `File`, a drag-drop payload) it is used as
//! given; otherwise it is guessed from the file name. Validation happens
//! here, before any request is built, so a rejected file never reaches the
//! network and never touches the session.

use crate::error::{ValidationError, WorkflowError};
use std::path::Path;
use tracing::debug;

/// An image selected by the user, held in memory until it is uploaded.
#[derive(Debug, Clone)]
pub struct ImageFile {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl ImageFile {
    /// Build from raw bytes, guessing the MIME type from `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name).to_string();
        Self { name, mime, bytes }
    }

    /// Override the guessed MIME type with one reported by the source.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Read a local file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WorkflowError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                WorkflowError::FileUnreadable {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the MIME type is in the `image/*` family.
    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime)
    }
}

/// Check that `file` may be staged: an image, non-empty, within `max_bytes`.
pub fn validate_image(file: &ImageFile, max_bytes: usize) -> Result<(), ValidationError> {
    if !file.is_image() {
        return Err(ValidationError::NotAnImage {
            mime: file.mime.clone(),
        });
    }
    if file.is_empty() {
        return Err(ValidationError::EmptyFile {
            name: file.name.clone(),
        });
    }
    if file.len() > max_bytes {
        return Err(ValidationError::TooLarge {
            name: file.name.clone(),
            size: file.len(),
            limit: max_bytes,
        });
    }
    Ok(())
}

/// `image/<subtype>` that also parses as a media type, so it can label the
/// multipart upload part.
fn is_image_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or("").trim();
    essence.len() > "image/".len()
        && essence
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
        && mime.trim().parse::<mime_guess::Mime>().is_ok()
}

fn guess_mime(name: &str) -> &'static str {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
}
