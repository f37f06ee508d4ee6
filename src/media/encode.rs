//! Frame encoding: `DynamicImage` → JPEG bytes → base64 data URI.
//!
//! The capture endpoint takes the snapshot as a `data:` URI in a JSON body
//! and strips everything up to the first comma before decoding. JPEG keeps
//! a 1280×720 frame well below the upload cap; PNG would not.

use crate::error::WorkflowError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use tracing::debug;

/// Prefix the capture endpoint expects in front of the base64 payload.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// MIME type of every encoded frame.
pub const JPEG_MIME: &str = "image/jpeg";

/// Encode a camera frame as JPEG bytes.
///
/// Alpha is dropped; JPEG has no transparency.
pub fn encode_frame_jpeg(frame: &DynamicImage, quality: u8) -> Result<Vec<u8>, WorkflowError> {
    let rgb = frame.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| WorkflowError::Encode(e.to_string()))?;

    debug!("Encoded {}x{} frame → {} bytes JPEG", width, height, buf.len());
    Ok(buf)
}

/// Wrap JPEG bytes as a `data:` URI.
pub fn jpeg_data_uri(jpeg: &[u8]) -> String {
    format!("{JPEG_DATA_URI_PREFIX}{}", STANDARD.encode(jpeg))
}
