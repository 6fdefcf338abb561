//! Turns whatever the browser uploaded into a PNG the model provider accepts.

use crate::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageFormat;
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

pub const CANONICAL_MIME_TYPE: &str = "image/png";

/// Normalised image payload handed to the model gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePart {
    /// Base64 (standard alphabet, padded) PNG bytes.
    pub data: String,
    pub mime_type: String,
}

impl ImagePart {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Removes a leading `data:<mime>;base64,` header, if any.
pub fn strip_data_url_prefix(input: &str) -> &str {
    let trimmed = input.trim_start();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some(idx) = rest.find(";base64,") {
            return &rest[idx + ";base64,".len()..];
        }
    }
    trimmed
}

/// Decodes a bare base64 string or data URL and re-encodes it as PNG.
///
/// Blocking: callers on the async runtime should go through `spawn_blocking`.
pub fn normalize(input: &str) -> Result<ImagePart> {
    let payload: String = strip_data_url_prefix(input)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = BASE64
        .decode(payload.as_bytes())
        .map_err(|e| Error::invalid_image(format!("image data is not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(Error::invalid_image("image data decoded to an empty buffer"));
    }

    let source_format = image::guess_format(&bytes).ok();
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| Error::invalid_image(format!("image could not be decoded: {}", e)))?;

    let mut png = Vec::with_capacity(bytes.len());
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| Error::internal(format!("PNG encoding failed: {}", e)))?;

    debug!(
        "Normalized {:?} image ({}x{}, {} bytes) to PNG ({} bytes)",
        source_format,
        decoded.width(),
        decoded.height(),
        bytes.len(),
        png.len()
    );

    Ok(ImagePart {
        data: BASE64.encode(&png),
        mime_type: CANONICAL_MIME_TYPE.to_string(),
    })
}
