//! Photo intake: sniffing, size and dimension limits, and data-URL encoding.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

use crate::document::models::Photo;
use crate::document::DocumentError;

/// Largest accepted width or height, in pixels.
pub const MAX_PHOTO_DIMENSION: u32 = 4096;

/// Builds a `Photo` from raw uploaded bytes, stored inline as a data URL.
///
/// The format is sniffed from the content rather than trusted from the
/// upload's declared type. Only PNG and JPEG are accepted since those are the
/// formats the exporter can embed.
pub fn photo_from_bytes(bytes: &[u8], max_bytes: usize) -> Result<Photo, DocumentError> {
    let (mime, width, height) = inspect(bytes, max_bytes)?;
    Ok(Photo {
        src: encode_data_url(mime, bytes),
        mime: mime.to_string(),
        width,
        height,
    })
}

/// Builds a `Photo` that keeps pointing at `url`, after checking the bytes
/// fetched from it the same way as an upload.
pub fn photo_from_remote(url: &str, bytes: &[u8], max_bytes: usize) -> Result<Photo, DocumentError> {
    let (mime, width, height) = inspect(bytes, max_bytes)?;
    Ok(Photo {
        src: url.to_string(),
        mime: mime.to_string(),
        width,
        height,
    })
}

fn inspect(bytes: &[u8], max_bytes: usize) -> Result<(&'static str, u32, u32), DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Photo("photo is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(DocumentError::Photo(format!(
            "photo is {} bytes, limit is {max_bytes}",
            bytes.len()
        )));
    }

    let format = image::guess_format(bytes)
        .map_err(|_| DocumentError::Photo("unrecognized image format".to_string()))?;
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        other => {
            return Err(DocumentError::Photo(format!(
                "unsupported image format {other:?}"
            )))
        }
    };

    let (width, height) = image::io::Reader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| DocumentError::Photo(format!("could not read image: {e}")))?;
    if width > MAX_PHOTO_DIMENSION || height > MAX_PHOTO_DIMENSION {
        return Err(DocumentError::Photo(format!(
            "photo is {width}x{height}, limit is {MAX_PHOTO_DIMENSION}x{MAX_PHOTO_DIMENSION}"
        )));
    }
    Ok((mime, width, height))
}

/// Builds a `Photo` from a `data:` URL, as sent by a browser file reader.
pub fn photo_from_data_url(data_url: &str, max_bytes: usize) -> Result<Photo, DocumentError> {
    let (_, bytes) = decode_data_url(data_url)?;
    photo_from_bytes(&bytes, max_bytes)
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Splits a base64 `data:` URL into its declared mime type and payload.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>), DocumentError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| DocumentError::Photo("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| DocumentError::Photo("data URL has no payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| DocumentError::Photo("data URL must be base64 encoded".to_string()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| DocumentError::Photo(format!("invalid base64 payload: {e}")))?;
    Ok((mime.to_string(), bytes))
}
