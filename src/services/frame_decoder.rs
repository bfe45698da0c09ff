/// Decoding of base64 frames sent by API clients
///
/// Accepts raw base64 or a data URL (`data:image/jpeg;base64,...`).

use base64ct::{Base64, Encoding};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameDecodeError {
    #[error("No image data provided")]
    Empty,
    #[error("Invalid base64 image data")]
    Base64(#[from] base64ct::Error),
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Strip an optional data-URL prefix and surrounding whitespace
fn payload(data: &str) -> &str {
    let data = data.trim();
    match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest.trim(),
        _ => data,
    }
}

pub fn decode_base64_bytes(data: &str) -> Result<Vec<u8>, FrameDecodeError> {
    let encoded = payload(data);
    if encoded.is_empty() {
        return Err(FrameDecodeError::Empty);
    }
    Ok(Base64::decode_vec(encoded)?)
}

pub fn decode_image(data: &str) -> Result<DynamicImage, FrameDecodeError> {
    let bytes = decode_base64_bytes(data)?;
    Ok(image::load_from_memory(&bytes)?)
}
