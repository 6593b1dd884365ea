//! Floor plan image decoding.
//!
//! Uploaded files are sniffed by content (not by file name), decoded once to
//! prove they are readable, and embedded as a `data:` URL.

use base64::prelude::*;
use image::ImageFormat;
use thiserror::Error;

/// Errors raised when an uploaded floor plan cannot be used.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image file is empty")]
    Empty,

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Image could not be decoded: {0}")]
    Corrupt(#[from] image::ImageError),
}

/// A decoded floor plan ready to be displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorPlanImage {
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

fn mime_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Ico => Some("image/x-icon"),
        _ => None,
    }
}

/// Decode an uploaded image into an embeddable floor plan.
pub fn decode_floor_plan(bytes: &[u8]) -> Result<FloorPlanImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let format = image::guess_format(bytes).map_err(|_| DecodeError::UnsupportedFormat)?;
    let mime_type = mime_type(format).ok_or(DecodeError::UnsupportedFormat)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;

    Ok(FloorPlanImage {
        mime_type,
        width: decoded.width(),
        height: decoded.height(),
        data_url: format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(bytes)),
    })
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 10, 10]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}
