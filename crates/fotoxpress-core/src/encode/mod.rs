//! Photo encoding for the commit step.
//!
//! Edited photos are written back in the format of the original file
//! (JPEG with configurable quality, or PNG), chosen from the locator's
//! extension.
//!
//! # Examples
//!
//! ```ignore
//! use fotoxpress_core::encode::{encode_image, ImageFormat};
//!
//! let format = ImageFormat::from_path("/photos/IMG_0042.jpg");
//! let bytes = encode_image(&edited, format, 92)?;
//! ```

mod jpeg;
mod png;

pub use jpeg::encode_jpeg;
pub use png::encode_png;

use std::path::Path;

use thiserror::Error;

use crate::decode::DecodedImage;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match the dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec itself failed.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Output formats the commit step can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Pick the format from a file extension. Anything that is not PNG is
    /// written as JPEG.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => ImageFormat::Png,
            _ => ImageFormat::Jpeg,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

/// Encode a decoded photo in the given format.
///
/// `quality` only applies to JPEG and is clamped to 1-100.
pub fn encode_image(
    image: &DecodedImage,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    match format {
        ImageFormat::Jpeg => encode_jpeg(&image.pixels, image.width, image.height, quality),
        ImageFormat::Png => encode_png(&image.pixels, image.width, image.height),
    }
}

/// Shared buffer validation for both encoders.
pub(crate) fn validate_buffer(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}
