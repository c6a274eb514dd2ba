//! Photo decoding into RGB buffers.
//!
//! Photos arrive from the media store as encoded bytes (JPEG or PNG). This
//! module turns them into a [`DecodedImage`] with EXIF orientation already
//! applied, so the straighten edit always works on the photo as the user
//! sees it.
//!
//! # Examples
//!
//! ```ignore
//! use fotoxpress_core::decode::decode_image;
//!
//! let bytes = std::fs::read("IMG_0042.jpg")?;
//! let photo = decode_image(&bytes)?;
//! println!("Decoded {}x{} photo", photo.width, photo.height);
//! ```

mod reader;
mod types;

pub use reader::decode_image;
pub(crate) use types::Orientation;
pub use types::{DecodeError, DecodedImage};
