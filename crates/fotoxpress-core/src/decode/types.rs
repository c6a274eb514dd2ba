use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported photo format")]
    InvalidFormat,

    /// The photo is truncated or otherwise damaged.
    #[error("Damaged photo: {0}")]
    CorruptedFile(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

/// How the camera says a photo must be turned to appear upright.
///
/// Values mirror the EXIF `Orientation` tag; `Transpose` and `Transverse`
/// are the mirrored quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90CW,
    Transverse,
    Rotate270CW,
}

impl Orientation {
    /// Map an EXIF tag value. Missing or out-of-range values mean upright.
    pub fn from_exif(value: u32) -> Self {
        const TABLE: [Orientation; 8] = [
            Orientation::Normal,
            Orientation::FlipHorizontal,
            Orientation::Rotate180,
            Orientation::FlipVertical,
            Orientation::Transpose,
            Orientation::Rotate90CW,
            Orientation::Transverse,
            Orientation::Rotate270CW,
        ];
        value
            .checked_sub(1)
            .and_then(|i| TABLE.get(i as usize))
            .copied()
            .unwrap_or_default()
    }
}

/// An upright photo as packed RGB8, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "RGB buffer does not match {}x{}",
            width,
            height
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb_image(rgb: image::RgbImage) -> Self {
        let (width, height) = rgb.dimensions();
        Self::new(width, height, rgb.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_exif() {
        assert_eq!(Orientation::from_exif(1), Orientation::Normal);
        assert_eq!(Orientation::from_exif(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from_exif(8), Orientation::Rotate270CW);
        assert_eq!(Orientation::from_exif(0), Orientation::Normal);
        assert_eq!(Orientation::from_exif(9), Orientation::Normal);
    }

    #[test]
    fn test_from_rgb_image_keeps_layout() {
        let rgb = image::RgbImage::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let photo = DecodedImage::from_rgb_image(rgb);
        assert_eq!((photo.width, photo.height), (2, 1));
        assert_eq!(photo.pixels, vec![1, 2, 3, 4, 5, 6]);
    }
}
