//! Straighten edit with bilinear and Lanczos3 resampling.
//!
//! The edit rotates the photo around its centre, zooms it by the auto-crop
//! scale (times an optional user zoom) and renders the result back into a
//! canvas of the original size.
//!
//! # Algorithm
//!
//! Inverse mapping: for each output pixel we undo the zoom, rotate by -θ and
//! sample the source there.
//!
//! ```text
//! dx = dst_x + 0.5 - cx          dy = dst_y + 0.5 - cy
//! src_x = ( dx * cos θ + dy * sin θ) / scale + cx - 0.5
//! src_y = (-dx * sin θ + dy * cos θ) / scale + cy - 0.5
//! ```
//!
//! Samples are clamped to the source edges, so rounding at the border never
//! produces black pixels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::autocrop::compute_cover_scale;
use crate::decode::DecodedImage;

/// Angles below this (degrees) render identically to no rotation at all.
const IDENTITY_ANGLE: f64 = 0.001;

/// Errors that can occur while editing a photo.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// Width or height is zero, or the pixel buffer does not match them.
    #[error("Invalid image dimensions: {width}x{height} with {actual} bytes of pixel data")]
    InvalidImageDimensions {
        width: u32,
        height: u32,
        actual: usize,
    },

    /// User zoom must be a positive finite number.
    #[error("Invalid zoom factor: {0}")]
    InvalidScale(f64),

    /// Rotation angle must be finite.
    #[error("Invalid rotation angle: {0}")]
    InvalidAngle(f64),
}

/// Interpolation filter used when resampling the rotated photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation - good for previews.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation - good for the final write.
    Lanczos3,
}

/// Rotate a photo and crop it to fill its original frame.
///
/// # Arguments
///
/// * `image` - Source photo (borrowed, never modified)
/// * `angle_degrees` - Rotation in degrees (positive = clockwise on screen)
/// * `extra_user_scale` - Additional zoom on top of the auto-crop scale (1.0 = none)
/// * `filter` - Resampling filter
///
/// # Returns
///
/// A new `DecodedImage` with exactly the source dimensions.
///
/// # Errors
///
/// * `TransformError::InvalidImageDimensions` for empty or inconsistent buffers
/// * `TransformError::InvalidScale` for a non-positive or non-finite zoom
/// * `TransformError::InvalidAngle` for a non-finite angle
///
/// # Example
///
/// ```ignore
/// use fotoxpress_core::transform::{apply_edit, InterpolationFilter};
///
/// let straightened = apply_edit(&photo, -3.5, 1.0, InterpolationFilter::Lanczos3)?;
/// assert_eq!(straightened.width, photo.width);
/// ```
pub fn apply_edit(
    image: &DecodedImage,
    angle_degrees: f64,
    extra_user_scale: f64,
    filter: InterpolationFilter,
) -> Result<DecodedImage, TransformError> {
    validate_dimensions(image)?;
    if !angle_degrees.is_finite() {
        return Err(TransformError::InvalidAngle(angle_degrees));
    }
    if !extra_user_scale.is_finite() || extra_user_scale <= 0.0 {
        return Err(TransformError::InvalidScale(extra_user_scale));
    }

    let (width, height) = (image.width, image.height);
    let base_scale = compute_cover_scale(width as f64, height as f64, angle_degrees);
    let scale = base_scale * extra_user_scale;

    // Fast path: nothing to rotate and nothing to zoom
    if angle_degrees.abs() < IDENTITY_ANGLE && (scale - 1.0).abs() < f64::EPSILON {
        return Ok(image.clone());
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;

    let mut output = vec![0u8; image.pixels.len()];

    for dst_y in 0..height {
        for dst_x in 0..width {
            // Output pixel centre relative to the rotation origin
            let dx = dst_x as f64 + 0.5 - cx;
            let dy = dst_y as f64 + 0.5 - cy;

            // Undo zoom, then rotate by -θ
            let src_x = (dx * cos + dy * sin) / scale + cx - 0.5;
            let src_y = (-dx * sin + dy * cos) / scale + cy - 0.5;

            let pixel = match filter {
                InterpolationFilter::Bilinear => sample_bilinear(image, src_x, src_y),
                InterpolationFilter::Lanczos3 => sample_lanczos3(image, src_x, src_y),
            };

            let dst_idx = ((dst_y * width + dst_x) * 3) as usize;
            output[dst_idx..dst_idx + 3].copy_from_slice(&pixel);
        }
    }

    Ok(DecodedImage {
        width,
        height,
        pixels: output,
    })
}

fn validate_dimensions(image: &DecodedImage) -> Result<(), TransformError> {
    let expected = image.width as usize * image.height as usize * 3;
    if image.width == 0 || image.height == 0 || image.pixels.len() != expected {
        return Err(TransformError::InvalidImageDimensions {
            width: image.width,
            height: image.height,
            actual: image.pixels.len(),
        });
    }
    Ok(())
}

/// Get a pixel as [f64; 3], clamping the coordinates to the image.
#[inline]
fn clamped_pixel(image: &DecodedImage, px: i64, py: i64) -> [f64; 3] {
    let x = px.clamp(0, image.width as i64 - 1) as usize;
    let y = py.clamp(0, image.height as i64 - 1) as usize;
    let idx = (y * image.width as usize + x) * 3;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
    ]
}

/// Sample a pixel using bilinear interpolation over the 4 nearest pixels.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let x = x.clamp(0.0, (image.width - 1) as f64);
    let y = y.clamp(0.0, (image.height - 1) as f64);

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = clamped_pixel(image, x0, y0);
    let p10 = clamped_pixel(image, x0 + 1, y0);
    let p01 = clamped_pixel(image, x0, y0 + 1);
    let p11 = clamped_pixel(image, x0 + 1, y0 + 1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}

/// Sample a pixel using Lanczos3 interpolation over a 6x6 neighborhood.
fn sample_lanczos3(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let x = x.clamp(0.0, (image.width - 1) as f64);
    let y = y.clamp(0.0, (image.height - 1) as f64);

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 3];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;

            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
            let pixel = clamped_pixel(image, px, py);
            sum[0] += pixel[0] * weight;
            sum[1] += pixel[1] * weight;
            sum[2] += pixel[2] * weight;
            weight_sum += weight;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return sample_bilinear(image, x, y);
    }

    let mut result = [0u8; 3];
    for i in 0..3 {
        result[i] = (sum[i] / weight_sum).clamp(0.0, 255.0).round() as u8;
    }

    result
}

/// Lanczos kernel: `sinc(x) * sinc(x / a)` for `|x| < a`, 0 otherwise.
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
