//! Auto-crop scale for rotated photos.
//!
//! When a `w x h` frame is rotated by θ, its axis-aligned bounding box is
//!
//! ```text
//! rotated_w = w * |cos θ| + h * |sin θ|
//! rotated_h = w * |sin θ| + h * |cos θ|
//! ```
//!
//! Zooming the rotated image by `max(rotated_w / w, rotated_h / h)` makes it
//! cover the original frame completely, which is what hides the corner
//! gaps after straightening.

/// Compute the zoom factor that removes corner gaps after a rotation.
///
/// # Arguments
///
/// * `width` - Frame width (0 means "not measured yet")
/// * `height` - Frame height (0 means "not measured yet")
/// * `angle_degrees` - Rotation angle in degrees, sign is irrelevant
///
/// # Returns
///
/// A factor `>= 1.0`. Exactly `1.0` for unrotated frames (and multiples of
/// 180 degrees) and for unmeasured frames.
///
/// # Example
///
/// ```ignore
/// use fotoxpress_core::transform::compute_cover_scale;
///
/// assert_eq!(compute_cover_scale(400.0, 300.0, 0.0), 1.0);
/// assert!(compute_cover_scale(400.0, 300.0, 8.0) > 1.0);
/// ```
pub fn compute_cover_scale(width: f64, height: f64, angle_degrees: f64) -> f64 {
    // Layout not measured yet; also keeps NaN/negative sizes out of the division
    if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
        return 1.0;
    }
    if !angle_degrees.is_finite() {
        return 1.0;
    }

    // The bounding box repeats every 180 degrees
    let theta = (angle_degrees.abs() % 180.0).to_radians();
    let sin = theta.sin().abs();
    let cos = theta.cos().abs();

    let rotated_w = width * cos + height * sin;
    let rotated_h = width * sin + height * cos;

    (rotated_w / width).max(rotated_h / height)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
