//! Straighten transform: rotation with automatic crop-to-fill.
//!
//! A photo is straightened by rotating it around its centre and zooming in
//! just enough that the rotated content covers the whole original frame.
//! The output always keeps the source dimensions, so no empty corners and
//! no canvas growth.
//!
//! # Coordinate System
//!
//! - Angles are in degrees, positive = clockwise on screen (y axis points down)
//! - Origin is the top-left corner, pixel centres sit at `x + 0.5`
//! - The rotation origin is the image centre

mod autocrop;
mod edit;

pub use autocrop::compute_cover_scale;
pub use edit::{apply_edit, InterpolationFilter, TransformError};
