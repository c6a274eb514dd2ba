//! Commit policy.
//!
//! Controls what the commit step does with kept photos: overwrite the
//! originals in place (only the rotated ones are touched) or export every
//! kept photo into a new album folder.

use serde::{Deserialize, Serialize};

use crate::transform::InterpolationFilter;

/// Where edited photos end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// Rewrite rotated originals in place. Unrotated photos are left alone.
    #[default]
    Overwrite,
    /// Write every kept photo into `destination_folder`.
    CopyToAlbum,
}

/// File naming for exported photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportNaming {
    /// `<prefix><n>`, numbered from 1 in commit order.
    Sequential { prefix: String },
    /// Keep the original file stem.
    OriginalName,
}

impl Default for ExportNaming {
    fn default() -> Self {
        ExportNaming::Sequential {
            prefix: "Photo_".to_string(),
        }
    }
}

impl ExportNaming {
    /// File name (without extension) for the `sequence`-th exported photo.
    ///
    /// `sequence` is 1-based. Falls back to sequential naming when the
    /// locator has no usable file stem.
    pub fn file_name_hint(&self, sequence: usize, locator: &str) -> String {
        match self {
            ExportNaming::Sequential { prefix } => format!("{}{}", prefix, sequence),
            ExportNaming::OriginalName => std::path::Path::new(locator)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|stem| !stem.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Photo_{}", sequence)),
        }
    }
}

/// Commit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    pub export_mode: ExportMode,
    /// Album folder used by `ExportMode::CopyToAlbum`.
    pub destination_folder: String,
    pub naming: ExportNaming,
    /// Resampling filter for the final write.
    pub filter: InterpolationFilter,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            export_mode: ExportMode::default(),
            destination_folder: "FotoXpress".to_string(),
            naming: ExportNaming::default(),
            filter: InterpolationFilter::Lanczos3,
        }
    }
}

impl CommitConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn copy_to_album(destination_folder: impl Into<String>) -> Self {
        Self {
            export_mode: ExportMode::CopyToAlbum,
            destination_folder: destination_folder.into(),
            ..Self::default()
        }
    }
}
