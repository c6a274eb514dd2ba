//! Where the store keeps its data.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Overrides the database file location.
pub const ENV_DATABASE: &str = "FOTOXPRESS_DB";
/// Overrides the photo library root.
pub const ENV_MEDIA_ROOT: &str = "FOTOXPRESS_MEDIA_ROOT";

const APP_DIR: &str = "FotoXpress";
const DATABASE_FILE: &str = "sessions.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    /// Root of the photo library; every sub-directory with photos is a folder.
    pub media_root: PathBuf,
    /// Quality used when re-encoding JPEGs (1-100).
    pub jpeg_quality: u8,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DATABASE_FILE),
            media_root: PathBuf::from("."),
            jpeg_quality: 92,
        }
    }
}

impl StoreConfig {
    /// Resolve the per-user locations, honouring the `FOTOXPRESS_*`
    /// environment overrides.
    pub fn discover() -> Result<Self> {
        Self::discover_with(|key| std::env::var(key).ok())
    }

    /// Like [`discover`](Self::discover), reading overrides from `lookup`.
    pub fn discover_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_path = match lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => dirs::data_dir()
                .ok_or_else(|| StoreError::Path("Failed to get data dir".to_string()))?
                .join(APP_DIR)
                .join(DATABASE_FILE),
        };

        let media_root = match lookup(ENV_MEDIA_ROOT).filter(|v| !v.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => dirs::picture_dir()
                .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
                .ok_or_else(|| StoreError::Path("Failed to get pictures dir".to_string()))?,
        };

        Ok(Self {
            database_path,
            media_root,
            ..Self::default()
        })
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Everything under one directory, handy for tests and portable setups.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            database_path: dir.join(DATABASE_FILE),
            media_root: dir.join("media"),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        let config = StoreConfig::discover_with(|key| match key {
            ENV_DATABASE => Some("/tmp/fx/test.db".to_string()),
            ENV_MEDIA_ROOT => Some("/tmp/fx/photos".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/fx/test.db"));
        assert_eq!(config.media_root, PathBuf::from("/tmp/fx/photos"));
        assert_eq!(config.jpeg_quality, 92);
    }

    #[test]
    fn test_database_defaults_to_data_dir() {
        let Ok(config) = StoreConfig::discover_with(|key| {
            (key == ENV_MEDIA_ROOT).then(|| "/photos".to_string())
        }) else {
            // No data dir on this machine; nothing else to check
            return;
        };
        assert!(config.database_path.ends_with("FotoXpress/sessions.db"));
        assert_eq!(config.media_root, PathBuf::from("/photos"));
    }

    #[test]
    fn test_from_json() {
        let config =
            StoreConfig::from_json(r#"{"media_root": "/sdcard/DCIM", "jpeg_quality": 80}"#)
                .unwrap();
        assert_eq!(config.media_root, PathBuf::from("/sdcard/DCIM"));
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.database_path, PathBuf::from("sessions.db"));

        assert!(matches!(
            StoreConfig::from_json("{not json"),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_in_dir() {
        let config = StoreConfig::in_dir("/data");
        assert_eq!(config.database_path, PathBuf::from("/data/sessions.db"));
        assert_eq!(config.media_root, PathBuf::from("/data/media"));
    }
}
