//! The device photo library as a directory tree.
//!
//! Every directory under the root that directly holds JPEG or PNG files is a
//! folder; its id is the path relative to the root (`.` for the root itself).
//! A photo's locator is its full path.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use fotoxpress_core::{
    decode_image, encode_image, AuthorizationRequest, DecodedImage, Folder, GatewayError,
    ImageFormat, MediaGateway,
};
use walkdir::WalkDir;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

const SUPPORTED_EXT: &[&str] = &["jpg", "jpeg", "png"];
const ROOT_FOLDER_ID: &str = ".";

pub struct FsMediaGateway {
    root: PathBuf,
    jpeg_quality: u8,
}

impl FsMediaGateway {
    pub fn new(root: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            root: root.into(),
            jpeg_quality,
        }
    }

    /// Gateway over `config.media_root`, creating the directory if needed.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.media_root)?;
        log::info!("Media root: {}", config.media_root.display());
        Ok(Self::new(&config.media_root, config.jpeg_quality))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folders with at least one photo, ordered by id.
    pub fn scan_folders(&self) -> Result<Vec<Folder>> {
        let mut grouped: BTreeMap<PathBuf, Vec<(PathBuf, SystemTime)>> = BTreeMap::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| is_supported(e.path()))
        {
            let Some(parent) = entry.path().parent() else {
                continue;
            };
            let modified = modified_time(entry.path());
            grouped
                .entry(parent.to_path_buf())
                .or_default()
                .push((entry.into_path(), modified));
        }

        let folders = grouped
            .into_iter()
            .map(|(dir, photos)| {
                let cover = photos
                    .iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
                    .map(|(path, _)| path.to_string_lossy().to_string());
                Folder {
                    id: self.folder_id(&dir),
                    display_name: self.display_name(&dir),
                    cover_locator: cover,
                    photo_count: photos.len() as u32,
                }
            })
            .collect();
        Ok(folders)
    }

    /// Photos directly inside a folder, newest first.
    pub fn folder_photos(&self, folder_id: &str) -> Result<Vec<String>> {
        let dir = self.folder_dir(folder_id)?;
        if !dir.is_dir() {
            return Err(StoreError::NotFound(format!("folder {}", folder_id)));
        }

        let mut photos: Vec<(PathBuf, SystemTime)> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_supported(p))
            .map(|p| {
                let modified = modified_time(&p);
                (p, modified)
            })
            .collect();
        photos.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(photos
            .into_iter()
            .map(|(path, _)| path.to_string_lossy().to_string())
            .collect())
    }

    pub fn read_image(&self, locator: &str) -> Result<DecodedImage> {
        let bytes = fs::read(self.resolve(locator)?)?;
        Ok(decode_image(&bytes)?)
    }

    /// Replace a photo in place, keeping its format.
    ///
    /// The new bytes go to a sibling temp file first, so a failed encode or
    /// write never leaves a truncated photo behind.
    pub fn write_over(&self, locator: &str, image: &DecodedImage) -> Result<()> {
        let path = self.resolve(locator)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(locator.to_string()));
        }

        let bytes = encode_image(image, ImageFormat::from_path(&path), self.jpeg_quality)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| StoreError::Path(format!("No file name in {}", locator)))?;
        let temp = path.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&temp, &bytes)?;
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        log::debug!("Overwrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Write a new JPEG into `destination_folder` (relative to the root).
    ///
    /// Names never collide: `hint.jpg`, then `hint_1.jpg`, `hint_2.jpg` and
    /// so on.
    pub fn write_new(
        &self,
        image: &DecodedImage,
        file_name_hint: &str,
        destination_folder: &str,
    ) -> Result<PathBuf> {
        let dir = self.root.join(sanitize(destination_folder, "FotoXpress"));
        fs::create_dir_all(&dir)?;

        let stem = sanitize(file_name_hint, "Photo");
        let extension = ImageFormat::Jpeg.extension();
        let mut path = dir.join(format!("{}.{}", stem, extension));
        let mut suffix = 1;
        while path.exists() {
            path = dir.join(format!("{}_{}.{}", stem, suffix, extension));
            suffix += 1;
        }

        let bytes = encode_image(image, ImageFormat::Jpeg, self.jpeg_quality)?;
        fs::write(&path, bytes)?;
        log::debug!("Saved {}", path.display());
        Ok(path)
    }

    /// Remove a photo. `Ok(false)` when it was already gone.
    pub fn remove(&self, locator: &str) -> Result<bool> {
        let path = self.resolve(locator)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Locators must point inside the root.
    fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let path = PathBuf::from(locator);
        let escapes = path.components().any(|c| c == Component::ParentDir);
        if escapes || !path.starts_with(&self.root) {
            return Err(StoreError::Path(format!("Outside media root: {}", locator)));
        }
        Ok(path)
    }

    fn folder_dir(&self, folder_id: &str) -> Result<PathBuf> {
        if folder_id == ROOT_FOLDER_ID {
            return Ok(self.root.clone());
        }
        let relative = Path::new(folder_id);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !plain {
            return Err(StoreError::Path(format!("Invalid folder id: {}", folder_id)));
        }
        Ok(self.root.join(relative))
    }

    fn folder_id(&self, dir: &Path) -> String {
        match dir.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                relative.to_string_lossy().to_string()
            }
            _ => ROOT_FOLDER_ID.to_string(),
        }
    }

    fn display_name(&self, dir: &Path) -> String {
        dir.file_name()
            .or_else(|| self.root.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Library".to_string())
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXT.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn modified_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Reduce a user-supplied name to one safe path component.
fn sanitize(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

impl MediaGateway for FsMediaGateway {
    fn list_folders(&self) -> std::result::Result<Vec<Folder>, GatewayError> {
        Ok(self.scan_folders()?)
    }

    fn list_photos_in_folder(&self, folder_id: &str) -> std::result::Result<Vec<String>, GatewayError> {
        Ok(self.folder_photos(folder_id)?)
    }

    fn load_image(&self, locator: &str) -> Option<DecodedImage> {
        match self.read_image(locator) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Failed to load {}: {}", locator, e);
                None
            }
        }
    }

    fn overwrite_image(
        &self,
        locator: &str,
        image: &DecodedImage,
    ) -> std::result::Result<(), GatewayError> {
        Ok(self.write_over(locator, image)?)
    }

    fn save_image_to_new_location(
        &self,
        image: &DecodedImage,
        file_name_hint: &str,
        destination_folder: &str,
    ) -> std::result::Result<String, GatewayError> {
        let path = self.write_new(image, file_name_hint, destination_folder)?;
        Ok(path.to_string_lossy().to_string())
    }

    fn delete_resource(&self, locator: &str) -> std::result::Result<bool, GatewayError> {
        Ok(self.remove(locator)?)
    }

    // Plain files need no consent beyond the process's own permissions; a
    // refused write surfaces as `AuthorizationRequired` from the call itself.
    fn request_delete_authorization(
        &self,
        _locators: &[String],
    ) -> std::result::Result<Option<AuthorizationRequest>, GatewayError> {
        Ok(None)
    }

    fn request_write_authorization(
        &self,
        _locators: &[String],
    ) -> std::result::Result<Option<AuthorizationRequest>, GatewayError> {
        Ok(None)
    }
}
