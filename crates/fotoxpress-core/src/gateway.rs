//! Contracts the culling core consumes.
//!
//! The session state machine never touches the database or the file system
//! directly. It talks to a [`PersistenceGateway`] (session and photo rows)
//! and a [`MediaGateway`] (device photos, permissions). Both are synchronous;
//! the session runs every call on a blocking worker thread.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::decode::DecodedImage;
use crate::model::{Decision, Folder, Photo, PhotoId, Session, SessionId, SessionProgress};

/// Errors reported by gateway implementations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The OS needs explicit user consent before this operation.
    #[error("Authorization required")]
    AuthorizationRequired,

    /// The resource was moved, deleted or cannot be decoded anymore.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoding or encoding the photo failed.
    #[error("Codec error: {0}")]
    Codec(String),
}

/// Which commit phase is waiting for the user's consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    Delete,
    Edit,
}

/// Opaque authorization request produced by the media gateway.
///
/// The core only hands it to the UI layer, which turns `token` into the
/// platform consent dialog and reports the result back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub locators: Vec<String>,
    pub token: String,
}

/// Session and photo persistence.
pub trait PersistenceGateway: Send + Sync + 'static {
    /// Create a session with one undecided, unrotated photo per locator.
    /// `sequence` follows the slice order.
    fn create_session(&self, name: &str, locators: &[String]) -> Result<SessionId, GatewayError>;

    /// Photos of a session, ordered by sequence.
    fn load_session_photos(&self, session_id: SessionId) -> Result<Vec<Photo>, GatewayError>;

    fn update_photo_rotation(&self, photo_id: PhotoId, rotation: f64) -> Result<(), GatewayError>;

    fn update_photo_decision(
        &self,
        photo_id: PhotoId,
        decision: Decision,
    ) -> Result<(), GatewayError>;

    /// Delete a session and, by cascade, its photos.
    fn delete_session(&self, session_id: SessionId) -> Result<(), GatewayError>;

    /// All sessions with their progress, newest first.
    fn list_sessions_with_progress(&self) -> Result<Vec<SessionProgress>, GatewayError>;

    /// Live view of [`list_sessions_with_progress`](Self::list_sessions_with_progress),
    /// refreshed after every write.
    fn watch_sessions_with_progress(&self) -> watch::Receiver<Vec<SessionProgress>>;

    /// Every locator that already belongs to some session.
    fn used_locators(&self) -> Result<HashSet<String>, GatewayError>;

    fn find_session(&self, session_id: SessionId) -> Result<Option<Session>, GatewayError>;

    /// Record that the delete phase of a commit has been applied.
    fn mark_session_finalized(&self, session_id: SessionId) -> Result<(), GatewayError>;
}

/// Device photo storage.
pub trait MediaGateway: Send + Sync + 'static {
    fn list_folders(&self) -> Result<Vec<Folder>, GatewayError>;

    /// Locators of the photos in a folder, newest first.
    fn list_photos_in_folder(&self, folder_id: &str) -> Result<Vec<String>, GatewayError>;

    /// Decode a photo. `None` when it cannot be read.
    fn load_image(&self, locator: &str) -> Option<DecodedImage>;

    fn overwrite_image(&self, locator: &str, image: &DecodedImage) -> Result<(), GatewayError>;

    /// Write a new photo into `destination_folder` and return its locator.
    fn save_image_to_new_location(
        &self,
        image: &DecodedImage,
        file_name_hint: &str,
        destination_folder: &str,
    ) -> Result<String, GatewayError>;

    /// Delete a photo. `Ok(false)` when nothing was deleted.
    ///
    /// Fails with [`GatewayError::AuthorizationRequired`] when the OS wants
    /// consent first.
    fn delete_resource(&self, locator: &str) -> Result<bool, GatewayError>;

    /// `Some` when deleting these photos needs user consent.
    fn request_delete_authorization(
        &self,
        locators: &[String],
    ) -> Result<Option<AuthorizationRequest>, GatewayError>;

    /// `Some` when rewriting these photos needs user consent.
    fn request_write_authorization(
        &self,
        locators: &[String],
    ) -> Result<Option<AuthorizationRequest>, GatewayError>;
}
