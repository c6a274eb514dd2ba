//! Immutable UI snapshots published by the editing session.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::gateway::{AuthorizationRequest, PendingAction};
use crate::model::{Folder, Photo, SessionId, Summary};

/// Screens of the culling workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// No active session.
    #[default]
    Home,
    /// Choosing a folder to import from.
    Browsing,
    /// Multi-selecting photos inside a folder.
    Selecting { folder_id: String },
    /// Stepping through the session one photo at a time.
    Editing,
    /// Every photo visited, waiting for the commit.
    Summary,
    /// Applying deletions and edits.
    Committing,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Browsing => "Browsing",
            Screen::Selecting { .. } => "Selecting",
            Screen::Editing => "Editing",
            Screen::Summary => "Summary",
            Screen::Committing => "Committing",
        }
    }
}

/// A commit phase paused on user consent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub action: PendingAction,
    pub request: AuthorizationRequest,
}

/// Progress of the edit/export phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitProgress {
    pub processed: usize,
    pub total: usize,
    pub message: String,
}

impl CommitProgress {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.processed as f64 / self.total as f64
    }
}

/// Everything a front end needs to render the current screen.
///
/// Snapshots are never mutated; the session replaces the whole value on
/// every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiState {
    pub screen: Screen,
    pub is_loading: bool,
    pub folders: Arc<Vec<Folder>>,
    /// Photos of the open folder, in gallery order.
    pub folder_photos: Arc<Vec<String>>,
    /// Selected locators, in gallery order.
    pub selected: Vec<String>,
    /// Locators already part of some session.
    pub used_locators: Arc<HashSet<String>>,
    pub session_id: Option<SessionId>,
    pub current_photo: Option<Photo>,
    /// Cursor index inside the session.
    pub position: usize,
    pub remaining: usize,
    pub total: usize,
    pub summary: Summary,
    pub pending_authorization: Option<PendingAuthorization>,
    pub progress: Option<CommitProgress>,
    pub status: Option<String>,
    /// Unix ms of the last commit that rewrote photos on disk. Thumbnail
    /// caches keyed on it are invalidated when it changes.
    pub cache_version: i64,
}
