//! The editing session state machine.
//!
//! [`EditingSession`] owns all in-memory workflow state: the folder gallery,
//! the multi-selection, the working list of the active session and the
//! commit progress. Every mutation ends with a fresh [`UiState`] snapshot
//! sent through a `tokio::sync::watch` channel.
//!
//! Gateway calls are synchronous and may block on disk or database I/O, so
//! each one runs on the blocking pool via `spawn_blocking`. The working list
//! is a write-through cache: every rotation or decision change is persisted
//! right after the in-memory update for the same photo.
//!
//! # Flow
//!
//! ```text
//! Home -> Browsing -> Selecting -> Editing -> Summary -> Committing -> Home
//! ```

mod commit;
mod error;
mod selection;
mod state;

#[cfg(test)]
mod fakes;

pub use commit::{CommitOutcome, CommitReport};
pub use error::SessionError;
pub use state::{CommitProgress, PendingAuthorization, Screen, UiState};

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Local;
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::config::CommitConfig;
use crate::gateway::{GatewayError, MediaGateway, PersistenceGateway};
use crate::model::{Decision, Folder, Photo, SessionId, SessionProgress, Summary};
use selection::Selection;

/// Working copy of the session being edited or committed.
#[derive(Debug, Clone)]
struct ActiveSession {
    id: SessionId,
    photos: Vec<Photo>,
    cursor: usize,
    /// The delete phase already ran (resumed finalized session, or a commit
    /// that paused after deleting).
    deletions_applied: bool,
    /// Discarded photos already removed, so a retried commit skips them.
    deleted: HashSet<String>,
}

/// Culling workflow driver.
pub struct EditingSession<P, M> {
    persistence: Arc<P>,
    media: Arc<M>,
    config: CommitConfig,

    screen: Screen,
    is_loading: bool,
    folders: Arc<Vec<Folder>>,
    folder_photos: Arc<Vec<String>>,
    used_locators: Arc<HashSet<String>>,
    selection: Selection,

    active: Option<ActiveSession>,
    pending: Option<PendingAuthorization>,
    report: CommitReport,
    progress: Option<CommitProgress>,
    status: Option<String>,
    cache_version: i64,

    state_tx: watch::Sender<UiState>,
}

/// Run a gateway call on the blocking pool.
///
/// The outer `Result` only fails when the worker itself dies.
async fn blocking<G, T, F>(gateway: &Arc<G>, f: F) -> Result<T, SessionError>
where
    G: Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&G) -> Result<T, GatewayError> + Send + 'static,
{
    let gateway = Arc::clone(gateway);
    tokio::task::spawn_blocking(move || f(&gateway))
        .await
        .map_err(|e| SessionError::Worker(e.to_string()))?
        .map_err(SessionError::from)
}

impl<P, M> EditingSession<P, M>
where
    P: PersistenceGateway,
    M: MediaGateway,
{
    pub fn new(persistence: Arc<P>, media: Arc<M>, config: CommitConfig) -> Self {
        let (state_tx, _) = watch::channel(UiState::default());
        Self {
            persistence,
            media,
            config,
            screen: Screen::Home,
            is_loading: false,
            folders: Arc::default(),
            folder_photos: Arc::default(),
            used_locators: Arc::default(),
            selection: Selection::default(),
            active: None,
            pending: None,
            report: CommitReport::default(),
            progress: None,
            status: None,
            cache_version: 0,
            state_tx,
        }
    }

    /// Receive every future [`UiState`] snapshot.
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state_tx.subscribe()
    }

    /// The latest snapshot.
    pub fn state(&self) -> UiState {
        self.state_tx.borrow().clone()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn config(&self) -> &CommitConfig {
        &self.config
    }

    /// Counts over the working list. Empty when no session is active.
    pub fn summary(&self) -> Summary {
        self.active
            .as_ref()
            .map(|active| Summary::from_photos(&active.photos))
            .unwrap_or_default()
    }

    /// Sessions available for resuming, newest first.
    pub async fn sessions(&self) -> Result<Vec<SessionProgress>, SessionError> {
        blocking(&self.persistence, |p| p.list_sessions_with_progress()).await
    }

    /// Live session list for the home screen.
    pub fn watch_sessions(&self) -> watch::Receiver<Vec<SessionProgress>> {
        self.persistence.watch_sessions_with_progress()
    }

    // ------------------------------------------------------------------
    // Import: Home -> Browsing -> Selecting -> Editing
    // ------------------------------------------------------------------

    /// Start a new import and show the device folders.
    pub async fn start_import(&mut self) -> Result<(), SessionError> {
        if !matches!(self.screen, Screen::Home | Screen::Browsing) {
            return Err(self.invalid_state("Home"));
        }

        self.set_loading(true);
        match self.load_folders().await {
            Ok(()) => {
                self.screen = Screen::Browsing;
                self.is_loading = false;
                self.status = None;
                self.publish();
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Open a folder's gallery for selection.
    pub async fn open_folder(&mut self, folder_id: &str) -> Result<(), SessionError> {
        if !matches!(self.screen, Screen::Browsing | Screen::Selecting { .. }) {
            return Err(self.invalid_state("Browsing"));
        }

        self.set_loading(true);
        let id = folder_id.to_string();
        let photos = blocking(&self.media, move |m| m.list_photos_in_folder(&id)).await;
        let used = blocking(&self.persistence, |p| p.used_locators()).await;

        match photos.and_then(|photos| used.map(|used| (photos, used))) {
            Ok((photos, used)) => {
                debug!("Folder {} has {} photos", folder_id, photos.len());
                self.folder_photos = Arc::new(photos);
                self.used_locators = Arc::new(used);
                self.selection.clear();
                self.screen = Screen::Selecting {
                    folder_id: folder_id.to_string(),
                };
                self.is_loading = false;
                self.publish();
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn toggle_selection(&mut self, locator: &str) -> Result<(), SessionError> {
        self.require_selecting()?;
        if !self.folder_photos.iter().any(|l| l == locator) {
            debug!("Ignoring toggle on {} outside the open folder", locator);
            return Ok(());
        }
        self.selection.toggle(locator);
        self.publish();
        Ok(())
    }

    /// Extend the selection from the anchor to `target`.
    pub fn select_range(&mut self, target: &str) -> Result<(), SessionError> {
        self.require_selecting()?;
        self.selection.select_range(&self.folder_photos, target);
        self.publish();
        Ok(())
    }

    pub fn select_all(&mut self) -> Result<(), SessionError> {
        self.require_selecting()?;
        self.selection.select_all(&self.folder_photos);
        self.publish();
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Result<(), SessionError> {
        self.require_selecting()?;
        self.selection.clear();
        self.publish();
        Ok(())
    }

    /// Create a session from the selection and start editing it.
    ///
    /// Returns `Ok(None)` without changing screens when nothing is selected.
    /// A missing or blank `name` defaults to the folder name plus the
    /// current date and time.
    pub async fn confirm_selection(
        &mut self,
        name: Option<String>,
    ) -> Result<Option<SessionId>, SessionError> {
        let folder_id = match &self.screen {
            Screen::Selecting { folder_id } => folder_id.clone(),
            _ => return Err(self.invalid_state("Selecting")),
        };

        if self.selection.is_empty() {
            debug!("Empty selection, nothing to create");
            return Ok(None);
        }

        let locators = self.selection.in_order(&self.folder_photos);
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.default_session_name(&folder_id));

        self.set_loading(true);
        match self.create_and_load(name, locators).await {
            Ok(id) => Ok(Some(id)),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn create_and_load(
        &mut self,
        name: String,
        locators: Vec<String>,
    ) -> Result<SessionId, SessionError> {
        let count = locators.len();
        let to_persist = locators.clone();
        let session_name = name.clone();
        let id = blocking(&self.persistence, move |p| {
            p.create_session(&session_name, &to_persist)
        })
        .await?;
        let photos = blocking(&self.persistence, move |p| p.load_session_photos(id)).await?;
        info!("Created session {} \"{}\" with {} photos", id, name, count);

        let mut used = (*self.used_locators).clone();
        used.extend(locators);
        self.used_locators = Arc::new(used);
        self.selection.clear();

        self.screen = if photos.is_empty() {
            Screen::Summary
        } else {
            Screen::Editing
        };
        self.active = Some(ActiveSession {
            id,
            photos,
            cursor: 0,
            deletions_applied: false,
            deleted: HashSet::new(),
        });
        self.is_loading = false;
        self.status = None;
        self.publish();
        Ok(id)
    }

    fn default_session_name(&self, folder_id: &str) -> String {
        let folder_name = self
            .folders
            .iter()
            .find(|f| f.id == folder_id)
            .map(|f| f.display_name.as_str())
            .unwrap_or(folder_id);
        format!("{} {}", folder_name, Local::now().format("%Y-%m-%d %H:%M"))
    }

    // ------------------------------------------------------------------
    // Existing sessions
    // ------------------------------------------------------------------

    /// Reopen a saved session.
    ///
    /// The cursor lands on the first undecided photo (or the first photo when
    /// everything is decided). A session whose delete phase already ran goes
    /// straight to the summary.
    pub async fn resume_session(&mut self, session_id: SessionId) -> Result<(), SessionError> {
        if self.screen == Screen::Committing {
            return Err(self.invalid_state("Home"));
        }

        self.set_loading(true);
        match self.load_existing(session_id).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn load_existing(&mut self, session_id: SessionId) -> Result<(), SessionError> {
        let session = blocking(&self.persistence, move |p| p.find_session(session_id))
            .await?
            .ok_or(SessionError::SessionNotFound(session_id))?;
        let photos =
            blocking(&self.persistence, move |p| p.load_session_photos(session_id)).await?;

        let cursor = photos
            .iter()
            .position(|p| p.decision == Decision::Undecided)
            .unwrap_or(0);

        info!(
            "Resuming session {} \"{}\" at photo {}/{}{}",
            session.id,
            session.name,
            cursor + 1,
            photos.len(),
            if session.finalized { " (finalized)" } else { "" }
        );

        self.screen = if session.finalized || photos.is_empty() {
            Screen::Summary
        } else {
            Screen::Editing
        };
        self.active = Some(ActiveSession {
            id: session.id,
            photos,
            cursor,
            deletions_applied: session.finalized,
            deleted: HashSet::new(),
        });
        self.pending = None;
        self.progress = None;
        self.is_loading = false;
        self.status = None;
        self.publish();
        Ok(())
    }

    /// Delete a saved session. Discarding the active one returns Home.
    pub async fn discard_session(&mut self, session_id: SessionId) -> Result<(), SessionError> {
        if self.screen == Screen::Committing {
            return Err(self.invalid_state("Home"));
        }

        if let Err(e) = blocking(&self.persistence, move |p| p.delete_session(session_id)).await
        {
            return Err(self.fail(e));
        }
        info!("Discarded session {}", session_id);

        if self.active.as_ref().is_some_and(|a| a.id == session_id) {
            self.active = None;
            self.screen = Screen::Home;
        }
        self.publish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Add `delta` degrees to the current photo and persist the new angle.
    pub async fn record_rotation_delta(&mut self, delta: f64) -> Result<(), SessionError> {
        self.require_editing()?;
        if !delta.is_finite() {
            return Err(SessionError::InvalidRotation(delta));
        }

        let (photo_id, previous, rotation) = {
            let photo = self.current_photo_mut()?;
            let previous = photo.rotation;
            photo.rotation += delta;
            (photo.id, previous, photo.rotation)
        };
        self.publish();

        if let Err(e) = blocking(&self.persistence, move |p| {
            p.update_photo_rotation(photo_id, rotation)
        })
        .await
        {
            // Keep the working list in step with what is stored
            self.current_photo_mut()?.rotation = previous;
            return Err(self.fail(e));
        }
        Ok(())
    }

    /// Decide the current photo, persist, then move to the next photo or to
    /// the summary after the last one.
    pub async fn record_decision(&mut self, decision: Decision) -> Result<(), SessionError> {
        self.require_editing()?;

        let (photo_id, previous) = {
            let photo = self.current_photo_mut()?;
            let previous = std::mem::replace(&mut photo.decision, decision);
            (photo.id, previous)
        };

        if let Err(e) = blocking(&self.persistence, move |p| {
            p.update_photo_decision(photo_id, decision)
        })
        .await
        {
            self.current_photo_mut()?.decision = previous;
            return Err(self.fail(e));
        }

        let active = self.active.as_mut().ok_or(SessionError::NoActiveSession)?;
        if active.cursor + 1 < active.photos.len() {
            active.cursor += 1;
        } else {
            debug!("Last photo of session {} decided", active.id);
            self.screen = Screen::Summary;
        }
        self.publish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Context-sensitive back action.
    ///
    /// Leaving Editing or Summary keeps the session saved; it can be resumed
    /// later. Committing ignores back.
    pub async fn back(&mut self) -> Result<(), SessionError> {
        match self.screen {
            Screen::Editing | Screen::Summary => {
                self.active = None;
                self.screen = Screen::Browsing;
                self.set_loading(true);
                match self.load_folders().await {
                    Ok(()) => {
                        self.is_loading = false;
                        self.publish();
                    }
                    Err(e) => return Err(self.fail(e)),
                }
            }
            Screen::Selecting { .. } if !self.selection.is_empty() => {
                self.selection.clear();
                self.publish();
            }
            Screen::Selecting { .. } => {
                self.folder_photos = Arc::default();
                self.screen = Screen::Browsing;
                self.publish();
            }
            Screen::Browsing => {
                self.screen = Screen::Home;
                self.publish();
            }
            Screen::Home | Screen::Committing => {}
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load_folders(&mut self) -> Result<(), SessionError> {
        let folders = blocking(&self.media, |m| m.list_folders()).await?;
        debug!("Loaded {} folders", folders.len());
        self.folders = Arc::new(folders);
        Ok(())
    }

    fn current_photo_mut(&mut self) -> Result<&mut Photo, SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NoActiveSession)?;
        let cursor = active.cursor;
        active
            .photos
            .get_mut(cursor)
            .ok_or(SessionError::NoActiveSession)
    }

    fn require_selecting(&self) -> Result<(), SessionError> {
        match self.screen {
            Screen::Selecting { .. } => Ok(()),
            _ => Err(self.invalid_state("Selecting")),
        }
    }

    fn require_editing(&self) -> Result<(), SessionError> {
        if self.screen != Screen::Editing {
            return Err(self.invalid_state("Editing"));
        }
        if self.active.is_none() {
            return Err(SessionError::NoActiveSession);
        }
        Ok(())
    }

    fn invalid_state(&self, expected: &'static str) -> SessionError {
        SessionError::InvalidState {
            expected,
            actual: self.screen.name(),
        }
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.publish();
    }

    /// Clear the loading flag, surface the error as a status message and
    /// hand it back to the caller.
    fn fail(&mut self, error: SessionError) -> SessionError {
        warn!("Session operation failed: {}", error);
        self.is_loading = false;
        self.status = Some(error.to_string());
        self.publish();
        error
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }

    fn snapshot(&self) -> UiState {
        let (session_id, current_photo, position, total) = match &self.active {
            Some(active) => (
                Some(active.id),
                active
                    .photos
                    .get(active.cursor)
                    .filter(|_| self.screen == Screen::Editing)
                    .cloned(),
                active.cursor,
                active.photos.len(),
            ),
            None => (None, None, 0, 0),
        };

        UiState {
            screen: self.screen.clone(),
            is_loading: self.is_loading,
            folders: Arc::clone(&self.folders),
            folder_photos: Arc::clone(&self.folder_photos),
            selected: self.selection.in_order(&self.folder_photos),
            used_locators: Arc::clone(&self.used_locators),
            session_id,
            current_photo,
            position,
            remaining: total.saturating_sub(position),
            total,
            summary: self.summary(),
            pending_authorization: self.pending.clone(),
            progress: self.progress.clone(),
            status: self.status.clone(),
            cache_version: self.cache_version,
        }
    }
}
