//! In-memory gateways that record every call.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::watch;

use crate::decode::DecodedImage;
use crate::gateway::{AuthorizationRequest, GatewayError, MediaGateway, PersistenceGateway};
use crate::model::{
    Decision, Folder, Photo, PhotoId, Session, SessionId, SessionPhoto, SessionProgress,
};

#[derive(Default)]
struct Tables {
    sessions: Vec<Session>,
    photos: Vec<SessionPhoto>,
    next_id: i64,
}

pub struct MemoryPersistence {
    tables: Mutex<Tables>,
    sessions_tx: watch::Sender<Vec<SessionProgress>>,
    /// Rotation writes in call order.
    pub rotation_writes: Mutex<Vec<(PhotoId, f64)>>,
    /// Make photo updates fail with a storage error.
    pub fail_writes: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        let (sessions_tx, _) = watch::channel(Vec::new());
        Self {
            tables: Mutex::new(Tables::default()),
            sessions_tx,
            rotation_writes: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    pub fn photo_row(&self, photo_id: PhotoId) -> Option<SessionPhoto> {
        let tables = self.tables.lock().unwrap();
        tables.photos.iter().find(|p| p.id == photo_id).cloned()
    }

    fn progress(tables: &Tables) -> Vec<SessionProgress> {
        tables
            .sessions
            .iter()
            .rev()
            .map(|s| {
                let photos = tables.photos.iter().filter(|p| p.session_id == s.id);
                SessionProgress {
                    id: s.id,
                    name: s.name.clone(),
                    created_at: s.created_at,
                    total_count: photos.clone().count() as u32,
                    edited_count: photos.filter(|p| p.decision.is_decided()).count() as u32,
                    finalized: s.finalized,
                }
            })
            .collect()
    }

    fn changed(&self, tables: &Tables) {
        self.sessions_tx.send_replace(Self::progress(tables));
    }

    fn update_photo(
        &self,
        photo_id: PhotoId,
        f: impl FnOnce(&mut SessionPhoto),
    ) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Storage("database is locked".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        let photo = tables
            .photos
            .iter_mut()
            .find(|p| p.id == photo_id)
            .ok_or_else(|| GatewayError::Storage(format!("photo {} not found", photo_id)))?;
        f(photo);
        self.changed(&tables);
        Ok(())
    }
}

impl PersistenceGateway for MemoryPersistence {
    fn create_session(&self, name: &str, locators: &[String]) -> Result<SessionId, GatewayError> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_id += 1;
        let id = tables.next_id;
        tables.sessions.push(Session {
            id,
            name: name.to_string(),
            created_at: id,
            photo_count: locators.len() as u32,
            finalized: false,
        });
        for (sequence, locator) in locators.iter().enumerate() {
            tables.next_id += 1;
            let photo_id = tables.next_id;
            tables.photos.push(SessionPhoto {
                id: photo_id,
                session_id: id,
                locator: locator.clone(),
                rotation: 0.0,
                decision: Decision::Undecided,
                sequence: sequence as u32,
            });
        }
        self.changed(&tables);
        Ok(id)
    }

    fn load_session_photos(&self, session_id: SessionId) -> Result<Vec<Photo>, GatewayError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<&SessionPhoto> = tables
            .photos
            .iter()
            .filter(|p| p.session_id == session_id)
            .collect();
        rows.sort_by_key(|p| p.sequence);
        Ok(rows.into_iter().map(SessionPhoto::to_photo).collect())
    }

    fn update_photo_rotation(&self, photo_id: PhotoId, rotation: f64) -> Result<(), GatewayError> {
        self.rotation_writes
            .lock()
            .unwrap()
            .push((photo_id, rotation));
        self.update_photo(photo_id, |p| p.rotation = rotation)
    }

    fn update_photo_decision(
        &self,
        photo_id: PhotoId,
        decision: Decision,
    ) -> Result<(), GatewayError> {
        self.update_photo(photo_id, |p| p.decision = decision)
    }

    fn delete_session(&self, session_id: SessionId) -> Result<(), GatewayError> {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.retain(|s| s.id != session_id);
        tables.photos.retain(|p| p.session_id != session_id);
        self.changed(&tables);
        Ok(())
    }

    fn list_sessions_with_progress(&self) -> Result<Vec<SessionProgress>, GatewayError> {
        Ok(Self::progress(&self.tables.lock().unwrap()))
    }

    fn watch_sessions_with_progress(&self) -> watch::Receiver<Vec<SessionProgress>> {
        self.sessions_tx.subscribe()
    }

    fn used_locators(&self) -> Result<HashSet<String>, GatewayError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.photos.iter().map(|p| p.locator.clone()).collect())
    }

    fn find_session(&self, session_id: SessionId) -> Result<Option<Session>, GatewayError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.sessions.iter().find(|s| s.id == session_id).cloned())
    }

    fn mark_session_finalized(&self, session_id: SessionId) -> Result<(), GatewayError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(session) = tables.sessions.iter_mut().find(|s| s.id == session_id) {
            session.finalized = true;
        }
        self.changed(&tables);
        Ok(())
    }
}

/// Media calls observed by [`RecordingMedia`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MediaCalls {
    pub overwritten: Vec<String>,
    /// `(file_name_hint, destination_folder)`
    pub saved: Vec<(String, String)>,
    pub deleted: Vec<String>,
    pub delete_auth_requests: Vec<Vec<String>>,
    pub write_auth_requests: Vec<Vec<String>>,
}

#[derive(Default)]
pub struct RecordingMedia {
    pub folders: Vec<Folder>,
    pub folder_photos: HashMap<String, Vec<String>>,
    images: HashMap<String, DecodedImage>,
    /// Locators whose delete raises `AuthorizationRequired`.
    protected: Mutex<HashSet<String>>,
    /// Offer a consent request when every locator asked about is protected.
    pub offer_consent_for_protected: bool,
    pub require_delete_consent: bool,
    pub require_write_consent: bool,
    pub calls: Mutex<MediaCalls>,
}

impl RecordingMedia {
    /// One folder `dcim` ("Camera") holding `locators`, each a small grey photo.
    pub fn with_folder(locators: &[&str]) -> Self {
        let locators: Vec<String> = locators.iter().map(|l| l.to_string()).collect();
        let images = locators
            .iter()
            .map(|l| (l.clone(), DecodedImage::new(8, 6, vec![120u8; 8 * 6 * 3])))
            .collect();
        Self {
            folders: vec![Folder {
                id: "dcim".to_string(),
                display_name: "Camera".to_string(),
                cover_locator: locators.first().cloned(),
                photo_count: locators.len() as u32,
            }],
            folder_photos: HashMap::from([("dcim".to_string(), locators)]),
            images,
            ..Self::default()
        }
    }

    /// Make `locator` unreadable.
    pub fn forget_image(&mut self, locator: &str) {
        self.images.remove(locator);
    }

    pub fn protect(&self, locator: &str) {
        self.protected.lock().unwrap().insert(locator.to_string());
    }

    pub fn unprotect(&self, locator: &str) {
        self.protected.lock().unwrap().remove(locator);
    }

    pub fn calls(&self) -> MediaCalls {
        self.calls.lock().unwrap().clone()
    }

    fn consent(&self, needed: bool, locators: &[String]) -> Option<AuthorizationRequest> {
        needed.then(|| AuthorizationRequest {
            locators: locators.to_vec(),
            token: format!("consent-{}", locators.len()),
        })
    }
}

impl MediaGateway for RecordingMedia {
    fn list_folders(&self) -> Result<Vec<Folder>, GatewayError> {
        Ok(self.folders.clone())
    }

    fn list_photos_in_folder(&self, folder_id: &str) -> Result<Vec<String>, GatewayError> {
        self.folder_photos
            .get(folder_id)
            .cloned()
            .ok_or_else(|| GatewayError::ResourceUnavailable(folder_id.to_string()))
    }

    fn load_image(&self, locator: &str) -> Option<DecodedImage> {
        self.images.get(locator).cloned()
    }

    fn overwrite_image(&self, locator: &str, _image: &DecodedImage) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .overwritten
            .push(locator.to_string());
        Ok(())
    }

    fn save_image_to_new_location(
        &self,
        _image: &DecodedImage,
        file_name_hint: &str,
        destination_folder: &str,
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .saved
            .push((file_name_hint.to_string(), destination_folder.to_string()));
        Ok(format!("/{}/{}.jpg", destination_folder, file_name_hint))
    }

    fn delete_resource(&self, locator: &str) -> Result<bool, GatewayError> {
        if self.protected.lock().unwrap().contains(locator) {
            return Err(GatewayError::AuthorizationRequired);
        }
        self.calls.lock().unwrap().deleted.push(locator.to_string());
        Ok(self.images.contains_key(locator))
    }

    fn request_delete_authorization(
        &self,
        locators: &[String],
    ) -> Result<Option<AuthorizationRequest>, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .delete_auth_requests
            .push(locators.to_vec());
        let protected = self.protected.lock().unwrap();
        let needed = self.require_delete_consent
            || (self.offer_consent_for_protected
                && locators.iter().all(|l| protected.contains(l)));
        Ok(self.consent(needed, locators))
    }

    fn request_write_authorization(
        &self,
        locators: &[String],
    ) -> Result<Option<AuthorizationRequest>, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .write_auth_requests
            .push(locators.to_vec());
        Ok(self.consent(self.require_write_consent, locators))
    }
}
