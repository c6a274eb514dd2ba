//! Two-phase commit: delete discarded photos, then edit or export kept ones.
//!
//! 1. Delete phase: every `Discard` photo is removed. When the OS wants
//!    consent the phase pauses with a pending `Delete` authorization; a grant
//!    means the OS already deleted the files.
//! 2. Edit phase: `Keep` photos are rotated/cropped and written back. In
//!    overwrite mode only rotated photos are touched; copy mode exports all
//!    of them. Overwrite mode may pause on a pending `Edit` authorization.
//!
//! Per-photo failures are logged and skipped. Only authorization denial
//! aborts, back to the summary screen.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    blocking, CommitProgress, EditingSession, PendingAuthorization, Screen, SessionError,
};
use crate::config::ExportMode;
use crate::gateway::{
    AuthorizationRequest, GatewayError, MediaGateway, PendingAction, PersistenceGateway,
};
use crate::model::{Decision, Photo};
use crate::transform::{apply_edit, InterpolationFilter, TransformError};

const STATUS_DENIED: &str = "Changes could not be applied";

/// Totals of a finished commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitReport {
    pub deleted: usize,
    /// Deletes that returned `false` or failed.
    pub delete_failed: usize,
    /// Photos written successfully (overwritten or exported).
    pub processed: usize,
    /// Photos skipped because loading, editing or writing failed.
    pub failed: usize,
    /// Locators of newly exported photos (copy mode).
    pub exported: Vec<String>,
}

/// How a commit call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Both phases done, session removed.
    Completed(CommitReport),
    /// Waiting for the user; answer with `on_permission_granted` or
    /// `on_permission_denied`.
    AuthorizationPending(PendingAuthorization),
    /// The user refused, or consent was needed but unavailable.
    Aborted,
}

#[derive(Debug, Error)]
enum PhotoError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Where one photo goes.
struct EditPlan {
    mode: ExportMode,
    filter: InterpolationFilter,
    file_name_hint: String,
    destination_folder: String,
}

/// Load, edit and write one photo. Returns the new locator in copy mode.
///
/// Decoded buffers are dropped as soon as the next stage has its own copy.
fn apply_to_resource<M: MediaGateway>(
    media: &M,
    photo: &Photo,
    plan: &EditPlan,
) -> Result<Option<String>, PhotoError> {
    let source = media
        .load_image(&photo.locator)
        .ok_or_else(|| GatewayError::ResourceUnavailable(photo.locator.clone()))?;

    let edited = if photo.is_rotated() {
        let output = apply_edit(&source, photo.rotation, 1.0, plan.filter)?;
        drop(source);
        output
    } else {
        source
    };

    match plan.mode {
        ExportMode::Overwrite => {
            media.overwrite_image(&photo.locator, &edited)?;
            Ok(None)
        }
        ExportMode::CopyToAlbum => {
            let locator = media.save_image_to_new_location(
                &edited,
                &plan.file_name_hint,
                &plan.destination_folder,
            )?;
            Ok(Some(locator))
        }
    }
}

impl<P, M> EditingSession<P, M>
where
    P: PersistenceGateway,
    M: MediaGateway,
{
    /// Apply the session to the device.
    pub async fn commit(&mut self) -> Result<CommitOutcome, SessionError> {
        if self.screen != Screen::Summary {
            return Err(self.invalid_state("Summary"));
        }
        let deletions_applied = self
            .active
            .as_ref()
            .map(|a| a.deletions_applied)
            .ok_or(SessionError::NoActiveSession)?;

        self.screen = Screen::Committing;
        self.is_loading = true;
        self.report = CommitReport::default();
        self.progress = None;
        self.status = Some("Applying changes".to_string());
        self.publish();

        let result = if deletions_applied {
            info!("Delete phase already applied, going straight to edits");
            self.run_edit_phase().await
        } else {
            self.run_delete_phase().await
        };
        self.settle(result)
    }

    /// Resume the paused phase after the user agreed.
    pub async fn on_permission_granted(&mut self) -> Result<CommitOutcome, SessionError> {
        let pending = self.pending.take().ok_or(SessionError::NoPendingAuthorization)?;
        info!("Permission granted for {:?}", pending.action);

        self.is_loading = true;
        self.status = Some("Applying changes".to_string());
        self.publish();

        let result = match pending.action {
            PendingAction::Delete => {
                // The OS performed the deletes itself
                self.report.deleted += pending.request.locators.len();
                if let Some(active) = self.active.as_mut() {
                    active.deleted.extend(pending.request.locators);
                }
                self.finish_delete_phase().await
            }
            PendingAction::Edit => {
                let targets = self.edit_targets();
                self.process_edits(targets).await
            }
        };
        self.settle(result)
    }

    /// Abort the commit after the user refused.
    pub async fn on_permission_denied(&mut self) -> Result<CommitOutcome, SessionError> {
        let pending = self.pending.take().ok_or(SessionError::NoPendingAuthorization)?;
        warn!("Permission denied for {:?}", pending.action);
        Ok(self.abort())
    }

    async fn run_delete_phase(&mut self) -> Result<CommitOutcome, SessionError> {
        let (done, locators): (Vec<String>, Vec<String>) = {
            let deleted = self.active.as_ref().map(|a| &a.deleted);
            self.locators_with(Decision::Discard)
                .into_iter()
                .partition(|l| deleted.is_some_and(|d| d.contains(l)))
        };
        // Removed by an earlier attempt that stopped for consent
        self.report.deleted += done.len();
        if locators.is_empty() {
            return self.finish_delete_phase().await;
        }
        info!(
            "Delete phase: {} photos ({} already deleted)",
            locators.len(),
            done.len()
        );

        let request_for = locators.clone();
        let request = blocking(&self.media, move |m| {
            m.request_delete_authorization(&request_for)
        })
        .await?;
        if let Some(request) = request {
            return Ok(self.pause(PendingAction::Delete, request));
        }

        let mut needs_consent = Vec::new();
        for locator in locators {
            let target = locator.clone();
            let outcome = blocking(&self.media, move |m| Ok(m.delete_resource(&target))).await?;
            match outcome {
                Ok(true) => {
                    debug!("Deleted {}", locator);
                    self.report.deleted += 1;
                    if let Some(active) = self.active.as_mut() {
                        active.deleted.insert(locator);
                    }
                }
                Ok(false) => {
                    warn!("Nothing deleted for {}", locator);
                    self.report.delete_failed += 1;
                }
                Err(GatewayError::AuthorizationRequired) => needs_consent.push(locator),
                Err(e) => {
                    warn!("Failed to delete {}: {}", locator, e);
                    self.report.delete_failed += 1;
                }
            }
        }

        if !needs_consent.is_empty() {
            info!("{} deletes need consent", needs_consent.len());
            let request = blocking(&self.media, move |m| {
                m.request_delete_authorization(&needs_consent)
            })
            .await?;
            return Ok(match request {
                Some(request) => self.pause(PendingAction::Delete, request),
                None => {
                    warn!("Deletes need consent but no authorization request is available");
                    self.abort()
                }
            });
        }

        self.finish_delete_phase().await
    }

    async fn finish_delete_phase(&mut self) -> Result<CommitOutcome, SessionError> {
        let id = self.active.as_ref().ok_or(SessionError::NoActiveSession)?.id;
        blocking(&self.persistence, move |p| p.mark_session_finalized(id)).await?;
        if let Some(active) = self.active.as_mut() {
            active.deletions_applied = true;
        }
        self.run_edit_phase().await
    }

    async fn run_edit_phase(&mut self) -> Result<CommitOutcome, SessionError> {
        let targets = self.edit_targets();
        if targets.is_empty() {
            return self.finish_commit().await;
        }
        info!(
            "Edit phase: {} photos ({:?})",
            targets.len(),
            self.config.export_mode
        );

        if self.config.export_mode == ExportMode::Overwrite {
            let locators: Vec<String> = targets.iter().map(|p| p.locator.clone()).collect();
            let request = blocking(&self.media, move |m| {
                m.request_write_authorization(&locators)
            })
            .await?;
            if let Some(request) = request {
                return Ok(self.pause(PendingAction::Edit, request));
            }
        }

        self.process_edits(targets).await
    }

    /// Write each target one at a time, publishing progress after each.
    async fn process_edits(&mut self, targets: Vec<Photo>) -> Result<CommitOutcome, SessionError> {
        let total = targets.len();
        for (index, photo) in targets.into_iter().enumerate() {
            let plan = EditPlan {
                mode: self.config.export_mode,
                filter: self.config.filter,
                file_name_hint: self.config.naming.file_name_hint(index + 1, &photo.locator),
                destination_folder: self.config.destination_folder.clone(),
            };
            let locator = photo.locator.clone();

            let result =
                blocking(&self.media, move |m| Ok(apply_to_resource(m, &photo, &plan))).await?;
            match result {
                Ok(exported) => {
                    debug!("Wrote {}", exported.as_deref().unwrap_or(&locator));
                    self.report.processed += 1;
                    self.report.exported.extend(exported);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", locator, e);
                    self.report.failed += 1;
                }
            }

            self.progress = Some(CommitProgress {
                processed: index + 1,
                total,
                message: format!("Processed {} of {}", index + 1, total),
            });
            self.publish();
        }

        self.finish_commit().await
    }

    async fn finish_commit(&mut self) -> Result<CommitOutcome, SessionError> {
        let id = self.active.as_ref().ok_or(SessionError::NoActiveSession)?.id;
        blocking(&self.persistence, move |p| p.delete_session(id)).await?;

        let report = std::mem::take(&mut self.report);
        info!(
            "Commit of session {} done: {} deleted, {} written, {} failed",
            id, report.deleted, report.processed, report.failed
        );

        if report.processed > 0 {
            self.cache_version = Utc::now().timestamp_millis().max(self.cache_version + 1);
        }
        self.active = None;
        self.pending = None;
        self.progress = None;
        self.is_loading = false;
        self.used_locators = Arc::default();
        self.status = Some("Changes applied".to_string());
        self.screen = Screen::Home;
        self.publish();

        Ok(CommitOutcome::Completed(report))
    }

    fn pause(&mut self, action: PendingAction, request: AuthorizationRequest) -> CommitOutcome {
        info!(
            "Waiting for {:?} permission on {} photos",
            action,
            request.locators.len()
        );
        let pending = PendingAuthorization { action, request };
        self.pending = Some(pending.clone());
        self.is_loading = false;
        self.status = Some("Waiting for permission".to_string());
        self.publish();
        CommitOutcome::AuthorizationPending(pending)
    }

    fn abort(&mut self) -> CommitOutcome {
        self.pending = None;
        self.progress = None;
        self.is_loading = false;
        self.status = Some(STATUS_DENIED.to_string());
        self.screen = Screen::Summary;
        self.publish();
        CommitOutcome::Aborted
    }

    /// Return to the summary when a phase fails outright.
    fn settle(
        &mut self,
        result: Result<CommitOutcome, SessionError>,
    ) -> Result<CommitOutcome, SessionError> {
        if let Err(e) = &result {
            error!("Commit failed: {}", e);
            self.pending = None;
            self.progress = None;
            self.is_loading = false;
            self.status = Some(format!("{}: {}", STATUS_DENIED, e));
            if self.active.is_some() {
                self.screen = Screen::Summary;
            }
            self.publish();
        }
        result
    }

    fn locators_with(&self, decision: Decision) -> Vec<String> {
        self.active
            .iter()
            .flat_map(|a| a.photos.iter())
            .filter(|p| p.decision == decision)
            .map(|p| p.locator.clone())
            .collect()
    }

    fn edit_targets(&self) -> Vec<Photo> {
        let overwrite = self.config.export_mode == ExportMode::Overwrite;
        self.active
            .iter()
            .flat_map(|a| a.photos.iter())
            .filter(|p| p.decision == Decision::Keep)
            .filter(|p| !overwrite || p.is_rotated())
            .cloned()
            .collect()
    }
}
