//! Edit session service.
//!
//! This module provides the `EditSessionService` which connects an
//! [`EditSession`] to its [`RecordSource`] and runs the autosave timer while
//! the session is editing.

use crate::autosave_timer::AutosaveTimer;
use anyhow::{Result, anyhow};
use recdraft_core::config::AutosaveConfig;
use recdraft_core::draft::DraftOffer;
use recdraft_core::edit_session::{
    EditSession, EditSessionState, RestorePrompt, SaveOutcome, UnloadDecision,
};
use recdraft_core::record::{Record, RecordId, RecordSource, SectionName};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Orchestrates one record-editing page.
///
/// # Responsibilities
///
/// - Fetching records and surfacing draft offers
/// - Asking the restore prompt and applying its answer
/// - Submitting saves to the record source and reporting the result back
/// - Keeping exactly one autosave timer alive while editing
///
/// # Thread Safety
///
/// The session sits behind a tokio `Mutex` shared with the timer task. No
/// lock is held across a call into the record source or the restore prompt.
pub struct EditSessionService {
    session: Arc<Mutex<EditSession>>,
    source: Arc<dyn RecordSource>,
    config: AutosaveConfig,
    timer: Mutex<Option<AutosaveTimer>>,
}

impl EditSessionService {
    pub fn new(session: EditSession, source: Arc<dyn RecordSource>, config: AutosaveConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            source,
            config,
            timer: Mutex::new(None),
        }
    }

    /// Shared handle to the underlying session.
    pub fn session(&self) -> Arc<Mutex<EditSession>> {
        Arc::clone(&self.session)
    }

    pub async fn state(&self) -> EditSessionState {
        self.session.lock().await.state()
    }

    pub async fn record(&self) -> Option<Record> {
        self.session.lock().await.record().cloned()
    }

    // ============================================================================
    // Loading and restore
    // ============================================================================

    /// Fetches a record and checks it for a recoverable draft.
    ///
    /// # Returns
    ///
    /// The draft offer, if one exists and the prompt should be shown.
    pub async fn load_record(&self, id: RecordId) -> Result<Option<DraftOffer>> {
        let kind = self.session.lock().await.kind();
        let record = self.source.fetch(kind, id).await?;

        let offer = self.session.lock().await.on_record_loaded(record)?;
        self.sync_timer().await;
        Ok(offer)
    }

    /// Asks `prompt` about the pending draft offer and applies the answer.
    ///
    /// # Returns
    ///
    /// - `Ok(None)`: No offer was pending
    /// - `Ok(Some(sections))`: The answer was applied; `sections` lists what
    ///   was restored and is empty when the draft was discarded
    pub async fn resolve_restore(&self, prompt: &dyn RestorePrompt) -> Result<Option<Vec<SectionName>>> {
        let offer = self.session.lock().await.pending_offer().cloned();
        let Some(offer) = offer else {
            return Ok(None);
        };

        if prompt.confirm_restore(&offer).await {
            self.accept_restore().await.map(Some)
        } else {
            self.decline_restore().await?;
            Ok(Some(Vec::new()))
        }
    }

    pub async fn accept_restore(&self) -> Result<Vec<SectionName>> {
        let restored = self.session.lock().await.accept_restore()?;
        self.sync_timer().await;
        Ok(restored)
    }

    pub async fn decline_restore(&self) -> Result<()> {
        self.session.lock().await.decline_restore()?;
        Ok(())
    }

    // ============================================================================
    // Mode transitions
    // ============================================================================

    pub async fn begin_edit(&self) -> Result<()> {
        self.session.lock().await.begin_edit()?;
        self.sync_timer().await;
        Ok(())
    }

    pub async fn enter_edit(&self, record: Record) -> Result<()> {
        self.session.lock().await.enter_edit(record)?;
        self.sync_timer().await;
        Ok(())
    }

    /// Leaves edit mode and discards the draft.
    pub async fn cancel(&self) {
        self.session.lock().await.cancel();
        self.sync_timer().await;
    }

    /// Leaves edit mode and keeps the draft for the next load.
    pub async fn shutdown(&self) {
        self.session.lock().await.end_edit();
        self.sync_timer().await;
    }

    // ============================================================================
    // Section updates
    // ============================================================================

    pub async fn set_field(&self, section: &str, field: &str, value: Value) -> Result<()> {
        self.session.lock().await.set_field(section, field, value)?;
        Ok(())
    }

    pub async fn set_values(&self, section: &str, values: Value) -> Result<()> {
        self.session.lock().await.set_values(section, values)?;
        Ok(())
    }

    pub async fn set_valid(&self, section: &str, valid: bool) -> Result<()> {
        self.session.lock().await.set_valid(section, valid)?;
        Ok(())
    }

    /// Sets a section's dirty flag, scheduling an early tick on the clean to
    /// dirty edge.
    pub async fn set_dirty(&self, section: &str, dirty: bool) -> Result<()> {
        let edge = self.session.lock().await.set_dirty(section, dirty)?;
        if edge && let Some(timer) = self.timer.lock().await.as_ref() {
            timer.poke();
        }
        Ok(())
    }

    // ============================================================================
    // Save
    // ============================================================================

    /// Validates and submits the edited sections.
    ///
    /// A blocked save is returned as `Ok(SaveOutcome::Blocked)`. A rejected
    /// submission leaves the session editing with its drafts intact and is
    /// returned as the error.
    pub async fn save(&self) -> Result<SaveOutcome> {
        let outcome = self.session.lock().await.save()?;
        let SaveOutcome::Submit(payload) = &outcome else {
            return Ok(outcome);
        };

        tracing::debug!(
            target: "edit_session",
            "Submitting {} {} ({} section(s))",
            payload.kind,
            payload.record_id,
            payload.sections.len()
        );

        match self.source.update(payload).await {
            Ok(saved) => {
                self.session.lock().await.on_save_succeeded(saved)?;
                self.sync_timer().await;
                Ok(outcome)
            }
            Err(e) => {
                self.session.lock().await.on_save_failed(&e);
                Err(anyhow!(e))
            }
        }
    }

    pub async fn before_unload(&self) -> UnloadDecision {
        self.session.lock().await.before_unload()
    }

    /// Epoch of the running timer, if any.
    pub async fn timer_epoch(&self) -> Option<u64> {
        self.timer.lock().await.as_ref().map(AutosaveTimer::epoch)
    }

    /// Makes the timer match the session's pump: one task per pump epoch
    /// while running, none otherwise.
    async fn sync_timer(&self) {
        let (running, epoch) = {
            let session = self.session.lock().await;
            (session.is_autosave_running(), session.autosave_epoch())
        };

        let mut timer = self.timer.lock().await;
        if running && timer.as_ref().is_some_and(|t| t.epoch() == epoch) {
            return;
        }

        if let Some(old) = timer.take() {
            old.stop().await;
        }
        if running {
            *timer = Some(AutosaveTimer::spawn(
                Arc::clone(&self.session),
                epoch,
                self.config.interval(),
                self.config.debounce(),
            ));
        }
    }
}
