use super::collaborator::{ErrorReporter, FormBinding};
use super::state::{EditMode, EditSessionState};
use crate::autosave::{AutosavePump, TickReport};
use crate::config::AutosaveConfig;
use crate::draft::{DraftKey, DraftOffer, DraftStore};
use crate::error::{DraftError, Result};
use crate::record::{Record, RecordId, RecordKind, SavePayload, SectionName};
use crate::section::{SectionRegistry, ValidityBundle};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Result of a save attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// At least one section is invalid. Nothing was submitted; each section's
    /// own indicator shows what is wrong.
    Blocked { invalid_sections: Vec<SectionName> },
    /// Hand this payload to the record source, then report back through
    /// `on_save_succeeded` or `on_save_failed`.
    Submit(SavePayload),
}

/// Answer to the host's "about to unload" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadDecision {
    Proceed,
    /// Ask the user before leaving. The autosaved draft stays either way.
    ConfirmRequired,
}

/// The single authority for one record-editing page.
///
/// `EditSession` is responsible for:
/// - View/edit mode transitions
/// - Initializing and discarding sections
/// - Starting and stopping the autosave pump
/// - Detecting, restoring and discarding drafts
/// - Gating save on aggregated section validity
pub struct EditSession {
    kind: RecordKind,
    store: DraftStore,
    pump: AutosavePump,
    state: EditSessionState,
    /// The record as last loaded or saved
    record: Option<Record>,
    /// Present only while editing
    sections: SectionRegistry,
    pending_offer: Option<DraftOffer>,
    /// Record of the last submitted payload; survives leaving edit mode
    in_flight: Option<RecordId>,
    form_binding: Option<Arc<dyn FormBinding>>,
    error_reporter: Option<Arc<dyn ErrorReporter>>,
}

impl EditSession {
    /// Creates a viewing session for one record kind.
    ///
    /// Each session gets a fresh writer token that tags the drafts it writes.
    pub fn new(kind: RecordKind, store: DraftStore, config: &AutosaveConfig) -> Self {
        Self {
            kind,
            store,
            pump: AutosavePump::new(config, Uuid::new_v4()),
            state: EditSessionState::default(),
            record: None,
            sections: SectionRegistry::empty(),
            pending_offer: None,
            in_flight: None,
            form_binding: None,
            error_reporter: None,
        }
    }

    pub fn with_form_binding(mut self, binding: Arc<dyn FormBinding>) -> Self {
        self.form_binding = Some(binding);
        self
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = Some(reporter);
        self
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn state(&self) -> EditSessionState {
        self.state
    }

    pub fn mode(&self) -> EditMode {
        self.state.mode
    }

    pub fn is_editing(&self) -> bool {
        self.state.mode == EditMode::Editing
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn sections(&self) -> &SectionRegistry {
        &self.sections
    }

    pub fn pending_offer(&self) -> Option<&DraftOffer> {
        self.pending_offer.as_ref()
    }

    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    pub fn writer(&self) -> Uuid {
        self.pump.writer()
    }

    pub fn is_autosave_running(&self) -> bool {
        self.pump.is_running()
    }

    /// Epoch of the running pump; timers must pass it back to `autosave_tick`.
    pub fn autosave_epoch(&self) -> u64 {
        self.pump.epoch()
    }

    // ============================================================================
    // Record load and restore
    // ============================================================================

    /// Adopts a freshly loaded record and looks for a matching draft.
    ///
    /// A draft is only offered when the kind's marker names this record. The
    /// draft is never applied here; the restore prompt opens instead.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the record is of another kind.
    pub fn on_record_loaded(&mut self, record: Record) -> Result<Option<DraftOffer>> {
        self.ensure_kind(&record)?;

        if self.is_editing() {
            let same = self.record.as_ref().is_some_and(|r| r.id == record.id);
            if same {
                tracing::debug!(
                    target: "edit_session",
                    "Record {} {} reloaded while editing, keeping sections",
                    self.kind,
                    record.id
                );
                self.record = Some(record);
                return Ok(None);
            }
            // Navigated to another record: drafts stay as the safety net
            self.end_edit();
        }

        let offer = self.store.offer_for(self.kind, record.id);
        self.state.is_restore_prompt_open = offer.is_some();
        if let Some(offer) = &offer {
            tracing::info!(
                target: "edit_session",
                "Found draft for {} {} saved at {} ({} section(s))",
                self.kind,
                record.id,
                offer.saved_at,
                offer.sections.len()
            );
        }
        self.pending_offer = offer.clone();
        self.record = Some(record);
        Ok(offer)
    }

    /// Restores the offered draft and enters edit mode.
    ///
    /// Sections are first re-initialized from the record, then each stored
    /// field is written individually and forwarded to the form binding.
    /// Restored sections are dirty and get their saved validity back.
    ///
    /// # Returns
    ///
    /// The names of the sections that were restored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if no restore prompt is open.
    pub fn accept_restore(&mut self) -> Result<Vec<SectionName>> {
        if !self.state.is_restore_prompt_open {
            return Err(DraftError::invalid_state("No restore prompt is open"));
        }
        let record = self
            .record
            .clone()
            .ok_or_else(|| DraftError::invalid_state("No record loaded"))?;

        self.enter_edit(record.clone())?;

        let validity: ValidityBundle = self
            .store
            .get(&DraftKey::validity(self.kind, record.id))
            .unwrap_or_default();

        let mut restored = Vec::new();
        for name in self.sections.names() {
            let key = DraftKey::section(self.kind, record.id, &name);
            let Some(Value::Object(fields)) = self.store.get::<Value>(&key) else {
                continue;
            };
            let Some(section) = self.sections.get_mut(&name) else {
                continue;
            };

            for (field, value) in fields {
                if let Some(binding) = &self.form_binding {
                    binding.field_changed(&name, &field, &value);
                }
                section.set_field(field, value);
            }
            section.set_dirty(true);
            if let Some(valid) = validity.get(&name) {
                section.set_valid(*valid);
            }
            restored.push(name);
        }

        self.state.is_restore_prompt_open = false;
        self.pending_offer = None;
        tracing::info!(
            target: "edit_session",
            "Restored {} section(s) of {} {}",
            restored.len(),
            self.kind,
            record.id
        );
        Ok(restored)
    }

    /// Discards the draft of the loaded record. Calling it again is harmless.
    pub fn decline_restore(&mut self) -> Result<()> {
        if let Some(record) = &self.record {
            self.store.clear_record(self.kind, record.id);
            tracing::info!(
                target: "edit_session",
                "Discarded draft of {} {}",
                self.kind,
                record.id
            );
        }
        self.state.is_restore_prompt_open = false;
        self.pending_offer = None;
        Ok(())
    }

    // ============================================================================
    // Mode transitions
    // ============================================================================

    /// Initializes every section from `record` and starts autosave.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the record is of another kind.
    pub fn enter_edit(&mut self, record: Record) -> Result<()> {
        self.ensure_kind(&record)?;

        self.sections = SectionRegistry::from_record(&record);
        self.record = Some(record);
        self.state.mode = EditMode::Editing;
        self.state.is_save_attempted = false;
        self.state.is_save_pending = false;
        let epoch = self.pump.start();

        tracing::info!(
            target: "edit_session",
            "Editing {} {} (autosave epoch {})",
            self.kind,
            self.record_id_display(),
            epoch
        );
        Ok(())
    }

    /// Enters edit mode for the already loaded record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if no record is loaded.
    pub fn begin_edit(&mut self) -> Result<()> {
        let record = self
            .record
            .clone()
            .ok_or_else(|| DraftError::invalid_state("No record loaded"))?;
        self.enter_edit(record)
    }

    /// Leaves edit mode and throws the draft away. Always succeeds.
    pub fn cancel(&mut self) {
        if let Some(record) = &self.record {
            self.store.clear_record(self.kind, record.id);
        }
        self.end_edit();
        tracing::info!(
            target: "edit_session",
            "Cancelled editing {} {}",
            self.kind,
            self.record_id_display()
        );
    }

    /// Stops autosave and drops sections but keeps drafts on disk.
    ///
    /// This is what unmounting the page does; the draft is recovered on the
    /// next load.
    pub fn end_edit(&mut self) {
        self.pump.stop();
        self.sections.clear();
        self.state.mode = EditMode::Viewing;
        self.state.is_save_attempted = false;
        self.state.is_save_pending = false;
    }

    // ============================================================================
    // Save
    // ============================================================================

    /// Validates all sections and builds the save payload.
    ///
    /// An invalid section blocks the save locally; this is not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when not editing or when a previous submission
    /// has not been answered yet.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        if !self.is_editing() {
            return Err(DraftError::invalid_state("Save requires edit mode"));
        }
        if self.state.is_save_pending {
            return Err(DraftError::invalid_state("A save is already pending"));
        }
        self.state.is_save_attempted = true;

        if !self.sections.all_valid() {
            let invalid_sections = self.sections.invalid_sections();
            tracing::debug!(
                target: "edit_session",
                "Save blocked by invalid section(s): {:?}",
                invalid_sections
            );
            return Ok(SaveOutcome::Blocked { invalid_sections });
        }

        let record_id = self
            .record
            .as_ref()
            .map(|r| r.id)
            .ok_or_else(|| DraftError::invalid_state("No record loaded"))?;

        let mut values = BTreeMap::new();
        let mut sections = Vec::new();
        for section in self.sections.iter().filter(|s| s.is_dirty()) {
            values.insert(section.name().to_string(), section.values().clone());
            sections.push(section.name().to_string());
        }

        self.state.is_save_pending = true;
        self.in_flight = Some(record_id);
        Ok(SaveOutcome::Submit(SavePayload {
            kind: self.kind,
            record_id,
            sections,
            values,
        }))
    }

    /// The record source accepted the save.
    ///
    /// A success arriving after `cancel` for the submitted record is still
    /// adopted; the backend has committed it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if nothing was submitted for this record.
    pub fn on_save_succeeded(&mut self, saved: Record) -> Result<()> {
        self.ensure_kind(&saved)?;
        if !self.state.is_save_pending {
            if self.in_flight.take() == Some(saved.id) {
                return self.adopt_late_save(saved);
            }
            return Err(DraftError::invalid_state("No save is pending"));
        }
        self.in_flight = None;

        if let Some(previous) = &self.record {
            self.store.clear_record(self.kind, previous.id);
        }
        self.store.clear_record(self.kind, saved.id);
        self.end_edit();
        tracing::info!(target: "edit_session", "Saved {} {}", self.kind, saved.id);
        self.record = Some(saved);
        Ok(())
    }

    /// The record source rejected the save.
    ///
    /// The session stays in edit mode and keeps every draft. The error goes to
    /// the error reporter when one is attached.
    pub fn on_save_failed(&mut self, error: &DraftError) {
        self.state.is_save_pending = false;
        self.in_flight = None;
        tracing::warn!(
            target: "edit_session",
            "Saving {} {} failed: {}",
            self.kind,
            self.record_id_display(),
            error
        );
        if let Some(reporter) = &self.error_reporter {
            reporter.report(error);
        }
    }

    // ============================================================================
    // Section updates pushed in by the form layer
    // ============================================================================

    /// Sets a section's dirty flag.
    ///
    /// # Returns
    ///
    /// `true` when the section just turned from clean to dirty.
    pub fn set_dirty(&mut self, section: &str, dirty: bool) -> Result<bool> {
        let was_dirty = self.section_mut(section)?.set_dirty(dirty);
        Ok(dirty && !was_dirty)
    }

    pub fn set_valid(&mut self, section: &str, valid: bool) -> Result<()> {
        self.section_mut(section)?.set_valid(valid);
        Ok(())
    }

    pub fn set_field(&mut self, section: &str, field: &str, value: Value) -> Result<()> {
        self.section_mut(section)?.set_field(field, value);
        Ok(())
    }

    pub fn set_values(&mut self, section: &str, values: Value) -> Result<()> {
        self.section_mut(section)?.set_values(values);
        Ok(())
    }

    // ============================================================================
    // Autosave and unload
    // ============================================================================

    /// Runs one autosave tick for a timer started at `epoch`.
    ///
    /// Returns `None` without touching storage when the pump has been
    /// stopped or restarted since.
    pub fn autosave_tick(&mut self, epoch: u64) -> Option<TickReport> {
        if !self.pump.accepts(epoch) || !self.is_editing() {
            return None;
        }
        let record_id = self.record.as_ref()?.id;
        Some(
            self.pump
                .tick(self.kind, record_id, &self.sections, &self.store),
        )
    }

    pub fn before_unload(&self) -> UnloadDecision {
        if self.is_editing() && self.sections.any_dirty() {
            UnloadDecision::ConfirmRequired
        } else {
            UnloadDecision::Proceed
        }
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    fn section_mut(&mut self, name: &str) -> Result<&mut crate::section::Section> {
        if !self.is_editing() {
            return Err(DraftError::invalid_state(format!(
                "Section '{}' is not editable outside edit mode",
                name
            )));
        }
        self.sections
            .get_mut(name)
            .ok_or_else(|| DraftError::not_found("section", name))
    }

    /// The backend committed a save the user walked away from.
    ///
    /// The saved record replaces the loaded one when they are the same
    /// record. Its drafts are cleared unless a new edit of it is under way.
    fn adopt_late_save(&mut self, saved: Record) -> Result<()> {
        tracing::info!(
            target: "edit_session",
            "Save of {} {} completed after editing ended",
            self.kind,
            saved.id
        );
        let current = self.record.as_ref().map(|r| r.id);
        if !(self.is_editing() && current == Some(saved.id)) {
            self.store.clear_record(self.kind, saved.id);
        }
        if current.is_none_or(|id| id == saved.id) {
            self.record = Some(saved);
        }
        Ok(())
    }

        fn ensure_kind(&self, record: &Record) -> Result<()> {
        if record.kind != self.kind {
            return Err(DraftError::invalid_state(format!(
                "Session edits {} records, got {}",
                self.kind, record.kind
            )));
        }
        Ok(())
    }

    fn record_id_display(&self) -> String {
        self.record
            .as_ref()
            .map(|r| r.id.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}
