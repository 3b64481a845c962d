//! Autosave pump.
//!
//! The pump decides, once per tick, which draft entries should exist for the
//! edited record. It owns no timer: the application layer drives `tick` from
//! a tokio interval and honours `epoch` so a stopped pump never writes.

use crate::config::AutosaveConfig;
use crate::draft::{DraftKey, DraftMarker, DraftStore};
use crate::record::{RecordId, RecordKind, SectionName};
use crate::section::SectionRegistry;
use chrono::Utc;
use uuid::Uuid;

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Dirty sections whose snapshot was written.
    pub dirty_sections: Vec<SectionName>,
    /// Dirty sections the storage refused. They do not count toward the marker.
    pub unsaved_sections: Vec<SectionName>,
    pub marker_written: bool,
    /// Another writer replaced our marker since our previous tick.
    pub foreign_writer: Option<Uuid>,
}

#[derive(Debug)]
pub struct AutosavePump {
    writer: Uuid,
    persist_validity: bool,
    running: bool,
    epoch: u64,
    revision: u64,
    last_written: Option<DraftMarker>,
}

impl AutosavePump {
    pub fn new(config: &AutosaveConfig, writer: Uuid) -> Self {
        Self {
            writer,
            persist_validity: config.persist_validity,
            running: false,
            epoch: 0,
            revision: 0,
            last_written: None,
        }
    }

    /// Starts the pump and returns the new epoch.
    pub fn start(&mut self) -> u64 {
        self.running = true;
        self.epoch += 1;
        self.last_written = None;
        tracing::debug!(target: "autosave", "Pump started (epoch {})", self.epoch);
        self.epoch
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(target: "autosave", "Pump stopped (epoch {})", self.epoch);
        }
        self.running = false;
        self.last_written = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn writer(&self) -> Uuid {
        self.writer
    }

    /// Returns true if a timer started at `epoch` may still tick.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.running && self.epoch == epoch
    }

    /// Writes or clears every draft entry of one record.
    ///
    /// All section entries are settled before the marker is touched. Only
    /// snapshots that actually landed count, so the marker never exists
    /// without at least one snapshot written by the same tick.
    pub fn tick(
        &mut self,
        kind: RecordKind,
        record_id: RecordId,
        sections: &SectionRegistry,
        store: &DraftStore,
    ) -> TickReport {
        let mut report = TickReport::default();

        for section in sections.iter() {
            let key = DraftKey::section(kind, record_id, section.name());
            if !section.is_dirty() {
                store.remove(&key);
            } else if store.put(&key, section.values()) {
                report.dirty_sections.push(section.name().to_string());
            } else {
                report.unsaved_sections.push(section.name().to_string());
            }
        }

        if !report.unsaved_sections.is_empty() {
            tracing::warn!(
                target: "autosave",
                "Storage refused {} snapshot(s) of {} {}: {:?}",
                report.unsaved_sections.len(),
                kind,
                record_id,
                report.unsaved_sections
            );
        }

        let marker_key = DraftKey::marker(kind);
        let validity_key = DraftKey::validity(kind, record_id);
        let existing = store.marker(kind);

        if let (Some(found), Some(ours)) = (&existing, &self.last_written)
            && found.record_id == record_id
            && found != ours
            && found.writer != self.writer
        {
            tracing::warn!(
                target: "autosave",
                "Draft of {} {} was overwritten by another session ({}); last write wins",
                kind,
                record_id,
                found.writer
            );
            report.foreign_writer = Some(found.writer);
        }

        if report.dirty_sections.is_empty() {
            if existing.as_ref().is_none_or(|m| m.record_id == record_id) {
                store.remove(&marker_key);
            }
            store.remove(&validity_key);
            self.last_written = None;
        } else {
            self.revision += 1;
            let marker = DraftMarker {
                record_id,
                writer: self.writer,
                revision: self.revision,
                saved_at: Utc::now(),
            };
            report.marker_written = store.put(&marker_key, &marker);
            if self.persist_validity {
                store.put(&validity_key, &sections.validity_bundle());
            } else {
                store.remove(&validity_key);
            }
            self.last_written = Some(marker);
        }

        tracing::debug!(
            target: "autosave",
            "Tick for {} {}: {} dirty section(s)",
            kind,
            record_id,
            report.dirty_sections.len()
        );
        report
    }
}
