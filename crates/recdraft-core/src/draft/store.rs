//! JSON adapter over a [`KeyValueStorage`].
//!
//! Autosave is a best-effort convenience: every storage or serialization
//! failure stops here, gets logged, and reads as "no draft".

use super::key::DraftKey;
use super::marker::{DraftMarker, DraftOffer};
use super::storage::KeyValueStorage;
use crate::record::{RecordId, RecordKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Draft store shared between an edit session and its autosave pump.
#[derive(Clone)]
pub struct DraftStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl DraftStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Serializes `value` and writes it under `key`.
    ///
    /// Returns whether the write landed. Failures are logged, never raised.
    pub fn put<T: Serialize + ?Sized>(&self, key: &DraftKey, value: &T) -> bool {
        let key = key.to_string();
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(target: "draft_store", "Failed to serialize draft {}: {}", key, e);
                return false;
            }
        };

        match self.storage.set_item(&key, &json) {
            Ok(()) => true,
            Err(e) if e.is_storage_failure() => {
                tracing::warn!(target: "draft_store", "Failed to write draft {}: {}", key, e);
                false
            }
            Err(e) => {
                tracing::error!(target: "draft_store", "Unexpected error writing draft {}: {}", key, e);
                false
            }
        }
    }

    /// Reads and deserializes `key`.
    ///
    /// Absent, unreadable and corrupt entries all come back as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &DraftKey) -> Option<T> {
        let key = key.to_string();
        let raw = match self.storage.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(target: "draft_store", "Failed to read draft {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(target: "draft_store", "Ignoring corrupt draft {}: {}", key, e);
                None
            }
        }
    }

    /// Returns true if `key` holds any stored string, parseable or not.
    pub fn contains(&self, key: &DraftKey) -> bool {
        matches!(self.storage.get_item(&key.to_string()), Ok(Some(_)))
    }

    /// Deletes `key`. Absent keys and storage failures are both no-ops.
    pub fn remove(&self, key: &DraftKey) {
        let key = key.to_string();
        if let Err(e) = self.storage.remove_item(&key) {
            tracing::warn!(target: "draft_store", "Failed to remove draft {}: {}", key, e);
        }
    }

    /// Stored keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        match self.storage.keys() {
            Ok(keys) => {
                let mut matching: Vec<String> =
                    keys.into_iter().filter(|k| k.starts_with(prefix)).collect();
                matching.sort();
                matching
            }
            Err(e) => {
                tracing::warn!(target: "draft_store", "Failed to list draft keys: {}", e);
                Vec::new()
            }
        }
    }

    /// Deletes a raw key. Used by tooling that lists keys by prefix.
    pub fn remove_raw(&self, key: &str) {
        if let Err(e) = self.storage.remove_item(key) {
            tracing::warn!(target: "draft_store", "Failed to remove draft {}: {}", key, e);
        }
    }

    /// Reads the marker of `kind`, if it is readable.
    pub fn marker(&self, kind: RecordKind) -> Option<DraftMarker> {
        self.get(&DraftKey::marker(kind))
    }

    /// Returns the restore offer for `record_id`, if its marker matches.
    ///
    /// A marker naming any other record is stale and yields `None`, as does a
    /// marker with no section snapshot left to restore.
    pub fn offer_for(&self, kind: RecordKind, record_id: RecordId) -> Option<DraftOffer> {
        let marker = self.marker(kind)?;
        if marker.record_id != record_id {
            tracing::debug!(
                target: "draft_store",
                "Ignoring {} draft marker for record {} while loading {}",
                kind,
                marker.record_id,
                record_id
            );
            return None;
        }

        let sections: Vec<_> = kind
            .sections()
            .iter()
            .filter(|name| self.contains(&DraftKey::section(kind, record_id, **name)))
            .map(|name| name.to_string())
            .collect();
        if sections.is_empty() {
            tracing::debug!(
                target: "draft_store",
                "Marker for {} {} has no snapshots behind it",
                kind,
                record_id
            );
            return None;
        }

        Some(DraftOffer {
            record_id,
            saved_at: marker.saved_at,
            writer: marker.writer,
            sections,
        })
    }

    /// Records of `kind` that have at least one draft entry, ascending.
    pub fn record_ids(&self, kind: RecordKind) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self
            .keys_with_prefix(&DraftKey::kind_prefix(kind))
            .iter()
            .filter_map(|raw| DraftKey::parse(raw)?.record_id())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Removes every draft entry of one record.
    ///
    /// The kind's marker is only removed when it names `record_id`; a marker
    /// for another record belongs to someone else's draft.
    pub fn clear_record(&self, kind: RecordKind, record_id: RecordId) {
        for key in self.keys_with_prefix(&DraftKey::record_prefix(kind, record_id)) {
            self.remove_raw(&key);
        }
        for section in kind.sections() {
            self.remove(&DraftKey::section(kind, record_id, *section));
        }
        self.remove(&DraftKey::validity(kind, record_id));

        let marker_key = DraftKey::marker(kind);
        match self.marker(kind) {
            Some(marker) if marker.record_id != record_id => {}
            Some(_) => self.remove(&marker_key),
            // Unreadable markers cannot be attributed; drop them with the rest
            None => self.remove(&marker_key),
        }
    }
}
