//! Inspection and cleanup of stored drafts.

use anyhow::{Result, bail};
use recdraft_core::draft::{DraftKey, DraftStore};
use recdraft_core::record::{RecordId, RecordKind};
use serde_json::Value;
use std::fmt::Write as _;
use strum::IntoEnumIterator;

/// Summarizes drafts per kind: the marker and every record with entries.
pub fn list(store: &DraftStore, kind: Option<RecordKind>) -> String {
    let mut out = String::new();
    let kinds: Vec<RecordKind> = match kind {
        Some(kind) => vec![kind],
        None => RecordKind::iter().collect(),
    };

    for kind in kinds {
        let ids = store.record_ids(kind);
        let marker = store.marker(kind);
        if ids.is_empty() && marker.is_none() {
            continue;
        }

        let _ = writeln!(out, "{kind}");
        match &marker {
            Some(marker) => {
                let _ = writeln!(
                    out,
                    "  marker: record {} saved {} (revision {}, writer {})",
                    marker.record_id, marker.saved_at, marker.revision, marker.writer
                );
            }
            None => {
                let _ = writeln!(out, "  marker: none");
            }
        }

        for id in ids {
            let sections = stored_sections(store, kind, id);
            let recoverable = marker.as_ref().is_some_and(|m| m.record_id == id);
            let _ = writeln!(
                out,
                "  {}: {}{}",
                id,
                if sections.is_empty() {
                    "(no sections)".to_string()
                } else {
                    sections.join(", ")
                },
                if recoverable { "" } else { " [orphaned]" }
            );
        }
    }

    if out.is_empty() {
        out.push_str("No drafts stored\n");
    }
    out
}

/// Renders the offer and every stored entry of one record.
pub fn show(store: &DraftStore, kind: RecordKind, id: RecordId) -> Result<String> {
    let sections = stored_sections(store, kind, id);
    let validity = store.get::<Value>(&DraftKey::validity(kind, id));
    if sections.is_empty() && validity.is_none() {
        bail!("No drafts stored for {kind} {id}");
    }

    let mut out = String::new();
    match store.offer_for(kind, id) {
        Some(offer) => {
            let _ = writeln!(out, "{kind} {id}: recoverable, saved {}", offer.saved_at);
        }
        None => {
            let _ = writeln!(out, "{kind} {id}: not recoverable (marker names another record)");
        }
    }

    for section in sections {
        let value = store
            .get::<Value>(&DraftKey::section(kind, id, section.as_str()))
            .unwrap_or(Value::Null);
        let _ = writeln!(out, "[{section}]");
        let _ = writeln!(out, "{}", serde_json::to_string_pretty(&value)?);
    }
    if let Some(validity) = validity {
        let _ = writeln!(out, "[validity]");
        let _ = writeln!(out, "{}", serde_json::to_string_pretty(&validity)?);
    }
    Ok(out)
}

/// Removes every draft entry of one record.
pub fn clear(store: &DraftStore, kind: RecordKind, id: RecordId) -> String {
    let before = store.keys_with_prefix(&DraftKey::record_prefix(kind, id)).len();
    store.clear_record(kind, id);
    tracing::info!("Cleared {} draft entries of {} {}", before, kind, id);
    format!("Cleared drafts of {kind} {id}\n")
}

fn stored_sections(store: &DraftStore, kind: RecordKind, id: RecordId) -> Vec<String> {
    kind.sections()
        .iter()
        .filter(|name| store.contains(&DraftKey::section(kind, id, **name)))
        .map(|name| name.to_string())
        .collect()
}
