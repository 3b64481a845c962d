use super::*;
use crate::config::AutosaveConfig;
use crate::draft::{DraftKey, DraftMarker, DraftStore};
use crate::error::DraftError;
use crate::record::{Record, RecordId, RecordKind};
use crate::test_support::{MapStorage, lease, store};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

// Mock form binding that records every field write
#[derive(Default)]
struct RecordingBinding {
    changes: Mutex<Vec<(String, String, Value)>>,
}

impl FormBinding for RecordingBinding {
    fn field_changed(&self, section: &str, field: &str, value: &Value) {
        self.changes
            .lock()
            .unwrap()
            .push((section.to_string(), field.to_string(), value.clone()));
    }
}

// Mock error reporter
#[derive(Default)]
struct RecordingReporter {
    errors: Mutex<Vec<DraftError>>,
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &DraftError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

fn session(store: &DraftStore) -> EditSession {
    EditSession::new(RecordKind::Lease, store.clone(), &AutosaveConfig::default())
}

fn tick(session: &mut EditSession) -> crate::autosave::TickReport {
    let epoch = session.autosave_epoch();
    session.autosave_tick(epoch).expect("pump should accept its epoch")
}

fn write_marker(store: &DraftStore, record_id: i64) {
    store.put(
        &DraftKey::marker(RecordKind::Lease),
        &DraftMarker {
            record_id: RecordId(record_id),
            writer: uuid::Uuid::new_v4(),
            revision: 1,
            saved_at: chrono::Utc::now(),
        },
    );
}

fn lease_keys(storage: &MapStorage) -> Vec<String> {
    use crate::draft::KeyValueStorage;
    storage
        .keys()
        .unwrap()
        .into_iter()
        .filter(|k| k.starts_with("recdraft:lease:"))
        .collect()
}

#[test]
fn test_enter_edit_initializes_sections() {
    let (_, store) = store();
    let mut session = session(&store);

    session.enter_edit(lease(42)).unwrap();

    assert_eq!(session.mode(), EditMode::Editing);
    assert!(session.is_autosave_running());
    assert_eq!(session.sections().len(), RecordKind::Lease.sections().len());
    assert!(!session.sections().any_dirty());
    assert_eq!(
        session.sections().get("basic_information").unwrap().field("note"),
        Some(&json!("original"))
    );
}

#[test]
fn test_enter_edit_rejects_other_kind() {
    let (_, store) = store();
    let mut session = session(&store);

    let err = session
        .enter_edit(Record::new(RecordKind::Contact, 1))
        .unwrap_err();

    assert!(err.is_invalid_state());
    assert_eq!(session.mode(), EditMode::Viewing);
}

#[test]
fn test_edit_then_revert_scenario() {
    let (storage, store) = store();
    let mut session = session(&store);
    let record = lease(42);
    session.enter_edit(record.clone()).unwrap();
    let key = DraftKey::section(RecordKind::Lease, record.id, "basic_information");

    session
        .set_field("basic_information", "note", json!("draft text"))
        .unwrap();
    assert!(session.set_dirty("basic_information", true).unwrap());
    tick(&mut session);

    assert_eq!(
        store.get::<Value>(&key),
        Some(json!({"note": "draft text", "area": 120, "start_date": "2024-01-01"}))
    );
    assert_eq!(store.marker(RecordKind::Lease).unwrap().record_id, record.id);

    session
        .set_field("basic_information", "note", json!("original"))
        .unwrap();
    assert!(!session.set_dirty("basic_information", false).unwrap());
    tick(&mut session);

    assert_eq!(store.get::<Value>(&key), None);
    assert!(store.marker(RecordKind::Lease).is_none());
    assert!(lease_keys(&storage).is_empty());
}

#[test]
fn test_set_dirty_reports_edge_only_once() {
    let (_, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();

    assert!(session.set_dirty("rents", true).unwrap());
    assert!(!session.set_dirty("rents", true).unwrap());
    assert!(!session.set_dirty("rents", false).unwrap());
    assert!(session.set_dirty("rents", true).unwrap());
}

#[test]
fn test_section_updates_require_edit_mode() {
    let (_, store) = store();
    let mut session = session(&store);

    assert!(session.set_dirty("rents", true).unwrap_err().is_invalid_state());

    session.enter_edit(lease(42)).unwrap();
    assert!(session.set_valid("no_such_section", false).unwrap_err().is_not_found());
}

#[test]
fn test_stale_marker_does_not_prompt() {
    let (_, store) = store();
    write_marker(&store, 41);
    let mut session = session(&store);

    let offer = session.on_record_loaded(lease(42)).unwrap();

    assert!(offer.is_none());
    assert!(!session.state().is_restore_prompt_open);
}

#[test]
fn test_matching_marker_prompts_and_restores() {
    let (_, store) = store();
    let record = lease(42);

    // A previous page instance crashed with unsaved edits
    {
        let mut crashed = session(&store);
        crashed.enter_edit(record.clone()).unwrap();
        crashed
            .set_field("basic_information", "note", json!("draft text"))
            .unwrap();
        crashed.set_dirty("basic_information", true).unwrap();
        crashed.set_field("rents", "amount", json!(1750)).unwrap();
        crashed.set_dirty("rents", true).unwrap();
        crashed.set_valid("rents", false).unwrap();
        tick(&mut crashed);
    }

    let binding = Arc::new(RecordingBinding::default());
    let mut session = session(&store).with_form_binding(binding.clone());

    let offer = session.on_record_loaded(record.clone()).unwrap().unwrap();
    assert!(session.state().is_restore_prompt_open);
    assert_eq!(session.mode(), EditMode::Viewing);
    assert_eq!(offer.record_id, record.id);
    assert_eq!(offer.sections, vec!["basic_information", "rents"]);

    let restored = session.accept_restore().unwrap();

    assert_eq!(restored, vec!["basic_information", "rents"]);
    assert_eq!(session.mode(), EditMode::Editing);
    assert!(!session.state().is_restore_prompt_open);
    let basic = session.sections().get("basic_information").unwrap();
    assert_eq!(
        basic.values(),
        &json!({"note": "draft text", "area": 120, "start_date": "2024-01-01"})
    );
    assert!(basic.is_dirty());
    let rents = session.sections().get("rents").unwrap();
    assert_eq!(rents.field("amount"), Some(&json!(1750)));
    assert!(!rents.is_valid());
    assert!(session.sections().get("decisions").unwrap().is_valid());

    // Field-by-field replay: one notification per stored field
    let changes = binding.changes.lock().unwrap();
    assert_eq!(changes.len(), 5);
    assert!(changes.contains(&(
        "basic_information".to_string(),
        "note".to_string(),
        json!("draft text")
    )));
}

#[test]
fn test_restore_round_trip_is_lossless() {
    let (_, store) = store();
    let record = lease(42);
    let values = json!({
        "decisions": [{"id": 1, "text": "approved"}, {"id": 2, "text": "ünïcode ✓", "amount": -0.25}],
        "nested": {"flag": true, "empty": null, "list": [[], {}]}
    });

    {
        let mut crashed = session(&store);
        crashed.enter_edit(record.clone()).unwrap();
        crashed.set_values("decisions", values.clone()).unwrap();
        crashed.set_dirty("decisions", true).unwrap();
        tick(&mut crashed);
    }

    let mut session = session(&store);
    session.on_record_loaded(record).unwrap();
    session.accept_restore().unwrap();

    assert_eq!(session.sections().get("decisions").unwrap().values(), &values);
}

#[test]
fn test_accept_without_prompt_fails() {
    let (_, store) = store();
    let mut session = session(&store);
    session.on_record_loaded(lease(42)).unwrap();

    assert!(session.accept_restore().unwrap_err().is_invalid_state());
}

#[test]
fn test_decline_restore_is_idempotent() {
    let (storage, store) = store();
    let record = lease(42);
    {
        let mut crashed = session(&store);
        crashed.enter_edit(record.clone()).unwrap();
        crashed.set_dirty("rents", true).unwrap();
        tick(&mut crashed);
    }

    let mut session = session(&store);
    session.on_record_loaded(record).unwrap();
    assert!(session.state().is_restore_prompt_open);

    session.decline_restore().unwrap();
    let after_once = (session.state(), lease_keys(&storage));
    session.decline_restore().unwrap();
    let after_twice = (session.state(), lease_keys(&storage));

    assert_eq!(after_once, after_twice);
    assert!(after_once.1.is_empty());
    assert!(!session.state().is_restore_prompt_open);
}

#[test]
fn test_save_blocked_when_invalid() {
    let (_, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    session.set_dirty("rents", true).unwrap();
    session.set_valid("decisions", false).unwrap();

    let outcome = session.save().unwrap();

    assert_eq!(
        outcome,
        SaveOutcome::Blocked {
            invalid_sections: vec!["decisions".to_string()]
        }
    );
    assert!(session.state().is_save_attempted);
    assert!(!session.state().is_save_pending);
    assert_eq!(session.mode(), EditMode::Editing);

    // A second click is also recorded, and still blocked
    assert!(matches!(session.save().unwrap(), SaveOutcome::Blocked { .. }));
    assert!(session.state().is_save_attempted);
}

#[test]
fn test_save_merges_dirty_sections_only() {
    let (_, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    session
        .set_field("basic_information", "note", json!("changed"))
        .unwrap();
    session.set_dirty("basic_information", true).unwrap();
    session.set_field("rents", "amount", json!(99)).unwrap();
    session.set_dirty("rents", true).unwrap();

    let SaveOutcome::Submit(payload) = session.save().unwrap() else {
        panic!("expected a submission");
    };

    assert_eq!(payload.record_id, RecordId(42));
    assert_eq!(payload.sections, vec!["basic_information", "rents"]);
    assert_eq!(payload.values["basic_information"]["note"], json!("changed"));
    assert_eq!(payload.values["basic_information"]["area"], json!(120));
    assert_eq!(payload.values["rents"]["amount"], json!(99));
    assert!(!payload.values.contains_key("decisions"));
    assert!(session.state().is_save_pending);
    assert!(session.save().unwrap_err().is_invalid_state());
}

#[test]
fn test_save_keeps_same_named_fields_of_each_section() {
    let (_, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    session
        .set_values("basic_information", json!({"note": "basic note"}))
        .unwrap();
    session.set_dirty("basic_information", true).unwrap();
    session
        .set_values("decisions", json!({"note": "decision note"}))
        .unwrap();
    session.set_dirty("decisions", true).unwrap();

    let SaveOutcome::Submit(payload) = session.save().unwrap() else {
        panic!("expected a submission");
    };

    assert_eq!(payload.sections, vec!["basic_information", "decisions"]);
    assert_eq!(payload.values["basic_information"], json!({"note": "basic note"}));
    assert_eq!(payload.values["decisions"], json!({"note": "decision note"}));
}

#[test]
fn test_save_success_clears_drafts() {
    let (storage, store) = store();
    let mut session = session(&store);
    let record = lease(42);
    session.enter_edit(record.clone()).unwrap();
    session.set_dirty("rents", true).unwrap();
    tick(&mut session);
    assert!(!lease_keys(&storage).is_empty());

    let epoch = session.autosave_epoch();
    assert!(matches!(session.save().unwrap(), SaveOutcome::Submit(_)));
    session.on_save_succeeded(record).unwrap();

    assert_eq!(session.mode(), EditMode::Viewing);
    assert!(lease_keys(&storage).is_empty());
    assert!(!session.is_autosave_running());
    // A late timer tick is ignored after stop
    assert!(session.autosave_tick(epoch).is_none());
    assert!(lease_keys(&storage).is_empty());
}

#[test]
fn test_success_after_cancel_adopts_saved_record() {
    let (storage, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    session
        .set_field("basic_information", "note", json!("committed"))
        .unwrap();
    session.set_dirty("basic_information", true).unwrap();
    tick(&mut session);
    assert!(matches!(session.save().unwrap(), SaveOutcome::Submit(_)));

    session.cancel();
    let saved = lease(42).with_section("basic_information", json!({"note": "committed"}));
    session.on_save_succeeded(saved.clone()).unwrap();

    assert_eq!(session.record(), Some(&saved));
    assert_eq!(session.mode(), EditMode::Viewing);
    assert!(lease_keys(&storage).is_empty());
    // Only one answer per submission
    assert!(session.on_save_succeeded(saved).unwrap_err().is_invalid_state());
}

#[test]
fn test_late_success_keeps_record_loaded_since() {
    let (_, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    assert!(matches!(session.save().unwrap(), SaveOutcome::Submit(_)));

    session.on_record_loaded(lease(43)).unwrap();
    session.on_save_succeeded(lease(42)).unwrap();

    assert_eq!(session.record().unwrap().id, RecordId(43));
}

#[test]
fn test_success_without_submission_is_invalid_state() {
    let (_, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();

    assert!(session.on_save_succeeded(lease(42)).unwrap_err().is_invalid_state());
}

#[test]
fn test_save_failure_keeps_editing_and_drafts() {
    let (storage, store) = store();
    let reporter = Arc::new(RecordingReporter::default());
    let mut session = session(&store).with_error_reporter(reporter.clone());
    session.enter_edit(lease(42)).unwrap();
    session.set_dirty("rents", true).unwrap();
    tick(&mut session);
    let keys_before = lease_keys(&storage);

    assert!(matches!(session.save().unwrap(), SaveOutcome::Submit(_)));
    session.on_save_failed(&DraftError::submission("HTTP 500"));

    assert_eq!(session.mode(), EditMode::Editing);
    assert!(!session.state().is_save_pending);
    assert!(session.is_autosave_running());
    let mut keys_after = lease_keys(&storage);
    let mut keys_before = keys_before;
    keys_after.sort();
    keys_before.sort();
    assert_eq!(keys_after, keys_before);
    assert_eq!(
        reporter.errors.lock().unwrap().as_slice(),
        &[DraftError::submission("HTTP 500")]
    );
}

#[test]
fn test_cancel_clears_drafts_and_stops_pump() {
    let (storage, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    session.set_dirty("decisions", true).unwrap();
    tick(&mut session);
    let epoch = session.autosave_epoch();

    session.cancel();

    assert_eq!(session.mode(), EditMode::Viewing);
    assert!(session.sections().is_empty());
    assert!(lease_keys(&storage).is_empty());
    assert!(session.autosave_tick(epoch).is_none());
}

#[test]
fn test_end_edit_keeps_drafts() {
    let (storage, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    session.set_dirty("decisions", true).unwrap();
    tick(&mut session);

    session.end_edit();

    assert_eq!(session.mode(), EditMode::Viewing);
    assert!(!lease_keys(&storage).is_empty());
}

#[test]
fn test_loading_other_record_while_editing_ends_edit() {
    let (_, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    session.set_dirty("decisions", true).unwrap();
    tick(&mut session);

    let offer = session.on_record_loaded(lease(43)).unwrap();

    assert!(offer.is_none());
    assert_eq!(session.mode(), EditMode::Viewing);
    assert_eq!(store.marker(RecordKind::Lease).unwrap().record_id, RecordId(42));
}

#[test]
fn test_before_unload() {
    let (_, store) = store();
    let mut session = session(&store);
    assert_eq!(session.before_unload(), UnloadDecision::Proceed);

    session.enter_edit(lease(42)).unwrap();
    assert_eq!(session.before_unload(), UnloadDecision::Proceed);

    session.set_dirty("rents", true).unwrap();
    assert_eq!(session.before_unload(), UnloadDecision::ConfirmRequired);
}

#[test]
fn test_restarted_pump_ignores_old_epoch() {
    let (_, store) = store();
    let mut session = session(&store);
    session.enter_edit(lease(42)).unwrap();
    let old = session.autosave_epoch();
    session.cancel();
    session.enter_edit(lease(42)).unwrap();

    assert!(session.autosave_tick(old).is_none());
    assert!(session.autosave_tick(session.autosave_epoch()).is_some());
}
