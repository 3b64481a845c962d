//! Shared fixtures for unit tests.

use crate::draft::{DraftStore, KeyValueStorage};
use crate::error::{DraftError, Result};
use crate::record::{Record, RecordKind};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub(crate) struct MapStorage {
    items: Mutex<HashMap<String, String>>,
    /// Values longer than this are rejected like a full quota.
    value_limit: Option<usize>,
}

impl MapStorage {
    pub(crate) fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

impl KeyValueStorage for MapStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if let Some(limit) = self.value_limit
            && value.len() > limit
        {
            return Err(DraftError::QuotaExceeded {
                needed: value.len() as u64,
                limit: limit as u64,
            });
        }
        self.items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.lock().unwrap().keys().cloned().collect())
    }
}

pub(crate) fn store() -> (Arc<MapStorage>, DraftStore) {
    let storage = Arc::new(MapStorage::default());
    let store = DraftStore::new(storage.clone());
    (storage, store)
}

/// A store whose backend rejects values longer than `value_limit` bytes.
pub(crate) fn capped_store(value_limit: usize) -> (Arc<MapStorage>, DraftStore) {
    let storage = Arc::new(MapStorage {
        value_limit: Some(value_limit),
        ..MapStorage::default()
    });
    let store = DraftStore::new(storage.clone());
    (storage, store)
}

pub(crate) fn lease(id: i64) -> Record {
    Record::new(RecordKind::Lease, id)
        .with_section(
            "basic_information",
            json!({"note": "original", "area": 120, "start_date": "2024-01-01"}),
        )
        .with_section("decisions", json!({"decisions": [{"id": 1, "text": "approved"}]}))
        .with_section("rents", json!({"amount": 1500.5, "currency": "EUR"}))
}
