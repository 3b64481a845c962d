//! Record source trait.
//!
//! Defines the boundary to the backend that owns records.

use super::model::{Record, RecordId, RecordKind, SectionName};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The outbound body of a save: the values of every dirty section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub kind: RecordKind,
    pub record_id: RecordId,
    /// Dirty sections, in layout order.
    pub sections: Vec<SectionName>,
    /// Section values keyed by section name. Field names may repeat across
    /// sections.
    pub values: BTreeMap<SectionName, Value>,
}

/// An abstract source of records.
///
/// This trait decouples the edit session from the REST client that actually
/// talks to the backend. The exact wire shape is the implementor's concern.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches a record by kind and ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: Record found
    /// - `Err(DraftError::NotFound)`: No such record
    /// - `Err(_)`: Transport or backend failure
    async fn fetch(&self, kind: RecordKind, id: RecordId) -> Result<Record>;

    /// Submits a save payload.
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: The record as stored after the update
    /// - `Err(_)`: The backend rejected the update
    async fn update(&self, payload: &SavePayload) -> Result<Record>;
}
