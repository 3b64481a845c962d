use crate::record::{RecordId, SectionName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record-identity marker written next to section snapshots.
///
/// The marker is the only thing consulted on record load. `writer` is the
/// session token of whoever wrote it; together with `revision` it lets a
/// session notice that another instance has been writing drafts for the same
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMarker {
    pub record_id: RecordId,
    pub writer: Uuid,
    pub revision: u64,
    pub saved_at: DateTime<Utc>,
}

/// What the restore prompt shows the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOffer {
    pub record_id: RecordId,
    pub saved_at: DateTime<Utc>,
    pub writer: Uuid,
    /// Sections that currently have a snapshot.
    pub sections: Vec<SectionName>,
}
