use crate::record::{RecordId, RecordKind};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every key the engine writes.
pub const KEY_PREFIX: &str = "recdraft";

/// A typed storage key.
///
/// Section snapshots and validity bundles are namespaced by record kind and
/// record ID, so unrelated kinds that reuse a section name never collide and a
/// draft of one record can never be read back as another's. The marker is one
/// per kind; it names the record the current drafts belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DraftKey {
    Section {
        kind: RecordKind,
        record_id: RecordId,
        section: String,
    },
    Validity {
        kind: RecordKind,
        record_id: RecordId,
    },
    Marker {
        kind: RecordKind,
    },
}

impl DraftKey {
    pub fn section(kind: RecordKind, record_id: RecordId, section: impl Into<String>) -> Self {
        Self::Section {
            kind,
            record_id,
            section: section.into(),
        }
    }

    pub fn validity(kind: RecordKind, record_id: RecordId) -> Self {
        Self::Validity { kind, record_id }
    }

    pub fn marker(kind: RecordKind) -> Self {
        Self::Marker { kind }
    }

    /// Prefix of every record-scoped key of `record_id`.
    pub fn record_prefix(kind: RecordKind, record_id: RecordId) -> String {
        format!("{KEY_PREFIX}:{kind}:{record_id}:")
    }

    /// Prefix of every key of `kind`.
    pub fn kind_prefix(kind: RecordKind) -> String {
        format!("{KEY_PREFIX}:{kind}:")
    }

    /// Parses a raw storage key. Keys not written by this engine yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(5, ':');
        if parts.next()? != KEY_PREFIX {
            return None;
        }
        let kind = RecordKind::from_str(parts.next()?).ok()?;

        match (parts.next()?, parts.next(), parts.next()) {
            ("marker", None, None) => Some(Self::marker(kind)),
            (id, Some("validity"), None) => Some(Self::validity(kind, RecordId(id.parse().ok()?))),
            (id, Some("section"), Some(section)) if !section.is_empty() => Some(Self::section(
                kind,
                RecordId(id.parse().ok()?),
                section,
            )),
            _ => None,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            DraftKey::Section { kind, .. }
            | DraftKey::Validity { kind, .. }
            | DraftKey::Marker { kind } => *kind,
        }
    }

    /// The record this key belongs to. Markers belong to no single record.
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            DraftKey::Section { record_id, .. } | DraftKey::Validity { record_id, .. } => {
                Some(*record_id)
            }
            DraftKey::Marker { .. } => None,
        }
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftKey::Section {
                kind,
                record_id,
                section,
            } => write!(f, "{KEY_PREFIX}:{kind}:{record_id}:section:{section}"),
            DraftKey::Validity { kind, record_id } => {
                write!(f, "{KEY_PREFIX}:{kind}:{record_id}:validity")
            }
            DraftKey::Marker { kind } => write!(f, "{KEY_PREFIX}:{kind}:marker"),
        }
    }
}
