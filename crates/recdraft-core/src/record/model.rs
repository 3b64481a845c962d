use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Name of a form section, e.g. `basic_information` or `decisions`.
pub type SectionName = String;

/// Backend identifier of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The kinds of record that have an editing page.
///
/// Each kind owns a fixed, ordered section layout. The string form is stable
/// and is used for storage key namespacing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    Lease,
    LandUseContract,
    Contact,
}

const LEASE_SECTIONS: &[&str] = &[
    "basic_information",
    "tenants",
    "rents",
    "decisions",
    "contracts",
    "inspections",
    "constructability",
    "summary",
];

const LAND_USE_CONTRACT_SECTIONS: &[&str] = &[
    "basic_information",
    "decisions",
    "contracts",
    "compensations",
    "invoices",
];

const CONTACT_SECTIONS: &[&str] = &["contact"];

impl RecordKind {
    /// The editable sections of this record kind, in display order.
    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Lease => LEASE_SECTIONS,
            RecordKind::LandUseContract => LAND_USE_CONTRACT_SECTIONS,
            RecordKind::Contact => CONTACT_SECTIONS,
        }
    }

    /// Returns true if `section` belongs to this kind's layout.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections().contains(&section)
    }
}

/// A record as loaded from the record source.
///
/// Section data is kept as JSON objects keyed by field name; anything the
/// form layer can render round-trips through `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub kind: RecordKind,
    pub id: RecordId,
    #[serde(default)]
    pub sections: BTreeMap<SectionName, Value>,
}

impl Record {
    pub fn new(kind: RecordKind, id: impl Into<RecordId>) -> Self {
        Self {
            kind,
            id: id.into(),
            sections: BTreeMap::new(),
        }
    }

    /// Builder-style helper for attaching section values.
    pub fn with_section(mut self, name: impl Into<SectionName>, values: Value) -> Self {
        self.sections.insert(name.into(), values);
        self
    }

    /// Values of `section`, or an empty object when the record has none.
    pub fn section_values(&self, section: &str) -> Value {
        match self.sections.get(section) {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            Some(other) => {
                tracing::warn!(
                    target: "edit_session",
                    "Record {}:{} section '{}' is not an object ({}), using empty values",
                    self.kind,
                    self.id,
                    section,
                    other
                );
                Value::Object(Map::new())
            }
            None => Value::Object(Map::new()),
        }
    }
}
