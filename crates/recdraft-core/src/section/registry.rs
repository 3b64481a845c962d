use super::model::Section;
use crate::record::{Record, SectionName};
use std::collections::BTreeMap;

/// Per-section validity flags, persisted next to drafts so error indicators
/// can be restored after a crash.
pub type ValidityBundle = BTreeMap<SectionName, bool>;

/// The fixed, ordered set of sections of one edited record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionRegistry {
    sections: Vec<Section>,
}

impl SectionRegistry {
    /// Initializes every section of `kind`'s layout from `record`.
    ///
    /// Layout sections missing from the record start as `{}`; record sections
    /// outside the layout are ignored.
    pub fn from_record(record: &Record) -> Self {
        for name in record.sections.keys() {
            if !record.kind.has_section(name) {
                tracing::debug!(
                    target: "edit_session",
                    "Ignoring section '{}' of {} {}: not in the layout",
                    name,
                    record.kind,
                    record.id
                );
            }
        }

        let sections = record
            .kind
            .sections()
            .iter()
            .map(|name| Section::new(*name, record.section_values(name)))
            .collect();
        Self { sections }
    }

    /// An empty registry, used while not editing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }

    /// AND over every section's validity. An empty registry is valid.
    pub fn all_valid(&self) -> bool {
        self.sections.iter().all(Section::is_valid)
    }

    pub fn any_dirty(&self) -> bool {
        self.sections.iter().any(Section::is_dirty)
    }

    pub fn dirty_sections(&self) -> Vec<SectionName> {
        self.sections
            .iter()
            .filter(|s| s.is_dirty())
            .map(|s| s.name().to_string())
            .collect()
    }

    pub fn invalid_sections(&self) -> Vec<SectionName> {
        self.sections
            .iter()
            .filter(|s| !s.is_valid())
            .map(|s| s.name().to_string())
            .collect()
    }

    pub fn validity_bundle(&self) -> ValidityBundle {
        self.sections
            .iter()
            .map(|s| (s.name().to_string(), s.is_valid()))
            .collect()
    }

    /// Names in layout order.
    pub fn names(&self) -> Vec<SectionName> {
        self.sections.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;
    use serde_json::json;

    fn lease() -> Record {
        Record::new(RecordKind::Lease, 42)
            .with_section("basic_information", json!({"note": "orig", "area": 10}))
            .with_section("decisions", json!({"items": []}))
            .with_section("unknown", json!({"x": 1}))
    }

    #[test]
    fn test_from_record_follows_layout() {
        let registry = SectionRegistry::from_record(&lease());

        assert_eq!(registry.len(), RecordKind::Lease.sections().len());
        assert_eq!(registry.names(), RecordKind::Lease.sections().to_vec());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.get("tenants").unwrap().values(), &json!({}));
        assert_eq!(
            registry.get("basic_information").unwrap().values(),
            &json!({"note": "orig", "area": 10})
        );
    }

    #[test]
    fn test_validity_aggregation() {
        let mut registry = SectionRegistry::from_record(&lease());
        assert!(registry.all_valid());

        registry.get_mut("rents").unwrap().set_valid(false);
        registry.get_mut("decisions").unwrap().set_valid(false);

        assert!(!registry.all_valid());
        assert_eq!(registry.invalid_sections(), vec!["rents", "decisions"]);
        let bundle = registry.validity_bundle();
        assert_eq!(bundle.get("rents"), Some(&false));
        assert_eq!(bundle.get("summary"), Some(&true));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut registry = SectionRegistry::from_record(&lease());
        assert!(!registry.any_dirty());

        registry.get_mut("contracts").unwrap().set_dirty(true);
        assert!(registry.any_dirty());
        assert_eq!(registry.dirty_sections(), vec!["contracts"]);
    }

    #[test]
    fn test_empty_registry_is_valid_and_clean() {
        let registry = SectionRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.all_valid());
        assert!(!registry.any_dirty());
    }
}
