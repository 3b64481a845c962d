use crate::record::SectionName;
use serde_json::{Map, Value};

/// A single form section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    name: SectionName,
    values: Value,
    baseline: Value,
    is_dirty: bool,
    is_valid: bool,
}

impl Section {
    /// Creates a clean, valid section whose baseline equals `values`.
    ///
    /// Non-object values are replaced by an empty object.
    pub fn new(name: impl Into<SectionName>, values: Value) -> Self {
        let values = if values.is_object() {
            values
        } else {
            Value::Object(Map::new())
        };
        Self {
            name: name.into(),
            baseline: values.clone(),
            values,
            is_dirty: false,
            is_valid: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &Value {
        &self.values
    }

    /// Values the section was initialized with.
    pub fn baseline(&self) -> &Value {
        &self.baseline
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Sets the dirty flag and returns the previous value.
    pub fn set_dirty(&mut self, dirty: bool) -> bool {
        std::mem::replace(&mut self.is_dirty, dirty)
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.is_valid = valid;
    }

    /// Replaces all values at once.
    pub fn set_values(&mut self, values: Value) {
        self.values = if values.is_object() {
            values
        } else {
            Value::Object(Map::new())
        };
    }

    /// Writes a single field, leaving every other field untouched.
    pub fn set_field(&mut self, field: impl Into<String>, value: Value) {
        if !self.values.is_object() {
            self.values = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.values {
            map.insert(field.into(), value);
        }
    }

    pub fn field(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}
