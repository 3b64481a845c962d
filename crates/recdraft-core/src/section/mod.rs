//! Form sections of an edited record.
//!
//! A section is one independently dirty/valid slice of a record's editable
//! form state. Dirtiness and validity are pushed in by the form-binding and
//! validation layers; nothing here diffs values.

mod model;
mod registry;

pub use model::Section;
pub use registry::{SectionRegistry, ValidityBundle};
