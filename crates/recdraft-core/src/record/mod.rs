//! Record domain module.
//!
//! The record is the backend entity being edited (lease, land-use contract,
//! contact). It is read on page load and only ever changes through an explicit
//! save submitted to a [`RecordSource`].

mod model;
mod source;

pub use model::{Record, RecordId, RecordKind, SectionName};
pub use source::{RecordSource, SavePayload};
