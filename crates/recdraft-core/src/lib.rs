//! Core of the recdraft draft autosave and crash-recovery engine.
//!
//! One [`EditSession`](edit_session::EditSession) exists per record-editing
//! page. It owns the page's sections, drives the
//! [`AutosavePump`](autosave::AutosavePump) and talks to durable storage only
//! through the [`DraftStore`](draft::DraftStore) adapter.

pub mod autosave;
pub mod config;
pub mod draft;
pub mod edit_session;
pub mod error;
pub mod record;
pub mod section;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export common error type
pub use error::DraftError;
