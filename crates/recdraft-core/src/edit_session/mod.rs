//! Edit session domain module.
//!
//! # Module Structure
//!
//! - `state`: view/edit mode and the flags the page renders (`EditSessionState`)
//! - `collaborator`: traits for the form-binding, error-reporting and prompt
//!   collaborators
//! - `manager`: the state machine that owns sections and drives the pump
//!   (`EditSession`)
//!
//! # Usage
//!
//! ```ignore
//! use recdraft_core::edit_session::{EditSession, EditMode, SaveOutcome};
//! ```

mod collaborator;
mod manager;
mod state;

#[cfg(test)]
mod manager_test;

pub use collaborator::{ErrorReporter, FormBinding, RestorePrompt};
pub use manager::{EditSession, SaveOutcome, UnloadDecision};
pub use state::{EditMode, EditSessionState};
