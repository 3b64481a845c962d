//! Application layer for recdraft.
//!
//! This crate wires the edit session state machine to a record source and a
//! real tokio timer, so hosts only forward user events.

mod autosave_timer;
pub mod edit_session_service;


pub use edit_session_service::EditSessionService;
