//! Durable draft persistence.
//!
//! - `key`: typed storage key builder (`DraftKey`)
//! - `storage`: raw key/value storage trait implemented by infrastructure
//! - `store`: the JSON adapter that swallows storage failures (`DraftStore`)
//! - `marker`: record-identity marker and restore offer types

mod key;
mod marker;
mod storage;
mod store;

pub use key::{DraftKey, KEY_PREFIX};
pub use marker::{DraftMarker, DraftOffer};
pub use storage::KeyValueStorage;
pub use store::DraftStore;
