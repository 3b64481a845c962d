//! Raw key/value storage trait.

use crate::error::Result;

/// A synchronous string-to-string store that survives restarts.
///
/// Implementations live in the infrastructure layer (in-memory, JSON file).
/// The store is shared by every session that points at it, so callers must
/// not assume exclusive ownership of any key.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the stored string, `Ok(None)` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;
}
