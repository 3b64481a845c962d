//! Key/value storage backends for drafts.

mod json_file;
mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

use std::collections::BTreeMap;

/// Bytes a map occupies for quota purposes: every key plus every value.
fn footprint(items: &BTreeMap<String, String>) -> u64 {
    items.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum()
}

/// Inserts `key` into `items` unless the result would exceed `quota_bytes`.
fn insert_within_quota(
    items: &mut BTreeMap<String, String>,
    key: &str,
    value: &str,
    quota_bytes: Option<u64>,
) -> recdraft_core::error::Result<()> {
    if let Some(limit) = quota_bytes {
        let current = footprint(items);
        let replaced = items
            .get(key)
            .map(|old| (key.len() + old.len()) as u64)
            .unwrap_or(0);
        let needed = current - replaced + (key.len() + value.len()) as u64;
        if needed > limit {
            return Err(recdraft_core::DraftError::QuotaExceeded { needed, limit });
        }
    }
    items.insert(key.to_string(), value.to_string());
    Ok(())
}
