pub mod config;
pub mod drafts;

use recdraft_core::record::RecordKind;
use std::str::FromStr;

/// Parses a record kind given on the command line.
pub fn parse_kind(raw: &str) -> Result<RecordKind, String> {
    RecordKind::from_str(raw).map_err(|_| {
        format!("unknown record kind '{raw}' (expected lease, land_use_contract or contact)")
    })
}
