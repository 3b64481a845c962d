use serde::{Deserialize, Serialize};
use strum::Display;

/// Whether the page shows the record read-only or as editable forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EditMode {
    #[default]
    Viewing,
    Editing,
}

/// Flags the page renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSessionState {
    pub mode: EditMode,
    /// Set by every save attempt; gates showing validation errors.
    pub is_save_attempted: bool,
    pub is_restore_prompt_open: bool,
    /// A payload was handed to the record source and no answer arrived yet.
    pub is_save_pending: bool,
}
