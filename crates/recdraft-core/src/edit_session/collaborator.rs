//! Collaborator traits.
//!
//! These are the in-process boundaries of the engine. Implementations belong
//! to the page that hosts the session.

use crate::draft::DraftOffer;
use crate::error::DraftError;
use async_trait::async_trait;
use serde_json::Value;

/// The form-binding layer, which observes field paths individually.
///
/// Restore replay calls `field_changed` once per restored field instead of
/// replacing a whole section in one go.
pub trait FormBinding: Send + Sync {
    fn field_changed(&self, section: &str, field: &str, value: &Value);
}

/// Surfaces save-submission failures to the user.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &DraftError);
}

/// The yes/no modal shown when a draft for the loaded record exists.
#[async_trait]
pub trait RestorePrompt: Send + Sync {
    /// Returns true to restore the draft, false to discard it.
    async fn confirm_restore(&self, offer: &DraftOffer) -> bool;
}
