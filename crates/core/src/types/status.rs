//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a product photo.
///
/// Photos are uploaded to the remote service as `Temporary` and become
/// `Synced` once pushed to the external commerce platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhotoStatus {
    #[default]
    Temporary,
    Synced,
}

impl PhotoStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Temporary => "Pending sync",
            Self::Synced => "Synced",
        }
    }

    /// Returns true once the photo lives on the commerce platform.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}
