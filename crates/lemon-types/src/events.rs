//! Diagnostic events emitted by the persistence layer.
//!
//! These never carry control flow: they exist so recurring local
//! corruption or write failures can be observed after the fact.

use serde::{Deserialize, Serialize};

use crate::MenuItemId;

/// Envelope for all store events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub kind: StoreEvent,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A bulk load finished.
    MenuLoaded { stored: usize, failed: usize },
    /// One row of a bulk load was not stored.
    RowWriteFailed { id: MenuItemId, reason: String },
    /// Dropping the menu table during logout failed.
    CacheDropFailed { error: String },
    /// A stored session record could not be parsed and was discarded.
    MalformedRecord { key: String, error: String },
    SessionCommitted,
    SessionCleared,
}

impl StoreEvent {
    /// Category used for subscription filtering: "menu" or "session".
    pub fn category(&self) -> &'static str {
        match self {
            Self::MenuLoaded { .. } | Self::RowWriteFailed { .. } | Self::CacheDropFailed { .. } => {
                "menu"
            }
            Self::MalformedRecord { .. } | Self::SessionCommitted | Self::SessionCleared => {
                "session"
            }
        }
    }

    /// True for events that indicate something went wrong.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::RowWriteFailed { .. } | Self::CacheDropFailed { .. } | Self::MalformedRecord { .. }
        )
    }
}
