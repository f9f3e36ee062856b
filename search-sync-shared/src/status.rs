//! Content item status vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Live,
    Pending,
    Expired,
    Disabled,
    Enabled,
}

impl ItemStatus {
    /// Every status, in vocabulary order.
    pub const ALL: [ItemStatus; 5] = [
        ItemStatus::Live,
        ItemStatus::Pending,
        ItemStatus::Expired,
        ItemStatus::Disabled,
        ItemStatus::Enabled,
    ];

    /// Parse a status, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything outside the vocabulary.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" => Some(Self::Live),
            "pending" => Some(Self::Pending),
            "expired" => Some(Self::Expired),
            "disabled" => Some(Self::Disabled),
            "enabled" => Some(Self::Enabled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Pending => "pending",
            Self::Expired => "expired",
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
