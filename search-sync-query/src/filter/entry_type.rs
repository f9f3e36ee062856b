//! Entry type references: `"news"` or `"section:news"`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A reference to an entry type, optionally qualified by its section.
///
/// Only `handle` takes part in filtering. The section qualifier is kept so
/// that narrowing by section can be added without changing callers, but a
/// handle shared by several sections currently matches all of them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryTypeRef {
    pub section: Option<String>,
    pub handle: String,
}

impl EntryTypeRef {
    /// Parse `handle` or `section:handle`. Blank input yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        match value.split_once(':') {
            Some((section, handle)) => {
                let handle = handle.trim();
                if handle.is_empty() {
                    return None;
                }
                let section = section.trim();
                Some(Self {
                    section: (!section.is_empty()).then(|| section.to_string()),
                    handle: handle.to_string(),
                })
            }
            None => Some(Self {
                section: None,
                handle: value.to_string(),
            }),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.section.is_some()
    }
}

impl fmt::Display for EntryTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.section {
            Some(section) => write!(f, "{}:{}", section, self.handle),
            None => f.write_str(&self.handle),
        }
    }
}
