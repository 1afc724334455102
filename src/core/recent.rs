//! Most-recently-opened root documents

use serde::{Deserialize, Serialize};

/// Maximum number of recent entries kept
pub const MAX_RECENT_FILES: usize = 10;

/// Most-recent-first, de-duplicated list of locators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentFiles {
    entries: Vec<String>,
}

impl RecentFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `locator` to the front, evicting the oldest past capacity
    pub fn add(&mut self, locator: &str) {
        self.entries.retain(|e| e != locator);
        self.entries.insert(0, locator.to_string());
        self.entries.truncate(MAX_RECENT_FILES);
    }

    /// Returns whether anything was removed
    pub fn remove(&mut self, locator: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != locator);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
