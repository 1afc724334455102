//! Linear back/forward browsing history

/// Cursor-based browsing trail.
///
/// Pushing after going back discards the forward branch; there is no tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationHistory {
    entries: Vec<String>,
    /// `None` iff `entries` is empty
    cursor: Option<usize>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit to `locator`
    pub fn push(&mut self, locator: &str) {
        if self.current() == Some(locator) {
            return;
        }

        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        self.entries.truncate(keep);
        self.entries.push(locator.to_string());
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back and return the entry now under the cursor
    pub fn back(&mut self) -> Option<&str> {
        let target = self.cursor.filter(|&c| c > 0)? - 1;
        self.cursor = Some(target);
        self.entries.get(target).map(String::as_str)
    }

    /// Step forward and return the entry now under the cursor
    pub fn forward(&mut self) -> Option<&str> {
        let target = self.cursor.filter(|&c| c + 1 < self.entries.len())? + 1;
        self.cursor = Some(target);
        self.entries.get(target).map(String::as_str)
    }

    /// The entry `back()` would move to, without moving
    pub fn peek_back(&self) -> Option<&str> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.entries.get(cursor - 1).map(String::as_str)
    }

    /// The entry `forward()` would move to, without moving
    pub fn peek_forward(&self) -> Option<&str> {
        let cursor = self.cursor?;
        self.entries.get(cursor + 1).map(String::as_str)
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor?).map(String::as_str)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
