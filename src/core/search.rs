//! Case-insensitive find-in-document

use super::markdown::offset_fraction;

/// Search term, its matches in the current content, and the selected match
#[derive(Debug, Clone, Default)]
pub struct DocumentSearch {
    term: String,
    /// Byte offsets of matches in the searched content
    matches: Vec<usize>,
    current: Option<usize>,
}

impl DocumentSearch {
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Re-run the search for `term` over `content`
    pub fn update(&mut self, term: &str, content: &str) {
        self.term = term.to_string();
        self.matches = find_all(content, term);
        self.current = if self.matches.is_empty() { None } else { Some(0) };
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// 1-based index of the selected match, for "3 of 7" displays
    pub fn current_index(&self) -> Option<usize> {
        self.current.map(|i| i + 1)
    }

    /// Select the next match, wrapping around
    pub fn next(&mut self) -> Option<usize> {
        let count = self.matches.len();
        let next = self.current.map_or(0, |i| (i + 1) % count.max(1));
        self.select(next)
    }

    /// Select the previous match, wrapping around
    pub fn previous(&mut self) -> Option<usize> {
        let count = self.matches.len();
        let previous = self.current.map_or(0, |i| (i + count.max(1) - 1) % count.max(1));
        self.select(previous)
    }

    fn select(&mut self, index: usize) -> Option<usize> {
        let offset = *self.matches.get(index)?;
        self.current = Some(index);
        Some(offset)
    }

    /// Where the selected match sits in `content`, as a fraction
    pub fn current_fraction(&self, content: &str) -> Option<f32> {
        let offset = *self.matches.get(self.current?)?;
        Some(offset_fraction(content, offset))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Byte offsets of case-insensitive, non-overlapping occurrences of `term`
fn find_all(content: &str, term: &str) -> Vec<usize> {
    if term.is_empty() {
        return Vec::new();
    }

    let needle = term.to_lowercase();
    let mut matches = Vec::new();
    let mut start = 0;

    // Lowercasing can change byte lengths, so compare per char boundary
    while start < content.len() {
        let Some(found) = content[start..]
            .char_indices()
            .map(|(i, _)| start + i)
            .find(|&i| starts_with_ignore_case(&content[i..], &needle))
        else {
            break;
        };
        matches.push(found);
        start = found + matched_len(&content[found..], &needle).max(1);
        while !content.is_char_boundary(start) {
            start += 1;
        }
    }

    matches
}

fn starts_with_ignore_case(haystack: &str, lower_needle: &str) -> bool {
    let mut hay = haystack.chars().flat_map(char::to_lowercase);
    lower_needle.chars().all(|n| hay.next() == Some(n))
}

/// Byte length of the prefix of `haystack` that matched
fn matched_len(haystack: &str, lower_needle: &str) -> usize {
    let target = lower_needle.chars().count();
    let mut produced = 0;
    for (i, c) in haystack.char_indices() {
        if produced >= target {
            return i;
        }
        produced += c.to_lowercase().count();
    }
    haystack.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_case_insensitive_matches() {
        let mut search = DocumentSearch::default();
        search.update("rust", "Rust is fun.\nI like rust and RUST.");
        assert_eq!(search.match_count(), 3);
        assert_eq!(search.current_index(), Some(1));
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let content = "a b a b a";
        let mut search = DocumentSearch::default();
        search.update("a", content);
        assert_eq!(search.next(), Some(4));
        assert_eq!(search.next(), Some(8));
        assert_eq!(search.next(), Some(0));
        assert_eq!(search.previous(), Some(8));
        assert_eq!(search.current_index(), Some(3));
    }

    #[test]
    fn test_empty_term_and_no_match() {
        let mut search = DocumentSearch::default();
        search.update("", "anything");
        assert_eq!(search.match_count(), 0);
        assert_eq!(search.next(), None);

        search.update("zzz", "anything");
        assert_eq!(search.current_index(), None);
        assert_eq!(search.previous(), None);
    }

    #[test]
    fn test_non_ascii_content() {
        let mut search = DocumentSearch::default();
        search.update("é", "Été et été");
        assert_eq!(search.match_count(), 4);
    }

    #[test]
    fn test_current_fraction() {
        let content = "one\ntwo\nthree\nfound it\n";
        let mut search = DocumentSearch::default();
        search.update("found", content);
        assert_eq!(search.current_fraction(content), Some(1.0));
    }
}
