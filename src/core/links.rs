//! Classification and resolution of navigation targets

use url::Url;

use super::error::ContentError;
use super::ports::ContentStore;

/// What kind of target an href points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `#heading` inside the current document
    Anchor,
    /// Has a URL scheme (`https:`, `mailto:`, ...)
    Absolute,
    Relative,
}

pub fn classify(href: &str) -> LinkKind {
    if href.starts_with('#') {
        LinkKind::Anchor
    } else if has_scheme(href) {
        LinkKind::Absolute
    } else {
        LinkKind::Relative
    }
}

/// `scheme ":"` with a scheme of at least two characters, so Windows drive
/// letters (`C:\notes`) stay relative.
fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() >= 2
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Whether a locator addresses a remote document
pub fn is_remote_locator(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

pub fn is_markdown_locator(locator: &str) -> bool {
    let path = locator.split(['?', '#']).next().unwrap_or(locator);
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown")
}

/// Heading id for an anchor or heading text.
///
/// Renderer and link handling both go through this function; a mismatch makes
/// anchor jumps silently miss.
pub fn normalize_anchor_id(raw: &str) -> String {
    let raw = raw.strip_prefix('#').unwrap_or(raw);
    raw.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Split `doc.md#part` into `("doc.md", Some("part"))`
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((path, fragment)) if !fragment.is_empty() => (path, Some(fragment)),
        Some((path, _)) => (path, None),
        None => (href, None),
    }
}

/// Resolve `relative_href` against the document at `base_locator`.
///
/// Remote bases use URL-join semantics; local bases defer to the content
/// store, which knows filesystem rules (`..`, `./`, siblings).
pub fn resolve(
    base_locator: &str,
    relative_href: &str,
    is_remote_base: bool,
    content: &dyn ContentStore,
) -> Result<String, ContentError> {
    if is_remote_base {
        return join_url(base_locator, relative_href);
    }
    content.resolve_path(base_locator, relative_href)
}

/// URL join of `relative` onto `base`
pub fn join_url(base: &str, relative: &str) -> Result<String, ContentError> {
    let resolution_error = |message: String| ContentError::Resolution {
        base: base.to_string(),
        relative: relative.to_string(),
        message,
    };

    let base_url = Url::parse(base).map_err(|e| resolution_error(e.to_string()))?;
    base_url
        .join(relative)
        .map(|u| u.to_string())
        .map_err(|e| resolution_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("#intro"), LinkKind::Anchor);
        assert_eq!(classify("https://example.com/a.md"), LinkKind::Absolute);
        assert_eq!(classify("mailto:someone@example.com"), LinkKind::Absolute);
        assert_eq!(classify("../guide/setup.md"), LinkKind::Relative);
        assert_eq!(classify("setup.md#install"), LinkKind::Relative);
        assert_eq!(classify("C:\\notes\\a.md"), LinkKind::Relative);
    }

    #[test]
    fn test_normalize_anchor_id() {
        assert_eq!(normalize_anchor_id("#Hello, World!"), "hello-world");
        assert_eq!(normalize_anchor_id("Getting   Started"), "getting-started");
        assert_eq!(normalize_anchor_id("  snake_case-and-dash  "), "snake_case-and-dash");
        assert_eq!(normalize_anchor_id("Version 2.0 (beta)"), "version-2-0-beta");
        assert_eq!(normalize_anchor_id("Café crème"), "caf-cr-me");
        assert_eq!(normalize_anchor_id("🚀 Launch"), "launch");
        assert_eq!(normalize_anchor_id("#"), "");
    }

    #[test]
    fn test_normalize_anchor_id_is_idempotent() {
        let samples = [
            "#Hello, World!",
            "API -- Reference",
            "  __init__ method ",
            "Ünïcödé and émoji 🎉",
            "a\tb\nc",
            "##double",
        ];
        for sample in samples {
            let once = normalize_anchor_id(sample);
            assert_eq!(normalize_anchor_id(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_split_fragment() {
        assert_eq!(split_fragment("doc.md#part"), ("doc.md", Some("part")));
        assert_eq!(split_fragment("doc.md#"), ("doc.md", None));
        assert_eq!(split_fragment("doc.md"), ("doc.md", None));
    }

    #[test]
    fn test_join_url() {
        let base = "https://example.com/docs/guide/index.md";
        assert_eq!(
            join_url(base, "../api.md").unwrap(),
            "https://example.com/docs/api.md"
        );
        assert_eq!(
            join_url(base, "setup.md").unwrap(),
            "https://example.com/docs/guide/setup.md"
        );
        assert!(matches!(
            join_url("not a url", "a.md"),
            Err(ContentError::Resolution { .. })
        ));
    }

    #[test]
    fn test_markdown_locator() {
        assert!(is_markdown_locator("/notes/a.md"));
        assert!(is_markdown_locator("https://example.com/README.MD?raw=1"));
        assert!(is_markdown_locator("notes.markdown#top"));
        assert!(!is_markdown_locator("image.png"));
    }
}
