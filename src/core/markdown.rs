//! Markdown rendering and link/heading extraction with pulldown-cmark

use std::path::Path;

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::error::RenderError;
use super::links::{self, normalize_anchor_id};
use super::ports::RenderService;

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// HTML renderer that assigns heading ids and rebases image sources
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite a relative image source against the document location
    fn rebase_image(dest: &str, base_path: Option<&str>) -> Option<String> {
        let base = base_path?;
        if links::classify(dest) != links::LinkKind::Relative || dest.starts_with("data:") {
            return None;
        }

        if links::is_remote_locator(base) {
            return links::join_url(base, dest).ok();
        }

        let img_path = Path::new(base).parent()?.join(dest);
        img_path
            .exists()
            .then(|| format!("file://{}", img_path.to_string_lossy()))
    }
}

impl RenderService for MarkdownRenderer {
    fn render(&self, content: &str, base_path: Option<&str>) -> Result<String, RenderError> {
        let mut events: Vec<Event> = Vec::new();
        let mut heading: Option<(usize, String)> = None;

        for event in Parser::new_ext(content, parser_options()) {
            match event {
                Event::Start(Tag::Heading { .. }) => {
                    heading = Some((events.len(), String::new()));
                    events.push(event);
                }
                Event::Text(ref text) | Event::Code(ref text) if heading.is_some() => {
                    if let Some((_, heading_text)) = heading.as_mut() {
                        heading_text.push_str(text);
                    }
                    events.push(event);
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((start, heading_text)) = heading.take() {
                        let id = normalize_anchor_id(&heading_text);
                        if let Some(Event::Start(Tag::Heading { id: slot, .. })) = events.get_mut(start) {
                            if slot.is_none() && !id.is_empty() {
                                *slot = Some(CowStr::from(id));
                            }
                        }
                    }
                    events.push(event);
                }
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let dest_url = Self::rebase_image(&dest_url, base_path)
                        .map(CowStr::from)
                        .unwrap_or(dest_url);
                    events.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        Ok(html_output)
    }
}

/// Destinations of every link in `content`, in document order
pub fn extract_links(content: &str) -> Vec<String> {
    Parser::new(content)
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect()
}

/// Text of the first heading; with `h1_only`, the first level-1 heading
pub fn extract_title(content: &str, h1_only: bool) -> Option<String> {
    let mut in_heading = false;
    let mut title = String::new();

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                in_heading = !h1_only || level == HeadingLevel::H1;
            }
            Event::Text(text) | Event::Code(text) if in_heading => title.push_str(&text),
            Event::End(TagEnd::Heading(_)) => {
                if in_heading && !title.trim().is_empty() {
                    return Some(title.trim().to_string());
                }
                in_heading = false;
                title.clear();
            }
            _ => {}
        }
    }

    None
}

/// Position of the heading with id `anchor_id` as a fraction of the document
pub fn heading_fraction(content: &str, anchor_id: &str) -> Option<f32> {
    let mut heading: Option<(usize, String)> = None;

    for (event, range) in Parser::new_ext(content, parser_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { id, .. }) => {
                if id.as_deref() == Some(anchor_id) {
                    return Some(offset_fraction(content, range.start));
                }
                heading = Some((range.start, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, heading_text)) = heading.as_mut() {
                    heading_text.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((start, heading_text)) = heading.take() {
                    if normalize_anchor_id(&heading_text) == anchor_id {
                        return Some(offset_fraction(content, start));
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Line of a byte offset as a fraction of the line count, in `[0, 1]`
pub fn offset_fraction(content: &str, offset: usize) -> f32 {
    let total = content.lines().count().max(1);
    if total <= 1 {
        return 0.0;
    }
    let offset = offset.min(content.len());
    let line = content.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count();
    (line as f32 / (total - 1) as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_assigns_normalized_heading_ids() {
        let html = MarkdownRenderer::new()
            .render("# Hello, World!\n\n## Getting `started`\n", None)
            .unwrap();
        assert!(html.contains(r#"<h1 id="hello-world">"#), "{html}");
        assert!(html.contains(r#"<h2 id="getting-started">"#), "{html}");
    }

    #[test]
    fn test_render_keeps_explicit_heading_id() {
        let html = MarkdownRenderer::new().render("# Title {#custom}\n", None).unwrap();
        assert!(html.contains(r#"id="custom""#), "{html}");
    }

    #[test]
    fn test_render_rebases_images_against_remote_base() {
        let html = MarkdownRenderer::new()
            .render("![logo](img/logo.png)", Some("https://example.com/docs/README.md"))
            .unwrap();
        assert!(html.contains("https://example.com/docs/img/logo.png"), "{html}");
    }

    #[test]
    fn test_render_rebases_existing_local_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), b"png").unwrap();
        let doc = dir.path().join("doc.md");

        let html = MarkdownRenderer::new()
            .render(
                "![logo](logo.png) ![gone](missing.png)",
                Some(doc.to_str().unwrap()),
            )
            .unwrap();
        assert!(html.contains("file://"), "{html}");
        assert!(html.contains(r#"src="missing.png""#), "{html}");
    }

    #[test]
    fn test_extract_links() {
        let links = extract_links("See [a](a.md), [site](https://x.org) and [top](#top).");
        assert_eq!(links, ["a.md", "https://x.org", "#top"]);
    }

    #[test]
    fn test_extract_title() {
        let content = "Intro\n\n## Section\n\n# Main\n";
        assert_eq!(extract_title(content, false), Some("Section".to_string()));
        assert_eq!(extract_title(content, true), Some("Main".to_string()));
        assert_eq!(extract_title("no headings", false), None);
    }

    #[test]
    fn test_heading_fraction() {
        let content = "# Top\n\ntext\n\n## Middle Part\n\ntext\n\n## End\n";
        assert_eq!(heading_fraction(content, "top"), Some(0.0));
        let middle = heading_fraction(content, "middle-part").unwrap();
        assert!(middle > 0.3 && middle < 0.7, "{middle}");
        assert_eq!(heading_fraction(content, "end"), Some(1.0));
        assert_eq!(heading_fraction(content, "absent"), None);
    }
}
