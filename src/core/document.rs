//! The displayed document and its edit state

use std::path::Path;

/// Content seeded into a new, untitled document
pub const NEW_DOCUMENT_TEMPLATE: &str = "# Untitled\n\nStart writing here.\n";

/// Where a document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIdentity {
    /// Canonical address used for I/O (file path or resolved URL)
    pub locator: String,
    pub is_remote: bool,
    /// User-facing alias when it differs from the canonical address
    pub display_locator: Option<String>,
}

impl DocumentIdentity {
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            locator: path.into(),
            is_remote: false,
            display_locator: None,
        }
    }

    pub fn remote(canonical_url: impl Into<String>, requested_url: &str) -> Self {
        let locator = canonical_url.into();
        let display_locator = (locator != requested_url).then(|| requested_url.to_string());
        Self {
            locator,
            is_remote: true,
            display_locator,
        }
    }

    /// The address to show the user
    pub fn display(&self) -> &str {
        self.display_locator.as_deref().unwrap_or(&self.locator)
    }

    /// Last path segment, for window titles and suggested file names
    pub fn file_name(&self) -> String {
        if self.is_remote {
            return self
                .locator
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("Untitled")
                .to_string();
        }

        Path::new(&self.locator)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    }
}

/// Which panes are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    View,
    Edit,
    /// Editor and viewer side by side with synchronized scrolling
    EditSplit,
}

impl Mode {
    pub fn is_editing(self) -> bool {
        matches!(self, Self::Edit | Self::EditSplit)
    }
}

/// The currently displayed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSession {
    identity: Option<DocumentIdentity>,
    original_content: String,
    edited_content: String,
    rendered_html: String,
    dirty: bool,
    mode: Mode,
    /// A draft with no backing location yet
    untitled: bool,
}

impl DocumentSession {
    /// A freshly loaded document, clean and in view mode
    pub fn loaded(identity: DocumentIdentity, content: String, html: String) -> Self {
        Self {
            identity: Some(identity),
            original_content: content.clone(),
            edited_content: content,
            rendered_html: html,
            dirty: false,
            mode: Mode::View,
            untitled: false,
        }
    }

    /// An untitled document seeded with `template`; dirty from the start
    pub fn untitled(template: &str, html: String) -> Self {
        Self {
            identity: None,
            original_content: String::new(),
            edited_content: template.to_string(),
            rendered_html: html,
            dirty: !template.is_empty(),
            mode: Mode::Edit,
            untitled: true,
        }
    }

    pub fn identity(&self) -> Option<&DocumentIdentity> {
        self.identity.as_ref()
    }

    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    pub fn edited_content(&self) -> &str {
        &self.edited_content
    }

    pub fn rendered_html(&self) -> &str {
        &self.rendered_html
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_remote(&self) -> bool {
        self.identity.as_ref().is_some_and(|id| id.is_remote)
    }

    /// True when there is anything to show: a loaded document or an untitled draft
    pub fn has_document(&self) -> bool {
        self.identity.is_some() || self.untitled
    }

    pub fn is_untitled(&self) -> bool {
        self.untitled
    }

    /// Get the document title (file name, or "Untitled")
    pub fn title(&self) -> String {
        self.identity
            .as_ref()
            .map(DocumentIdentity::file_name)
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// Replace the edited text and recompute the dirty flag
    pub fn set_edited_content(&mut self, content: String) {
        self.dirty = content != self.original_content;
        self.edited_content = content;
    }

    pub fn set_rendered_html(&mut self, html: String) {
        self.rendered_html = html;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Record that `saved` is now persisted, optionally under a new identity
    pub fn mark_saved(&mut self, saved: String, identity: Option<DocumentIdentity>) {
        if let Some(identity) = identity {
            self.identity = Some(identity);
            self.untitled = false;
        }
        self.original_content = saved;
        self.dirty = self.edited_content != self.original_content;
    }
}
