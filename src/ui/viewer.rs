//! Rendered markdown panel using egui_commonmark

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui;
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};

use super::ScrollPane;
use crate::core::markdown::extract_links;
use crate::core::scroll_sync::{Pane, PaneScrollState, ScrollReport};

/// What happened in the viewer this frame
#[derive(Debug, Default)]
pub struct ViewerOutput {
    /// Destination of a clicked link
    pub clicked_link: Option<String>,
    pub scroll: Option<ScrollReport>,
}

/// Markdown viewer panel
#[derive(Default)]
pub struct ViewerPanel {
    cache: CommonMarkCache,
    scroll: ScrollPane,
    /// Link destinations registered as hooks, so clicks come back to us
    hooked_links: Vec<String>,
    hooked_hash: Option<u64>,
}

fn content_hash(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

impl ViewerPanel {
    /// Show `content`, or the welcome screen when there is nothing to show
    pub fn show(&mut self, ui: &mut egui::Ui, content: Option<&str>) -> ViewerOutput {
        let Some(content) = content else {
            Self::show_welcome(ui);
            return ViewerOutput::default();
        };

        self.register_links(content);

        let cache = &mut self.cache;
        let scroll = self.scroll.show(ui, "viewer_scroll", Pane::Viewer, false, |ui| {
            CommonMarkViewer::new()
                .max_image_width(Some(800))
                .indentation_spaces(2)
                .show_alt_text_on_hover(true)
                .show(ui, cache, content);
        });

        ViewerOutput {
            clicked_link: self.take_clicked_link(),
            scroll,
        }
    }

    /// Route every link through hooks instead of the default browser handling
    fn register_links(&mut self, content: &str) {
        let hash = content_hash(content);
        if self.hooked_hash == Some(hash) {
            return;
        }

        for link in self.hooked_links.drain(..) {
            self.cache.remove_link_hook(&link);
        }
        self.hooked_links = extract_links(content);
        for link in &self.hooked_links {
            self.cache.add_link_hook(link);
        }
        self.hooked_hash = Some(hash);
    }

    fn take_clicked_link(&self) -> Option<String> {
        self.hooked_links
            .iter()
            .find(|link| self.cache.get_link_hook(link) == Some(true))
            .cloned()
    }

    pub fn scroll_target(&mut self) -> &mut PaneScrollState {
        self.scroll.target()
    }

    pub fn jump_to(&mut self, percentage: f32) {
        self.scroll.jump_to(percentage);
    }

    /// Drop cached layout after the displayed document changed
    pub fn reset(&mut self) {
        self.scroll.reset();
        self.cache = CommonMarkCache::default();
        self.hooked_links.clear();
        self.hooked_hash = None;
    }

    /// Show welcome screen when no document is open
    fn show_welcome(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);

            ui.heading("Welcome to mdox");
            ui.add_space(20.0);

            ui.label("Open a markdown file or a URL, or drop a file here.");
            ui.add_space(10.0);

            ui.label("Keyboard shortcuts:");
            ui.label("  Ctrl+O - Open");
            ui.label("  Ctrl+N - New document");
            ui.label("  Ctrl+S - Save");
            ui.label("  Ctrl+E - Toggle edit mode");
            ui.label("  Ctrl+\\ - Toggle split view");
            ui.label("  Ctrl+F - Find");
            ui.label("  Alt+Left / Alt+Right - Back / Forward");
        });
    }
}
