//! Markdown source editor panel

use eframe::egui;

use super::ScrollPane;
use crate::core::config::EditorConfig;
use crate::core::scroll_sync::{Pane, PaneScrollState, ScrollReport};
use crate::core::session::DocumentSessionController;

/// Markdown editor panel
#[derive(Default)]
pub struct EditorPanel {
    /// Text bound to the widget; mirrors the session's edited content
    buffer: String,
    scroll: ScrollPane,
}

impl EditorPanel {
    /// Show the editor and forward edits to the controller
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        controller: &mut DocumentSessionController,
        settings: &EditorConfig,
    ) -> Option<ScrollReport> {
        if self.buffer != controller.session().edited_content() {
            self.buffer = controller.session().edited_content().to_string();
        }

        let buffer = &mut self.buffer;
        let mut changed = false;
        let report = self
            .scroll
            .show(ui, "editor_scroll", Pane::Editor, !settings.word_wrap, |ui| {
                let response = egui::TextEdit::multiline(buffer)
                    .font(egui::FontId::monospace(settings.font_size))
                    .code_editor()
                    .desired_width(f32::INFINITY)
                    .desired_rows(30)
                    .show(ui);
                changed = response.response.changed();
            });

        if changed {
            controller.edit(self.buffer.clone());
        }
        report
    }

    pub fn scroll_target(&mut self) -> &mut PaneScrollState {
        self.scroll.target()
    }

    pub fn jump_to(&mut self, percentage: f32) {
        self.scroll.jump_to(percentage);
    }

    pub fn reset(&mut self) {
        self.scroll.reset();
    }
}
