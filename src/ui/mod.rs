//! UI components for mdox

pub mod dialogs;
pub mod editor;
pub mod file_tree;
pub mod sidebar;
pub mod viewer;

use eframe::egui;

use crate::core::scroll_sync::{scroll_percentage, Pane, PaneScrollState, ScrollReport};

/// A scroll area whose vertical position is tracked as a percentage
#[derive(Debug, Default)]
pub struct ScrollPane {
    state: PaneScrollState,
    /// Scrollable distance measured on the last frame
    max_offset: f32,
}

impl ScrollPane {
    /// Show `add_contents` in the scroll area and report user movement.
    ///
    /// Commands wait until the content has been measured once, so a jump
    /// issued right after a document change lands on the new layout.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        id_salt: &str,
        pane: Pane,
        horizontal: bool,
        add_contents: impl FnOnce(&mut egui::Ui),
    ) -> Option<ScrollReport> {
        let mut area = if horizontal {
            egui::ScrollArea::both()
        } else {
            egui::ScrollArea::vertical()
        }
        .id_salt(id_salt)
        .auto_shrink([false, false]);

        if self.max_offset > 0.0 {
            if let Some(percentage) = self.state.take_command() {
                area = area.vertical_scroll_offset(percentage * self.max_offset);
            }
        }

        let output = area.show(ui, add_contents);
        let viewport = output.inner_rect.height();
        self.max_offset = (output.content_size.y - viewport).max(0.0);

        let percentage = scroll_percentage(output.state.offset.y, output.content_size.y, viewport);
        self.state.observe(pane, percentage)
    }

    /// The pane as a scroll-sync target
    pub fn target(&mut self) -> &mut PaneScrollState {
        &mut self.state
    }

    pub fn jump_to(&mut self, percentage: f32) {
        self.state.jump_to(percentage);
    }

    /// Forget positions after the displayed document changed
    pub fn reset(&mut self) {
        self.state.reset();
        self.max_offset = 0.0;
    }
}
