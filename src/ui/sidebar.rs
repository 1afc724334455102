//! Sidebar with recent files, linked documents and the file explorer

use eframe::egui;

use super::dialogs;
use crate::app::MdoxApp;
use crate::core::session::OpenOptions;

/// Left-hand navigation panel
pub struct Sidebar;

impl Sidebar {
    /// Show the sidebar
    pub fn show(ui: &mut egui::Ui, app: &mut MdoxApp) {
        egui::ScrollArea::vertical()
            .id_salt("sidebar_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::show_recent_files(ui, app);
                ui.separator();
                Self::show_linked_documents(ui, app);
                ui.separator();
                Self::show_explorer(ui, app);
            });
    }

    fn show_recent_files(ui: &mut egui::Ui, app: &mut MdoxApp) {
        let recent: Vec<String> = app.controller.recent_files().entries().to_vec();

        egui::CollapsingHeader::new("Recent Files")
            .default_open(true)
            .show(ui, |ui| {
                if recent.is_empty() {
                    ui.weak("No recent files");
                    return;
                }

                for locator in &recent {
                    let name = locator
                        .trim_end_matches('/')
                        .rsplit(['/', '\\'])
                        .next()
                        .unwrap_or(locator);
                    let response = ui.selectable_label(false, name).on_hover_text(locator);
                    if response.clicked() {
                        app.controller.open_recent(locator);
                    }
                    response.context_menu(|ui| {
                        if ui.button("Remove from list").clicked() {
                            app.controller.remove_recent(locator);
                            ui.close();
                        }
                    });
                }

                if ui.small_button("Clear").clicked() {
                    app.controller.clear_recents();
                }
            });
    }

    fn show_linked_documents(ui: &mut egui::Ui, app: &mut MdoxApp) {
        let documents = app.controller.linked_documents().to_vec();
        let current = app
            .controller
            .session()
            .identity()
            .map(|identity| identity.locator.clone());

        egui::CollapsingHeader::new("Linked Documents")
            .default_open(true)
            .show(ui, |ui| {
                if app.controller.is_discovering() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.weak("Discovering links...");
                    });
                    return;
                }

                if documents.is_empty() {
                    ui.weak("No linked documents");
                    return;
                }

                for document in &documents {
                    let is_current = current.as_deref() == Some(document.locator.as_str());
                    if ui
                        .selectable_label(is_current, &document.title)
                        .on_hover_text(&document.locator)
                        .clicked()
                    {
                        app.controller.open_linked(document);
                    }
                }
            });
    }

    fn show_explorer(ui: &mut egui::Ui, app: &mut MdoxApp) {
        let Some(root) = app.controller.config().root_directory.clone() else {
            ui.weak("No folder open");
            ui.add_space(10.0);
            if ui.button("Open Folder...").clicked() {
                if let Some(path) = dialogs::pick_folder() {
                    app.file_tree.refresh();
                    app.controller.set_root_directory(Some(path));
                }
            }
            return;
        };

        let active = app
            .controller
            .session()
            .identity()
            .map(|identity| identity.locator.clone());
        let store = app.controller.services().content.clone();

        let picked = app.file_tree.show(ui, store.as_ref(), &root, active.as_deref());
        if let Some(path) = picked {
            app.controller.open(&path, OpenOptions::root());
        }
    }
}
