//! File explorer for the configured root directory

use std::collections::HashMap;
use std::path::Path;

use eframe::egui;

use super::dialogs::{self, InputDialog};
use crate::core::error::ContentError;
use crate::core::ports::{ContentStore, DirEntry};

/// A change requested from the tree's context menus
#[derive(Debug, Clone, PartialEq, Eq)]
enum TreeAction {
    NewFile { parent: String },
    NewFolder { parent: String },
    Rename { path: String },
    Delete { path: String },
}

/// Directory listings loaded on first expansion
#[derive(Debug, Default)]
pub struct FileTree {
    listings: HashMap<String, Vec<DirEntry>>,
    pending: Option<TreeAction>,
    input: InputDialog,
}

/// Append `.md` to a new file name that has no markdown extension
pub fn markdown_file_name(name: &str) -> String {
    if name.ends_with(".md") || name.ends_with(".markdown") {
        name.to_string()
    } else {
        format!("{name}.md")
    }
}

fn sibling_path(path: &str, new_name: &str) -> String {
    Path::new(path)
        .with_file_name(new_name)
        .to_string_lossy()
        .to_string()
}

fn child_path(parent: &str, name: &str) -> String {
    Path::new(parent).join(name).to_string_lossy().to_string()
}

impl FileTree {
    /// Forget cached listings
    pub fn refresh(&mut self) {
        self.listings.clear();
    }

    fn listing(&mut self, store: &dyn ContentStore, path: &str) -> Vec<DirEntry> {
        if let Some(entries) = self.listings.get(path) {
            return entries.clone();
        }

        let entries = store.list_directory(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to list {}: {}", path, e);
            Vec::new()
        });
        self.listings.insert(path.to_string(), entries.clone());
        entries
    }

    /// Show the tree under `root`. Returns the markdown file the user picked.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        store: &dyn ContentStore,
        root: &Path,
        active: Option<&str>,
    ) -> Option<String> {
        let root = root.to_string_lossy().to_string();
        let mut picked = None;

        ui.horizontal(|ui| {
            ui.strong("Explorer");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("\u{21BB}").on_hover_text("Refresh").clicked() {
                    self.refresh();
                }
                if ui.small_button("+").on_hover_text("New file").clicked() {
                    self.pending = Some(TreeAction::NewFile { parent: root.clone() });
                }
            });
        });

        self.show_directory_contents(ui, store, &root, active, &mut picked);
        self.run_pending(ui.ctx(), store);
        picked
    }

    fn show_directory_contents(
        &mut self,
        ui: &mut egui::Ui,
        store: &dyn ContentStore,
        path: &str,
        active: Option<&str>,
        picked: &mut Option<String>,
    ) {
        for entry in self.listing(store, path) {
            if entry.is_dir {
                let id = ui.make_persistent_id(&entry.path);
                egui::collapsing_header::CollapsingState::load_with_default_open(ui.ctx(), id, false)
                    .show_header(ui, |ui| {
                        let response = ui.label(format!("\u{1F4C1} {}", entry.name));
                        self.context_menu(&response, &entry);
                    })
                    .body(|ui| {
                        self.show_directory_contents(ui, store, &entry.path, active, picked);
                    });
            } else {
                let icon = if entry.is_markdown() { "\u{1F4DD}" } else { "\u{1F4C4}" };
                let is_active = active == Some(entry.path.as_str());

                ui.horizontal(|ui| {
                    ui.add_space(16.0);
                    let response = ui.selectable_label(is_active, format!("{} {}", icon, entry.name));
                    if response.clicked() && entry.is_markdown() {
                        *picked = Some(entry.path.clone());
                    }
                    self.context_menu(&response, &entry);
                });
            }
        }
    }

    fn context_menu(&mut self, response: &egui::Response, entry: &DirEntry) {
        response.context_menu(|ui| {
            if entry.is_dir {
                if ui.button("New file").clicked() {
                    self.pending = Some(TreeAction::NewFile { parent: entry.path.clone() });
                    ui.close();
                }
                if ui.button("New folder").clicked() {
                    self.pending = Some(TreeAction::NewFolder { parent: entry.path.clone() });
                    ui.close();
                }
            }
            if ui.button("Rename").clicked() {
                self.pending = Some(TreeAction::Rename { path: entry.path.clone() });
                ui.close();
            }
            if ui.button("Delete").clicked() {
                self.pending = Some(TreeAction::Delete { path: entry.path.clone() });
                ui.close();
            }
        });
    }

    /// Prompt for and apply the pending context action
    fn run_pending(&mut self, ctx: &egui::Context, store: &dyn ContentStore) {
        let Some(action) = self.pending.clone() else {
            return;
        };

        if let TreeAction::Delete { path } = &action {
            self.pending = None;
            let name = Path::new(path).file_name().map(|n| n.to_string_lossy().to_string());
            let question = format!("Delete {}?", name.as_deref().unwrap_or(path));
            if dialogs::confirm("Delete", &question) {
                self.apply(store.delete(path), path);
            }
            return;
        }

        if !self.input.is_open() {
            match &action {
                TreeAction::NewFile { .. } => self.input.open("New File", "File name:", ""),
                TreeAction::NewFolder { .. } => self.input.open("New Folder", "Folder name:", ""),
                TreeAction::Rename { path } => {
                    let current = Path::new(path)
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    self.input.open("Rename", "New name:", &current);
                }
                TreeAction::Delete { .. } => {}
            }
        }

        let Some(name) = self.input.show(ctx) else {
            if !self.input.is_open() {
                self.pending = None;
            }
            return;
        };
        self.pending = None;

        match action {
            TreeAction::NewFile { parent } => {
                let path = child_path(&parent, &markdown_file_name(&name));
                self.apply(store.create_file(&path), &path);
            }
            TreeAction::NewFolder { parent } => {
                let path = child_path(&parent, &name);
                self.apply(store.create_directory(&path), &path);
            }
            TreeAction::Rename { path } => {
                let target = sibling_path(&path, &name);
                self.apply(store.rename(&path, &target), &path);
            }
            TreeAction::Delete { .. } => {}
        }
    }

    fn apply(&mut self, result: Result<(), ContentError>, path: &str) {
        match result {
            Ok(()) => {
                tracing::info!("Updated {}", path);
                self.refresh();
            }
            Err(e) => tracing::error!("File operation failed: {}", e),
        }
    }
}
