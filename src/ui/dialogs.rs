//! Native prompts and small in-window dialogs

use std::path::PathBuf;

use eframe::egui;

use crate::core::ports::Dialogs;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// [`Dialogs`] backed by native message boxes and file pickers
#[derive(Debug, Clone, Copy, Default)]
pub struct RfdDialogs;

impl Dialogs for RfdDialogs {
    fn confirm_discard(&self) -> bool {
        confirm(
            "Unsaved changes",
            "You have unsaved changes. Discard them and continue?",
        )
    }

    fn pick_save_location(&self, suggested_name: &str) -> Option<String> {
        rfd::FileDialog::new()
            .add_filter("Markdown", MARKDOWN_EXTENSIONS)
            .set_file_name(suggested_name)
            .save_file()
            .map(|path| path.to_string_lossy().to_string())
    }

    fn alert(&self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// Blocking yes/no question
pub fn confirm(title: &str, message: &str) -> bool {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title(title)
        .set_description(message)
        .set_buttons(rfd::MessageButtons::YesNo)
        .show()
        == rfd::MessageDialogResult::Yes
}

pub fn pick_markdown_file() -> Option<String> {
    rfd::FileDialog::new()
        .add_filter("Markdown", MARKDOWN_EXTENSIONS)
        .add_filter("All files", &["*"])
        .pick_file()
        .map(|path| path.to_string_lossy().to_string())
}

pub fn pick_folder() -> Option<PathBuf> {
    rfd::FileDialog::new().pick_folder()
}

/// Accept only absolute http(s) URLs
pub fn validate_url(input: &str) -> Result<String, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Enter a URL".to_string());
    }

    let parsed = url::Url::parse(input).map_err(|e| format!("Invalid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(input.to_string()),
        other => Err(format!("Unsupported scheme: {other}")),
    }
}

/// "Open from URL" prompt
#[derive(Debug, Default)]
pub struct UrlDialog {
    visible: bool,
    input: String,
    error: Option<String>,
}

impl UrlDialog {
    pub fn open(&mut self) {
        self.visible = true;
        self.error = None;
    }

    /// Returns the URL once the user confirms a valid one
    pub fn show(&mut self, ctx: &egui::Context) -> Option<String> {
        if !self.visible {
            return None;
        }

        let mut result = None;
        let mut close = false;

        egui::Window::new("Open from URL")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_TOP, [0.0, 80.0])
            .show(ctx, |ui| {
                ui.label("Markdown file or GitHub repository URL:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.input)
                        .hint_text("https://github.com/user/repo")
                        .desired_width(420.0),
                );
                response.request_focus();

                if let Some(error) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }

                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        close = true;
                    }
                    if ui.button("Open").clicked() || submitted {
                        match validate_url(&self.input) {
                            Ok(url) => {
                                result = Some(url);
                                close = true;
                            }
                            Err(e) => self.error = Some(e),
                        }
                    }
                });
            });

        if close {
            self.visible = false;
            self.input.clear();
            self.error = None;
        }
        result
    }
}

/// Single-line text prompt used by the file explorer
#[derive(Debug, Default)]
pub struct InputDialog {
    visible: bool,
    title: String,
    label: String,
    value: String,
}

impl InputDialog {
    pub fn open(&mut self, title: &str, label: &str, initial: &str) {
        self.visible = true;
        self.title = title.to_string();
        self.label = label.to_string();
        self.value = initial.to_string();
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    /// Returns the entered text once confirmed
    pub fn show(&mut self, ctx: &egui::Context) -> Option<String> {
        if !self.visible {
            return None;
        }

        let mut result = None;
        let mut close = false;

        egui::Window::new(self.title.as_str())
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(self.label.as_str());
                    ui.text_edit_singleline(&mut self.value);
                });

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                    if ui.button("OK").clicked() {
                        let value = self.value.trim();
                        if !value.is_empty() {
                            result = Some(value.to_string());
                        }
                        close = true;
                    }
                });
            });

        if close {
            self.visible = false;
            self.value.clear();
        }
        result
    }
}
