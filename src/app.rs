//! Main application state and UI coordination

use std::sync::mpsc::Receiver;

use eframe::egui;

use crate::core::config::Theme;
use crate::core::document::Mode;
use crate::core::markdown::heading_fraction;
use crate::core::scroll_sync::ScrollSyncCoordinator;
use crate::core::search::DocumentSearch;
use crate::core::session::{DocumentSessionController, HostEvent, LinkOutcome};
use crate::core::tasks::Completion;
use crate::ui::dialogs::{self, UrlDialog};
use crate::ui::editor::EditorPanel;
use crate::ui::file_tree::FileTree;
use crate::ui::sidebar::Sidebar;
use crate::ui::viewer::ViewerPanel;

/// A user command from the menu bar or a keyboard shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Open,
    OpenUrl,
    New,
    Save,
    SaveAs,
    ToggleEdit,
    ToggleSplit,
    Find,
    Back,
    Forward,
    ToggleSidebar,
    ToggleTheme,
    Quit,
}

#[derive(Debug, Clone, Copy)]
enum FindStep {
    Current,
    Next,
    Previous,
}

/// Find bar state
#[derive(Debug, Default)]
struct FindBar {
    visible: bool,
    term: String,
    search: DocumentSearch,
}

/// Main application state
pub struct MdoxApp {
    pub(crate) controller: DocumentSessionController,
    completions: Receiver<Completion>,
    pub(crate) file_tree: FileTree,
    editor: EditorPanel,
    viewer: ViewerPanel,
    scroll_sync: ScrollSyncCoordinator,
    find: FindBar,
    url_dialog: UrlDialog,
    sidebar_visible: bool,
    /// Session generation the panels were last reset for
    shown_generation: u64,
    applied_theme: Option<Theme>,
    window_title: String,
}

impl MdoxApp {
    /// Create the application; `startup` is opened as a root document
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        mut controller: DocumentSessionController,
        completions: Receiver<Completion>,
        startup: Option<String>,
    ) -> Self {
        // Images referenced from documents
        egui_extras::install_image_loaders(&cc.egui_ctx);

        if let Some(locator) = startup {
            controller.handle_event(HostEvent::OpenRequested(locator));
        }

        Self {
            controller,
            completions,
            file_tree: FileTree::default(),
            editor: EditorPanel::default(),
            viewer: ViewerPanel::default(),
            scroll_sync: ScrollSyncCoordinator::new(),
            find: FindBar::default(),
            url_dialog: UrlDialog::default(),
            sidebar_visible: true,
            shown_generation: 0,
            applied_theme: None,
            window_title: String::new(),
        }
    }

    /// Feed finished background jobs to the controller
    fn drain_completions(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            self.controller.handle_completion(completion);
        }
    }

    /// Reset panes when a different document is shown, then honor a pending anchor
    fn sync_with_session(&mut self) {
        let generation = self.controller.session_generation();
        if generation != self.shown_generation {
            self.shown_generation = generation;
            self.editor.reset();
            self.viewer.reset();
            let term = self.find.term.clone();
            self.find.search.update(&term, self.controller.session().edited_content());
        }

        if let Some(anchor) = self.controller.take_pending_anchor() {
            self.scroll_to_anchor(&anchor);
        }
    }

    fn scroll_to_anchor(&mut self, anchor: &str) {
        match heading_fraction(self.controller.session().edited_content(), anchor) {
            Some(fraction) => self.viewer.jump_to(fraction),
            None => tracing::debug!("No heading for anchor #{}", anchor),
        }
    }

    fn apply_theme(&mut self, ctx: &egui::Context) {
        let theme = self.controller.config().theme;
        if self.applied_theme == Some(theme) {
            return;
        }
        ctx.set_visuals(match theme {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        });
        self.applied_theme = Some(theme);
    }

    fn update_window_title(&mut self, ctx: &egui::Context) {
        let session = self.controller.session();
        let title = if session.has_document() {
            let marker = if session.is_dirty() { "*" } else { "" };
            format!("{}{} - mdox", session.title(), marker)
        } else {
            "mdox".to_string()
        };

        if title != self.window_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.window_title = title;
        }
    }

    /// Collect keyboard shortcuts
    fn shortcuts(ctx: &egui::Context) -> Vec<Command> {
        let mut commands = Vec::new();
        ctx.input(|i| {
            let ctrl = i.modifiers.command;
            if ctrl && i.key_pressed(egui::Key::O) {
                commands.push(Command::Open);
            }
            if ctrl && i.key_pressed(egui::Key::N) {
                commands.push(Command::New);
            }
            if ctrl && i.key_pressed(egui::Key::S) {
                commands.push(if i.modifiers.shift { Command::SaveAs } else { Command::Save });
            }
            if ctrl && i.key_pressed(egui::Key::E) {
                commands.push(Command::ToggleEdit);
            }
            if ctrl && i.key_pressed(egui::Key::Backslash) {
                commands.push(Command::ToggleSplit);
            }
            if ctrl && i.key_pressed(egui::Key::F) {
                commands.push(Command::Find);
            }
            if ctrl && i.key_pressed(egui::Key::B) {
                commands.push(Command::ToggleSidebar);
            }
            if i.modifiers.alt && i.key_pressed(egui::Key::ArrowLeft) {
                commands.push(Command::Back);
            }
            if i.modifiers.alt && i.key_pressed(egui::Key::ArrowRight) {
                commands.push(Command::Forward);
            }
        });
        commands
    }

    fn execute(&mut self, ctx: &egui::Context, command: Command) {
        match command {
            Command::Open => {
                if let Some(path) = dialogs::pick_markdown_file() {
                    self.controller.handle_event(HostEvent::OpenRequested(path));
                }
            }
            Command::OpenUrl => self.url_dialog.open(),
            Command::New => self.controller.handle_event(HostEvent::NewDocumentRequested),
            Command::Save => {
                if let Err(e) = self.controller.save() {
                    tracing::debug!("Save not started: {}", e);
                }
            }
            Command::SaveAs => self.controller.handle_event(HostEvent::SaveAsRequested),
            Command::ToggleEdit => self.controller.toggle_edit_mode(),
            Command::ToggleSplit => self.controller.toggle_split(),
            Command::Find => {
                self.find.visible = !self.find.visible;
                if !self.find.visible {
                    self.find.term.clear();
                    self.find.search.clear();
                }
            }
            Command::Back => {
                self.controller.go_back();
            }
            Command::Forward => {
                self.controller.go_forward();
            }
            Command::ToggleSidebar => self.sidebar_visible = !self.sidebar_visible,
            Command::ToggleTheme => self.controller.toggle_theme(),
            Command::Quit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
        }
    }

    /// Open dropped markdown files as root documents
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<String> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.as_ref())
                .map(|p| p.to_string_lossy().to_string())
                .collect()
        });

        // Only one document is shown at a time
        if let Some(path) = dropped.into_iter().next() {
            self.controller.handle_event(HostEvent::OpenRequested(path));
        }
    }

    fn handle_close_request(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.viewport().close_requested()) && !self.controller.confirm_close() {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        }
    }

    fn handle_link(&mut self, href: &str) {
        match self.controller.follow_link(href) {
            LinkOutcome::ScrollToAnchor(anchor) => self.scroll_to_anchor(&anchor),
            LinkOutcome::External(url) => {
                if let Err(e) = open::that(&url) {
                    tracing::error!("Failed to open {}: {}", url, e);
                }
            }
            LinkOutcome::Opened | LinkOutcome::Ignored | LinkOutcome::Failed => {}
        }
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut recent_pick = None;
        let recent: Vec<String> = self.controller.recent_files().entries().to_vec();
        let mode = self.controller.session().mode();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let mut item = |ui: &mut egui::Ui, label: &str, shortcut: &str, command: Command| {
                        if ui.add(egui::Button::new(label).shortcut_text(shortcut)).clicked() {
                            commands.push(command);
                            ui.close();
                        }
                    };
                    item(ui, "Open...", "Ctrl+O", Command::Open);
                    item(ui, "Open URL...", "", Command::OpenUrl);
                    item(ui, "New", "Ctrl+N", Command::New);
                    ui.separator();
                    item(ui, "Save", "Ctrl+S", Command::Save);
                    item(ui, "Save As...", "Ctrl+Shift+S", Command::SaveAs);
                    ui.separator();
                    ui.menu_button("Recent", |ui| {
                        if recent.is_empty() {
                            ui.weak("No recent files");
                        }
                        for locator in &recent {
                            if ui.button(locator).clicked() {
                                recent_pick = Some(locator.clone());
                                ui.close();
                            }
                        }
                    });
                    ui.separator();
                    item(ui, "Quit", "", Command::Quit);
                });

                ui.menu_button("View", |ui| {
                    let mut item = |ui: &mut egui::Ui, selected: bool, label: &str, command: Command| {
                        if ui.selectable_label(selected, label).clicked() {
                            commands.push(command);
                            ui.close();
                        }
                    };
                    item(ui, self.sidebar_visible, "Sidebar", Command::ToggleSidebar);
                    item(ui, mode.is_editing(), "Edit Mode", Command::ToggleEdit);
                    item(ui, mode == Mode::EditSplit, "Split View", Command::ToggleSplit);
                    item(ui, false, "Toggle Theme", Command::ToggleTheme);
                    item(ui, self.find.visible, "Find", Command::Find);
                });
            });
        });

        if let Some(locator) = recent_pick {
            self.controller.open_recent(&locator);
        }
        commands
    }

    /// Back/forward, document title and status
    fn render_toolbar(&mut self, ctx: &egui::Context) -> Vec<Command> {
        let mut commands = Vec::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(self.controller.can_go_back(), egui::Button::new("\u{2190}"))
                    .on_hover_text("Back (Alt+Left)")
                    .clicked()
                {
                    commands.push(Command::Back);
                }
                if ui
                    .add_enabled(self.controller.can_go_forward(), egui::Button::new("\u{2192}"))
                    .on_hover_text("Forward (Alt+Right)")
                    .clicked()
                {
                    commands.push(Command::Forward);
                }
                ui.separator();

                let session = self.controller.session();
                if session.has_document() {
                    let title = if session.is_dirty() {
                        format!("{}*", session.title())
                    } else {
                        session.title()
                    };
                    let label = ui.strong(title);
                    if let Some(identity) = session.identity() {
                        label.on_hover_text(identity.display());
                    }
                    if session.is_remote() {
                        ui.weak("(remote, read-only)");
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.controller.is_loading() || self.controller.is_saving() {
                        ui.spinner();
                    }
                });
            });
        });

        commands
    }

    fn render_error_banner(&mut self, ctx: &egui::Context) {
        let Some((error, blocking)) = self
            .controller
            .error()
            .map(|e| (e.to_string(), e.is_blocking()))
        else {
            return;
        };

        let mut dismiss = false;
        egui::TopBottomPanel::top("error_banner").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let color = if blocking {
                    ui.visuals().error_fg_color
                } else {
                    ui.visuals().warn_fg_color
                };
                ui.colored_label(color, format!("\u{26A0} {error}"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("\u{2715}").on_hover_text("Dismiss").clicked() {
                        dismiss = true;
                    }
                });
            });
        });

        if dismiss {
            self.controller.dismiss_error();
        }
    }

    fn render_find_bar(&mut self, ctx: &egui::Context) {
        if !self.find.visible {
            return;
        }

        let mut step = None;
        let mut close = false;
        let content = self.controller.session().edited_content().to_string();

        egui::TopBottomPanel::top("find_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Find:");
                let response = ui.add(egui::TextEdit::singleline(&mut self.find.term).desired_width(240.0));
                if response.changed() {
                    self.find.search.update(&self.find.term, &content);
                    step = Some(FindStep::Current);
                }
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    step = Some(if ui.input(|i| i.modifiers.shift) {
                        FindStep::Previous
                    } else {
                        FindStep::Next
                    });
                    response.request_focus();
                }

                let status = match self.find.search.current_index() {
                    Some(index) => format!("{} of {}", index, self.find.search.match_count()),
                    None if self.find.term.is_empty() => String::new(),
                    None => "No matches".to_string(),
                };
                ui.weak(status);

                if ui.small_button("\u{2191}").on_hover_text("Previous").clicked() {
                    step = Some(FindStep::Previous);
                }
                if ui.small_button("\u{2193}").on_hover_text("Next").clicked() {
                    step = Some(FindStep::Next);
                }
                if ui.small_button("\u{2715}").clicked() {
                    close = true;
                }
            });
        });

        if let Some(step) = step {
            match step {
                FindStep::Current => {}
                FindStep::Next => {
                    self.find.search.next();
                }
                FindStep::Previous => {
                    self.find.search.previous();
                }
            }
            if let Some(fraction) = self.find.search.current_fraction(&content) {
                match self.controller.session().mode() {
                    Mode::Edit => self.editor.jump_to(fraction),
                    Mode::View | Mode::EditSplit => self.viewer.jump_to(fraction),
                }
            }
        }

        if close {
            self.execute(ctx, Command::Find);
        }
    }

    fn render_central(&mut self, ctx: &egui::Context) {
        let mode = self.controller.session().mode();
        let has_document = self.controller.session().has_document();
        self.scroll_sync.set_active(mode == Mode::EditSplit);

        let editor_settings = self.controller.config().editor.clone();
        let mut editor_report = None;
        let mut viewer_output = None;

        egui::CentralPanel::default().show(ctx, |ui| match mode {
            _ if !has_document => {
                viewer_output = Some(self.viewer.show(ui, None));
            }
            Mode::View => {
                let content = self.controller.session().edited_content().to_string();
                viewer_output = Some(self.viewer.show(ui, Some(&content)));
            }
            Mode::Edit => {
                editor_report = self.editor.show(ui, &mut self.controller, &editor_settings);
            }
            Mode::EditSplit => {
                ui.columns(2, |columns| {
                    editor_report = self.editor.show(&mut columns[0], &mut self.controller, &editor_settings);
                    let content = self.controller.session().edited_content().to_string();
                    viewer_output = Some(self.viewer.show(&mut columns[1], Some(&content)));
                });
            }
        });

        if let Some(report) = editor_report {
            self.scroll_sync.on_scroll(report, self.viewer.scroll_target());
        }

        if let Some(output) = viewer_output {
            if let Some(report) = output.scroll {
                self.scroll_sync.on_scroll(report, self.editor.scroll_target());
            }
            if let Some(href) = output.clicked_link {
                self.handle_link(&href);
            }
        }
    }
}

impl eframe::App for MdoxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_completions();
        self.sync_with_session();
        self.apply_theme(ctx);

        self.handle_dropped_files(ctx);
        self.handle_close_request(ctx);

        let mut commands = Self::shortcuts(ctx);
        commands.extend(self.render_menu_bar(ctx));
        commands.extend(self.render_toolbar(ctx));
        for command in commands {
            self.execute(ctx, command);
        }

        self.render_error_banner(ctx);
        self.render_find_bar(ctx);

        if let Some(url) = self.url_dialog.show(ctx) {
            self.controller.handle_event(HostEvent::OpenFromUrlRequested(url));
        }

        if self.sidebar_visible {
            egui::SidePanel::left("sidebar")
                .resizable(true)
                .default_width(250.0)
                .min_width(150.0)
                .show(ctx, |ui| {
                    Sidebar::show(ui, self);
                });
        }

        self.render_central(ctx);
        self.update_window_title(ctx);
    }
}
