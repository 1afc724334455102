//! The document session controller
//!
//! Owns the displayed document, its dirty state and mode, the browsing history,
//! the recent-files list and the linked-document list. Every navigation goes
//! through here: the unsaved-changes guard runs first, loads are started as
//! background jobs, and their completions are applied only while their request
//! token is still the latest.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::config::AppConfig;
use super::discovery::{DiscoveryRoot, LinkedDocuments};
use super::document::{DocumentIdentity, DocumentSession, Mode, NEW_DOCUMENT_TEMPLATE};
use super::error::SessionError;
use super::history::NavigationHistory;
use super::links::{self, LinkKind};
use super::ports::{Dialogs, LinkedDocument, Services, SettingsStore};
use super::recent::RecentFiles;
use super::tasks::{
    Completion, LoadedDocument, RequestToken, SavedDocument, Spawner, TokenCounter,
};

/// How an open request affects history, recents and discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub add_to_history: bool,
    /// Root documents anchor link discovery and the recent-files list
    pub is_root_document: bool,
    /// Only honored for root documents
    pub add_to_recent: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            add_to_history: true,
            is_root_document: false,
            add_to_recent: true,
        }
    }
}

impl OpenOptions {
    /// Explicit user open: menu, file picker, drag and drop, CLI, recents, URL dialog
    pub fn root() -> Self {
        Self {
            is_root_document: true,
            ..Self::default()
        }
    }

    /// In-content link or linked-document pick
    pub fn link() -> Self {
        Self {
            add_to_recent: false,
            ..Self::default()
        }
    }

    /// Back/forward
    pub fn history_move() -> Self {
        Self {
            add_to_history: false,
            is_root_document: false,
            add_to_recent: false,
        }
    }
}

/// Lifecycle requests raised by the host (menus, CLI, drag and drop)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    OpenRequested(String),
    NewDocumentRequested,
    SaveAsRequested,
    OpenFromUrlRequested(String),
}

/// What the presentation layer should do after a link click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Scroll the viewer to the heading with this id
    ScrollToAnchor(String),
    /// Hand the URL to the system browser
    External(String),
    /// A load was started
    Opened,
    /// Nothing to do (no base document, or the user kept their changes)
    Ignored,
    /// The link could not be resolved; the error is set
    Failed,
}

#[derive(Debug)]
struct PendingLoad {
    token: RequestToken,
    options: OpenOptions,
    anchor: Option<String>,
    /// `edit_revision` when the load was requested
    edit_revision: u64,
    /// History as it was before a back/forward move started this load
    history_before: Option<NavigationHistory>,
}

/// Fetch and render one document. Runs on a worker thread.
fn load_document(services: &Services, locator: &str, remote: bool) -> Result<LoadedDocument, SessionError> {
    let load_error = |message: String| SessionError::Load {
        locator: locator.to_string(),
        message,
    };

    let (identity, content) = if remote {
        let fetched = services
            .remote
            .fetch(locator)
            .map_err(|e| load_error(e.to_string()))?;
        (DocumentIdentity::remote(fetched.canonical_url, locator), fetched.content)
    } else {
        let content = services
            .content
            .read(locator)
            .map_err(|e| load_error(e.to_string()))?;
        (DocumentIdentity::local(locator), content)
    };

    let html = services
        .render
        .render(&content, Some(&identity.locator))
        .map_err(|e| load_error(e.to_string()))?;

    Ok(LoadedDocument {
        identity,
        content,
        html,
    })
}

pub struct DocumentSessionController {
    services: Services,
    dialogs: Box<dyn Dialogs>,
    settings: Box<dyn SettingsStore>,
    spawner: Box<dyn Spawner>,
    config: AppConfig,
    session: DocumentSession,
    /// Bumped whenever `session` is replaced
    session_generation: u64,
    /// Bumped on every edit
    edit_revision: u64,
    history: NavigationHistory,
    linked: LinkedDocuments,
    /// Discovery root belonging to the displayed session
    displayed_root: Option<DiscoveryRoot>,
    loads: TokenCounter,
    pending_load: Option<PendingLoad>,
    saves: TokenCounter,
    saving: bool,
    pending_anchor: Option<String>,
    error: Option<SessionError>,
}

impl DocumentSessionController {
    pub fn new(
        services: Services,
        dialogs: Box<dyn Dialogs>,
        settings: Box<dyn SettingsStore>,
        spawner: Box<dyn Spawner>,
    ) -> Self {
        let config = settings.load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            AppConfig::default()
        });

        Self {
            services,
            dialogs,
            settings,
            spawner,
            config,
            session: DocumentSession::default(),
            session_generation: 0,
            edit_revision: 0,
            history: NavigationHistory::new(),
            linked: LinkedDocuments::default(),
            displayed_root: None,
            loads: TokenCounter::default(),
            pending_load: None,
            saves: TokenCounter::default(),
            saving: false,
            pending_anchor: None,
            error: None,
        }
    }

    // ----- read-only surface -----

    pub fn session(&self) -> &DocumentSession {
        &self.session
    }

    pub fn session_generation(&self) -> u64 {
        self.session_generation
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    pub fn linked_documents(&self) -> &[LinkedDocument] {
        self.linked.documents()
    }

    pub fn is_discovering(&self) -> bool {
        self.linked.is_loading()
    }

    pub fn discovery_root(&self) -> Option<&DiscoveryRoot> {
        self.linked.root()
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn recent_files(&self) -> &RecentFiles {
        &self.config.recent_files
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Anchor to scroll to once the document that was opened for it is shown
    pub fn take_pending_anchor(&mut self) -> Option<String> {
        self.pending_anchor.take()
    }

    // ----- navigation -----

    /// Open a local document
    pub fn open(&mut self, locator: &str, options: OpenOptions) -> bool {
        self.request_load(locator, false, options, None)
    }

    /// Open a remote document
    pub fn open_url(&mut self, url: &str, options: OpenOptions) -> bool {
        self.request_load(url, true, options, None)
    }

    /// Open a history entry, recent file or linked document, local or remote
    pub fn open_locator(&mut self, locator: &str, options: OpenOptions) -> bool {
        self.request_load(locator, links::is_remote_locator(locator), options, None)
    }

    pub fn open_recent(&mut self, locator: &str) -> bool {
        self.open_locator(locator, OpenOptions::root())
    }

    /// Sidebar pick of a discovered document; never becomes the root
    pub fn open_linked(&mut self, document: &LinkedDocument) -> bool {
        self.open_locator(&document.locator, OpenOptions::link())
    }

    pub fn go_back(&mut self) -> bool {
        self.move_in_history(false)
    }

    pub fn go_forward(&mut self) -> bool {
        self.move_in_history(true)
    }

    fn move_in_history(&mut self, forward: bool) -> bool {
        let target = if forward {
            self.history.peek_forward()
        } else {
            self.history.peek_back()
        };
        let Some(target) = target.map(str::to_string) else {
            return false;
        };
        if !self.confirm_discard_changes() {
            return false;
        }

        let before = self.history.clone();
        if forward {
            self.history.forward();
        } else {
            self.history.back();
        }
        self.start_load(&target, links::is_remote_locator(&target), OpenOptions::history_move(), None);
        if let Some(pending) = self.pending_load.as_mut() {
            pending.history_before = Some(before);
        }
        true
    }

    /// Handle a click on a link inside the rendered document
    pub fn follow_link(&mut self, href: &str) -> LinkOutcome {
        match links::classify(href) {
            LinkKind::Anchor => LinkOutcome::ScrollToAnchor(links::normalize_anchor_id(href)),
            LinkKind::Absolute => LinkOutcome::External(href.to_string()),
            LinkKind::Relative => {
                let Some(identity) = self.session.identity() else {
                    return LinkOutcome::Ignored;
                };
                let (path, fragment) = links::split_fragment(href);
                if path.is_empty() {
                    return LinkOutcome::Ignored;
                }

                let is_remote = identity.is_remote;
                let resolved = links::resolve(
                    &identity.locator,
                    path,
                    is_remote,
                    self.services.content.as_ref(),
                );

                match resolved {
                    Ok(target) => {
                        let anchor = fragment.map(links::normalize_anchor_id);
                        if self.request_load(&target, is_remote, OpenOptions::link(), anchor) {
                            LinkOutcome::Opened
                        } else {
                            LinkOutcome::Ignored
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to resolve link {}: {}", href, e);
                        self.error = Some(SessionError::LinkResolution {
                            href: href.to_string(),
                            message: e.to_string(),
                        });
                        LinkOutcome::Failed
                    }
                }
            }
        }
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::OpenRequested(locator) => {
                self.open_locator(&locator, OpenOptions::root());
            }
            HostEvent::NewDocumentRequested => {
                self.new_document();
            }
            HostEvent::SaveAsRequested => self.save_as(),
            HostEvent::OpenFromUrlRequested(url) => {
                self.open_url(&url, OpenOptions::root());
            }
        }
    }

    /// Unsaved-changes guard. Declining is a normal abort, not an error.
    fn confirm_discard_changes(&self) -> bool {
        if !self.session.is_dirty() {
            return true;
        }
        let confirmed = self.dialogs.confirm_discard();
        if !confirmed {
            tracing::debug!("Navigation aborted, unsaved changes kept");
        }
        confirmed
    }

    /// Ask before the window closes with unsaved changes
    pub fn confirm_close(&self) -> bool {
        self.confirm_discard_changes()
    }

    fn request_load(
        &mut self,
        locator: &str,
        remote: bool,
        options: OpenOptions,
        anchor: Option<String>,
    ) -> bool {
        if !self.confirm_discard_changes() {
            return false;
        }
        self.start_load(locator, remote, options, anchor);
        true
    }

    /// Start a load without consulting the guard
    fn start_load(&mut self, locator: &str, remote: bool, options: OpenOptions, anchor: Option<String>) {
        if options.is_root_document {
            self.linked.set_root(None, &self.services, self.spawner.as_ref());
        }

        let token = self.loads.issue();
        self.pending_load = Some(PendingLoad {
            token,
            options,
            anchor,
            edit_revision: self.edit_revision,
            history_before: None,
        });
        self.error = None;

        tracing::info!("Opening {}", locator);
        let services = self.services.clone();
        let locator = locator.to_string();
        self.spawner.spawn(
            Duration::ZERO,
            Box::new(move || Completion::Load {
                token,
                result: load_document(&services, &locator, remote),
            }),
        );
    }

    /// Apply a background job's result
    pub fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Load { token, result } => self.finish_load(token, result),
            Completion::Save { token, result } => self.finish_save(token, result),
            Completion::Discovery { token, root, result } => {
                self.linked.apply(token, &root, result);
            }
        }
    }

    fn finish_load(&mut self, token: RequestToken, result: Result<LoadedDocument, SessionError>) {
        if !self.loads.is_current(token) {
            tracing::debug!("Discarding superseded load result");
            return;
        }
        let Some(pending) = self.pending_load.take() else {
            return;
        };

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("{}", e);
                self.error = Some(e);
                self.restore_displayed_root();
                return;
            }
        };

        // Typed into the editor while the load was in flight
        if pending.edit_revision != self.edit_revision && !self.confirm_discard_changes() {
            tracing::debug!("Dropping loaded {}, unsaved changes kept", loaded.identity.locator);
            if let Some(history) = pending.history_before {
                self.history = history;
            }
            self.restore_displayed_root();
            return;
        }

        let locator = loaded.identity.locator.clone();
        let recent_locator = loaded.identity.display().to_string();
        let is_remote = loaded.identity.is_remote;

        self.session = DocumentSession::loaded(loaded.identity, loaded.content, loaded.html);
        self.session_generation += 1;
        self.saves.invalidate();
        self.saving = false;
        self.pending_anchor = pending.anchor;

        if pending.options.is_root_document {
            let root = Some(DiscoveryRoot {
                locator: locator.clone(),
                is_remote,
            });
            self.displayed_root = root.clone();
            self.linked.set_root(root, &self.services, self.spawner.as_ref());

            if pending.options.add_to_recent {
                self.config.recent_files.add(&recent_locator);
                self.persist_settings();
            }
        } else {
            // A root open superseded by this load cleared the root
            self.restore_displayed_root();
        }

        if pending.options.add_to_history {
            self.history.push(&locator);
        }

        tracing::info!("Opened {}", locator);
    }

    /// Point discovery back at the displayed session's root
    fn restore_displayed_root(&mut self) {
        if self.linked.root() != self.displayed_root.as_ref() {
            let root = self.displayed_root.clone();
            self.linked.set_root(root, &self.services, self.spawner.as_ref());
        }
    }

    // ----- editing -----

    /// Replace the edited text and re-render. Render failures are only logged.
    pub fn edit(&mut self, new_content: String) {
        self.session.set_edited_content(new_content);
        self.edit_revision += 1;

        let base = self.session.identity().map(|id| id.locator.clone());
        match self
            .services
            .render
            .render(self.session.edited_content(), base.as_deref())
        {
            Ok(html) => self.session.set_rendered_html(html),
            Err(e) => tracing::warn!("Live render failed: {}", e),
        }
    }

    /// Persist the edited content to the document's own location
    pub fn save(&mut self) -> Result<(), SessionError> {
        if !self.session.is_dirty() {
            return Ok(());
        }

        let Some(identity) = self.session.identity() else {
            self.save_as();
            return Ok(());
        };

        if identity.is_remote {
            let err = SessionError::RemoteSaveRejected;
            tracing::warn!("{}", err);
            self.error = Some(err.clone());
            return Err(err);
        }

        let locator = identity.locator.clone();
        self.start_save(locator, false);
        Ok(())
    }

    /// Persist to a location picked by the user; the document moves there.
    /// Write failures arrive with the save completion.
    pub fn save_as(&mut self) {
        if !self.session.has_document() {
            return;
        }

        let suggested = self
            .session
            .identity()
            .map(DocumentIdentity::file_name)
            .unwrap_or_else(|| "untitled.md".to_string());

        let Some(locator) = self.dialogs.pick_save_location(&suggested) else {
            tracing::debug!("Save As cancelled");
            return;
        };

        self.start_save(locator, true);
    }

    fn start_save(&mut self, locator: String, relocated: bool) {
        let token = self.saves.issue();
        self.saving = true;

        let content = self.session.edited_content().to_string();
        let store = Arc::clone(&self.services.content);
        self.spawner.spawn(
            Duration::ZERO,
            Box::new(move || {
                let result = match store.write(&locator, &content) {
                    Ok(()) => Ok(SavedDocument {
                        locator,
                        content,
                        relocated,
                    }),
                    Err(e) => Err(SessionError::Save {
                        locator,
                        message: e.to_string(),
                    }),
                };
                Completion::Save { token, result }
            }),
        );
    }

    fn finish_save(&mut self, token: RequestToken, result: Result<SavedDocument, SessionError>) {
        let current = self.saves.is_current(token);
        if current {
            self.saving = false;
        }

        let saved = match result {
            Ok(saved) => saved,
            Err(e) => {
                // Surfaced even for a replaced session: data may be lost
                tracing::error!("{}", e);
                self.dialogs.alert("Save failed", &e.to_string());
                self.error = Some(e);
                return;
            }
        };

        if !current {
            tracing::debug!("Save of {} finished for a replaced session", saved.locator);
            return;
        }

        let identity = saved
            .relocated
            .then(|| DocumentIdentity::local(saved.locator.clone()));
        self.session.mark_saved(saved.content, identity);

        if saved.relocated {
            let root = Some(DiscoveryRoot {
                locator: saved.locator.clone(),
                is_remote: false,
            });
            self.displayed_root = root.clone();
            self.linked.set_root(root, &self.services, self.spawner.as_ref());
            self.config.recent_files.add(&saved.locator);
            self.persist_settings();
        }

        tracing::info!("Saved {}", saved.locator);
    }

    /// Start an untitled document from the template
    pub fn new_document(&mut self) -> bool {
        if !self.confirm_discard_changes() {
            return false;
        }

        self.loads.invalidate();
        self.pending_load = None;
        self.saves.invalidate();
        self.saving = false;
        self.displayed_root = None;
        self.linked.set_root(None, &self.services, self.spawner.as_ref());

        let html = self
            .services
            .render
            .render(NEW_DOCUMENT_TEMPLATE, None)
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to render template: {}", e);
                String::new()
            });
        self.session = DocumentSession::untitled(NEW_DOCUMENT_TEMPLATE, html);
        self.session_generation += 1;
        self.pending_anchor = None;
        self.error = None;
        true
    }

    // ----- modes -----

    /// View -> split editing; any editing mode -> View
    pub fn toggle_edit_mode(&mut self) {
        if !self.session.has_document() {
            return;
        }

        let next = if self.session.mode().is_editing() {
            Mode::View
        } else {
            Mode::EditSplit
        };
        self.session.set_mode(next);
    }

    pub fn toggle_split(&mut self) {
        match self.session.mode() {
            Mode::Edit => self.session.set_mode(Mode::EditSplit),
            Mode::EditSplit => self.session.set_mode(Mode::Edit),
            Mode::View => {}
        }
    }

    // ----- settings -----

    pub fn remove_recent(&mut self, locator: &str) {
        if self.config.recent_files.remove(locator) {
            self.persist_settings();
        }
    }

    pub fn clear_recents(&mut self) {
        self.config.recent_files.clear();
        self.persist_settings();
    }

    pub fn toggle_theme(&mut self) {
        self.config.theme = self.config.theme.toggled();
        self.persist_settings();
    }

    pub fn set_root_directory(&mut self, directory: Option<PathBuf>) {
        self.config.root_directory = directory;
        self.persist_settings();
    }

    fn persist_settings(&self) {
        if let Err(e) = self.settings.save(&self.config) {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }
}
