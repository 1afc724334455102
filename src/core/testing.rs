//! In-memory collaborators for controller and discovery tests

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use super::config::AppConfig;
use super::discovery::LinkCrawler;
use super::error::{ContentError, FetchError, RenderError};
use super::markdown::MarkdownRenderer;
use super::ports::{
    ContentStore, Dialogs, DirEntry, RemoteDocument, RemoteFetchService, RenderService, Services,
    SettingsStore,
};
use super::session::DocumentSessionController;
use super::tasks::{Completion, Job, Spawner};

/// Content that makes [`FlakyRenderer`] fail
pub const BROKEN_MARKDOWN: &str = "{{broken}}";

/// Collapse `.` and `..` segments of an absolute, `/`-separated path
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

/// [`ContentStore`] over a map of path to content
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    files: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryContentStore {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut map = store.files.lock().unwrap();
            for (path, content) in files {
                map.insert(path.to_string(), content.to_string());
            }
        }
        store
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ContentStore for MemoryContentStore {
    fn read(&self, locator: &str) -> Result<String, ContentError> {
        self.file(locator)
            .ok_or_else(|| ContentError::NotFound(locator.to_string()))
    }

    fn write(&self, locator: &str, content: &str) -> Result<(), ContentError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ContentError::io(locator, "disk full"));
        }
        self.files
            .lock()
            .unwrap()
            .insert(locator.to_string(), content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resolve_path(&self, base: &str, relative: &str) -> Result<String, ContentError> {
        let joined = if relative.starts_with('/') {
            relative.to_string()
        } else {
            let dir = base.rsplit_once('/').map_or("", |(dir, _)| dir);
            format!("{dir}/{relative}")
        };
        let resolved = normalize(&joined);

        if self.files.lock().unwrap().contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(ContentError::Resolution {
                base: base.to_string(),
                relative: relative.to_string(),
                message: "no such file".to_string(),
            })
        }
    }

    fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, ContentError> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let files = self.files.lock().unwrap();

        let mut entries: Vec<DirEntry> = Vec::new();
        for key in files.keys().filter_map(|k| k.strip_prefix(&prefix)) {
            let (name, is_dir) = match key.split_once('/') {
                Some((dir, _)) => (dir, true),
                None => (key, false),
            };
            if entries.iter().any(|e| e.name == name) {
                continue;
            }
            entries.push(DirEntry {
                name: name.to_string(),
                path: format!("{prefix}{name}"),
                is_dir,
            });
        }
        Ok(entries)
    }

    fn create_file(&self, path: &str) -> Result<(), ContentError> {
        self.write(path, "")
    }

    fn create_directory(&self, _path: &str) -> Result<(), ContentError> {
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), ContentError> {
        let prefix = format!("{path}/");
        self.files
            .lock()
            .unwrap()
            .retain(|k, _| k != path && !k.starts_with(&prefix));
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), ContentError> {
        let mut files = self.files.lock().unwrap();
        let content = files
            .remove(from)
            .ok_or_else(|| ContentError::NotFound(from.to_string()))?;
        files.insert(to.to_string(), content);
        Ok(())
    }
}

/// [`RemoteFetchService`] serving canned pages
#[derive(Debug, Default)]
pub struct FakeRemote {
    pages: Mutex<HashMap<String, RemoteDocument>>,
}

impl FakeRemote {
    pub fn with_page(self, url: &str, content: &str) -> Self {
        self.with_alias(url, url, content)
    }

    /// `requested` is served from `canonical`, like a GitHub repository page
    pub fn with_alias(self, requested: &str, canonical: &str, content: &str) -> Self {
        let document = RemoteDocument {
            content: content.to_string(),
            canonical_url: canonical.to_string(),
        };
        {
            let mut pages = self.pages.lock().unwrap();
            pages.insert(canonical.to_string(), document.clone());
            pages.insert(requested.to_string(), document);
        }
        self
    }
}

impl RemoteFetchService for FakeRemote {
    fn fetch(&self, url: &str) -> Result<RemoteDocument, FetchError> {
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::Http {
                status: 404,
                reason: "Not Found".to_string(),
            })
    }
}

/// The real renderer, except that it fails on [`BROKEN_MARKDOWN`]
#[derive(Debug, Default)]
pub struct FlakyRenderer {
    inner: MarkdownRenderer,
}

impl RenderService for FlakyRenderer {
    fn render(&self, content: &str, base_path: Option<&str>) -> Result<String, RenderError> {
        if content.contains(BROKEN_MARKDOWN) {
            return Err(RenderError::Parse("unbalanced template".to_string()));
        }
        self.inner.render(content, base_path)
    }
}

/// [`Spawner`] that queues jobs until the test runs them
#[derive(Clone, Default)]
pub struct JobQueue {
    jobs: Rc<RefCell<VecDeque<(Duration, Job)>>>,
}

impl JobQueue {
    /// Run every queued job in spawn order, ignoring delays
    pub fn run_all_pending(&self) -> Vec<Completion> {
        let jobs: Vec<_> = self.jobs.borrow_mut().drain(..).collect();
        jobs.into_iter().map(|(_, job)| job()).collect()
    }

    /// Delays of the queued jobs
    pub fn delays(&self) -> Vec<Duration> {
        self.jobs.borrow().iter().map(|(delay, _)| *delay).collect()
    }
}

impl Spawner for JobQueue {
    fn spawn(&self, delay: Duration, job: Job) {
        self.jobs.borrow_mut().push_back((delay, job));
    }
}

/// Scripted answers for [`Dialogs`]
#[derive(Debug, Default)]
pub struct DialogScript {
    answers: RefCell<VecDeque<bool>>,
    confirms: Cell<usize>,
    save_location: RefCell<Option<String>>,
    picks: Cell<usize>,
    alerts: RefCell<Vec<String>>,
}

impl DialogScript {
    pub fn accept_next(&self) {
        self.answers.borrow_mut().push_back(true);
    }

    pub fn decline_next(&self) {
        self.answers.borrow_mut().push_back(false);
    }

    pub fn set_save_location(&self, location: Option<&str>) {
        *self.save_location.borrow_mut() = location.map(str::to_string);
    }

    pub fn confirm_count(&self) -> usize {
        self.confirms.get()
    }

    pub fn pick_count(&self) -> usize {
        self.picks.get()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }
}

impl Dialogs for Rc<DialogScript> {
    fn confirm_discard(&self) -> bool {
        self.confirms.set(self.confirms.get() + 1);
        // Unscripted prompts keep the user's changes
        self.answers.borrow_mut().pop_front().unwrap_or(false)
    }

    fn pick_save_location(&self, _suggested_name: &str) -> Option<String> {
        self.picks.set(self.picks.get() + 1);
        self.save_location.borrow().clone()
    }

    fn alert(&self, title: &str, message: &str) {
        self.alerts.borrow_mut().push(format!("{title}: {message}"));
    }
}

/// Settings kept in memory; remembers the last saved config
#[derive(Clone, Default)]
pub struct MemorySettings {
    saved: Rc<RefCell<AppConfig>>,
}

impl MemorySettings {
    pub fn saved(&self) -> AppConfig {
        self.saved.borrow().clone()
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> Result<AppConfig> {
        Ok(self.saved())
    }

    fn save(&self, config: &AppConfig) -> Result<()> {
        *self.saved.borrow_mut() = config.clone();
        Ok(())
    }
}

/// A controller wired to in-memory collaborators
pub struct Harness {
    pub controller: DocumentSessionController,
    pub jobs: JobQueue,
    pub content: Arc<MemoryContentStore>,
    pub dialogs: Rc<DialogScript>,
    pub settings: MemorySettings,
}

impl Harness {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self::with_remote(files, FakeRemote::default())
    }

    pub fn with_remote(files: &[(&str, &str)], remote: FakeRemote) -> Self {
        let content = Arc::new(MemoryContentStore::with_files(files));
        let remote = Arc::new(remote);
        let services = Services {
            content: content.clone(),
            render: Arc::new(FlakyRenderer::default()),
            remote: remote.clone(),
            discovery: Arc::new(LinkCrawler::new(content.clone(), remote)),
        };

        let jobs = JobQueue::default();
        let dialogs = Rc::new(DialogScript::default());
        let settings = MemorySettings::default();
        let controller = DocumentSessionController::new(
            services,
            Box::new(dialogs.clone()),
            Box::new(settings.clone()),
            Box::new(jobs.clone()),
        );

        Self {
            controller,
            jobs,
            content,
            dialogs,
            settings,
        }
    }

    /// Run the queued jobs without delivering their completions
    pub fn run_pending(&self) -> Vec<Completion> {
        self.jobs.run_all_pending()
    }

    /// Run jobs and deliver completions until nothing is left
    pub fn settle(&mut self) {
        loop {
            let completions = self.jobs.run_all_pending();
            if completions.is_empty() {
                break;
            }
            for completion in completions {
                self.controller.handle_completion(completion);
            }
        }
    }
}
