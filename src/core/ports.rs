//! Collaborator contracts consumed by the session controller
//!
//! Content, rendering, remote fetching and discovery run on worker threads, so
//! their traits are `Send + Sync` and shared through `Arc`. Dialogs and settings
//! only ever run on the UI thread.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::config::AppConfig;
use super::error::{ContentError, DiscoveryError, FetchError, RenderError};

/// An entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
}

impl DirEntry {
    /// Check if this is a markdown file
    pub fn is_markdown(&self) -> bool {
        !self.is_dir && super::links::is_markdown_locator(&self.path)
    }
}

/// File access keyed by locator (a filesystem path)
pub trait ContentStore: Send + Sync {
    fn read(&self, locator: &str) -> Result<String, ContentError>;

    fn write(&self, locator: &str, content: &str) -> Result<(), ContentError>;

    /// Resolve `relative` against the directory containing `base`.
    fn resolve_path(&self, base: &str, relative: &str) -> Result<String, ContentError>;

    fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, ContentError>;

    fn create_file(&self, path: &str) -> Result<(), ContentError>;

    fn create_directory(&self, path: &str) -> Result<(), ContentError>;

    fn delete(&self, path: &str) -> Result<(), ContentError>;

    fn rename(&self, from: &str, to: &str) -> Result<(), ContentError>;
}

/// Markdown to HTML
pub trait RenderService: Send + Sync {
    /// Heading ids must come from [`normalize_anchor_id`](super::links::normalize_anchor_id).
    fn render(&self, content: &str, base_path: Option<&str>) -> Result<String, RenderError>;
}

/// A fetched remote document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub content: String,
    /// Address the content was actually served from
    pub canonical_url: String,
}

pub trait RemoteFetchService: Send + Sync {
    fn fetch(&self, url: &str) -> Result<RemoteDocument, FetchError>;
}

/// A document reachable from the root document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedDocument {
    pub locator: String,
    pub title: String,
}

pub trait DiscoveryService: Send + Sync {
    fn discover_local(
        &self,
        root_path: &str,
        max_depth: usize,
    ) -> Result<Vec<LinkedDocument>, DiscoveryError>;

    fn discover_remote(
        &self,
        root_url: &str,
        max_depth: usize,
    ) -> Result<Vec<LinkedDocument>, DiscoveryError>;
}

/// User prompts. Calls block the UI thread until answered.
pub trait Dialogs {
    /// Ask whether unsaved changes may be discarded.
    fn confirm_discard(&self) -> bool;

    /// Ask for a destination path; `None` when cancelled.
    fn pick_save_location(&self, suggested_name: &str) -> Option<String>;

    /// Blocking alert
    fn alert(&self, title: &str, message: &str);
}

/// Persistence port for process-wide settings
pub trait SettingsStore {
    fn load(&self) -> Result<AppConfig>;

    fn save(&self, config: &AppConfig) -> Result<()>;
}

/// The worker-side collaborators, cheap to clone into jobs
#[derive(Clone)]
pub struct Services {
    pub content: Arc<dyn ContentStore>,
    pub render: Arc<dyn RenderService>,
    pub remote: Arc<dyn RemoteFetchService>,
    pub discovery: Arc<dyn DiscoveryService>,
}
