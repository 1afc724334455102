//! Local file access behind the [`ContentStore`] port

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use super::error::ContentError;
use super::ports::{ContentStore, DirEntry};

/// Directories never shown in listings
const SKIPPED_DIRECTORIES: &[&str] = &["node_modules", "target"];

/// [`ContentStore`] over the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalContentStore;

impl LocalContentStore {
    pub fn new() -> Self {
        Self
    }
}

/// Sort entries: directories first, then files, alphabetically
fn sort_entries(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
}

impl ContentStore for LocalContentStore {
    fn read(&self, locator: &str) -> Result<String, ContentError> {
        let path = Path::new(locator);

        if !path.exists() {
            return Err(ContentError::NotFound(locator.to_string()));
        }
        if !path.is_file() {
            return Err(ContentError::NotAFile(locator.to_string()));
        }

        fs::read_to_string(path).map_err(|e| ContentError::io(locator, e))
    }

    fn write(&self, locator: &str, content: &str) -> Result<(), ContentError> {
        fs::write(locator, content).map_err(|e| ContentError::io(locator, e))?;
        tracing::info!("Saved document: {}", locator);
        Ok(())
    }

    fn resolve_path(&self, base: &str, relative: &str) -> Result<String, ContentError> {
        let resolution_error = |message: String| ContentError::Resolution {
            base: base.to_string(),
            relative: relative.to_string(),
            message,
        };

        let base_dir = Path::new(base)
            .parent()
            .ok_or_else(|| resolution_error("base has no parent directory".to_string()))?;

        let canonical = base_dir
            .join(relative)
            .canonicalize()
            .map_err(|e| resolution_error(e.to_string()))?;

        canonical
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| resolution_error("path is not valid UTF-8".to_string()))
    }

    fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, ContentError> {
        let read_dir = fs::read_dir(path).map_err(|e| ContentError::io(path, e))?;

        let mut entries: Vec<DirEntry> = read_dir
            .flatten()
            .filter_map(|entry| {
                let entry_path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();

                // Skip hidden files and common non-content directories
                if name.starts_with('.') || SKIPPED_DIRECTORIES.contains(&name.as_str()) {
                    return None;
                }

                Some(DirEntry {
                    name,
                    is_dir: entry_path.is_dir(),
                    path: entry_path.to_string_lossy().to_string(),
                })
            })
            .collect();

        sort_entries(&mut entries);
        Ok(entries)
    }

    fn create_file(&self, path: &str) -> Result<(), ContentError> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent).map_err(|e| ContentError::io(path, e))?;
        }
        fs::write(path, "").map_err(|e| ContentError::io(path, e))
    }

    fn create_directory(&self, path: &str) -> Result<(), ContentError> {
        fs::create_dir_all(path).map_err(|e| ContentError::io(path, e))
    }

    fn delete(&self, path: &str) -> Result<(), ContentError> {
        let target = Path::new(path);
        let result = if target.is_dir() {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };
        result.map_err(|e| ContentError::io(path, e))
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), ContentError> {
        fs::rename(from, to).map_err(|e| ContentError::io(from, e))
    }
}
