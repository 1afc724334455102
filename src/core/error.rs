//! Error types for the document session engine

use thiserror::Error;

/// Failures reported by a [`ContentStore`](super::ports::ContentStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("path is not a file: {0}")]
    NotAFile(String),

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to resolve {relative} against {base}: {message}")]
    Resolution {
        base: String,
        relative: String,
        message: String,
    },
}

impl ContentError {
    pub(crate) fn io(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Markdown could not be turned into HTML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("failed to render markdown: {0}")]
    Parse(String),
}

/// Failures while fetching a remote document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("invalid content type: {0}. Expected text/markdown or text/plain")]
    InvalidContentType(String),

    #[error("document is empty")]
    Empty,

    #[error("document appears to be binary, not text")]
    Binary,

    #[error("could not find README.md on the main or master branch: {0}")]
    ReadmeNotFound(String),
}

/// Link discovery failed. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// User-visible failures of the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Content or render fetch failed; the prior session is kept.
    #[error("failed to open {locator}: {message}")]
    Load { locator: String, message: String },

    /// Persisting the document failed.
    #[error("failed to save {locator}: {message}")]
    Save { locator: String, message: String },

    #[error("cannot save remote content; use Save As to keep a local copy")]
    RemoteSaveRejected,

    #[error("failed to open link: {href}")]
    LinkResolution { href: String, message: String },
}

impl SessionError {
    /// Whether the shell must raise a blocking alert in addition to the banner.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Save { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_save_errors_block() {
        let save = SessionError::Save {
            locator: "/notes/a.md".to_string(),
            message: "disk full".to_string(),
        };
        assert!(save.is_blocking());
        assert!(!SessionError::RemoteSaveRejected.is_blocking());
        assert!(!SessionError::Load {
            locator: "/notes/a.md".to_string(),
            message: "gone".to_string(),
        }
        .is_blocking());
    }

    #[test]
    fn test_link_resolution_names_href() {
        let err = SessionError::LinkResolution {
            href: "../missing.md".to_string(),
            message: "no such file".to_string(),
        };
        assert_eq!(err.to_string(), "failed to open link: ../missing.md");
    }
}
