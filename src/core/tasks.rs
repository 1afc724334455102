//! Background jobs and request tokens
//!
//! The controller never blocks on I/O. Anything that suspends is packaged as a
//! [`Job`] and handed to a [`Spawner`]; the job's [`Completion`] comes back to
//! the UI thread, where the controller checks its [`RequestToken`] before
//! applying it.

use std::sync::mpsc::Sender;
use std::time::Duration;

use super::document::DocumentIdentity;
use super::error::{DiscoveryError, SessionError};
use super::ports::LinkedDocument;

/// Generation of a request. Only the latest issued token is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Issues request tokens and remembers which one is current
#[derive(Debug, Default)]
pub struct TokenCounter {
    latest: u64,
}

impl TokenCounter {
    /// Issue a new token, superseding every earlier one
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    /// Supersede all outstanding tokens without issuing a new request
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}

/// A document fetched and rendered by a load job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub identity: DocumentIdentity,
    pub content: String,
    pub html: String,
}

/// Result of a save job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub locator: String,
    /// Exactly what was written
    pub content: String,
    /// Set for Save As: the document takes this new local identity
    pub relocated: bool,
}

/// The outcome of a background job, delivered back to the UI thread
#[derive(Debug)]
pub enum Completion {
    Load {
        token: RequestToken,
        result: Result<LoadedDocument, SessionError>,
    },
    Save {
        token: RequestToken,
        result: Result<SavedDocument, SessionError>,
    },
    Discovery {
        token: RequestToken,
        root: String,
        result: Result<Vec<LinkedDocument>, DiscoveryError>,
    },
}

pub type Job = Box<dyn FnOnce() -> Completion + Send + 'static>;

/// Runs jobs off the UI thread
pub trait Spawner {
    /// Run `job` after `delay` (zero for immediately).
    fn spawn(&self, delay: Duration, job: Job);
}

/// Spawner backed by a tokio runtime; completions go back over a channel
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
    completions: Sender<Completion>,
    repaint: Option<egui::Context>,
}

impl TokioSpawner {
    pub fn new(handle: tokio::runtime::Handle, completions: Sender<Completion>) -> Self {
        Self {
            handle,
            completions,
            repaint: None,
        }
    }

    /// Wake the UI whenever a completion arrives
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }
}

impl Spawner for TokioSpawner {
    fn spawn(&self, delay: Duration, job: Job) {
        let completions = self.completions.clone();
        let repaint = self.repaint.clone();

        self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match tokio::task::spawn_blocking(job).await {
                Ok(completion) => {
                    if completions.send(completion).is_err() {
                        tracing::debug!("Completion dropped, UI has shut down");
                        return;
                    }
                    if let Some(ctx) = repaint {
                        ctx.request_repaint();
                    }
                }
                Err(e) => tracing::error!("Background job failed: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_token_is_current() {
        let mut tokens = TokenCounter::default();
        let first = tokens.issue();
        assert!(tokens.is_current(first));

        let second = tokens.issue();
        assert!(!tokens.is_current(first));
        assert!(tokens.is_current(second));
    }

    #[test]
    fn test_invalidate_supersedes_outstanding_tokens() {
        let mut tokens = TokenCounter::default();
        let token = tokens.issue();
        tokens.invalidate();
        assert!(!tokens.is_current(token));
    }

    #[test]
    fn test_tokio_spawner_delivers_completion() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .build()
            .unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let spawner = TokioSpawner::new(runtime.handle().clone(), tx);

        let mut tokens = TokenCounter::default();
        let token = tokens.issue();
        spawner.spawn(
            Duration::from_millis(5),
            Box::new(move || Completion::Discovery {
                token,
                root: "/notes/index.md".to_string(),
                result: Ok(Vec::new()),
            }),
        );

        let completion = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        match completion {
            Completion::Discovery { token: got, root, .. } => {
                assert_eq!(got, token);
                assert_eq!(root, "/notes/index.md");
            }
            other => panic!("unexpected completion: {:?}", other),
        }
    }
}
