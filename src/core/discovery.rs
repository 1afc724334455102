//! Linked-document discovery: the bounded crawl and its race-safe client

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::error::DiscoveryError;
use super::links::{self, LinkKind};
use super::markdown::{extract_links, extract_title};
use super::ports::{ContentStore, DiscoveryService, LinkedDocument, RemoteFetchService, Services};
use super::tasks::{Completion, Spawner, TokenCounter, RequestToken};

/// Link hops followed from the root document
pub const DISCOVERY_MAX_DEPTH: usize = 2;

/// Remote crawls wait this long so the first paint is never blocked
pub const REMOTE_DISCOVERY_DELAY: Duration = Duration::from_millis(500);

/// Breadth-first crawl shared by the local and remote strategies.
///
/// `load` returns a document's content, `neighbours` the resolved link targets
/// of a loaded document, and `fallback_title` names documents without a heading.
fn crawl(
    root: &str,
    max_depth: usize,
    h1_only: bool,
    load: impl Fn(&str) -> Result<String, DiscoveryError>,
    neighbours: impl Fn(&str, &str) -> Vec<String>,
    fallback_title: impl Fn(&str) -> String,
) -> Result<Vec<LinkedDocument>, DiscoveryError> {
    let mut discovered = Vec::new();
    let mut visited = HashSet::from([root.to_string()]);
    let mut queue = VecDeque::from([(root.to_string(), 0usize)]);
    let mut contents: HashMap<String, String> = HashMap::new();

    contents.insert(root.to_string(), load(root)?);

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }

        let content = match contents.remove(&current) {
            Some(content) => content,
            None => match load(&current) {
                Ok(content) => content,
                Err(e) => {
                    tracing::debug!("Skipping {} during discovery: {}", current, e);
                    continue;
                }
            },
        };

        for target in neighbours(&content, &current) {
            if !visited.insert(target.clone()) {
                continue;
            }

            let linked = load(&target).ok();
            let title = linked
                .as_deref()
                .and_then(|c| extract_title(c, h1_only))
                .unwrap_or_else(|| fallback_title(&target));

            discovered.push(LinkedDocument {
                locator: target.clone(),
                title,
            });

            if let Some(linked) = linked {
                contents.insert(target.clone(), linked);
            }
            queue.push_back((target, depth + 1));
        }
    }

    Ok(discovered)
}

/// Discovery over a [`ContentStore`] and a [`RemoteFetchService`]
pub struct LinkCrawler {
    content: Arc<dyn ContentStore>,
    remote: Arc<dyn RemoteFetchService>,
}

impl LinkCrawler {
    pub fn new(content: Arc<dyn ContentStore>, remote: Arc<dyn RemoteFetchService>) -> Self {
        Self { content, remote }
    }

    /// Local markdown files linked from `content`
    fn local_links(&self, content: &str, base: &str) -> Vec<String> {
        extract_links(content)
            .into_iter()
            .filter(|href| links::classify(href) == LinkKind::Relative)
            .filter_map(|href| {
                let (path, _) = links::split_fragment(&href);
                if path.is_empty() {
                    return None;
                }
                self.content.resolve_path(base, path).ok()
            })
            .filter(|resolved| links::is_markdown_locator(resolved))
            .collect()
    }

    /// Markdown URLs linked from remote `content`
    fn remote_links(content: &str, base_url: &str) -> Vec<String> {
        extract_links(content)
            .into_iter()
            .filter(|href| links::classify(href) != LinkKind::Anchor)
            .filter(|href| {
                let is_relative = links::classify(href) == LinkKind::Relative;
                links::is_markdown_locator(href) || (is_relative && !href.contains('.'))
            })
            .filter_map(|href| {
                let (path, _) = links::split_fragment(&href);
                links::join_url(base_url, path).ok()
            })
            .collect()
    }
}

impl DiscoveryService for LinkCrawler {
    fn discover_local(
        &self,
        root_path: &str,
        max_depth: usize,
    ) -> Result<Vec<LinkedDocument>, DiscoveryError> {
        crawl(
            root_path,
            max_depth,
            false,
            |path| Ok(self.content.read(path)?),
            |content, base| self.local_links(content, base),
            |path| {
                Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "Untitled".to_string())
            },
        )
    }

    fn discover_remote(
        &self,
        root_url: &str,
        max_depth: usize,
    ) -> Result<Vec<LinkedDocument>, DiscoveryError> {
        crawl(
            root_url,
            max_depth,
            true,
            |url| Ok(self.remote.fetch(url)?.content),
            Self::remote_links,
            |url| {
                url.trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .unwrap_or("Untitled")
                    .to_string()
            },
        )
    }
}

/// The root a discovery list belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRoot {
    pub locator: String,
    pub is_remote: bool,
}

/// Race-safe holder of the linked-document list.
///
/// There is no real cancellation: every request carries a token and its root,
/// and a response is applied only if both still match.
#[derive(Debug, Default)]
pub struct LinkedDocuments {
    root: Option<DiscoveryRoot>,
    tokens: TokenCounter,
    documents: Vec<LinkedDocument>,
    loading: bool,
}

impl LinkedDocuments {
    pub fn root(&self) -> Option<&DiscoveryRoot> {
        self.root.as_ref()
    }

    pub fn documents(&self) -> &[LinkedDocument] {
        &self.documents
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Change the root and start a crawl for it; `None` clears the list.
    pub fn set_root(&mut self, root: Option<DiscoveryRoot>, services: &Services, spawner: &dyn Spawner) {
        let token = self.tokens.issue();
        self.documents.clear();
        self.root = root.clone();

        let Some(root) = root else {
            self.loading = false;
            return;
        };

        self.loading = true;
        let delay = if root.is_remote {
            REMOTE_DISCOVERY_DELAY
        } else {
            Duration::ZERO
        };
        tracing::info!("Discovering documents linked from {}", root.locator);

        let discovery = Arc::clone(&services.discovery);
        spawner.spawn(
            delay,
            Box::new(move || {
                let result = if root.is_remote {
                    discovery.discover_remote(&root.locator, DISCOVERY_MAX_DEPTH)
                } else {
                    discovery.discover_local(&root.locator, DISCOVERY_MAX_DEPTH)
                };
                Completion::Discovery {
                    token,
                    root: root.locator,
                    result,
                }
            }),
        );
    }

    /// Apply a crawl response. Returns whether it was current.
    pub fn apply(
        &mut self,
        token: RequestToken,
        root: &str,
        result: Result<Vec<LinkedDocument>, DiscoveryError>,
    ) -> bool {
        let same_root = self.root.as_ref().is_some_and(|r| r.locator == root);
        if !self.tokens.is_current(token) || !same_root {
            tracing::debug!("Discarding stale discovery result for {}", root);
            return false;
        }

        self.loading = false;
        match result {
            Ok(documents) => {
                tracing::info!("Found {} linked documents for {}", documents.len(), root);
                self.documents = documents;
            }
            Err(e) => {
                tracing::warn!("Link discovery failed for {}: {}", root, e);
                self.documents.clear();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file_system::LocalContentStore;
    use crate::core::testing::{FakeRemote, JobQueue, MemoryContentStore};

    fn crawler_over(files: &[(&str, &str)]) -> LinkCrawler {
        LinkCrawler::new(
            Arc::new(MemoryContentStore::with_files(files)),
            Arc::new(FakeRemote::default()),
        )
    }

    #[test]
    fn test_local_crawl_is_breadth_first_and_depth_bounded() {
        let crawler = crawler_over(&[
            ("/n/index.md", "[a](a.md) [b](sub/b.md#part) [site](https://x.org) [img](pic.png)"),
            ("/n/a.md", "# Alpha\n[back](index.md) [c](c.md)"),
            ("/n/sub/b.md", "no heading"),
            ("/n/c.md", "# Gamma\n[d](d.md)"),
            ("/n/d.md", "# Delta"),
            ("/n/pic.png", ""),
        ]);

        let found = crawler.discover_local("/n/index.md", DISCOVERY_MAX_DEPTH).unwrap();
        let summary: Vec<_> = found.iter().map(|d| (d.locator.as_str(), d.title.as_str())).collect();
        assert_eq!(
            summary,
            [
                ("/n/a.md", "Alpha"),
                ("/n/sub/b.md", "b.md"),
                ("/n/c.md", "Gamma"),
            ]
        );
    }

    #[test]
    fn test_local_crawl_of_missing_root_fails() {
        let crawler = crawler_over(&[]);
        assert!(crawler.discover_local("/n/none.md", 2).is_err());
    }

    #[test]
    fn test_local_crawl_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.md"), "[guide](guide.md)").unwrap();
        std::fs::write(dir.path().join("guide.md"), "## The Guide").unwrap();
        let root = dir.path().join("index.md").canonicalize().unwrap();

        let crawler = LinkCrawler::new(
            Arc::new(LocalContentStore::new()),
            Arc::new(FakeRemote::default()),
        );
        let found = crawler
            .discover_local(root.to_str().unwrap(), DISCOVERY_MAX_DEPTH)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "The Guide");
    }

    #[test]
    fn test_remote_crawl_filters_and_titles() {
        let remote = FakeRemote::default()
            .with_page(
                "https://ex.org/docs/README.md",
                "[guide](guide.md) [api](api) [zip](pkg.zip) [top](#top) [other](https://ex.org/x.md)",
            )
            .with_page("https://ex.org/docs/guide.md", "## Sub\n# Guide\n")
            .with_page("https://ex.org/docs/api", "nothing");
        let crawler = LinkCrawler::new(Arc::new(MemoryContentStore::default()), Arc::new(remote));

        let found = crawler
            .discover_remote("https://ex.org/docs/README.md", DISCOVERY_MAX_DEPTH)
            .unwrap();
        let summary: Vec<_> = found.iter().map(|d| (d.locator.as_str(), d.title.as_str())).collect();
        assert_eq!(
            summary,
            [
                ("https://ex.org/docs/guide.md", "Guide"),
                ("https://ex.org/docs/api", "api"),
                ("https://ex.org/x.md", "x.md"),
            ]
        );
    }

    fn services() -> Services {
        let content: Arc<MemoryContentStore> = Arc::new(MemoryContentStore::with_files(&[
            ("/n/a.md", "[x](x.md)"),
            ("/n/x.md", "# X"),
            ("/n/b.md", "[y](y.md)"),
            ("/n/y.md", "# Y"),
        ]));
        let remote = Arc::new(FakeRemote::default());
        Services {
            content: content.clone(),
            render: Arc::new(crate::core::markdown::MarkdownRenderer::new()),
            remote: remote.clone(),
            discovery: Arc::new(LinkCrawler::new(content, remote)),
        }
    }

    fn local(locator: &str) -> Option<DiscoveryRoot> {
        Some(DiscoveryRoot {
            locator: locator.to_string(),
            is_remote: false,
        })
    }

    #[test]
    fn test_late_response_for_old_root_is_discarded() {
        let services = services();
        let jobs = JobQueue::default();
        let mut linked = LinkedDocuments::default();

        linked.set_root(local("/n/a.md"), &services, &jobs);
        linked.set_root(local("/n/b.md"), &services, &jobs);

        let mut completions = jobs.run_all_pending();
        let late_a = completions.remove(0);
        let b = completions.remove(0);

        for completion in [b, late_a] {
            if let Completion::Discovery { token, root, result } = completion {
                linked.apply(token, &root, result);
            }
        }

        assert_eq!(linked.documents().len(), 1);
        assert_eq!(linked.documents()[0].title, "Y");
        assert!(!linked.is_loading());
    }

    #[test]
    fn test_clearing_root_clears_list_and_loading() {
        let services = services();
        let jobs = JobQueue::default();
        let mut linked = LinkedDocuments::default();

        linked.set_root(local("/n/a.md"), &services, &jobs);
        assert!(linked.is_loading());

        linked.set_root(None, &services, &jobs);
        assert!(!linked.is_loading());
        assert!(linked.documents().is_empty());

        for completion in jobs.run_all_pending() {
            if let Completion::Discovery { token, root, result } = completion {
                assert!(!linked.apply(token, &root, result));
            }
        }
        assert!(linked.documents().is_empty());
    }

    #[test]
    fn test_remote_root_is_delayed() {
        let services = services();
        let jobs = JobQueue::default();
        let mut linked = LinkedDocuments::default();

        linked.set_root(
            Some(DiscoveryRoot {
                locator: "https://ex.org/README.md".to_string(),
                is_remote: true,
            }),
            &services,
            &jobs,
        );
        assert_eq!(jobs.delays(), [REMOTE_DISCOVERY_DELAY]);
    }

    #[test]
    fn test_failure_clears_list_silently() {
        let services = services();
        let jobs = JobQueue::default();
        let mut linked = LinkedDocuments::default();

        linked.set_root(local("/n/missing.md"), &services, &jobs);
        for completion in jobs.run_all_pending() {
            if let Completion::Discovery { token, root, result } = completion {
                assert!(result.is_err());
                assert!(linked.apply(token, &root, result));
            }
        }
        assert!(linked.documents().is_empty());
        assert!(!linked.is_loading());
    }
}
