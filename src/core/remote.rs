//! Fetching markdown over HTTP

use std::time::Duration;

use regex_lite::Regex;

use super::error::FetchError;
use super::ports::{RemoteDocument, RemoteFetchService};

const USER_AGENT: &str = concat!("mdox/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw README location for a GitHub repository on `branch`
fn github_readme_url(user: &str, repo: &str, branch: &str) -> String {
    format!("https://raw.githubusercontent.com/{user}/{repo}/refs/heads/{branch}/README.md")
}

/// `(user, repo)` when `url` is a GitHub repository page
pub fn parse_github_repo(url: &str) -> Option<(String, String)> {
    let re = Regex::new(r"^https://github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$").ok()?;
    let captures = re.captures(url)?;
    Some((captures.get(1)?.as_str().to_string(), captures.get(2)?.as_str().to_string()))
}

/// Accept only bodies that look like text
fn validate_body(text: String) -> Result<String, FetchError> {
    if text.is_empty() {
        return Err(FetchError::Empty);
    }

    let control_chars = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        .count();
    if control_chars > text.len() / 10 {
        return Err(FetchError::Binary);
    }

    Ok(text)
}

fn is_text_content_type(content_type: &str) -> bool {
    content_type.is_empty()
        || content_type.contains("text")
        || content_type.contains("markdown")
        || content_type.contains("plain")
}

/// Blocking HTTP fetcher with GitHub repository support
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown error").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_text_content_type(&content_type) {
            return Err(FetchError::InvalidContentType(content_type));
        }

        let text = response.text().map_err(|e| FetchError::Network(e.to_string()))?;
        validate_body(text)
    }

    /// Try the README on `main`, then on `master`
    fn fetch_github_readme(&self, user: &str, repo: &str) -> Result<RemoteDocument, FetchError> {
        let main_url = github_readme_url(user, repo, "main");
        match self.fetch_text(&main_url) {
            Ok(content) => Ok(RemoteDocument {
                content,
                canonical_url: main_url,
            }),
            Err(main_err) => {
                tracing::debug!("No README on main for {}/{}: {}", user, repo, main_err);
                let master_url = github_readme_url(user, repo, "master");
                self.fetch_text(&master_url)
                    .map(|content| RemoteDocument {
                        content,
                        canonical_url: master_url,
                    })
                    .map_err(|e| FetchError::ReadmeNotFound(e.to_string()))
            }
        }
    }
}

impl RemoteFetchService for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<RemoteDocument, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        if let Some((user, repo)) = parse_github_repo(url) {
            return self.fetch_github_readme(&user, &repo);
        }

        tracing::info!("Fetching {}", url);
        self.fetch_text(url).map(|content| RemoteDocument {
            content,
            canonical_url: url.to_string(),
        })
    }
}
