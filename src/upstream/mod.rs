//! Upstream repository-hosting API
//!
//! The [`Upstream`] trait is the seam between the cache orchestrators and the
//! network. [`GitHubClient`] is the production implementation; tests substitute
//! in-memory fakes.
//!
//! # Failure model
//!
//! - Rate limiting halts pagination; whatever was accumulated is returned.
//! - A failing page is logged and skipped.
//! - `search` only errors when every requested page failed.
//! - `fetch_readme` never errors; failures become placeholder documents.

mod github;
mod normalize;
mod readme;
mod window;

use crate::models::ProjectInput;
use async_trait::async_trait;

pub use github::{GitHubClient, MAX_PAGES, PAGE_SIZE};
pub use normalize::{normalize_item, RawLicense, RawOwner, RawRepository};
pub use readme::{decode_base64_content, rewrite_relative_links, DECODE_ERROR_TEXT};
pub use window::TimeWindow;

pub(crate) use readme::no_readme;

/// Errors raised while talking to the upstream API
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("GitHub API rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("GitHub API error: HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("All {pages} page requests failed; last error: {last}")]
    Unavailable { pages: u32, last: String },
}

/// Normalized search results plus a human-readable summary
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub repos: Vec<ProjectInput>,
    pub message: String,
}

impl SearchOutcome {
    pub fn new(repos: Vec<ProjectInput>) -> Self {
        let message = if repos.is_empty() {
            "No repositories found matching your criteria.".to_string()
        } else {
            format!("Found {} repositories.", repos.len())
        };
        Self { repos, message }
    }
}

#[async_trait]
pub trait Upstream: Send + Sync {
    /// Most-starred repositories created within `window`, at most `count`
    async fn search(
        &self,
        language: &str,
        window: TimeWindow,
        count: usize,
    ) -> Result<SearchOutcome, UpstreamError>;

    /// README text for `owner/repo` with relative links made absolute
    async fn fetch_readme(&self, owner: &str, repo: &str) -> String;
}
