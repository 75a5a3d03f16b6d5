//! In-memory upstream used by the orchestrator tests

use crate::models::ProjectInput;
use crate::upstream::{SearchOutcome, TimeWindow, Upstream, UpstreamError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeUpstream {
    repos: Mutex<Vec<ProjectInput>>,
    fail_search: bool,
    search_counts: Mutex<Vec<usize>>,
    readme_calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn with_repos(repos: Vec<ProjectInput>) -> Self {
        Self {
            repos: Mutex::new(repos),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_search: true,
            ..Default::default()
        }
    }

    /// `count` argument of every search call, in order
    pub fn search_counts(&self) -> Vec<usize> {
        self.search_counts.lock().unwrap().clone()
    }

    pub fn readme_calls(&self) -> usize {
        self.readme_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn search(
        &self,
        _language: &str,
        _window: TimeWindow,
        count: usize,
    ) -> Result<SearchOutcome, UpstreamError> {
        self.search_counts.lock().unwrap().push(count);
        if self.fail_search {
            return Err(UpstreamError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        let repos = self.repos.lock().unwrap().iter().take(count).cloned().collect();
        Ok(SearchOutcome::new(repos))
    }

    async fn fetch_readme(&self, owner: &str, repo: &str) -> String {
        let call = self.readme_calls.fetch_add(1, Ordering::SeqCst) + 1;
        format!("# {}/{}\n\nfetch #{}", owner, repo, call)
    }
}

/// Project input owned by `octo` with the given star count
pub fn repo(id: &str, name: &str, stars: i64) -> ProjectInput {
    let mut input = ProjectInput::new(id, name);
    input.full_name = Some(format!("octo/{}", name));
    input.owner_login = Some("octo".to_string());
    input.stars = stars;
    input.language = Some("Rust".to_string());
    input
}
