//! Trending orchestration over the project cache
//!
//! A trending request is served from the local store whenever it holds
//! enough matching rows. Stale rows are refreshed in one bulk search, and a
//! short result set is backfilled from upstream. Upstream failures only reach
//! the caller when there is nothing cached to fall back on.

use super::ReadmeService;
use crate::cache::{is_valid_at, PROJECT_CACHE_DURATION};
use crate::models::{Project, ProjectWithReadme};
use crate::storage::ProjectStore;
use crate::upstream::{no_readme, TimeWindow, Upstream};
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Rows examined for staleness, and results requested for a bulk refresh
pub const SCAN_LIMIT: usize = 50;

#[derive(Clone)]
pub struct TrendingService {
    projects: ProjectStore,
    readmes: ReadmeService,
    upstream: Arc<dyn Upstream>,
}

impl TrendingService {
    pub fn new(projects: ProjectStore, readmes: ReadmeService, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            projects,
            readmes,
            upstream,
        }
    }

    /// Up to `count` trending projects for `language` (empty means any)
    /// created within `window`, each with its README attached.
    pub async fn get_with_cache(
        &self,
        language: &str,
        window: TimeWindow,
        count: usize,
    ) -> Result<Vec<ProjectWithReadme>> {
        let language = language.trim();
        let now = Utc::now();
        let created_after = window.created_after(now);

        let candidates = self.projects.filtered(language, created_after, SCAN_LIMIT)?;
        let stale = stale_project_ids(&candidates, now);
        if !stale.is_empty() {
            self.refresh_stale_projects(language, window, &stale).await;
        }

        let available = self.projects.filtered(language, created_after, count)?;
        if available.len() >= count {
            debug!(language = %language, time_window = %window, count = count, "Serving trending from cache");
            return Ok(self.attach_readmes(available).await);
        }

        info!(
            language = %language,
            time_window = %window,
            cached = available.len(),
            wanted = count,
            "Not enough cached projects, backfilling from GitHub"
        );

        match self.upstream.search(language, window, count).await {
            Ok(outcome) => {
                for repo in &outcome.repos {
                    if let Err(e) = self.projects.create_or_update(repo) {
                        warn!(id = %repo.id, name = %repo.name, error = %e, "Failed to store backfilled project");
                    }
                }
                let rows = self.projects.filtered(language, created_after, count)?;
                Ok(self.attach_readmes(rows).await)
            }
            Err(e) if !available.is_empty() => {
                warn!(
                    language = %language,
                    time_window = %window,
                    error = %e,
                    "Backfill failed, returning {} cached projects",
                    available.len()
                );
                Ok(self.attach_readmes(available).await)
            }
            Err(e) => {
                error!(language = %language, time_window = %window, error = %e, "Backfill failed with nothing cached");
                Err(e.into())
            }
        }
    }

    /// Refresh rows in `stale` from a single upstream search.
    ///
    /// Returns the ids that were overwritten. Rows the search did not return
    /// stay as they are; failures are logged and yield an empty set.
    pub async fn refresh_stale_projects(
        &self,
        language: &str,
        window: TimeWindow,
        stale: &HashSet<String>,
    ) -> HashSet<String> {
        info!(language = %language, time_window = %window, stale = stale.len(), "Refreshing stale projects");

        let outcome = match self.upstream.search(language, window, SCAN_LIMIT).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(language = %language, time_window = %window, error = %e, "Stale refresh failed, keeping cached data");
                return HashSet::new();
            }
        };

        let mut refreshed = HashSet::new();
        for repo in outcome.repos.iter().filter(|r| stale.contains(&r.id)) {
            match self.projects.update(&repo.id, repo) {
                Ok(Some(_)) => {
                    refreshed.insert(repo.id.clone());
                }
                Ok(None) => debug!(id = %repo.id, "Stale project vanished before refresh"),
                Err(e) => warn!(id = %repo.id, error = %e, "Failed to refresh project"),
            }
        }

        debug!(refreshed = refreshed.len(), "Stale refresh complete");
        refreshed
    }

    async fn attach_readmes(&self, projects: Vec<Project>) -> Vec<ProjectWithReadme> {
        let mut out = Vec::with_capacity(projects.len());
        for project in projects {
            let readme = match project.owner_login() {
                Some(owner) => self.readmes.get_with_cache(owner, project.name()).await,
                None => no_readme(project.name()),
            };
            out.push(ProjectWithReadme::new(project, readme));
        }
        out
    }
}

/// Ids of projects whose cache date falls outside the project validity window
pub fn stale_project_ids(projects: &[Project], now: DateTime<Utc>) -> HashSet<String> {
    projects
        .iter()
        .filter(|p| !is_valid_at(p.cache_date, PROJECT_CACHE_DURATION, now))
        .map(|p| p.id().to_string())
        .collect()
}
