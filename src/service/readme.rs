//! README orchestration: serve the cached document while fresh, otherwise
//! fetch from upstream and cache whatever came back.

use crate::cache::{is_valid, README_CACHE_DURATION};
use crate::storage::{ProjectStore, ReadmeStore};
use crate::upstream::Upstream;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ReadmeService {
    projects: ProjectStore,
    readmes: ReadmeStore,
    upstream: Arc<dyn Upstream>,
}

impl ReadmeService {
    pub fn new(projects: ProjectStore, readmes: ReadmeStore, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            projects,
            readmes,
            upstream,
        }
    }

    /// README text for `owner/repo`. Never fails: upstream problems arrive as
    /// placeholder documents and storage problems are logged.
    ///
    /// Only repositories known to the project store get their README cached;
    /// placeholders are cached too so repositories without a README are not
    /// refetched on every request.
    pub async fn get_with_cache(&self, owner: &str, repo: &str) -> String {
        let project = match self.projects.get_by_owner_and_name(owner, repo) {
            Ok(project) => project,
            Err(e) => {
                warn!(owner = %owner, repo = %repo, error = %e, "Project lookup failed, bypassing README cache");
                None
            }
        };

        if let Some(ref project) = project {
            match self.readmes.get(project.id()) {
                Ok(Some(cached)) if is_valid(Some(cached.cache_date), README_CACHE_DURATION) => {
                    if let Some(text) = cached.readme.filter(|text| !text.is_empty()) {
                        debug!(owner = %owner, repo = %repo, "README cache hit");
                        return text;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(owner = %owner, repo = %repo, error = %e, "README cache read failed");
                }
            }
        }

        let readme = self.upstream.fetch_readme(owner, repo).await;

        if let Some(project) = project {
            if let Err(e) = self.readmes.upsert(project.id(), &readme) {
                warn!(owner = %owner, repo = %repo, error = %e, "Failed to cache README");
            }
        }

        readme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{repo, FakeUpstream};
    use crate::storage::Database;

    struct Fixture {
        db: Database,
        projects: ProjectStore,
        readmes: ReadmeStore,
        upstream: Arc<FakeUpstream>,
        service: ReadmeService,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let projects = ProjectStore::new(db.clone());
        let readmes = ReadmeStore::new(db.clone());
        let upstream = Arc::new(FakeUpstream::default());
        let service = ReadmeService::new(projects.clone(), readmes.clone(), upstream.clone());
        Fixture {
            db,
            projects,
            readmes,
            upstream,
            service,
        }
    }

    #[tokio::test]
    async fn test_second_call_within_window_uses_cache() {
        let f = fixture();
        f.projects.create(&repo("1", "alpha", 10)).unwrap();

        let first = f.service.get_with_cache("octo", "alpha").await;
        let second = f.service.get_with_cache("octo", "alpha").await;

        assert_eq!(first, second);
        assert_eq!(f.upstream.readme_calls(), 1);
        assert_eq!(f.readmes.get("1").unwrap().unwrap().readme.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_unknown_project_is_never_cached() {
        let f = fixture();

        f.service.get_with_cache("someone", "elsewhere").await;
        f.service.get_with_cache("someone", "elsewhere").await;

        assert_eq!(f.upstream.readme_calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_cache_is_refetched_and_overwritten() {
        let f = fixture();
        f.projects.create(&repo("1", "alpha", 10)).unwrap();
        f.readmes.upsert("1", "# stale copy").unwrap();
        f.db.with_conn(|conn| {
            conn.execute(
                "UPDATE readme_cache SET cache_date = '2020-01-01 00:00:00+00:00' WHERE project_id = '1'",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let text = f.service.get_with_cache("octo", "alpha").await;

        assert_eq!(f.upstream.readme_calls(), 1);
        assert_ne!(text, "# stale copy");
        let cached = f.readmes.get("1").unwrap().unwrap();
        assert_eq!(cached.readme.as_deref(), Some(text.as_str()));
        assert!(is_valid(Some(cached.cache_date), README_CACHE_DURATION));
    }

    #[tokio::test]
    async fn test_empty_cached_text_is_refetched() {
        let f = fixture();
        f.projects.create(&repo("1", "alpha", 10)).unwrap();
        f.readmes.upsert("1", "").unwrap();

        let text = f.service.get_with_cache("octo", "alpha").await;

        assert_eq!(f.upstream.readme_calls(), 1);
        assert!(!text.is_empty());
    }
}
