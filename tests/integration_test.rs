//! Integration tests for StarCache
//!
//! These tests verify the full workflow from config loading through the
//! on-disk cache and the orchestrators.

use async_trait::async_trait;
use starcache::cache::{is_valid, PROJECT_CACHE_DURATION, README_CACHE_DURATION};
use starcache::config::{validate_config, AppConfig, DatabaseConfig};
use starcache::models::ProjectInput;
use starcache::service::{ReadmeService, TrendingService};
use starcache::storage::{Database, ProjectStore, ReadmeStore};
use starcache::upstream::{SearchOutcome, TimeWindow, Upstream, UpstreamError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a test project
fn create_test_project(id: &str, name: &str, stars: i64, language: &str) -> ProjectInput {
    let mut input = ProjectInput::new(id, name);
    input.full_name = Some(format!("acme/{}", name));
    input.owner_login = Some("acme".to_string());
    input.description = Some(format!("{} does things", name));
    input.stars = stars;
    input.language = Some(language.to_string());
    input
}

fn open_db(temp_dir: &TempDir) -> Database {
    Database::open(&DatabaseConfig {
        path: temp_dir.path().join("starcache.db"),
        wal_mode: true,
    })
    .unwrap()
}

/// Upstream serving a fixed result list and counting calls
struct StaticUpstream {
    repos: Vec<ProjectInput>,
    searches: AtomicUsize,
    readmes: AtomicUsize,
}

impl StaticUpstream {
    fn new(repos: Vec<ProjectInput>) -> Self {
        Self {
            repos,
            searches: AtomicUsize::new(0),
            readmes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Upstream for StaticUpstream {
    async fn search(
        &self,
        language: &str,
        _window: TimeWindow,
        count: usize,
    ) -> Result<SearchOutcome, UpstreamError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let repos = self
            .repos
            .iter()
            .filter(|r| language.is_empty() || r.language.as_deref() == Some(language))
            .take(count)
            .cloned()
            .collect();
        Ok(SearchOutcome::new(repos))
    }

    async fn fetch_readme(&self, owner: &str, repo: &str) -> String {
        self.readmes.fetch_add(1, Ordering::SeqCst);
        format!("# {}\n\nREADME for {}/{}", repo, owner, repo)
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.server.port = 9001;
        config.github.api_url = "http://127.0.0.1:1234".to_string();
        config.database.path = temp_dir.path().join("cache.db");

        config.save(&config_path).unwrap();

        let loaded = AppConfig::load(&config_path).unwrap();
        assert_eq!(loaded.server.port, 9001);
        assert_eq!(loaded.github.api_url, "http://127.0.0.1:1234");
        assert_eq!(loaded.database.path, temp_dir.path().join("cache.db"));
        assert!(validate_config(&loaded).is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "server:\n  port: 8080\n").unwrap();

        let loaded = AppConfig::load(&config_path).unwrap();
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.server.host, "0.0.0.0");
        assert_eq!(loaded.github.api_url, "https://api.github.com");
        assert_eq!(loaded.github.timeout_secs, 30);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(AppConfig::load(temp_dir.path().join("absent.yaml")).is_err());
    }
}

mod storage_tests {
    use super::*;

    #[test]
    fn test_projects_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = ProjectStore::new(open_db(&temp_dir));
            store.create(&create_test_project("1", "rocket", 500, "Rust")).unwrap();
            store.create(&create_test_project("2", "gizmo", 50, "Go")).unwrap();
        }

        let db = open_db(&temp_dir);
        assert!(db.path().is_some());
        let store = ProjectStore::new(db);
        let listed = store.list(0, 10).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name(), "rocket");

        let found = store.get_by_owner_and_name("acme", "gizmo").unwrap().unwrap();
        assert_eq!(found.id(), "2");
        assert!(is_valid(found.cache_date, PROJECT_CACHE_DURATION));
    }

    #[test]
    fn test_create_then_get_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = ProjectStore::new(open_db(&temp_dir));
        let input = create_test_project("7", "widget", 42, "Rust");

        store.create(&input).unwrap();

        let stored = store.get("7").unwrap().unwrap();
        assert_eq!(stored.info, input);
    }

    #[test]
    fn test_delete_cascades_to_readme() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);
        let projects = ProjectStore::new(db.clone());
        let readmes = ReadmeStore::new(db);

        projects.create(&create_test_project("1", "rocket", 5, "Rust")).unwrap();
        readmes.upsert("1", "# rocket").unwrap();

        assert!(projects.delete("1").unwrap());
        assert!(readmes.get("1").unwrap().is_none());
        assert!(!projects.delete("1").unwrap());
    }
}

mod workflow_tests {
    use super::*;

    fn services(db: &Database, upstream: Arc<StaticUpstream>) -> (ReadmeService, TrendingService) {
        let projects = ProjectStore::new(db.clone());
        let readmes = ReadmeService::new(projects.clone(), ReadmeStore::new(db.clone()), upstream.clone());
        let trending = TrendingService::new(projects, readmes.clone(), upstream);
        (readmes, trending)
    }

    #[tokio::test]
    async fn test_trending_backfill_then_cache_hit() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);
        let upstream = Arc::new(StaticUpstream::new(vec![
            create_test_project("1", "rocket", 500, "Rust"),
            create_test_project("2", "gizmo", 300, "Go"),
            create_test_project("3", "widget", 100, "Rust"),
        ]));
        let (_, trending) = services(&db, upstream.clone());

        let first = trending
            .get_with_cache("Rust", TimeWindow::Weekly, 2)
            .await
            .unwrap();
        let names: Vec<_> = first.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["rocket", "widget"]);
        assert_eq!(first[0].readme, "# rocket\n\nREADME for acme/rocket");
        assert_eq!(upstream.searches.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.readmes.load(Ordering::SeqCst), 2);

        // Second request is answered from the on-disk cache
        let second = trending
            .get_with_cache("Rust", TimeWindow::Weekly, 2)
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(upstream.searches.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.readmes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_readme_cached_after_trending() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_db(&temp_dir);
        let upstream = Arc::new(StaticUpstream::new(vec![create_test_project(
            "1", "rocket", 500, "Rust",
        )]));
        let (readmes, trending) = services(&db, upstream.clone());

        trending
            .get_with_cache("", TimeWindow::Monthly, 1)
            .await
            .unwrap();
        let text = readmes.get_with_cache("acme", "rocket").await;

        assert_eq!(text, "# rocket\n\nREADME for acme/rocket");
        assert_eq!(upstream.readmes.load(Ordering::SeqCst), 1);

        let cached = ReadmeStore::new(db).get("1").unwrap().unwrap();
        assert!(is_valid(Some(cached.cache_date), README_CACHE_DURATION));
    }
}
