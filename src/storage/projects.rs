//! Project rows: keyed CRUD, text search and the trending filter query

use super::Database;
use crate::models::{Project, ProjectInput};
use crate::{Result, StarCacheError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

const PROJECT_COLUMNS: &str = "id, name, full_name, description, stars, forks, issues, \
     open_issues_count, owner_login, owner_avatar_url, language, license, tags_url, \
     release_url, collaborators_url, pushed_at, homepage, size, created_at, updated_at, cache_date";

/// Persisted repository records
#[derive(Clone)]
pub struct ProjectStore {
    db: Database,
}

impl ProjectStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Page through all projects, most starred first
    pub fn list(&self, skip: usize, limit: usize) -> Result<Vec<Project>> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY stars DESC, id LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit as i64, skip as i64], project_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<Project>> {
        self.db.with_conn(|conn| get_tx(conn, id))
    }

    /// Look up a project by owner login and repository name
    pub fn get_by_owner_and_name(&self, owner: &str, name: &str) -> Result<Option<Project>> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_login = ?1 AND name = ?2 LIMIT 1"
            );
            Ok(conn
                .query_row(&sql, params![owner, name], project_from_row)
                .optional()?)
        })
    }

    /// Insert a new project; its cache date starts at now
    pub fn create(&self, input: &ProjectInput) -> Result<Project> {
        self.db.with_conn(|conn| create_tx(conn, input, Utc::now()))
    }

    /// Overwrite every upstream-owned field and bump `updated_at` and `cache_date`.
    ///
    /// The row keeps `id`; an id inside `input` is ignored. Returns `None` when
    /// the project does not exist.
    pub fn update(&self, id: &str, input: &ProjectInput) -> Result<Option<Project>> {
        self.db.with_conn(|conn| update_tx(conn, id, input, Utc::now()))
    }

    /// Update the row if it exists, otherwise insert it
    pub fn create_or_update(&self, input: &ProjectInput) -> Result<Project> {
        self.db.with_conn(|conn| {
            let now = Utc::now();
            match update_tx(conn, &input.id, input, now)? {
                Some(project) => Ok(project),
                None => create_tx(conn, input, now),
            }
        })
    }

    /// Returns false when no such project existed
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.db.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
    }

    /// Case-insensitive substring match on name or description, most starred first
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Project>> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROJECT_COLUMNS} FROM projects \
                 WHERE lower(name) LIKE ?1 ESCAPE '\\' OR lower(description) LIKE ?1 ESCAPE '\\' \
                 ORDER BY stars DESC, id LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![pattern, limit as i64], project_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Mark a project as freshly refreshed without touching its fields
    pub fn touch_cache_date(&self, id: &str) -> Result<bool> {
        self.db.with_conn(|conn| {
            let touched = conn.execute(
                "UPDATE projects SET cache_date = ?1 WHERE id = ?2",
                params![Utc::now(), id],
            )?;
            Ok(touched > 0)
        })
    }

    /// Projects created after `created_after`, optionally restricted to one
    /// language (skipped when empty), most starred first
    pub fn filtered(
        &self,
        language: &str,
        created_after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Project>> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROJECT_COLUMNS} FROM projects \
                 WHERE (?1 = '' OR language = ?1) AND created_at > ?2 \
                 ORDER BY stars DESC, id LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![language, created_after, limit as i64],
                project_from_row,
            )?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }
}

fn get_tx(conn: &Connection, id: &str) -> Result<Option<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], project_from_row)
        .optional()?)
}

fn create_tx(conn: &Connection, input: &ProjectInput, now: DateTime<Utc>) -> Result<Project> {
    let result = conn.execute(
        r#"
        INSERT INTO projects (
            id, name, full_name, description, stars, forks, issues,
            open_issues_count, owner_login, owner_avatar_url, language, license,
            tags_url, release_url, collaborators_url, pushed_at, homepage, size,
            created_at, updated_at, cache_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19, ?19)
        "#,
        params![
            &input.id,
            &input.name,
            input.full_name.as_deref(),
            input.description.as_deref(),
            input.stars,
            input.forks,
            input.issues,
            input.open_issues_count,
            input.owner_login.as_deref(),
            input.owner_avatar_url.as_deref(),
            input.language.as_deref(),
            input.license.as_deref(),
            input.tags_url.as_deref(),
            input.release_url.as_deref(),
            input.collaborators_url.as_deref(),
            input.pushed_at,
            input.homepage.as_deref(),
            input.size,
            now,
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(StarCacheError::AlreadyExists(format!("project {}", input.id)));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::debug!(id = %input.id, name = %input.name, "Project created");

    get_tx(conn, &input.id)?
        .ok_or_else(|| StarCacheError::Storage(format!("project {} vanished after insert", input.id)))
}

fn update_tx(
    conn: &Connection,
    id: &str,
    input: &ProjectInput,
    now: DateTime<Utc>,
) -> Result<Option<Project>> {
    let updated = conn.execute(
        r#"
        UPDATE projects SET
            name = ?2, full_name = ?3, description = ?4, stars = ?5, forks = ?6,
            issues = ?7, open_issues_count = ?8, owner_login = ?9, owner_avatar_url = ?10,
            language = ?11, license = ?12, tags_url = ?13, release_url = ?14,
            collaborators_url = ?15, pushed_at = ?16, homepage = ?17, size = ?18,
            updated_at = ?19, cache_date = ?19
        WHERE id = ?1
        "#,
        params![
            id,
            &input.name,
            input.full_name.as_deref(),
            input.description.as_deref(),
            input.stars,
            input.forks,
            input.issues,
            input.open_issues_count,
            input.owner_login.as_deref(),
            input.owner_avatar_url.as_deref(),
            input.language.as_deref(),
            input.license.as_deref(),
            input.tags_url.as_deref(),
            input.release_url.as_deref(),
            input.collaborators_url.as_deref(),
            input.pushed_at,
            input.homepage.as_deref(),
            input.size,
            now,
        ],
    )?;

    if updated == 0 {
        return Ok(None);
    }

    tracing::debug!(id = %id, "Project updated");
    get_tx(conn, id)
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        info: ProjectInput {
            id: row.get(0)?,
            name: row.get(1)?,
            full_name: row.get(2)?,
            description: row.get(3)?,
            stars: row.get(4)?,
            forks: row.get(5)?,
            issues: row.get(6)?,
            open_issues_count: row.get(7)?,
            owner_login: row.get(8)?,
            owner_avatar_url: row.get(9)?,
            language: row.get(10)?,
            license: row.get(11)?,
            tags_url: row.get(12)?,
            release_url: row.get(13)?,
            collaborators_url: row.get(14)?,
            pushed_at: row.get(15)?,
            homepage: row.get(16)?,
            size: row.get(17)?,
        },
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
        cache_date: row.get(20)?,
    })
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn store() -> ProjectStore {
        ProjectStore::new(Database::open_in_memory().unwrap())
    }

    fn input(id: &str, name: &str, stars: i64, language: Option<&str>) -> ProjectInput {
        let mut input = ProjectInput::new(id, name);
        input.full_name = Some(format!("octo/{}", name));
        input.owner_login = Some("octo".to_string());
        input.description = Some(format!("{} description", name));
        input.stars = stars;
        input.language = language.map(str::to_string);
        input
    }

    #[test]
    fn test_create_then_get_round_trip() {
        let store = store();
        let mut created = input("1", "alpha", 10, Some("Rust"));
        created.pushed_at = Some(Utc::now() - TimeDelta::days(2));
        created.license = Some("MIT License".to_string());
        created.size = Some(2048);

        let stored = store.create(&created).unwrap();
        let loaded = store.get("1").unwrap().unwrap();

        assert_eq!(loaded.info, created);
        assert_eq!(loaded, stored);
        assert!(loaded.cache_date.is_some());
    }

    #[test]
    fn test_create_duplicate_is_rejected() {
        let store = store();
        store.create(&input("1", "alpha", 10, None)).unwrap();

        let err = store.create(&input("1", "alpha", 10, None)).unwrap_err();
        assert!(matches!(err, StarCacheError::AlreadyExists(_)));
    }

    #[test]
    fn test_update_overwrites_and_bumps_timestamps() {
        let store = store();
        let original = store.create(&input("1", "alpha", 10, Some("Rust"))).unwrap();

        let mut changed = input("1", "alpha", 99, Some("Go"));
        changed.description = None;
        let updated = store.update("1", &changed).unwrap().unwrap();

        assert_eq!(updated.info.stars, 99);
        assert_eq!(updated.info.language.as_deref(), Some("Go"));
        assert_eq!(updated.info.description, None);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
        assert!(updated.cache_date >= original.cache_date);
    }

    #[test]
    fn test_update_missing_returns_none() {
        let store = store();
        assert!(store.update("404", &input("404", "ghost", 0, None)).unwrap().is_none());
    }

    #[test]
    fn test_create_or_update() {
        let store = store();
        store.create_or_update(&input("1", "alpha", 1, None)).unwrap();
        store.create_or_update(&input("1", "alpha", 5, None)).unwrap();

        assert_eq!(store.list(0, 10).unwrap().len(), 1);
        assert_eq!(store.get("1").unwrap().unwrap().info.stars, 5);
    }

    #[test]
    fn test_delete() {
        let store = store();
        store.create(&input("1", "alpha", 1, None)).unwrap();

        assert!(store.delete("1").unwrap());
        assert!(!store.delete("1").unwrap());
        assert!(store.get("1").unwrap().is_none());
    }

    #[test]
    fn test_list_orders_by_stars_with_paging() {
        let store = store();
        store.create(&input("1", "low", 1, None)).unwrap();
        store.create(&input("2", "high", 300, None)).unwrap();
        store.create(&input("3", "mid", 20, None)).unwrap();

        let names: Vec<_> = store
            .list(0, 10)
            .unwrap()
            .into_iter()
            .map(|p| p.info.name)
            .collect();
        assert_eq!(names, vec!["high", "mid", "low"]);

        let page = store.list(1, 1).unwrap();
        assert_eq!(page[0].info.name, "mid");
    }

    #[test]
    fn test_get_by_owner_and_name() {
        let store = store();
        store.create(&input("1", "alpha", 1, None)).unwrap();

        assert!(store.get_by_owner_and_name("octo", "alpha").unwrap().is_some());
        assert!(store.get_by_owner_and_name("other", "alpha").unwrap().is_none());
    }

    #[test]
    fn test_search_is_case_insensitive_and_limited() {
        let store = store();
        store.create(&input("1", "FastParser", 5, None)).unwrap();
        store.create(&input("2", "slow", 50, None)).unwrap();
        let mut described = input("3", "other", 500, None);
        described.description = Some("A fastparser-compatible shim".to_string());
        store.create(&described).unwrap();

        let hits = store.search("fastPARSER", 10).unwrap();
        let ids: Vec<_> = hits.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["3", "1"]);

        assert_eq!(store.search("fastparser", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let store = store();
        store.create(&input("1", "plain", 5, None)).unwrap();

        assert!(store.search("%", 10).unwrap().is_empty());
        assert!(store.search("_", 10).unwrap().is_empty());
    }

    #[test]
    fn test_filtered_by_language_and_date() {
        let store = store();
        store.create(&input("1", "rusty", 10, Some("Rust"))).unwrap();
        store.create(&input("2", "gopher", 20, Some("Go"))).unwrap();
        store.create(&input("3", "crab", 30, Some("Rust"))).unwrap();

        let yesterday = Utc::now() - TimeDelta::days(1);

        let rust: Vec<_> = store
            .filtered("Rust", yesterday, 10)
            .unwrap()
            .into_iter()
            .map(|p| p.info.id)
            .collect();
        assert_eq!(rust, vec!["3", "1"]);

        assert_eq!(store.filtered("", yesterday, 10).unwrap().len(), 3);
        assert_eq!(store.filtered("", yesterday, 2).unwrap().len(), 2);

        let tomorrow = Utc::now() + TimeDelta::days(1);
        assert!(store.filtered("", tomorrow, 10).unwrap().is_empty());
    }

    #[test]
    fn test_touch_cache_date() {
        let store = store();
        store.create(&input("1", "alpha", 1, None)).unwrap();
        store
            .db
            .with_conn(|conn| {
                conn.execute("UPDATE projects SET cache_date = NULL WHERE id = '1'", [])?;
                Ok(())
            })
            .unwrap();
        assert!(store.get("1").unwrap().unwrap().cache_date.is_none());

        assert!(store.touch_cache_date("1").unwrap());
        assert!(store.get("1").unwrap().unwrap().cache_date.is_some());
        assert!(!store.touch_cache_date("missing").unwrap());
    }
}
