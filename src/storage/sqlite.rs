//! SQLite database handle and schema

use crate::config::DatabaseConfig;
use crate::{Result, StarCacheError};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Shared SQLite connection
///
/// Cloning is cheap; all clones use the same connection. Each store call holds
/// the lock for a single statement or upsert, never across an `.await`.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the database file described by `config`
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %config.path.display(), "Opening project database");

        let conn = Connection::open(&config.path)?;

        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        Self::from_connection(conn, Some(config.path.clone()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Run `f` with exclusive access to the connection
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StarCacheError::Storage("database connection lock poisoned".into()))?;
        f(&conn)
    }

    /// Cheap round-trip used by health checks
    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    /// Database file path, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            full_name TEXT,
            description TEXT,
            stars INTEGER NOT NULL DEFAULT 0,
            forks INTEGER NOT NULL DEFAULT 0,
            issues INTEGER NOT NULL DEFAULT 0,
            open_issues_count INTEGER,
            owner_login TEXT,
            owner_avatar_url TEXT,
            language TEXT,
            license TEXT,
            tags_url TEXT,
            release_url TEXT,
            collaborators_url TEXT,
            pushed_at TEXT,
            homepage TEXT,
            size INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            cache_date TEXT
        );

        CREATE TABLE IF NOT EXISTS readme_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id TEXT NOT NULL UNIQUE,
            readme TEXT,
            cache_date TEXT NOT NULL,
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name);
        CREATE INDEX IF NOT EXISTS idx_projects_full_name ON projects(full_name);
        CREATE INDEX IF NOT EXISTS idx_projects_owner_name ON projects(owner_login, name);
        CREATE INDEX IF NOT EXISTS idx_projects_language ON projects(language);
        CREATE INDEX IF NOT EXISTS idx_projects_stars ON projects(stars);
        "#,
    )?;

    Ok(())
}
