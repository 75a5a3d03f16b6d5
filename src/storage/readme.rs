//! README cache rows, at most one per project

use super::Database;
use crate::models::ReadmeCache;
use crate::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

#[derive(Clone)]
pub struct ReadmeStore {
    db: Database,
}

impl ReadmeStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn get(&self, project_id: &str) -> Result<Option<ReadmeCache>> {
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, project_id, readme, cache_date FROM readme_cache WHERE project_id = ?1",
                    params![project_id],
                    |row| {
                        Ok(ReadmeCache {
                            id: row.get(0)?,
                            project_id: row.get(1)?,
                            readme: row.get(2)?,
                            cache_date: row.get(3)?,
                        })
                    },
                )
                .optional()?)
        })
    }

    /// Store `readme` for the project, replacing any existing row in place
    pub fn upsert(&self, project_id: &str, readme: &str) -> Result<ReadmeCache> {
        self.db.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO readme_cache (project_id, readme, cache_date)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(project_id) DO UPDATE SET
                    readme = excluded.readme,
                    cache_date = excluded.cache_date
                "#,
                params![project_id, readme, Utc::now()],
            )?;
            Ok(())
        })?;

        tracing::debug!(project_id = %project_id, bytes = readme.len(), "README cached");

        self.get(project_id)?.ok_or_else(|| {
            crate::StarCacheError::Storage(format!("README for {} vanished after upsert", project_id))
        })
    }
}
