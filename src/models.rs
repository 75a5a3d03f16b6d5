//! Persisted entities and the records composed from them
//!
//! - [`ProjectInput`]: the upstream-derived field set, used for create and update
//! - [`Project`]: a stored project row including server-assigned timestamps
//! - [`ReadmeCache`]: the single cached README row belonging to a project
//! - [`ProjectWithReadme`]: a project flattened together with its README text

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when the upstream repository has no description
pub const NO_DESCRIPTION: &str = "No description provided";

/// Repository fields owned by the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stars: i64,
    #[serde(default)]
    pub forks: i64,
    #[serde(default)]
    pub issues: i64,
    #[serde(default)]
    pub open_issues_count: Option<i64>,
    #[serde(default)]
    pub owner_login: Option<String>,
    #[serde(default)]
    pub owner_avatar_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub tags_url: Option<String>,
    #[serde(default)]
    pub release_url: Option<String>,
    #[serde(default)]
    pub collaborators_url: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

impl ProjectInput {
    /// Minimal input with the required identity fields set
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            full_name: None,
            description: None,
            stars: 0,
            forks: 0,
            issues: 0,
            open_issues_count: None,
            owner_login: None,
            owner_avatar_url: None,
            language: None,
            license: None,
            tags_url: None,
            release_url: None,
            collaborators_url: None,
            pushed_at: None,
            homepage: None,
            size: None,
        }
    }
}

/// A stored project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(flatten)]
    pub info: ProjectInput,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last successful refresh from upstream; `None` until first populated
    pub cache_date: Option<DateTime<Utc>>,
}

impl Project {
    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Owner login, falling back to the prefix of `full_name`
    pub fn owner_login(&self) -> Option<&str> {
        self.info.owner_login.as_deref().or_else(|| {
            self.info
                .full_name
                .as_deref()
                .and_then(|full| full.split_once('/'))
                .map(|(owner, _)| owner)
        })
    }
}

/// Cached README document for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmeCache {
    pub id: i64,
    pub project_id: String,
    pub readme: Option<String>,
    pub cache_date: DateTime<Utc>,
}

/// Project record with README content attached, as returned by the trending flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithReadme {
    pub id: String,
    pub name: String,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub issues: i64,
    pub open_issues_count: Option<i64>,
    pub owner_login: Option<String>,
    pub owner_avatar_url: Option<String>,
    pub language: Option<String>,
    pub license: Option<String>,
    pub tags_url: Option<String>,
    pub release_url: Option<String>,
    pub collaborators_url: Option<String>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub homepage: Option<String>,
    pub size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cache_date: Option<DateTime<Utc>>,
    pub readme: String,
}

impl ProjectWithReadme {
    pub fn new(project: Project, readme: String) -> Self {
        let Project {
            info,
            created_at,
            updated_at,
            cache_date,
        } = project;

        Self {
            id: info.id,
            name: info.name,
            full_name: info.full_name,
            description: info.description,
            stars: info.stars,
            forks: info.forks,
            issues: info.issues,
            open_issues_count: info.open_issues_count,
            owner_login: info.owner_login,
            owner_avatar_url: info.owner_avatar_url,
            language: info.language,
            license: info.license,
            tags_url: info.tags_url,
            release_url: info.release_url,
            collaborators_url: info.collaborators_url,
            pushed_at: info.pushed_at,
            homepage: info.homepage,
            size: info.size,
            created_at,
            updated_at,
            cache_date,
            readme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> Project {
        let mut info = ProjectInput::new("101", "starcache");
        info.full_name = Some("octo/starcache".to_string());
        info.stars = 42;
        info.language = Some("Rust".to_string());
        let now = Utc::now();
        Project {
            info,
            created_at: now,
            updated_at: now,
            cache_date: Some(now),
        }
    }

    #[test]
    fn test_owner_login_falls_back_to_full_name() {
        let mut project = sample_project();
        assert_eq!(project.owner_login(), Some("octo"));

        project.info.owner_login = Some("someone".to_string());
        assert_eq!(project.owner_login(), Some("someone"));
    }

    #[test]
    fn test_with_readme_maps_every_field() {
        let project = sample_project();
        let composed = ProjectWithReadme::new(project.clone(), "# starcache".to_string());

        assert_eq!(composed.id, "101");
        assert_eq!(composed.stars, 42);
        assert_eq!(composed.language.as_deref(), Some("Rust"));
        assert_eq!(composed.created_at, project.created_at);
        assert_eq!(composed.cache_date, project.cache_date);
        assert_eq!(composed.readme, "# starcache");
    }

    #[test]
    fn test_project_serializes_flat() {
        let json = serde_json::to_value(sample_project()).unwrap();
        assert_eq!(json["id"], "101");
        assert_eq!(json["stars"], 42);
        assert!(json.get("info").is_none());
        assert!(json.get("cache_date").is_some());
    }

    #[test]
    fn test_input_defaults_when_deserializing() {
        let input: ProjectInput =
            serde_json::from_str(r#"{"id": "7", "name": "tiny"}"#).unwrap();
        assert_eq!(input, ProjectInput::new("7", "tiny"));
    }
}
