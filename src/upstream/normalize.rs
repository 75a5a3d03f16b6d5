//! Conversion of raw search results into project fields

use crate::models::{ProjectInput, NO_DESCRIPTION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Body of `GET /search/repositories`
///
/// Items are kept as raw JSON so one malformed entry does not sink the page.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// Repository as returned by the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    #[serde(default)]
    pub open_issues_count: i64,
    pub owner: RawOwner,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub license: Option<RawLicense>,
    #[serde(default)]
    pub tags_url: Option<String>,
    #[serde(default)]
    pub releases_url: Option<String>,
    #[serde(default)]
    pub collaborators_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOwner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLicense {
    #[serde(default)]
    pub name: Option<String>,
}

impl RawRepository {
    pub fn into_project_input(self) -> ProjectInput {
        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        ProjectInput {
            id: self.id.to_string(),
            name: self.name,
            full_name: Some(self.full_name),
            description: Some(description),
            stars: self.stargazers_count,
            forks: self.forks_count,
            issues: self.open_issues_count,
            open_issues_count: Some(self.open_issues_count),
            owner_login: Some(self.owner.login),
            owner_avatar_url: self.owner.avatar_url,
            language: self.language,
            license: self.license.and_then(|l| l.name),
            tags_url: self.tags_url,
            release_url: self.releases_url.map(|url| url.replace("{/id}", "")),
            collaborators_url: self
                .collaborators_url
                .map(|url| url.replace("{/collaborator}", "")),
            pushed_at: self.pushed_at,
            homepage: self.homepage.filter(|h| !h.is_empty()),
            size: self.size,
        }
    }
}

/// Normalize one raw search item
pub fn normalize_item(item: serde_json::Value) -> serde_json::Result<ProjectInput> {
    let raw: RawRepository = serde_json::from_value(item)?;
    Ok(raw.into_project_input())
}

/// Accepts an RFC 3339 string; anything else (null, garbage, numbers) becomes `None`
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
