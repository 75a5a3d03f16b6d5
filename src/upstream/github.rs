//! GitHub REST client for repository search and README content

use super::normalize::{normalize_item, SearchResponse};
use super::readme::{self, ReadmeEnvelope, DECODE_ERROR_TEXT};
use super::{SearchOutcome, TimeWindow, Upstream, UpstreamError};
use crate::config::GitHubConfig;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Response, StatusCode};
use tracing::{debug, error, info, warn};

/// Results requested per search page
pub const PAGE_SIZE: usize = 100;

/// Search never goes past this page (GitHub serves at most 1000 results)
pub const MAX_PAGES: u32 = 10;

/// Body fragment GitHub uses for primary rate-limit rejections
const RATE_LIMIT_MESSAGE: &str = "API rate limit exceeded";

const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";

/// GitHub API client used to refresh the cache
pub struct GitHubClient {
    client: Client,
    api_url: String,
    raw_base_url: String,
    auth_token: Option<String>,
}

impl GitHubClient {
    /// Create a client from configuration, reading the token from the configured env var
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let user_agent = header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            crate::StarCacheError::Config(format!("Invalid user agent {:?}: {}", config.user_agent, e))
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(header::USER_AGENT, user_agent);
                headers
            })
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            raw_base_url: config.raw_base_url.trim_end_matches('/').to_string(),
            auth_token: config.token(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Search query: optional language filter plus creation-date bound
    pub fn build_query(language: &str, window: TimeWindow) -> String {
        let qualifier = window.search_qualifier(Utc::now());
        let language = language.trim();
        if language.is_empty() {
            qualifier
        } else {
            format!("language:{} {}", language, qualifier)
        }
    }

    fn get(&self, url: &str, accept: &'static str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url).header(header::ACCEPT, accept);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Fetch one page of raw search items
    async fn fetch_page(&self, query: &str, page: u32) -> std::result::Result<Vec<serde_json::Value>, UpstreamError> {
        let url = format!("{}/search/repositories", self.api_url);

        info!(page = page, query = %query, "Sending repository search request");

        let response = self
            .get(&url, ACCEPT_JSON)
            .query(&[
                ("q", query.to_string()),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for(response).await);
        }

        let body: SearchResponse = response.json().await?;
        debug!(page = page, total_count = body.total_count, returned = body.items.len(), "Search page received");
        Ok(body.items)
    }

    async fn try_fetch_readme(&self, owner: &str, repo: &str) -> std::result::Result<String, UpstreamError> {
        let url = format!("{}/repos/{}/{}/readme", self.api_url, owner, repo);

        info!(owner = %owner, repo = %repo, "Fetching README");

        let response = self.get(&url, ACCEPT_RAW).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let err = error_for(response).await;
            if let UpstreamError::RateLimited(_) = err {
                return Err(err);
            }
            error!(owner = %owner, repo = %repo, status = status.as_u16(), "README request failed");
            return Ok(readme::no_readme(repo));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = response.text().await?;

        if content_type.starts_with("text/plain") || content_type.contains("vnd.github.raw") {
            return Ok(self.rewrite_links(&body, owner, repo));
        }

        if body.trim().is_empty() {
            error!(owner = %owner, repo = %repo, "Empty README response body");
            return Ok(readme::empty_readme(repo));
        }

        match serde_json::from_str::<ReadmeEnvelope>(&body) {
            Ok(envelope) => {
                let Some(content) = envelope.content.filter(|c| !c.is_empty()) else {
                    error!(owner = %owner, repo = %repo, "No content field in README envelope");
                    return Ok(readme::missing_content(repo));
                };

                let is_base64 = envelope
                    .encoding
                    .as_deref()
                    .map_or(true, |enc| enc.eq_ignore_ascii_case("base64"));
                if !is_base64 {
                    return Ok(self.rewrite_links(&content, owner, repo));
                }

                match readme::decode_base64_content(&content) {
                    Ok(decoded) => Ok(self.rewrite_links(&decoded, owner, repo)),
                    Err(e) => {
                        error!(owner = %owner, repo = %repo, error = %e, "Error decoding README base64");
                        Ok(DECODE_ERROR_TEXT.to_string())
                    }
                }
            }
            Err(e) => {
                error!(owner = %owner, repo = %repo, error = %e, "Error parsing README response");
                if readme::looks_like_markdown(&body) {
                    debug!(owner = %owner, repo = %repo, "Response appears to be markdown, returning as-is");
                    Ok(self.rewrite_links(&body, owner, repo))
                } else {
                    Ok(readme::unparseable(repo, &e))
                }
            }
        }
    }

    fn rewrite_links(&self, content: &str, owner: &str, repo: &str) -> String {
        readme::rewrite_relative_links(content, &self.raw_base_url, owner, repo)
    }
}

#[async_trait]
impl Upstream for GitHubClient {
    async fn search(
        &self,
        language: &str,
        window: TimeWindow,
        count: usize,
    ) -> std::result::Result<SearchOutcome, UpstreamError> {
        let query = Self::build_query(language, window);

        let mut repos = Vec::new();
        let mut pages_requested = 0u32;
        let mut pages_failed = 0u32;
        let mut last_error = None;

        for page in 1..=MAX_PAGES {
            if repos.len() >= count {
                break;
            }
            pages_requested += 1;

            match self.fetch_page(&query, page).await {
                Ok(items) if items.is_empty() => {
                    debug!(page = page, "Empty page, end of results");
                    break;
                }
                Ok(items) => {
                    for item in items {
                        match normalize_item(item) {
                            Ok(project) => repos.push(project),
                            Err(e) => warn!(page = page, error = %e, "Skipping malformed search item"),
                        }
                        if repos.len() >= count {
                            break;
                        }
                    }
                }
                Err(UpstreamError::RateLimited(message)) => {
                    error!(
                        page = page,
                        language = %language,
                        time_window = %window,
                        message = %message,
                        "GitHub API rate limit exceeded, stopping further requests"
                    );
                    break;
                }
                Err(e) => {
                    error!(
                        page = page,
                        language = %language,
                        time_window = %window,
                        error = %e,
                        "Error fetching search page"
                    );
                    pages_failed += 1;
                    last_error = Some(e.to_string());
                }
            }
        }

        if repos.is_empty() && pages_failed > 0 && pages_failed == pages_requested {
            return Err(UpstreamError::Unavailable {
                pages: pages_failed,
                last: last_error.unwrap_or_default(),
            });
        }

        repos.truncate(count);
        let outcome = SearchOutcome::new(repos);
        info!(language = %language, time_window = %window, count = outcome.repos.len(), "{}", outcome.message);
        Ok(outcome)
    }

    async fn fetch_readme(&self, owner: &str, repo: &str) -> String {
        match self.try_fetch_readme(owner, repo).await {
            Ok(text) => text,
            Err(UpstreamError::RateLimited(message)) => {
                error!(owner = %owner, repo = %repo, message = %message, "GitHub API rate limit exceeded when fetching README");
                readme::rate_limited(repo)
            }
            Err(e) => {
                error!(owner = %owner, repo = %repo, error = %e, "Exception while fetching README");
                readme::load_error(repo, &e)
            }
        }
    }
}

/// Classify a non-success response, detecting the rate-limit condition
async fn error_for(response: Response) -> UpstreamError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        if let Some(message) = rate_limit_message(&body) {
            return UpstreamError::RateLimited(message);
        }
    }

    UpstreamError::Status {
        status: status.as_u16(),
        body,
    }
}

fn rate_limit_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value.get("message")?.as_str()?;
    message
        .contains(RATE_LIMIT_MESSAGE)
        .then(|| message.to_string())
}
