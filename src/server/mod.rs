//! HTTP server for StarCache
//!
//! Exposes the project store and the cache orchestrators as a JSON API.
//!
//! # Routes
//!
//! - `GET /` - Welcome message
//! - `GET /health` - Database health probe
//! - `GET /api/projects/?skip&limit` - List projects, most starred first
//! - `POST /api/projects/` - Create a project
//! - `GET /api/projects/{id}` - Get a project
//! - `PUT /api/projects/{id}` - Overwrite a project
//! - `DELETE /api/projects/{id}` - Delete a project and its cached README
//! - `GET /api/search/?query&limit` - Substring search over name and description
//! - `GET /api/trending/?language&since&count` - Trending projects with READMEs
//! - `GET /api/readme/{owner}/{repo}` - README for one repository
//!
//! # Example
//!
//! ```no_run
//! use starcache::config::AppConfig;
//! use starcache::server::StarCacheServer;
//! use starcache::storage::Database;
//! use starcache::upstream::GitHubClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> starcache::Result<()> {
//!     let config = AppConfig::default();
//!     let db = Database::open(&config.database)?;
//!     let upstream = Arc::new(GitHubClient::new(&config.github)?);
//!     StarCacheServer::new(&config, db, upstream)
//!         .run(&config.server.bind_addr())
//!         .await
//! }
//! ```

use crate::config::AppConfig;
use crate::models::{Project, ProjectInput, ProjectWithReadme};
use crate::service::{ReadmeService, TrendingService};
use crate::storage::{Database, ProjectStore, ReadmeStore};
use crate::upstream::{TimeWindow, Upstream};
use crate::StarCacheError;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

const PROJECT_NOT_FOUND: &str = "Project not found";

/// Shared server state
pub struct AppState {
    pub db: Database,
    pub projects: ProjectStore,
    pub readmes: ReadmeService,
    pub trending: TrendingService,
}

impl AppState {
    /// Wire stores and services around one database and one upstream
    pub fn new(db: Database, upstream: Arc<dyn Upstream>) -> Self {
        let projects = ProjectStore::new(db.clone());
        let readmes = ReadmeService::new(projects.clone(), ReadmeStore::new(db.clone()), upstream.clone());
        let trending = TrendingService::new(projects.clone(), readmes.clone(), upstream);
        Self {
            db,
            projects,
            readmes,
            trending,
        }
    }
}

/// HTTP server for the trending cache
pub struct StarCacheServer {
    state: Arc<AppState>,
    cors_origins: Vec<String>,
}

impl StarCacheServer {
    pub fn new(config: &AppConfig, db: Database, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            state: Arc::new(AppState::new(db, upstream)),
            cors_origins: config.server.cors_origins.clone(),
        }
    }

    /// Build the router over `state`
    pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
        Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .route("/api/projects", get(list_projects).post(create_project))
            .route("/api/projects/", get(list_projects).post(create_project))
            .route(
                "/api/projects/{id}",
                get(get_project).put(update_project).delete(delete_project),
            )
            .route("/api/search", get(search_projects))
            .route("/api/search/", get(search_projects))
            .route("/api/trending", get(trending))
            .route("/api/trending/", get(trending))
            .route("/api/readme/{owner}/{repo}", get(readme))
            .layer(build_cors_layer(cors_origins))
            .with_state(state)
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> crate::Result<()> {
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(
            addr = addr,
            cors_origins = ?self.cors_origins,
            "StarCache server listening"
        );

        axum::serve(listener, Self::router(self.state, &self.cors_origins)).await?;
        Ok(())
    }
}

/// Allow the configured origins; an empty list or a `*` entry allows any origin
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    if origins.is_empty() || origins.iter().any(|origin| origin.trim() == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins).allow_credentials(true)
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

impl From<StarCacheError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: StarCacheError) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else if let StarCacheError::AlreadyExists(_) = err {
            StatusCode::CONFLICT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }
        api_error(status, err.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub since: Option<String>,
    #[serde(default = "default_trending_count")]
    pub count: usize,
}

fn default_trending_count() -> usize {
    10
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadmeResponse {
    pub owner: String,
    pub repo: String,
    pub readme: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Welcome to the StarCache API" }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.ping() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "healthy", "database": "connected" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "error": e.to_string(),
                })),
            )
        }
    }
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.projects.list(params.skip, params.limit)?))
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.projects.create(&input)?;
    tracing::info!(id = %project.id(), name = %project.name(), "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    state
        .projects
        .get(&id)?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, PROJECT_NOT_FOUND))
}

async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Project>, ApiError> {
    state
        .projects
        .update(&id, &input)?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, PROJECT_NOT_FOUND))
}

async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.projects.delete(&id)? {
        return Err(api_error(StatusCode::NOT_FOUND, PROJECT_NOT_FOUND));
    }
    tracing::info!(id = %id, "Project deleted");
    Ok(Json(serde_json::json!({ "message": "Project deleted successfully" })))
}

async fn search_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Project>>, ApiError> {
    if params.query.is_empty() {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "query must be at least 1 character",
        ));
    }
    Ok(Json(state.projects.search(&params.query, params.limit)?))
}

async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingParams>,
) -> Result<Json<Vec<ProjectWithReadme>>, ApiError> {
    let window = params
        .since
        .as_deref()
        .map(TimeWindow::parse)
        .unwrap_or_default();

    let projects = state
        .trending
        .get_with_cache(&params.language, window, params.count)
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error fetching trending repositories: {}", e),
            )
        })?;
    Ok(Json(projects))
}

async fn readme(
    State(state): State<Arc<AppState>>,
    Path((owner, repo)): Path<(String, String)>,
) -> Json<ReadmeResponse> {
    let readme = state.readmes.get_with_cache(&owner, &repo).await;
    Json(ReadmeResponse { owner, repo, readme })
}
