//! Configuration system
//!
//! Loads ~/.config/starcache/config.yaml with support for:
//! - HTTP server bind address and CORS origins
//! - SQLite database location
//! - GitHub API endpoint, token variable and request timeout

mod app_config;
pub mod validation;

pub use app_config::{AppConfig, DatabaseConfig, GitHubConfig, ServerConfig};
pub use validation::{validate_config, validate_config_result, ValidationError};
