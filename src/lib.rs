//! StarCache - caching proxy for GitHub trending repositories
//!
//! StarCache answers "what is trending" queries from a local SQLite cache and
//! only goes to the GitHub API when cached rows are stale or missing. README
//! documents are cached alongside, with relative links rewritten so they
//! render outside GitHub.
//!
//! # Architecture
//!
//! - **cache**: Freshness policy for cached rows
//! - **config**: YAML configuration with defaults
//! - **storage**: SQLite persistence (projects, README cache)
//! - **upstream**: GitHub search and README client behind the `Upstream` trait
//! - **service**: README and trending orchestrators
//! - **server**: axum HTTP API

// Core modules
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod storage;

// Network and orchestration
pub mod server;
pub mod service;
pub mod upstream;

// Re-exports
pub use error::{Result, StarCacheError};
