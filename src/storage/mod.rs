//! Storage layer
//!
//! SQLite persistence for cached projects and their README documents.
//! A single [`Database`] handle is opened at start-up and shared by both stores.

mod projects;
mod readme;
mod sqlite;

pub use projects::ProjectStore;
pub use readme::ReadmeStore;
pub use sqlite::Database;
