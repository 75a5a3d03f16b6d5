//! Cache orchestrators
//!
//! Services are constructed once at start-up and shared by the HTTP server
//! and the CLI. They decide between cached rows and upstream calls.

mod readme;
mod trending;

#[cfg(test)]
pub(crate) mod testing;

pub use readme::ReadmeService;
pub use trending::{stale_project_ids, TrendingService, SCAN_LIMIT};
