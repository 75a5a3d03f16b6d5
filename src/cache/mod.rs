//! Cache freshness policy
//!
//! Decides whether a cached row is still fresh given the timestamp of its
//! last refresh and the validity window for its kind of data.

mod policy;

pub use policy::{is_valid, is_valid_at, PROJECT_CACHE_DURATION, README_CACHE_DURATION};
