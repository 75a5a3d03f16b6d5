//! Trending time windows and their creation-date lower bounds

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recency filter for trending queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl TimeWindow {
    /// Parse a query parameter; anything unrecognised means monthly
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => TimeWindow::Daily,
            "weekly" => TimeWindow::Weekly,
            _ => TimeWindow::Monthly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Daily => "daily",
            TimeWindow::Weekly => "weekly",
            TimeWindow::Monthly => "monthly",
        }
    }

    pub fn lookback(&self) -> TimeDelta {
        match self {
            TimeWindow::Daily => TimeDelta::days(1),
            TimeWindow::Weekly => TimeDelta::days(7),
            TimeWindow::Monthly => TimeDelta::days(30),
        }
    }

    /// Calendar date repositories must be created after
    pub fn created_after_date(&self, now: DateTime<Utc>) -> NaiveDate {
        (now - self.lookback()).date_naive()
    }

    /// Midnight UTC of [`Self::created_after_date`], used to filter cached rows
    pub fn created_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.created_after_date(now)
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now)
    }

    /// Search qualifier such as `created:>2026-09-15`
    pub fn search_qualifier(&self, now: DateTime<Utc>) -> String {
        format!("created:>{}", self.created_after_date(now).format("%Y-%m-%d"))
    }
}

impl From<&str> for TimeWindow {
    fn from(value: &str) -> Self {
        TimeWindow::parse(value)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
