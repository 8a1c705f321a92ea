//! Calendar month keys used to bucket finished games.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// A (year, month) pair. Orders chronologically, like `year * 12 + month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl MonthKey {
    /// Create a key, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Month in which `at` falls, in UTC.
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// The month it is now, in UTC.
    pub fn current() -> Self {
        Self::of(Utc::now())
    }

    /// Whether a listing may start at this month: no later than December
    /// of next year.
    pub fn is_requestable(&self) -> bool {
        self.year <= Self::current().year.saturating_add(1)
    }

    /// The calendar month before this one.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
