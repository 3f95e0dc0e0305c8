use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` on the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "TimeRange start must not be after end");
        Self { start, end }
    }

    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Self {
        Self::new(start, start + length)
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    a.overlaps(b)
}
