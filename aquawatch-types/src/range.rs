//! Time-range selector bounding which readings are fetched.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};

/// Window of readings to fetch, counted back from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeRange {
    #[cfg_attr(feature = "serde", serde(rename = "1h"))]
    Hour,
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "24h"))]
    Day,
    #[cfg_attr(feature = "serde", serde(rename = "7d"))]
    Week,
    #[cfg_attr(feature = "serde", serde(rename = "30d"))]
    Month,
}

impl TimeRange {
    /// Every range, shortest first.
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Hour,
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
    ];

    /// The canonical short form (`1h`, `24h`, `7d`, `30d`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Hour => "1h",
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
        }
    }

    /// Length of the window.
    pub fn window(&self) -> Duration {
        match self {
            TimeRange::Hour => Duration::hours(1),
            TimeRange::Day => Duration::hours(24),
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
        }
    }

    /// Start of the window ending at `now`.
    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window()
    }

    /// Cycle to the next longer range, wrapping around.
    pub fn next(self) -> Self {
        match self {
            TimeRange::Hour => TimeRange::Day,
            TimeRange::Day => TimeRange::Week,
            TimeRange::Week => TimeRange::Month,
            TimeRange::Month => TimeRange::Hour,
        }
    }

    /// Cycle to the next shorter range, wrapping around.
    pub fn prev(self) -> Self {
        match self {
            TimeRange::Hour => TimeRange::Month,
            TimeRange::Day => TimeRange::Hour,
            TimeRange::Week => TimeRange::Day,
            TimeRange::Month => TimeRange::Week,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of `1h`, `24h`, `7d`, `30d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTimeRange(pub String);

impl fmt::Display for InvalidTimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time range '{}', expected one of 1h, 24h, 7d, 30d", self.0)
    }
}

impl std::error::Error for InvalidTimeRange {}

impl FromStr for TimeRange {
    type Err = InvalidTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidTimeRange(s.to_string()))
    }
}
