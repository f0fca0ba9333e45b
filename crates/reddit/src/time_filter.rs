//! Natural-language time windows for post searches.

use chrono::{DateTime, TimeDelta, Utc};

/// A search time window. Unrecognized input maps to [`TimeFilter::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl TimeFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    /// Length of the window; `None` means unbounded.
    pub fn window(&self) -> Option<TimeDelta> {
        const DAY: i64 = 86_400;
        let seconds = match self {
            Self::Hour => 3_600,
            Self::Day => DAY,
            Self::Week => 7 * DAY,
            Self::Month => 30 * DAY,
            Self::Year => 365 * DAY,
            Self::All => return None,
        };
        Some(TimeDelta::seconds(seconds))
    }

    /// Earliest creation time (UNIX seconds) a result may have.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<f64> {
        self.window()
            .map(|window| (now - window).timestamp_millis() as f64 / 1000.0)
    }
}
