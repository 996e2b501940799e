//! Run timestamps.
//!
//! A run is stamped once; the compact form names output files and the
//! display form goes into report headers.

use chrono::{DateTime, Local, TimeZone};

/// `strftime` pattern for run timestamps, e.g. `20250114_093005`.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `strftime` pattern for report headers, e.g. `January 14, 2025 at 09:30 AM`.
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// Formats a moment as a run timestamp.
#[must_use]
pub fn run_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(RUN_TIMESTAMP_FORMAT).to_string()
}

/// Formats a moment for report headers.
#[must_use]
pub fn display_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(DISPLAY_TIMESTAMP_FORMAT).to_string()
}

/// Both timestamp forms of one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunClock {
    /// Compact `YYYYMMDD_HHMMSS` form.
    pub run: String,
    /// Human-readable form.
    pub display: String,
}

impl RunClock {
    /// Stamps the current local time.
    #[must_use]
    pub fn now() -> Self {
        Self::at(&Local::now())
    }

    /// Stamps a fixed moment.
    #[must_use]
    pub fn at<Tz: TimeZone>(moment: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            run: run_timestamp(moment),
            display: display_timestamp(moment),
        }
    }
}
