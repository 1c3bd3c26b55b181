//! Mapping between frame indices, hours and timestamps for one year.
//!
//! Frame `n` is the hour that starts `n - 1` hours after 00:00 UT on
//! January 1. A common year has 8760 frames, a leap year 8784.

use crate::ephemeris::julian_day;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("Year {0} cannot be represented")]
    InvalidYear(i32),
}

/// Hourly timeline of a single calendar year (UT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearTimeline {
    year: i32,
    start: DateTime<Utc>,
    hours: u32,
}

impl YearTimeline {
    pub fn new(year: i32) -> Result<Self, TimelineError> {
        let start = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .ok_or(TimelineError::InvalidYear(year))?;
        let days = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
            366
        } else {
            365
        };
        Ok(Self {
            year,
            start,
            hours: days * 24,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 00:00 UT on January 1.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Number of hourly frames in the year.
    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// Julian Day at the start of the year.
    pub fn start_jd(&self) -> f64 {
        julian_day(&self.start)
    }

    /// Timestamp `hour_offset` whole hours after the start of the year.
    pub fn datetime_at(&self, hour_offset: i64) -> DateTime<Utc> {
        self.start + Duration::hours(hour_offset)
    }

    /// Julian Day `hour_offset` hours after the start of the year.
    pub fn jd_at(&self, hour_offset: f64) -> f64 {
        self.start_jd() + hour_offset / 24.0
    }

    /// Start of the hour covered by frame `index` (1-based).
    pub fn frame_start(&self, index: u32) -> DateTime<Utc> {
        self.datetime_at(i64::from(index) - 1)
    }

    /// Frame index whose hour contains `time`: whole hours since the start, plus one.
    ///
    /// Returns `None` for instants outside the year.
    pub fn frame_index(&self, time: &DateTime<Utc>) -> Option<u32> {
        if time.year() != self.year {
            return None;
        }
        let hours = (*time - self.start).num_hours();
        u32::try_from(hours).ok().map(|h| h + 1)
    }
}
