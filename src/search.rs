//! Phase-angle scans over the hourly timeline.
//!
//! Two searches share the same primitive: sample [`phase_angle`] at fixed
//! hour offsets and compare against a target:
//!
//! - [`find_new_moons`] walks every hour of a year and brackets the samples
//!   that fall within a tolerance band of 0°.
//! - [`find_loop_point`] walks a window of offsets from a reference instant
//!   and returns the offset whose phase best matches the reference phase, so
//!   an hourly frame sequence can wrap around without a visible jump.
//!
//! ## New-moon bracketing
//!
//! The tolerance band usually catches several consecutive hourly samples
//! around each conjunction. Candidates are not grouped into lunations: the
//! result is only the first and the last candidate of the whole year, which
//! brackets the first and last new moons as long as those are the extreme
//! band hits.
//!
//! ## Loop-point presets
//!
//! | Preset | Window (hours) | Step | Max diff | Day rounding |
//! |---|---|---|---|---|
//! | [`LoopSearch::synodic`] | 636..780 (one synodic month ± 72 h) | 6 | 6° | yes |
//! | [`LoopSearch::calendar_month`] | 8040..8760 (December) | 1 | 3° | no |

use crate::ephemeris::{Ephemeris, EphemerisError, circular_diff, phase_angle};
use crate::timeline::YearTimeline;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Mean synodic month used to centre the default loop window, in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.53;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] EphemerisError),
    #[error("No new-moon sample found in {year}")]
    NoNewMoon { year: i32 },
}

/// A single hourly sample inside the new-moon tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NewMoonSample {
    pub time: DateTime<Utc>,
    /// 1-based frame index of the sample hour.
    pub frame: u32,
    pub phase_angle: f64,
}

/// First and last new-moon band samples of a year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMoonBracket {
    pub first: NewMoonSample,
    pub last: NewMoonSample,
    /// Total number of hourly samples inside the band.
    pub candidates: usize,
}

impl NewMoonBracket {
    pub fn first_frame(&self) -> u32 {
        self.first.frame
    }

    pub fn last_frame(&self) -> u32 {
        self.last.frame
    }
}

fn in_new_moon_band(angle: f64, tolerance_deg: f64) -> bool {
    angle.abs() < tolerance_deg || (angle - 360.0).abs() < tolerance_deg
}

/// Scan every hour of the timeline's year for new-moon samples.
///
/// A sample qualifies when its phase angle is strictly within
/// `tolerance_deg` of 0° or 360°. Returns the first and last qualifying
/// samples in chronological order. Ephemeris failures abort the scan.
pub fn find_new_moons(
    ephemeris: &impl Ephemeris,
    timeline: &YearTimeline,
    tolerance_deg: f64,
) -> Result<NewMoonBracket, SearchError> {
    let mut first: Option<NewMoonSample> = None;
    let mut last: Option<NewMoonSample> = None;
    let mut candidates = 0;

    for frame in 1..=timeline.hours() {
        let angle = phase_angle(ephemeris, timeline.jd_at(f64::from(frame - 1)))?;
        if !in_new_moon_band(angle, tolerance_deg) {
            continue;
        }
        let sample = NewMoonSample {
            time: timeline.frame_start(frame),
            frame,
            phase_angle: angle,
        };
        tracing::debug!(frame = sample.frame, angle, "new-moon candidate");
        candidates += 1;
        if first.is_none() {
            first = Some(sample);
        }
        last = Some(sample);
    }

    match (first, last) {
        (Some(first), Some(last)) => {
            tracing::info!(
                first = first.frame,
                last = last.frame,
                candidates,
                "new-moon bracket found"
            );
            Ok(NewMoonBracket {
                first,
                last,
                candidates,
            })
        }
        _ => Err(SearchError::NoNewMoon {
            year: timeline.year(),
        }),
    }
}

/// Parameters of a loop-point scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSearch {
    /// First offset sampled, in hours after the reference instant.
    pub window_start_hours: u32,
    /// Exclusive end of the offset window.
    pub window_end_hours: u32,
    pub step_hours: u32,
    /// Best matches farther than this from the reference phase are rejected.
    pub max_tolerance_deg: f64,
    /// A sample closer than this ends the scan immediately.
    pub exact_match_deg: f64,
    /// Round the winning offset to the nearest whole day.
    pub round_to_day: bool,
}

impl LoopSearch {
    /// One synodic month after the reference, ± 72 hours, sampled every 6 hours.
    pub fn synodic() -> Self {
        let base = (SYNODIC_MONTH_DAYS * 24.0) as u32;
        Self {
            window_start_hours: base - 72,
            window_end_hours: base + 72,
            step_hours: 6,
            max_tolerance_deg: 6.0,
            exact_match_deg: 0.5,
            round_to_day: true,
        }
    }

    /// Every hour of the last thirty days of a common year.
    pub fn calendar_month() -> Self {
        Self {
            window_start_hours: 8040,
            window_end_hours: 8760,
            step_hours: 1,
            max_tolerance_deg: 3.0,
            exact_match_deg: 0.5,
            round_to_day: false,
        }
    }

    /// Offsets sampled by the scan, in order.
    pub fn offsets(&self) -> impl Iterator<Item = u32> {
        (self.window_start_hours..self.window_end_hours).step_by(self.step_hours.max(1) as usize)
    }
}

/// Best phase match found by [`find_loop_point`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoopPoint {
    /// Offset to loop at, after optional day rounding.
    pub offset_hours: u32,
    /// Offset of the best sample before rounding.
    pub raw_offset_hours: u32,
    /// Arc distance between the best sample and the reference phase.
    pub difference_deg: f64,
}

impl LoopPoint {
    /// Trailing frame window `(start, end)` of a `total_frames` sequence that
    /// spans this loop's offset. The start is clamped to frame 1.
    pub fn frame_range(&self, total_frames: u32) -> (u32, u32) {
        let start = total_frames.saturating_sub(self.offset_hours) + 1;
        (start.min(total_frames).max(1), total_frames)
    }

    pub fn days(&self) -> f64 {
        f64::from(self.offset_hours) / 24.0
    }
}

/// Round an hour count to the nearest multiple of 24, halves to even days.
pub fn round_to_whole_days(hours: u32) -> u32 {
    ((f64::from(hours) / 24.0).round_ties_even() as u32) * 24
}

/// Find the offset in `search`'s window whose phase angle best matches `reference_angle`.
///
/// Each offset `h` is evaluated at `reference_jd + h / 24`. The first
/// strictly smallest arc distance wins; a distance below
/// `exact_match_deg` stops the scan. Returns `Ok(None)` when the window is
/// empty or the best distance exceeds `max_tolerance_deg`; this is an
/// expected outcome, not an error.
pub fn find_loop_point(
    ephemeris: &impl Ephemeris,
    reference_jd: f64,
    reference_angle: f64,
    search: &LoopSearch,
) -> Result<Option<LoopPoint>, SearchError> {
    let mut best: Option<(u32, f64)> = None;

    for offset in search.offsets() {
        let angle = phase_angle(ephemeris, reference_jd + f64::from(offset) / 24.0)?;
        let diff = circular_diff(angle, reference_angle);
        tracing::debug!(offset, diff, "loop candidate");

        if best.is_none_or(|(_, min)| diff < min) {
            best = Some((offset, diff));
        }
        if diff < search.exact_match_deg {
            break;
        }
    }

    let Some((raw_offset, min_diff)) = best else {
        return Ok(None);
    };
    if min_diff > search.max_tolerance_deg {
        tracing::info!(
            min_diff,
            tolerance = search.max_tolerance_deg,
            "best loop match exceeds tolerance"
        );
        return Ok(None);
    }

    let offset_hours = if search.round_to_day {
        round_to_whole_days(raw_offset)
    } else {
        raw_offset
    };
    Ok(Some(LoopPoint {
        offset_hours,
        raw_offset_hours: raw_offset,
        difference_deg: min_diff,
    }))
}

/// Run [`find_loop_point`] anchored at the start of `timeline`'s year.
pub fn find_year_loop_point(
    ephemeris: &impl Ephemeris,
    timeline: &YearTimeline,
    search: &LoopSearch,
) -> Result<Option<LoopPoint>, SearchError> {
    let reference_jd = timeline.start_jd();
    let reference_angle = phase_angle(ephemeris, reference_jd)?;
    tracing::info!(reference_angle, "loop search reference phase");
    find_loop_point(ephemeris, reference_jd, reference_angle, search)
}
