//! Pure angle and calendar functions.
//!
//! Everything here except [`phase_angle`] is free of I/O and backend calls.

use super::backend::{Body, Ephemeris, EphemerisError};
use chrono::{DateTime, NaiveDate, Utc};

/// Julian Day of the Unix epoch (1970-01-01 00:00 UT).
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Reduce any finite angle into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let r = angle.rem_euclid(360.0);
    // rem_euclid of a tiny negative value rounds up to exactly 360.0
    if r >= 360.0 { 0.0 } else { r }
}

/// Shorter-arc distance between two angles, in `[0, 180]`.
///
/// Symmetric in its arguments; inputs need not be normalized.
pub fn circular_diff(a: f64, b: f64) -> f64 {
    let diff = (normalize_degrees(a) - normalize_degrees(b)).abs();
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Continuous Julian Day (UT) for a timestamp.
pub fn julian_day(time: &DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JD
}

/// Julian Day (UT) for a Gregorian calendar date plus fractional hour.
///
/// `hour` may exceed 24 or be negative; it is simply added to midnight.
pub fn julian_day_for(year: i32, month: u32, day: u32, hour: f64) -> Result<f64, EphemerisError> {
    if !hour.is_finite() {
        return Err(EphemerisError::InvalidTime(format!("hour {hour}")));
    }
    let midnight = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EphemerisError::InvalidTime(format!("{year:04}-{month:02}-{day:02}")))?
        .and_utc();
    Ok(julian_day(&midnight) + hour / 24.0)
}

/// Sun–Moon elongation in ecliptic longitude: `(moon - sun) mod 360`.
///
/// 0° is new moon, 180° full moon. Always in `[0, 360)`. Backend failures
/// propagate unchanged.
pub fn phase_angle(ephemeris: &impl Ephemeris, jd: f64) -> Result<f64, EphemerisError> {
    if !jd.is_finite() {
        return Err(EphemerisError::InvalidTime(format!("Julian Day {jd}")));
    }
    let moon = ephemeris.longitude(Body::Moon, jd)?;
    let sun = ephemeris.longitude(Body::Sun, jd)?;
    Ok(normalize_degrees(moon - sun))
}
