//! Sun/Moon ephemeris behind a narrow capability trait.
//!
//! | Operation | Provided by |
//! |---|---|
//! | **Ecliptic longitude** | [`Ephemeris::longitude`] |
//! | **Julian Day** | [`julian_day`], [`julian_day_for`] |
//! | **Phase angle** | [`phase_angle`] = Moon − Sun, normalized to `[0, 360)` |
//! | **Arc distance** | [`circular_diff`], shorter arc in `[0, 180]` |
//!
//! The module is split into:
//! - **Backend**: [`Ephemeris`] trait + [`Body`] + [`EphemerisError`]
//! - **Analytic**: [`AnalyticEphemeris`], a compact series solution
//! - **Angles**: pure angle and calendar functions (unit testable)

pub mod analytic;
pub mod angles;
pub mod backend;

pub use analytic::AnalyticEphemeris;
pub use angles::{circular_diff, julian_day, julian_day_for, normalize_degrees, phase_angle};
pub use backend::{Body, Ephemeris, EphemerisError};
