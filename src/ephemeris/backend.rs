//! Ephemeris backend trait and shared types.
//!
//! The [`Ephemeris`] trait is the only thing the search and table code
//! depends on. The production implementation is
//! [`AnalyticEphemeris`](super::analytic::AnalyticEphemeris); tests swap in
//! synthetic angle functions through the same trait.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("Julian Day {jd} is outside the supported range")]
    OutOfRange { jd: f64 },
    #[error("Invalid time: {0}")]
    InvalidTime(String),
}

/// Bodies the ephemeris can place on the ecliptic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Moon,
}

/// Source of geocentric ecliptic longitudes.
///
/// Implementations must be `Sync`: the same instance is shared by every
/// caller without locking.
pub trait Ephemeris: Sync {
    /// Apparent geocentric ecliptic longitude of `body` at Julian Day `jd`, in degrees.
    ///
    /// The value does not need to be normalized; callers reduce it modulo 360.
    fn longitude(&self, body: Body, jd: f64) -> Result<f64, EphemerisError>;
}
