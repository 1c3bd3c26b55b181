//! Analytic Sun/Moon longitudes with no data files or external services.
//!
//! ## Series
//!
//! | Body | Method |
//! |---|---|
//! | Sun | mean longitude + equation of centre (three terms), aberration |
//! | Moon | mean longitude + 59 periodic terms in D, M, M′, F with eccentricity factor E, plus the Venus/Jupiter/flattening additive terms |
//! | Both | nutation in longitude from the dominant Ω term |
//!
//! Accuracy is a few hundredths of a degree for the Sun and about 0.01°
//! for the Moon over 1900–2100, far below the 1° bands the searches use.
//! The time argument is taken as UT; ΔT (about a minute in this era) moves
//! the Moon by roughly 0.01°.

use super::backend::{Body, Ephemeris, EphemerisError};
use super::angles::normalize_degrees;

const J2000: f64 = 2_451_545.0;
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// 1000 BC January 1.
const MIN_JD: f64 = 1_355_807.5;
/// AD 3000 January 1.
const MAX_JD: f64 = 2_816_787.5;

/// Periodic terms for the Moon's longitude: multiples of D, M, M′, F and the
/// coefficient in millionths of a degree.
const MOON_LONGITUDE_TERMS: &[(i8, i8, i8, i8, f64)] = &[
    (0, 0, 1, 0, 6_288_774.0),
    (2, 0, -1, 0, 1_274_027.0),
    (2, 0, 0, 0, 658_314.0),
    (0, 0, 2, 0, 213_618.0),
    (0, 1, 0, 0, -185_116.0),
    (0, 0, 0, 2, -114_332.0),
    (2, 0, -2, 0, 58_793.0),
    (2, -1, -1, 0, 57_066.0),
    (2, 0, 1, 0, 53_322.0),
    (2, -1, 0, 0, 45_758.0),
    (0, 1, -1, 0, -40_923.0),
    (1, 0, 0, 0, -34_720.0),
    (0, 1, 1, 0, -30_383.0),
    (2, 0, 0, -2, 15_327.0),
    (0, 0, 1, 2, -12_528.0),
    (0, 0, 1, -2, 10_980.0),
    (4, 0, -1, 0, 10_675.0),
    (0, 0, 3, 0, 10_034.0),
    (4, 0, -2, 0, 8_548.0),
    (2, 1, -1, 0, -7_888.0),
    (2, 1, 0, 0, -6_766.0),
    (1, 0, -1, 0, -5_163.0),
    (1, 1, 0, 0, 4_987.0),
    (2, -1, 1, 0, 4_036.0),
    (2, 0, 2, 0, 3_994.0),
    (4, 0, 0, 0, 3_861.0),
    (2, 0, -3, 0, 3_665.0),
    (0, 1, -2, 0, -2_689.0),
    (2, 0, -1, 2, -2_602.0),
    (2, -1, -2, 0, 2_390.0),
    (1, 0, 1, 0, -2_348.0),
    (2, -2, 0, 0, 2_236.0),
    (0, 1, 2, 0, -2_120.0),
    (0, 2, 0, 0, -2_069.0),
    (2, -2, -1, 0, 2_048.0),
    (2, 0, 1, -2, -1_773.0),
    (2, 0, 0, 2, -1_595.0),
    (4, -1, -1, 0, 1_215.0),
    (0, 0, 2, 2, -1_110.0),
    (3, 0, -1, 0, -892.0),
    (2, 1, 1, 0, -810.0),
    (4, -1, -2, 0, 759.0),
    (0, 2, -1, 0, -713.0),
    (2, 2, -1, 0, -700.0),
    (2, 1, -2, 0, 691.0),
    (2, -1, 0, -2, 596.0),
    (4, 0, 1, 0, 549.0),
    (0, 0, 4, 0, 537.0),
    (4, -1, 0, 0, 520.0),
    (1, 0, -2, 0, -487.0),
    (2, 1, 0, -2, -399.0),
    (0, 0, 2, -2, -381.0),
    (1, 1, 1, 0, 351.0),
    (3, 0, -2, 0, -340.0),
    (4, 0, -3, 0, 330.0),
    (2, -1, 2, 0, 327.0),
    (0, 2, 1, 0, -323.0),
    (1, 1, -1, 0, 299.0),
    (2, 0, 3, 0, 294.0),
];

/// Compact analytic ephemeris for the Sun and the Moon.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticEphemeris;

impl AnalyticEphemeris {
    pub fn new() -> Self {
        Self
    }
}

impl Ephemeris for AnalyticEphemeris {
    fn longitude(&self, body: Body, jd: f64) -> Result<f64, EphemerisError> {
        if !jd.is_finite() {
            return Err(EphemerisError::InvalidTime(format!("Julian Day {jd}")));
        }
        if !(MIN_JD..=MAX_JD).contains(&jd) {
            return Err(EphemerisError::OutOfRange { jd });
        }
        let t = (jd - J2000) / DAYS_PER_CENTURY;
        let lon = match body {
            Body::Sun => sun_longitude(t),
            Body::Moon => moon_longitude(t),
        };
        Ok(normalize_degrees(lon))
    }
}

/// Nutation in longitude, dominant term only (degrees).
fn nutation_longitude(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    -0.00478 * omega.to_radians().sin()
}

/// Apparent solar longitude for `t` Julian centuries from J2000 (degrees).
fn sun_longitude(t: f64) -> f64 {
    let l0 = 280.46646 + 36_000.76983 * t + 0.000_303_2 * t * t;
    let m = (357.52911 + 35_999.05029 * t - 0.000_153_7 * t * t).to_radians();
    let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();
    let aberration = -0.00569;
    l0 + c + aberration + nutation_longitude(t)
}

/// Apparent lunar longitude for `t` Julian centuries from J2000 (degrees).
fn moon_longitude(t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let l_prime = 218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t2 + t3 / 538_841.0
        - t4 / 65_194_000.0;
    let d = (297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0)
        .to_radians();
    let m = (357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2 + t3 / 24_490_000.0)
        .to_radians();
    let m_prime = (134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0)
        .to_radians();
    let f = (93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t2 - t3 / 3_526_000.0
        + t4 / 863_310_000.0)
        .to_radians();

    // Earth orbit eccentricity decreases; terms in M are scaled by E or E².
    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t2;

    let periodic: f64 = MOON_LONGITUDE_TERMS
        .iter()
        .map(|&(cd, cm, cmp, cf, coeff)| {
            let arg = cd as f64 * d + cm as f64 * m + cmp as f64 * m_prime + cf as f64 * f;
            let scale = match cm.abs() {
                1 => e,
                2 => e * e,
                _ => 1.0,
            };
            coeff * scale * arg.sin()
        })
        .sum();

    let a1 = (119.75 + 131.849 * t).to_radians();
    let a2 = (53.09 + 479_264.290 * t).to_radians();
    let additive = 3958.0 * a1.sin()
        + 1962.0 * (l_prime.to_radians() - f).sin()
        + 318.0 * a2.sin();

    l_prime + (periodic + additive) / 1_000_000.0 + nutation_longitude(t)
}
