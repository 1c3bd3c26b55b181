//! Procedural moon-phase sprites.
//!
//! Each sprite is a grey disc with per-pixel Gaussian noise, cut by a
//! terminator so that the lit area matches [`illuminated_fraction`]. The
//! lighting convention is simple: waxing phases (0°–180°) are
//! lit from the right, waning phases from the left.
//!
//! ```text
//! phases/
//! ├── phase-0.png     # 0°   new
//! ├── phase-1.png     # 12°
//! ├── ...
//! └── phase-29.png    # 348°
//! ```

use crate::config::PhasesConfig;
use crate::ephemeris::normalize_degrees;
use image::{ImageFormat, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhaseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Noise standard deviation must be finite and non-negative, got {0}")]
    InvalidNoise(f64),
    #[error("Invalid noise distribution: {0}")]
    Noise(#[from] NormalError),
}

/// Look of a single sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseStyle {
    /// Width and height in pixels.
    pub size: u32,
    /// Gap between the disc and the image edge.
    pub padding: u32,
    pub color: [u8; 4],
    /// Standard deviation of the surface noise, in 8-bit levels.
    pub noise_std_dev: f64,
}

impl Default for PhaseStyle {
    fn default() -> Self {
        Self {
            size: 512,
            padding: 4,
            color: [200, 200, 200, 255],
            noise_std_dev: 10.0,
        }
    }
}

/// A full set of evenly spaced sprites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSetConfig {
    pub count: u32,
    pub seed: u64,
    pub style: PhaseStyle,
}

impl From<&PhasesConfig> for PhaseSetConfig {
    fn from(config: &PhasesConfig) -> Self {
        Self {
            count: config.count,
            seed: config.seed,
            style: PhaseStyle {
                size: config.size,
                ..PhaseStyle::default()
            },
        }
    }
}

/// Fraction of the disc that is lit at `angle_deg`.
///
/// `(1 - cos a) / 2` on the waxing half `[0, 180]`, `(1 + cos a) / 2` on the
/// waning half.
pub fn illuminated_fraction(angle_deg: f64) -> f64 {
    let angle = normalize_degrees(angle_deg);
    let cos = angle.to_radians().cos();
    if angle <= 180.0 {
        (1.0 - cos) / 2.0
    } else {
        (1.0 + cos) / 2.0
    }
}

/// Whether the point `dx` along a row of half-chord `half_chord` is lit.
fn is_lit(dx: f64, half_chord: f64, angle: f64) -> bool {
    let edge = half_chord * angle.to_radians().cos();
    if angle <= 180.0 { dx >= edge } else { dx <= edge }
}

/// Render the sprite for one phase angle.
pub fn generate_phase(
    angle_deg: f64,
    style: &PhaseStyle,
    rng: &mut impl Rng,
) -> Result<RgbaImage, PhaseError> {
    if !style.noise_std_dev.is_finite() || style.noise_std_dev < 0.0 {
        return Err(PhaseError::InvalidNoise(style.noise_std_dev));
    }
    let noise = Normal::new(0.0, style.noise_std_dev)?;
    let angle = normalize_degrees(angle_deg);
    let center = f64::from(style.size) / 2.0;
    let radius = (center - f64::from(style.padding)).max(0.0);
    let [r, g, b, a] = style.color;

    let mut image = RgbaImage::new(style.size, style.size);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = f64::from(x) + 0.5 - center;
        let dy = f64::from(y) + 0.5 - center;
        let r2 = radius * radius - dy * dy;
        if dx * dx > r2 {
            continue;
        }
        if !is_lit(dx, r2.max(0.0).sqrt(), angle) {
            continue;
        }
        let n = noise.sample(rng);
        let shade = |c: u8| (f64::from(c) + n).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgba([shade(r), shade(g), shade(b), a]);
    }
    Ok(image)
}

/// Angle of sprite `i` in a set of `count`.
pub fn phase_angle_for(i: u32, count: u32) -> f64 {
    f64::from(i) * 360.0 / f64::from(count.max(1))
}

pub fn phase_file_name(i: u32) -> String {
    format!("phase-{i}.png")
}

/// Write `phase-0.png` .. `phase-{count-1}.png` into `dir`.
///
/// Sprite `i` uses an RNG seeded with `seed + i`, so output is reproducible
/// regardless of how the work is scheduled.
pub fn generate_all_phases(dir: &Path, config: &PhaseSetConfig) -> Result<Vec<PathBuf>, PhaseError> {
    std::fs::create_dir_all(dir)?;
    tracing::info!(
        count = config.count,
        size = config.style.size,
        dir = %dir.display(),
        "generating phase sprites"
    );

    (0..config.count)
        .into_par_iter()
        .map(|i| -> Result<PathBuf, PhaseError> {
            let angle = phase_angle_for(i, config.count);
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(u64::from(i)));
            let image = generate_phase(angle, &config.style, &mut rng)?;
            let path = dir.join(phase_file_name(i));
            image.save_with_format(&path, ImageFormat::Png)?;
            tracing::debug!(i, angle, path = %path.display(), "phase sprite written");
            Ok(path)
        })
        .collect()
}
