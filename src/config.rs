//! Tool configuration module.
//!
//! Handles loading, validating, and merging `moonloop.toml`. Stock defaults
//! reproduce the 2017 hourly frame set; a user file only needs the keys it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! base_url = "https://svs.gsfc.nasa.gov/vis/a000000/a004500/a004537/frames/730x730_1x1_30p"
//! year = 2017               # Frame 1 is 00:00 UT on January 1 of this year
//!
//! [paths]
//! frames_dir = "public/moon-phases"
//! loop_dir = "public/moon-phases-loop"
//! phases_dir = "public/images/moon-phases"
//!
//! [fetch]
//! workers = 4               # Parallel downloads
//! delay_ms = 500            # Pause after each download
//! timeout_secs = 30         # Per-request timeout
//!
//! [new_moon]
//! tolerance_deg = 1.0
//!
//! [loop_search]             # Defaults are the "synodic" preset
//! window_start_hours = 636
//! window_end_hours = 780
//! step_hours = 6
//! max_tolerance_deg = 6.0
//! exact_match_deg = 0.5
//! round_to_day = true
//!
//! [verify]
//! size_jump_bytes = 20000
//!
//! [phases]
//! count = 30
//! size = 512
//! seed = 2017
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::search::LoopSearch;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "moonloop.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `moonloop.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoonConfig {
    /// Remote frame source and the year it covers.
    pub source: SourceConfig,
    /// Local directories.
    pub paths: PathsConfig,
    /// Download pool settings.
    pub fetch: FetchConfig,
    /// New-moon scan settings.
    pub new_moon: NewMoonConfig,
    /// Loop-point search window.
    pub loop_search: LoopSearchConfig,
    /// Integrity check settings.
    pub verify: VerifyConfig,
    /// Procedural phase texture settings.
    pub phases: PhasesConfig,
}

impl MoonConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source.base_url must not be empty".into(),
            ));
        }
        if !(1000..=3000).contains(&self.source.year) {
            return Err(ConfigError::Validation(
                "source.year must be within 1000-3000".into(),
            ));
        }
        if self.fetch.workers == 0 {
            return Err(ConfigError::Validation(
                "fetch.workers must be at least 1".into(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be non-zero".into(),
            ));
        }
        if self.new_moon.tolerance_deg <= 0.0 {
            return Err(ConfigError::Validation(
                "new_moon.tolerance_deg must be positive".into(),
            ));
        }
        let ls = &self.loop_search;
        if ls.step_hours == 0 {
            return Err(ConfigError::Validation(
                "loop_search.step_hours must be non-zero".into(),
            ));
        }
        if ls.window_start_hours >= ls.window_end_hours {
            return Err(ConfigError::Validation(
                "loop_search window must satisfy window_start_hours < window_end_hours".into(),
            ));
        }
        if ls.max_tolerance_deg < 0.0 || ls.exact_match_deg < 0.0 {
            return Err(ConfigError::Validation(
                "loop_search tolerances must not be negative".into(),
            ));
        }
        if self.phases.count == 0 {
            return Err(ConfigError::Validation(
                "phases.count must be non-zero".into(),
            ));
        }
        if self.phases.size < 16 {
            return Err(ConfigError::Validation(
                "phases.size must be at least 16 pixels".into(),
            ));
        }
        Ok(())
    }
}

/// Remote frame source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory URL the `moon.NNNN.jpg` names are appended to.
    pub base_url: String,
    /// Calendar year covered by the frame sequence.
    pub year: i32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://svs.gsfc.nasa.gov/vis/a000000/a004500/a004537/frames/730x730_1x1_30p"
                .to_string(),
            year: 2017,
        }
    }
}

/// Local output directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Where fetched hourly frames live.
    pub frames_dir: PathBuf,
    /// Destination of the re-indexed loop sequence.
    pub loop_dir: PathBuf,
    /// Destination of procedurally generated phase textures.
    pub phases_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("public/moon-phases"),
            loop_dir: PathBuf::from("public/moon-phases-loop"),
            phases_dir: PathBuf::from("public/images/moon-phases"),
        }
    }
}

/// Download pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Number of concurrent download workers.
    pub workers: usize,
    /// Pause after each successful download, in milliseconds.
    pub delay_ms: u64,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            delay_ms: 500,
            timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resolve the effective worker count: at least one, at most 64.
pub fn effective_workers(config: &FetchConfig) -> usize {
    config.workers.clamp(1, 64)
}

/// New-moon scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewMoonConfig {
    /// Angular distance from 0°/360° accepted as a new-moon sample.
    pub tolerance_deg: f64,
}

impl Default for NewMoonConfig {
    fn default() -> Self {
        Self { tolerance_deg: 1.0 }
    }
}

/// Loop-point search window, mirrored one-to-one by [`LoopSearch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopSearchConfig {
    pub window_start_hours: u32,
    /// Exclusive upper bound of the offset window.
    pub window_end_hours: u32,
    pub step_hours: u32,
    /// Best matches worse than this are rejected.
    pub max_tolerance_deg: f64,
    /// A sample closer than this stops the scan early.
    pub exact_match_deg: f64,
    /// Round the winning offset to whole days.
    pub round_to_day: bool,
}

impl Default for LoopSearchConfig {
    fn default() -> Self {
        Self::from(LoopSearch::synodic())
    }
}

impl From<LoopSearch> for LoopSearchConfig {
    fn from(search: LoopSearch) -> Self {
        Self {
            window_start_hours: search.window_start_hours,
            window_end_hours: search.window_end_hours,
            step_hours: search.step_hours,
            max_tolerance_deg: search.max_tolerance_deg,
            exact_match_deg: search.exact_match_deg,
            round_to_day: search.round_to_day,
        }
    }
}

impl From<&LoopSearchConfig> for LoopSearch {
    fn from(config: &LoopSearchConfig) -> Self {
        Self {
            window_start_hours: config.window_start_hours,
            window_end_hours: config.window_end_hours,
            step_hours: config.step_hours,
            max_tolerance_deg: config.max_tolerance_deg,
            exact_match_deg: config.exact_match_deg,
            round_to_day: config.round_to_day,
        }
    }
}

/// Integrity check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Size difference between neighbouring frames that flags a frame.
    pub size_jump_bytes: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            size_jump_bytes: 20_000,
        }
    }
}

/// Procedural phase texture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhasesConfig {
    /// Number of evenly spaced phase angles to render.
    pub count: u32,
    /// Square image edge, in pixels.
    pub size: u32,
    /// Seed for the surface noise generator.
    pub seed: u64,
}

impl Default for PhasesConfig {
    fn default() -> Self {
        Self {
            count: 30,
            size: 512,
            seed: 2017,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(MoonConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<MoonConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MoonConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file path; a missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<MoonConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `moonloop.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# moonloop configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Remote frame source
# ---------------------------------------------------------------------------
[source]
# Frames are fetched from {base_url}/moon.NNNN.jpg
base_url = "https://svs.gsfc.nasa.gov/vis/a000000/a004500/a004537/frames/730x730_1x1_30p"
# Frame 1 is the hour starting 00:00 UT on January 1 of this year.
year = 2017

# ---------------------------------------------------------------------------
# Local directories
# ---------------------------------------------------------------------------
[paths]
frames_dir = "public/moon-phases"
loop_dir = "public/moon-phases-loop"
phases_dir = "public/images/moon-phases"

# ---------------------------------------------------------------------------
# Downloads
# ---------------------------------------------------------------------------
[fetch]
# Number of parallel download workers.
workers = 4
# Pause after each successful download (milliseconds).
delay_ms = 500
# Per-request timeout (seconds).
timeout_secs = 30

# ---------------------------------------------------------------------------
# New-moon scan
# ---------------------------------------------------------------------------
[new_moon]
# Hourly samples within this many degrees of 0/360 count as new moon.
tolerance_deg = 1.0

# ---------------------------------------------------------------------------
# Loop-point search (defaults: one synodic month, +/- 72 hours)
# ---------------------------------------------------------------------------
[loop_search]
window_start_hours = 636
window_end_hours = 780
step_hours = 6
max_tolerance_deg = 6.0
exact_match_deg = 0.5
round_to_day = true

# ---------------------------------------------------------------------------
# Integrity check
# ---------------------------------------------------------------------------
[verify]
# Neighbouring frames whose sizes differ by more than this are flagged.
size_jump_bytes = 20000

# ---------------------------------------------------------------------------
# Procedural phase textures
# ---------------------------------------------------------------------------
[phases]
count = 30
size = 512
seed = 2017
"##
}
