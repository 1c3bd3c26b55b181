//! Hourly phase angles for a whole year, as JSON.
//!
//! Frame `n` maps to the phase angle at the start of its hour. The table is
//! what a front end needs to label the frame it is currently showing.

use crate::ephemeris::{Ephemeris, EphemerisError, normalize_degrees, phase_angle};
use crate::timeline::YearTimeline;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The eight conventional phase names, each covering 45°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl PhaseName {
    const ALL: [PhaseName; 8] = [
        PhaseName::NewMoon,
        PhaseName::WaxingCrescent,
        PhaseName::FirstQuarter,
        PhaseName::WaxingGibbous,
        PhaseName::FullMoon,
        PhaseName::WaningGibbous,
        PhaseName::LastQuarter,
        PhaseName::WaningCrescent,
    ];

    pub fn from_angle(angle_deg: f64) -> Self {
        let angle = normalize_degrees(angle_deg);
        let bin = ((angle / 45.0) as usize).min(7);
        Self::ALL[bin]
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseName::NewMoon => "New Moon",
            PhaseName::WaxingCrescent => "Waxing Crescent",
            PhaseName::FirstQuarter => "First Quarter",
            PhaseName::WaxingGibbous => "Waxing Gibbous",
            PhaseName::FullMoon => "Full Moon",
            PhaseName::WaningGibbous => "Waning Gibbous",
            PhaseName::LastQuarter => "Last Quarter",
            PhaseName::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTableMetadata {
    pub year: i32,
    /// RFC 3339 timestamp of frame 1.
    pub start: String,
    pub total_hours: u32,
    /// Phase one hour before the year starts.
    pub pre_start_phase: f64,
    pub start_phase: f64,
    pub end_phase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTable {
    pub metadata: PhaseTableMetadata,
    /// Keyed by 1-based frame index.
    pub phase_angles: BTreeMap<u32, f64>,
}

impl PhaseTable {
    pub fn angle(&self, frame: u32) -> Option<f64> {
        self.phase_angles.get(&frame).copied()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn build(
    ephemeris: &impl Ephemeris,
    timeline: &YearTimeline,
) -> Result<PhaseTable, EphemerisError> {
    let phase_angles = (0..timeline.hours())
        .map(|hour| -> Result<(u32, f64), EphemerisError> {
            Ok((hour + 1, phase_angle(ephemeris, timeline.jd_at(f64::from(hour)))?))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let pre_start_phase = phase_angle(ephemeris, timeline.jd_at(-1.0))?;
    let start_phase = phase_angles.get(&1).copied().unwrap_or(pre_start_phase);
    let end_phase = phase_angles
        .get(&timeline.hours())
        .copied()
        .unwrap_or(start_phase);

    Ok(PhaseTable {
        metadata: PhaseTableMetadata {
            year: timeline.year(),
            start: timeline.start().to_rfc3339(),
            total_hours: timeline.hours(),
            pre_start_phase,
            start_phase,
            end_phase,
        },
        phase_angles,
    })
}
