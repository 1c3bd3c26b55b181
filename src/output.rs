//! CLI output formatting for every command.
//!
//! # Frame-First Display
//!
//! Every line leads with the frame index (four digits, like the file names)
//! or with the quantity the command was asked for. Paths and timestamps are
//! secondary context on indented lines.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! 0001 downloaded (48.2 KB)
//! 0002 skipped
//! 0003 failed: HTTP 404 for https://…/moon.0003.jpg
//!
//! Fetched 1 frame, skipped 1, failed 1
//!     Failed: 3
//! ```
//!
//! ## New moons
//!
//! ```text
//! First new moon: frame 0648
//!     Time: 2017-01-27 23:00 UTC (phase 359.62°)
//! Last new moon: frame 8433
//!     Time: 2017-12-18 08:00 UTC (phase 359.81°)
//! Sequence: 648-8433 (7786 frames, 44 candidates)
//! ```
//!
//! ## Verify
//!
//! ```text
//! Frames: 8758 of 8760 present
//! Missing: 12-13
//! Suspicious size changes:
//!     0412: 52.1 KB -> 3.2 KB
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::fetch::{FetchEvent, FetchSummary};
use crate::phase_table::PhaseName;
use crate::reindex::ReindexSummary;
use crate::search::{LoopPoint, NewMoonBracket, NewMoonSample};
use crate::verify::VerifyReport;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

fn format_frame(index: u32) -> String {
    format!("{index:04}")
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte size in KB with one decimal.
fn format_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Collapse sorted indices into runs: `[1, 2, 3, 7, 9, 10]` → `1-3, 7, 9-10`.
fn format_ranges(indices: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = indices.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
    }
    parts.join(", ")
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

// ============================================================================
// Fetch
// ============================================================================

pub fn format_fetch_event(event: &FetchEvent) -> Vec<String> {
    match event {
        FetchEvent::Downloaded { index, bytes } => vec![format!(
            "{} downloaded ({})",
            format_frame(*index),
            format_kb(*bytes as u64)
        )],
        FetchEvent::Skipped { index } => vec![format!("{} skipped", format_frame(*index))],
        FetchEvent::Failed { index, reason } => {
            vec![format!("{} failed: {}", format_frame(*index), reason)]
        }
    }
}

pub fn format_fetch_summary(summary: &FetchSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Fetched {}, skipped {}, failed {}",
        plural(summary.downloaded, "frame"),
        summary.skipped,
        summary.failed.len()
    )];
    if !summary.is_complete() {
        let indices: Vec<u32> = summary.failed.iter().map(|f| f.index).collect();
        lines.push(format!("{}Failed: {}", indent(1), format_ranges(&indices)));
        lines.push(format!("{}Run fetch again to retry", indent(1)));
    }
    lines
}

pub fn print_fetch_summary(summary: &FetchSummary) {
    print_lines(format_fetch_summary(summary));
}

// ============================================================================
// New moons
// ============================================================================

fn sample_lines(label: &str, sample: &NewMoonSample) -> Vec<String> {
    vec![
        format!("{label}: frame {}", format_frame(sample.frame)),
        format!(
            "{}Time: {} (phase {:.2}°)",
            indent(1),
            sample.time.format("%Y-%m-%d %H:%M UTC"),
            sample.phase_angle
        ),
    ]
}

pub fn format_new_moons(bracket: &NewMoonBracket, sequence_file: Option<&Path>) -> Vec<String> {
    let mut lines = sample_lines("First new moon", &bracket.first);
    lines.extend(sample_lines("Last new moon", &bracket.last));
    let span = bracket.last_frame() - bracket.first_frame() + 1;
    lines.push(format!(
        "Sequence: {}-{} ({}, {})",
        bracket.first_frame(),
        bracket.last_frame(),
        plural(span as usize, "frame"),
        plural(bracket.candidates, "candidate")
    ));
    if let Some(path) = sequence_file {
        lines.push(format!("{}Written: {}", indent(1), path.display()));
    }
    lines
}

pub fn print_new_moons(bracket: &NewMoonBracket, sequence_file: Option<&Path>) {
    print_lines(format_new_moons(bracket, sequence_file));
}

// ============================================================================
// Loop point
// ============================================================================

pub fn format_loop_point(
    reference_angle: f64,
    point: Option<&LoopPoint>,
    total_frames: u32,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Reference phase: {:.2}° ({})",
        reference_angle,
        PhaseName::from_angle(reference_angle)
    )];
    match point {
        Some(point) => {
            let (start, end) = point.frame_range(total_frames);
            lines.push(format!(
                "Loop point: {} hours ({:.2} days)",
                point.offset_hours,
                point.days()
            ));
            if point.raw_offset_hours != point.offset_hours {
                lines.push(format!(
                    "{}Best sample: {} hours",
                    indent(1),
                    point.raw_offset_hours
                ));
            }
            lines.push(format!(
                "{}Phase difference: {:.2}°",
                indent(1),
                point.difference_deg
            ));
            lines.push(format!("{}Frames: {}-{}", indent(1), start, end));
        }
        None => lines.push("No suitable loop point found".to_string()),
    }
    lines
}

pub fn print_loop_point(reference_angle: f64, point: Option<&LoopPoint>, total_frames: u32) {
    print_lines(format_loop_point(reference_angle, point, total_frames));
}

// ============================================================================
// Reindex
// ============================================================================

pub fn format_reindex_summary(
    summary: &ReindexSummary,
    start: u32,
    end: u32,
    dest: &Path,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Copied {} ({}-{}) → {}",
        plural(summary.copied as usize, "frame"),
        start,
        end,
        dest.display()
    )];
    if !summary.missing.is_empty() {
        lines.push(format!(
            "{}Missing: {}",
            indent(1),
            format_ranges(&summary.missing)
        ));
    }
    lines
}

pub fn print_reindex_summary(summary: &ReindexSummary, start: u32, end: u32, dest: &Path) {
    print_lines(format_reindex_summary(summary, start, end, dest));
}

// ============================================================================
// Phases
// ============================================================================

pub fn format_phases(paths: &[PathBuf]) -> Vec<String> {
    let mut lines: Vec<String> = paths
        .iter()
        .map(|p| format!("Generated {}", p.display()))
        .collect();
    lines.push(format!("{} written", plural(paths.len(), "phase image")));
    lines
}

pub fn print_phases(paths: &[PathBuf]) {
    print_lines(format_phases(paths));
}

// ============================================================================
// Verify
// ============================================================================

pub fn format_verify_report(report: &VerifyReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Frames: {} of {} present",
        report.present, report.expected
    )];

    if !report.missing.is_empty() {
        lines.push(format!("Missing: {}", format_ranges(&report.missing)));
    }
    if !report.empty.is_empty() {
        lines.push(format!("Empty: {}", format_ranges(&report.empty)));
    }
    if !report.suspicious.is_empty() {
        lines.push("Suspicious size changes:".to_string());
        for jump in &report.suspicious {
            lines.push(format!(
                "{}{}: {} -> {}",
                indent(1),
                format_frame(jump.index),
                format_kb(jump.prev_size),
                format_kb(jump.size)
            ));
        }
    }
    if !report.duplicates.is_empty() {
        lines.push(format!(
            "Identical to previous frame: {}",
            format_ranges(&report.duplicates)
        ));
    }
    if !report.unexpected.is_empty() {
        lines.push(format!(
            "Beyond expected count: {}",
            format_ranges(&report.unexpected)
        ));
    }
    if report.is_clean() {
        lines.push("All frames present and sizes consistent".to_string());
    }
    lines
}

pub fn print_verify_report(report: &VerifyReport) {
    print_lines(format_verify_report(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FailedFrame;
    use crate::verify::SizeJump;
    use chrono::{TimeZone, Utc};

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_frame_pads_to_four() {
        assert_eq!(format_frame(7), "0007");
        assert_eq!(format_frame(8760), "8760");
    }

    #[test]
    fn format_kb_one_decimal() {
        assert_eq!(format_kb(2048), "2.0 KB");
        assert_eq!(format_kb(1536), "1.5 KB");
    }

    #[test]
    fn format_ranges_collapses_runs() {
        assert_eq!(format_ranges(&[1, 2, 3, 7, 9, 10]), "1-3, 7, 9-10");
        assert_eq!(format_ranges(&[5]), "5");
        assert_eq!(format_ranges(&[]), "");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "frame"), "1 frame");
        assert_eq!(plural(0, "frame"), "0 frames");
        assert_eq!(plural(3, "frame"), "3 frames");
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    #[test]
    fn fetch_event_lines() {
        assert_eq!(
            format_fetch_event(&FetchEvent::Downloaded {
                index: 1,
                bytes: 2048
            }),
            vec!["0001 downloaded (2.0 KB)"]
        );
        assert_eq!(
            format_fetch_event(&FetchEvent::Skipped { index: 42 }),
            vec!["0042 skipped"]
        );
        assert_eq!(
            format_fetch_event(&FetchEvent::Failed {
                index: 3,
                reason: "timeout".into()
            }),
            vec!["0003 failed: timeout"]
        );
    }

    #[test]
    fn fetch_summary_lists_failures() {
        let summary = FetchSummary {
            downloaded: 10,
            skipped: 2,
            failed: vec![
                FailedFrame {
                    index: 4,
                    reason: "x".into(),
                },
                FailedFrame {
                    index: 5,
                    reason: "x".into(),
                },
            ],
        };
        let lines = format_fetch_summary(&summary);
        assert_eq!(lines[0], "Fetched 10 frames, skipped 2, failed 2");
        assert_eq!(lines[1], "    Failed: 4-5");
    }

    #[test]
    fn fetch_summary_clean_is_one_line() {
        let summary = FetchSummary {
            downloaded: 1,
            ..FetchSummary::default()
        };
        assert_eq!(
            format_fetch_summary(&summary),
            vec!["Fetched 1 frame, skipped 0, failed 0"]
        );
    }

    // =========================================================================
    // New moons / loop point
    // =========================================================================

    fn sample(frame: u32, hour: u32, day: u32, month: u32) -> NewMoonSample {
        NewMoonSample {
            time: Utc.with_ymd_and_hms(2017, month, day, hour, 0, 0).unwrap(),
            frame,
            phase_angle: 0.25,
        }
    }

    #[test]
    fn new_moons_show_bracket_and_span() {
        let bracket = NewMoonBracket {
            first: sample(649, 0, 28, 1),
            last: sample(8383, 6, 18, 12),
            candidates: 48,
        };
        let lines = format_new_moons(&bracket, Some(Path::new("frames/sequence.txt")));
        assert_eq!(lines[0], "First new moon: frame 0649");
        assert_eq!(lines[1], "    Time: 2017-01-28 00:00 UTC (phase 0.25°)");
        assert_eq!(lines[2], "Last new moon: frame 8383");
        assert_eq!(lines[4], "Sequence: 649-8383 (7735 frames, 48 candidates)");
        assert_eq!(lines[5], "    Written: frames/sequence.txt");
    }

    #[test]
    fn loop_point_found() {
        let point = LoopPoint {
            offset_hours: 720,
            raw_offset_hours: 714,
            difference_deg: 1.234,
        };
        let lines = format_loop_point(33.0, Some(&point), 8760);
        assert_eq!(lines[0], "Reference phase: 33.00° (New Moon)");
        assert_eq!(lines[1], "Loop point: 720 hours (30.00 days)");
        assert_eq!(lines[2], "    Best sample: 714 hours");
        assert_eq!(lines[3], "    Phase difference: 1.23°");
        assert_eq!(lines[4], "    Frames: 8041-8760");
    }

    #[test]
    fn loop_point_missing_is_reported() {
        let lines = format_loop_point(200.0, None, 8760);
        assert_eq!(lines[1], "No suitable loop point found");
    }

    // =========================================================================
    // Reindex / phases
    // =========================================================================

    #[test]
    fn reindex_summary_with_missing() {
        let summary = ReindexSummary {
            copied: 3,
            missing: vec![12, 14],
        };
        let lines = format_reindex_summary(&summary, 10, 15, Path::new("loop"));
        assert_eq!(lines[0], "Copied 3 frames (10-15) → loop");
        assert_eq!(lines[1], "    Missing: 12, 14");
    }

    #[test]
    fn phases_listing() {
        let paths = vec![PathBuf::from("p/phase-0.png"), PathBuf::from("p/phase-1.png")];
        let lines = format_phases(&paths);
        assert_eq!(lines[0], "Generated p/phase-0.png");
        assert_eq!(lines[2], "2 phase images written");
    }

    // =========================================================================
    // Verify
    // =========================================================================

    #[test]
    fn verify_clean_report() {
        let report = VerifyReport {
            expected: 10,
            present: 10,
            ..VerifyReport::default()
        };
        assert_eq!(
            format_verify_report(&report),
            vec![
                "Frames: 10 of 10 present",
                "All frames present and sizes consistent"
            ]
        );
    }

    #[test]
    fn verify_problem_report() {
        let report = VerifyReport {
            expected: 20,
            present: 17,
            missing: vec![12, 13, 19],
            suspicious: vec![SizeJump {
                index: 4,
                size: 1024,
                prev_size: 51_200,
            }],
            duplicates: vec![8],
            unexpected: vec![21],
            ..VerifyReport::default()
        };
        let lines = format_verify_report(&report);
        assert_eq!(
            lines,
            vec![
                "Frames: 17 of 20 present",
                "Missing: 12-13, 19",
                "Suspicious size changes:",
                "    0004: 50.0 KB -> 1.0 KB",
                "Identical to previous frame: 8",
                "Beyond expected count: 21",
            ]
        );
    }
}
