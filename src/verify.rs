//! Read-only integrity check of a downloaded frame directory.
//!
//! The check is heuristic. Consecutive hourly frames of the same scene are
//! close in size, so a large jump between neighbours usually means the server
//! substituted an error page or placeholder image. The optional duplicate
//! pass catches the other common substitution: the same bytes served twice.
//!
//! Nothing is modified; the report is the only output.

use crate::frames::{frame_path, scan_frames};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Frame directory not found: {0}")]
    NotADirectory(std::path::PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Neighbouring frames differing by more than this many bytes are flagged.
    pub size_jump_bytes: u64,
    pub detect_duplicates: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            size_jump_bytes: 20_000,
            detect_duplicates: false,
        }
    }
}

/// A frame whose size differs sharply from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeJump {
    pub index: u32,
    pub size: u64,
    pub prev_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub expected: u32,
    pub present: u32,
    pub missing: Vec<u32>,
    /// Zero-byte frames. They count as present.
    pub empty: Vec<u32>,
    pub suspicious: Vec<SizeJump>,
    /// Frames byte-identical to their predecessor.
    pub duplicates: Vec<u32>,
    /// Frames beyond the expected count.
    pub unexpected: Vec<u32>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.empty.is_empty()
            && self.suspicious.is_empty()
            && self.duplicates.is_empty()
    }
}

pub fn verify(
    dir: &Path,
    expected_count: u32,
    options: &VerifyOptions,
) -> Result<VerifyReport, VerifyError> {
    if !dir.is_dir() {
        return Err(VerifyError::NotADirectory(dir.to_path_buf()));
    }
    tracing::info!(dir = %dir.display(), expected_count, "verifying frames");

    let mut report = VerifyReport {
        expected: expected_count,
        ..VerifyReport::default()
    };
    let mut prev_size: Option<u64> = None;
    let mut prev_digest: Option<[u8; 32]> = None;

    for index in 1..=expected_count {
        let path = frame_path(dir, index);
        let size = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                report.missing.push(index);
                prev_size = None;
                prev_digest = None;
                continue;
            }
        };
        report.present += 1;
        if size == 0 {
            report.empty.push(index);
        }

        if let Some(prev) = prev_size.filter(|&p| p > 0) {
            if size.abs_diff(prev) > options.size_jump_bytes {
                tracing::warn!(index, size, prev_size = prev, "suspicious size jump");
                report.suspicious.push(SizeJump {
                    index,
                    size,
                    prev_size: prev,
                });
            }
        }
        prev_size = Some(size);

        if options.detect_duplicates {
            let digest: [u8; 32] = Sha256::digest(std::fs::read(&path)?).into();
            if size > 0 && prev_digest == Some(digest) {
                tracing::warn!(index, "frame identical to predecessor");
                report.duplicates.push(index);
            }
            prev_digest = Some(digest);
        }
    }

    report.unexpected = scan_frames(dir)
        .into_iter()
        .filter(|&index| index > expected_count)
        .collect();

    tracing::info!(
        present = report.present,
        missing = report.missing.len(),
        suspicious = report.suspicious.len(),
        "verification finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sized(dir: &Path, index: u32, size: usize) {
        // Distinct content per frame so the duplicate check stays quiet.
        let mut bytes = vec![0u8; size];
        if let Some(first) = bytes.first_mut() {
            *first = (index % 251) as u8;
        }
        if size > 1 {
            bytes[1] = (index / 251) as u8;
        }
        std::fs::write(frame_path(dir, index), bytes).unwrap();
    }

    fn options() -> VerifyOptions {
        VerifyOptions::default()
    }

    #[test]
    fn complete_consistent_directory_is_clean() {
        let tmp = TempDir::new().unwrap();
        for index in 1..=10 {
            write_sized(tmp.path(), index, 50_000 + index as usize * 100);
        }

        let report = verify(tmp.path(), 10, &options()).unwrap();

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.present, 10);
        assert_eq!(report.expected, 10);
    }

    #[test]
    fn reports_missing_frames() {
        let tmp = TempDir::new().unwrap();
        for index in [1, 2, 4, 5] {
            write_sized(tmp.path(), index, 1000);
        }

        let report = verify(tmp.path(), 6, &options()).unwrap();

        assert_eq!(report.missing, vec![3, 6]);
        assert_eq!(report.present, 4);
        assert!(!report.is_clean());
    }

    #[test]
    fn flags_size_jump_over_threshold() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), 1, 50_000);
        write_sized(tmp.path(), 2, 50_000);
        write_sized(tmp.path(), 3, 5_000);
        write_sized(tmp.path(), 4, 5_500);

        let report = verify(tmp.path(), 4, &options()).unwrap();

        assert_eq!(
            report.suspicious,
            vec![SizeJump {
                index: 3,
                size: 5_000,
                prev_size: 50_000
            }]
        );
    }

    #[test]
    fn jump_exactly_at_threshold_is_not_flagged() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), 1, 30_000);
        write_sized(tmp.path(), 2, 50_000);

        let report = verify(tmp.path(), 2, &options()).unwrap();

        assert!(report.suspicious.is_empty());
    }

    #[test]
    fn no_comparison_across_a_gap() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), 1, 90_000);
        write_sized(tmp.path(), 3, 1_000);

        let report = verify(tmp.path(), 3, &options()).unwrap();

        assert_eq!(report.missing, vec![2]);
        assert!(report.suspicious.is_empty());
    }

    #[test]
    fn empty_frame_is_reported_and_not_compared_against() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), 1, 60_000);
        write_sized(tmp.path(), 2, 0);
        write_sized(tmp.path(), 3, 60_000);

        let report = verify(tmp.path(), 3, &options()).unwrap();

        assert_eq!(report.empty, vec![2]);
        assert_eq!(report.present, 3);
        // 1 → 2 is a jump; 2 → 3 is skipped because frame 2 is empty.
        let flagged: Vec<u32> = report.suspicious.iter().map(|s| s.index).collect();
        assert_eq!(flagged, vec![2]);
    }

    #[test]
    fn detects_duplicate_neighbours() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), 1, 1000);
        std::fs::copy(frame_path(tmp.path(), 1), frame_path(tmp.path(), 2)).unwrap();
        write_sized(tmp.path(), 3, 1000);

        let with = VerifyOptions {
            detect_duplicates: true,
            ..options()
        };
        assert_eq!(verify(tmp.path(), 3, &with).unwrap().duplicates, vec![2]);
        assert!(verify(tmp.path(), 3, &options()).unwrap().duplicates.is_empty());
    }

    #[test]
    fn lists_unexpected_frames() {
        let tmp = TempDir::new().unwrap();
        for index in 1..=3 {
            write_sized(tmp.path(), index, 1000);
        }
        write_sized(tmp.path(), 9, 1000);

        let report = verify(tmp.path(), 3, &options()).unwrap();

        assert_eq!(report.unexpected, vec![9]);
        assert!(report.is_clean());
    }

    #[test]
    fn report_serializes_to_json() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), 1, 1000);
        write_sized(tmp.path(), 2, 50_000);

        let report = verify(tmp.path(), 3, &options()).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["expected"], 3);
        assert_eq!(value["present"], 2);
        assert_eq!(value["missing"], serde_json::json!([3]));
        assert_eq!(value["suspicious"][0]["index"], 2);
        assert_eq!(value["suspicious"][0]["prev_size"], 1000);
    }

    #[test]
    fn missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = verify(&tmp.path().join("nope"), 3, &options());
        assert!(matches!(result, Err(VerifyError::NotADirectory(_))));
    }

    #[test]
    fn does_not_modify_directory() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), 1, 100);
        write_sized(tmp.path(), 2, 90_000);

        verify(tmp.path(), 5, &VerifyOptions { detect_duplicates: true, ..options() }).unwrap();

        assert_eq!(scan_frames(tmp.path()), vec![1, 2]);
    }
}
