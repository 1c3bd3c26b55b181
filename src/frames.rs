//! Centralized naming for the `moon.NNNN.jpg` frame convention.
//!
//! Every frame on the remote host and on disk follows the same pattern: a
//! fixed `moon.` prefix, the 1-based frame index zero-padded to four digits,
//! and a `.jpg` extension. Re-indexed loop copies use the same pattern with
//! fresh indices starting at 1.
//!
//! - `moon.0001.jpg` → index 1 (00:00–01:00 UT, January 1)
//! - `moon.8760.jpg` → index 8760 (23:00–24:00 UT, December 31)

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PREFIX: &str = "moon.";
const EXTENSION: &str = ".jpg";

/// File name for a frame index: `moon.{index:04}.jpg`.
pub fn frame_file_name(index: u32) -> String {
    format!("{PREFIX}{index:04}{EXTENSION}")
}

/// Local path for a frame index inside `dir`.
pub fn frame_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(frame_file_name(index))
}

/// Remote URL for a frame index. A trailing slash on `base_url` is tolerated.
pub fn frame_url(base_url: &str, index: u32) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        frame_file_name(index)
    )
}

/// Parse a frame file name back into its index.
///
/// Accepts any digit count (`moon.12345.jpg` is index 12345) so frames past
/// the four-digit range are still recognised. Returns `None` for anything
/// else, including index 0.
pub fn parse_frame_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(PREFIX)?.strip_suffix(EXTENSION)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|&n| n > 0)
}

/// All frame indices present directly inside `dir`, sorted ascending.
///
/// Non-frame files and subdirectories are ignored. A missing directory
/// yields an empty list.
pub fn scan_frames(dir: &Path) -> Vec<u32> {
    let mut indices: Vec<u32> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.file_name().to_str().and_then(parse_frame_name))
        .collect();
    indices.sort_unstable();
    indices
}

/// Highest frame index present in `dir`, or 0 when there are none.
pub fn last_frame_index(dir: &Path) -> u32 {
    scan_frames(dir).last().copied().unwrap_or(0)
}
