//! Copy a sub-range of frames into a fresh, 1-based sequence.
//!
//! Source frames `start..=end` become `moon.0001.jpg`, `moon.0002.jpg`, ... in
//! the destination, in source order. A missing source frame is skipped with a
//! warning and does not consume a destination number, so the output is always
//! gap-free even when the input is not.

use crate::frames::frame_path;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReindexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Empty frame range: start {start} is after end {end}")]
    EmptyRange { start: u32, end: u32 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexSummary {
    pub copied: u32,
    /// Source indices that were not found.
    pub missing: Vec<u32>,
}

pub fn reindex(
    source_dir: &Path,
    start: u32,
    end: u32,
    dest_dir: &Path,
) -> Result<ReindexSummary, ReindexError> {
    if start > end {
        return Err(ReindexError::EmptyRange { start, end });
    }
    std::fs::create_dir_all(dest_dir)?;
    tracing::info!(
        start,
        end,
        source = %source_dir.display(),
        dest = %dest_dir.display(),
        "re-indexing frames"
    );

    let mut summary = ReindexSummary::default();
    for index in start..=end {
        let source = frame_path(source_dir, index);
        if !source.is_file() {
            tracing::warn!(index, path = %source.display(), "source frame missing, skipped");
            summary.missing.push(index);
            continue;
        }
        let dest = frame_path(dest_dir, summary.copied + 1);
        std::fs::copy(&source, &dest)?;
        summary.copied += 1;
    }

    tracing::info!(
        copied = summary.copied,
        missing = summary.missing.len(),
        "re-index finished"
    );
    Ok(summary)
}
