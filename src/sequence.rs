//! Sidecar file recording the frame range of a detected sequence.
//!
//! Format: two decimal integers on two lines, no trailing newline.
//!
//! ```text
//! 648
//! 8433
//! ```

use std::path::Path;
use thiserror::Error;

pub const SEQUENCE_FILENAME: &str = "sequence.txt";

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed sequence file: {0}")]
    Malformed(String),
    #[error("Sequence start {start} is after end {end}")]
    Inverted { start: u32, end: u32 },
}

pub fn format_sequence(start: u32, end: u32) -> String {
    format!("{start}\n{end}")
}

pub fn parse_sequence(content: &str) -> Result<(u32, u32), SequenceError> {
    let mut lines = content.split_whitespace();
    let (Some(start), Some(end), None) = (lines.next(), lines.next(), lines.next()) else {
        return Err(SequenceError::Malformed(format!(
            "expected two lines, got {content:?}"
        )));
    };
    let start = parse_index(start)?;
    let end = parse_index(end)?;
    if start > end {
        return Err(SequenceError::Inverted { start, end });
    }
    Ok((start, end))
}

fn parse_index(token: &str) -> Result<u32, SequenceError> {
    match token.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SequenceError::Malformed(format!(
            "{token:?} is not a positive frame index"
        ))),
    }
}

pub fn write_sequence(path: &Path, start: u32, end: u32) -> Result<(), SequenceError> {
    if start > end {
        return Err(SequenceError::Inverted { start, end });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format_sequence(start, end))?;
    tracing::info!(path = %path.display(), start, end, "sequence file written");
    Ok(())
}

pub fn read_sequence(path: &Path) -> Result<(u32, u32), SequenceError> {
    parse_sequence(&std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_has_exact_format() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SEQUENCE_FILENAME);

        write_sequence(&path, 648, 8433).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "648\n8433");
    }

    #[test]
    fn read_back_written_range() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sub/dir").join(SEQUENCE_FILENAME);

        write_sequence(&path, 12, 700).unwrap();

        assert_eq!(read_sequence(&path).unwrap(), (12, 700));
    }

    #[test]
    fn parse_tolerates_surrounding_whitespace() {
        assert_eq!(parse_sequence("  5\r\n9\n\n").unwrap(), (5, 9));
    }

    #[test]
    fn parse_rejects_malformed_content() {
        for bad in ["", "5", "5\n9\n11", "a\n9", "5\n-9", "0\n9", "5.5\n9"] {
            assert!(
                matches!(parse_sequence(bad), Err(SequenceError::Malformed(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn parse_rejects_inverted_range() {
        assert!(matches!(
            parse_sequence("9\n5"),
            Err(SequenceError::Inverted { start: 9, end: 5 })
        ));
    }

    #[test]
    fn write_rejects_inverted_range() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SEQUENCE_FILENAME);
        assert!(write_sequence(&path, 9, 5).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = read_sequence(&tmp.path().join(SEQUENCE_FILENAME));
        assert!(matches!(result, Err(SequenceError::Io(_))));
    }
}
