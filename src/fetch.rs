//! Batch download of hourly frames.
//!
//! Frames are pulled from a [`FrameSource`] into a local directory using a
//! bounded worker pool. The fetcher is idempotent: a frame already on disk
//! with a non-zero size is skipped, so an interrupted run is resumed simply
//! by running it again.
//!
//! ## Write protocol
//!
//! ```text
//! moon.0042.jpg.part   ← body written here first
//! moon.0042.jpg        ← renamed into place once complete
//! ```
//!
//! A crash mid-write can only leave a `.part` file behind, never a truncated
//! frame that a later run would mistake for a finished download.
//!
//! ## Failure policy
//!
//! Per-frame failures (network errors, non-success statuses, empty bodies,
//! local write errors) are logged, reported as [`FetchEvent::Failed`] and
//! collected into [`FetchSummary::failed`]. They never abort the batch and are
//! never retried within a run.

use crate::frames::{frame_path, frame_url};
use rayon::prelude::*;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Empty response body for frame {0}")]
    EmptyBody(u32),
    #[error("Frame indices start at 1, got range {start}..={end}")]
    InvalidRange { start: u32, end: u32 },
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Anything that can produce the bytes of frame `index`.
///
/// Shared across worker threads without locking, hence `Sync`.
pub trait FrameSource: Sync {
    fn fetch_frame(&self, index: u32) -> Result<Vec<u8>, FetchError>;
}

/// Remote frame source over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("moonloop/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl FrameSource for HttpSource {
    fn fetch_frame(&self, index: u32) -> Result<Vec<u8>, FetchError> {
        let url = frame_url(&self.base_url, index);
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub workers: usize,
    /// Pause after every successful download.
    pub delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            delay: Duration::from_millis(500),
        }
    }
}

/// Progress events emitted while fetching, in completion order.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Downloaded { index: u32, bytes: usize },
    Skipped { index: u32 },
    Failed { index: u32, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedFrame {
    pub index: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub skipped: usize,
    /// Sorted by frame index.
    pub failed: Vec<FailedFrame>,
}

impl FetchSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Outcome {
    Downloaded(usize),
    Skipped,
}

/// Fetch every frame in `range` into `dest_dir`.
///
/// An empty range (`start > end`) is a no-op. Only failing to create
/// `dest_dir` or to build the worker pool is an error; everything else is
/// reported per frame.
pub fn fetch(
    source: &impl FrameSource,
    range: RangeInclusive<u32>,
    dest_dir: &Path,
    options: &FetchOptions,
    events: Option<Sender<FetchEvent>>,
) -> Result<FetchSummary, FetchError> {
    let (start, end) = (*range.start(), *range.end());
    if start == 0 {
        return Err(FetchError::InvalidRange { start, end });
    }
    if range.is_empty() {
        return Ok(FetchSummary::default());
    }

    std::fs::create_dir_all(dest_dir)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()?;
    tracing::info!(
        start,
        end,
        workers = options.workers.max(1),
        dest = %dest_dir.display(),
        "fetching frames"
    );

    let results: Vec<(u32, Result<Outcome, FetchError>)> = pool.install(|| {
        range
            .into_par_iter()
            .map_with(events, |tx, index| {
                let result = fetch_one(source, index, dest_dir, options.delay);
                if let Some(tx) = tx {
                    tx.send(event_for(index, &result)).ok();
                }
                (index, result)
            })
            .collect()
    });

    let mut summary = FetchSummary::default();
    for (index, result) in results {
        match result {
            Ok(Outcome::Downloaded(_)) => summary.downloaded += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Err(e) => summary.failed.push(FailedFrame {
                index,
                reason: e.to_string(),
            }),
        }
    }
    summary.failed.sort_by_key(|f| f.index);

    tracing::info!(
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        "fetch finished"
    );
    Ok(summary)
}

fn event_for(index: u32, result: &Result<Outcome, FetchError>) -> FetchEvent {
    match result {
        Ok(Outcome::Downloaded(bytes)) => FetchEvent::Downloaded {
            index,
            bytes: *bytes,
        },
        Ok(Outcome::Skipped) => FetchEvent::Skipped { index },
        Err(e) => FetchEvent::Failed {
            index,
            reason: e.to_string(),
        },
    }
}

fn fetch_one(
    source: &impl FrameSource,
    index: u32,
    dest_dir: &Path,
    delay: Duration,
) -> Result<Outcome, FetchError> {
    let path = frame_path(dest_dir, index);
    if std::fs::metadata(&path).is_ok_and(|m| m.len() > 0) {
        tracing::debug!(index, "frame already present");
        return Ok(Outcome::Skipped);
    }

    let bytes = source.fetch_frame(index).inspect_err(|e| {
        tracing::warn!(index, error = %e, "frame download failed");
    })?;
    if bytes.is_empty() {
        tracing::warn!(index, "empty response body");
        return Err(FetchError::EmptyBody(index));
    }

    let part = path.with_extension("jpg.part");
    if let Err(e) = std::fs::write(&part, &bytes).and_then(|()| std::fs::rename(&part, &path)) {
        tracing::warn!(index, error = %e, "failed to store frame");
        std::fs::remove_file(&part).ok();
        return Err(e.into());
    }

    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
    Ok(Outcome::Downloaded(bytes.len()))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::frames::frame_file_name;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory source. Records every request; bodies are `"frame {index}"`.
    ///
    /// Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockSource {
        pub requests: Mutex<Vec<u32>>,
        failing: HashSet<u32>,
        empty: HashSet<u32>,
    }

    impl MockSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(indices: &[u32]) -> Self {
            Self {
                failing: indices.iter().copied().collect(),
                ..Self::default()
            }
        }

        pub fn with_empty(indices: &[u32]) -> Self {
            Self {
                empty: indices.iter().copied().collect(),
                ..Self::default()
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn body(index: u32) -> Vec<u8> {
            format!("frame {index}").into_bytes()
        }
    }

    impl FrameSource for MockSource {
        fn fetch_frame(&self, index: u32) -> Result<Vec<u8>, FetchError> {
            self.requests.lock().unwrap().push(index);
            if self.failing.contains(&index) {
                return Err(FetchError::Status {
                    status: 404,
                    url: frame_file_name(index),
                });
            }
            if self.empty.contains(&index) {
                return Ok(Vec::new());
            }
            Ok(Self::body(index))
        }
    }

    fn quick() -> FetchOptions {
        FetchOptions {
            workers: 4,
            delay: Duration::ZERO,
        }
    }

    // =========================================================================
    // fetch
    // =========================================================================

    #[test]
    fn downloads_every_frame_in_range() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::new();

        let summary = fetch(&source, 1..=10, tmp.path(), &quick(), None).unwrap();

        assert_eq!(summary.downloaded, 10);
        assert_eq!(summary.skipped, 0);
        assert!(summary.is_complete());
        for index in 1..=10 {
            let bytes = std::fs::read(frame_path(tmp.path(), index)).unwrap();
            assert_eq!(bytes, MockSource::body(index));
        }
    }

    #[test]
    fn second_run_performs_no_requests() {
        let tmp = TempDir::new().unwrap();
        fetch(&MockSource::new(), 1..=8, tmp.path(), &quick(), None).unwrap();

        let source = MockSource::new();
        let summary = fetch(&source, 1..=8, tmp.path(), &quick(), None).unwrap();

        assert_eq!(source.request_count(), 0);
        assert_eq!(summary.skipped, 8);
        assert_eq!(summary.downloaded, 0);
    }

    #[test]
    fn zero_byte_file_is_fetched_again() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(frame_path(tmp.path(), 3), b"").unwrap();
        std::fs::write(frame_path(tmp.path(), 4), b"kept").unwrap();

        let source = MockSource::new();
        let summary = fetch(&source, 3..=4, tmp.path(), &quick(), None).unwrap();

        assert_eq!(*source.requests.lock().unwrap(), vec![3]);
        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(std::fs::read(frame_path(tmp.path(), 4)).unwrap(), b"kept");
    }

    #[test]
    fn failures_are_recorded_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::failing(&[2, 5]);

        let summary = fetch(&source, 1..=6, tmp.path(), &quick(), None).unwrap();

        assert_eq!(summary.downloaded, 4);
        let failed: Vec<u32> = summary.failed.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![2, 5]);
        assert!(!summary.is_complete());
        assert!(summary.failed[0].reason.contains("404"));
        assert!(!frame_path(tmp.path(), 2).exists());
        assert!(frame_path(tmp.path(), 6).exists());
    }

    #[test]
    fn empty_body_is_a_failure_and_not_persisted() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::with_empty(&[7]);

        let summary = fetch(&source, 7..=7, tmp.path(), &quick(), None).unwrap();

        assert_eq!(summary.failed.len(), 1);
        assert!(!frame_path(tmp.path(), 7).exists());
        assert!(!tmp.path().join("moon.0007.jpg.part").exists());
    }

    #[test]
    fn no_part_files_left_after_success() {
        let tmp = TempDir::new().unwrap();
        fetch(&MockSource::new(), 1..=5, tmp.path(), &quick(), None).unwrap();

        let leftovers = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn creates_destination_directory() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("nested/frames");

        fetch(&MockSource::new(), 1..=2, &dest, &quick(), None).unwrap();

        assert!(frame_path(&dest, 2).exists());
    }

    #[test]
    fn empty_range_is_noop() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::new();
        #[allow(clippy::reversed_empty_ranges)]
        let summary = fetch(&source, 9..=8, tmp.path(), &quick(), None).unwrap();
        assert_eq!(summary, FetchSummary::default());
        assert_eq!(source.request_count(), 0);
    }

    #[test]
    fn index_zero_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let result = fetch(&MockSource::new(), 0..=3, tmp.path(), &quick(), None);
        assert!(matches!(
            result,
            Err(FetchError::InvalidRange { start: 0, end: 3 })
        ));
    }

    #[test]
    fn single_worker_still_completes() {
        let tmp = TempDir::new().unwrap();
        let options = FetchOptions {
            workers: 0,
            delay: Duration::ZERO,
        };
        let summary = fetch(&MockSource::new(), 1..=3, tmp.path(), &options, None).unwrap();
        assert_eq!(summary.downloaded, 3);
    }

    #[test]
    fn emits_one_event_per_frame() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(frame_path(tmp.path(), 1), b"x").unwrap();
        let source = MockSource::failing(&[3]);
        let (tx, rx) = std::sync::mpsc::channel();

        let summary = fetch(&source, 1..=4, tmp.path(), &quick(), Some(tx)).unwrap();
        let mut events: Vec<FetchEvent> = rx.iter().collect();
        events.sort_by_key(|e| match e {
            FetchEvent::Downloaded { index, .. }
            | FetchEvent::Skipped { index }
            | FetchEvent::Failed { index, .. } => *index,
        });

        assert_eq!(summary.downloaded + summary.skipped + summary.failed.len(), 4);
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], FetchEvent::Skipped { index: 1 });
        assert_eq!(
            events[1],
            FetchEvent::Downloaded {
                index: 2,
                bytes: MockSource::body(2).len()
            }
        );
        assert!(matches!(events[2], FetchEvent::Failed { index: 3, .. }));
    }

    #[test]
    fn http_source_builds_frame_urls() {
        let source = HttpSource::new("https://example.invalid/frames/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.base_url(), "https://example.invalid/frames/");
        assert_eq!(
            frame_url(source.base_url(), 12),
            "https://example.invalid/frames/moon.0012.jpg"
        );
    }
}
