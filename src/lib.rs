//! # Moonloop
//!
//! Tooling for an hourly moon-phase animation: one pre-rendered frame per hour
//! of a year, fetched from a remote archive, trimmed to a clean new-moon to
//! new-moon sequence and checked for damaged downloads.
//!
//! # Pipeline
//!
//! ```text
//! 1. fetch       remote archive  →  frames/moon.NNNN.jpg   (idempotent, parallel)
//! 2. verify      frames/         →  report                 (missing, size jumps)
//! 3. new-moons   ephemeris       →  frames/sequence.txt    (first/last new moon)
//! 4. reindex     frames/ + range →  loop/moon.0001.jpg…    (contiguous 1-based copy)
//! ```
//!
//! `loop-point`, `angles` and `phases` are independent: they answer where an
//! hourly sequence can wrap seamlessly, dump the phase angle of every frame,
//! and render stand-in phase sprites.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `moonloop.toml` loading, merging over stock defaults, validation |
//! | [`frames`] | `moon.NNNN.jpg` naming, remote URLs, directory scans |
//! | [`timeline`] | Frame index ↔ hour ↔ timestamp for one calendar year |
//! | [`ephemeris`] | Sun/Moon longitudes behind a trait, phase angle and angle math |
//! | [`search`] | New-moon bracketing and loop-point search |
//! | [`fetch`] | Parallel, resumable frame download |
//! | [`reindex`] | Copy a frame range into a fresh 1-based sequence |
//! | [`sequence`] | `sequence.txt` sidecar read/write |
//! | [`verify`] | Read-only integrity report for a frame directory |
//! | [`phases`] | Procedural phase sprite generation |
//! | [`phase_table`] | Per-frame phase angles as JSON |
//! | [`output`] | CLI output formatting |
//!
//! # Frame Numbering
//!
//! Frame `n` (1-based) is the hour starting `n - 1` hours after 00:00 UT on
//! January 1. Every module uses this convention; [`timeline::YearTimeline`]
//! is the single place that converts between frames and timestamps.

pub mod config;
pub mod ephemeris;
pub mod fetch;
pub mod frames;
pub mod output;
pub mod phase_table;
pub mod phases;
pub mod reindex;
pub mod search;
pub mod sequence;
pub mod timeline;
pub mod verify;
