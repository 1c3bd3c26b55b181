use clap::{Parser, Subcommand, ValueEnum};
use moonloop::ephemeris::{AnalyticEphemeris, phase_angle};
use moonloop::fetch::{FetchOptions, HttpSource};
use moonloop::phases::PhaseSetConfig;
use moonloop::search::LoopSearch;
use moonloop::sequence::SEQUENCE_FILENAME;
use moonloop::timeline::YearTimeline;
use moonloop::verify::VerifyOptions;
use moonloop::{
    config, fetch, frames, output, phase_table, phases, reindex, search, sequence, verify,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "moonloop")]
#[command(about = "Build a seamless hourly moon-phase frame sequence")]
#[command(long_about = "\
Build a seamless hourly moon-phase frame sequence

One frame per hour of a year is fetched from a remote archive into a local
directory, then trimmed to the span between the first and last new moon so
the animation can loop.

Typical run:

  moonloop fetch                     # download moon.0001.jpg … moon.8760.jpg
  moonloop verify                    # missing frames, suspicious sizes
  moonloop new-moons --write-sequence
  moonloop reindex                   # copy the new-moon span to the loop dir

Frame n is the hour starting n-1 hours after 00:00 UT on January 1.

Run 'moonloop gen-config' to generate a documented moonloop.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Configuration file (optional; stock defaults apply when missing)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Override the frames directory from the config
    #[arg(long, global = true)]
    frames_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// One synodic month after January 1, ± 3 days, day-rounded
    Synodic,
    /// Every hour of the last thirty days of the year
    Month,
}

impl From<Preset> for LoopSearch {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Synodic => LoopSearch::synodic(),
            Preset::Month => LoopSearch::calendar_month(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Download hourly frames (skips frames already on disk, exits 1 if any fail)
    Fetch {
        /// First frame index
        #[arg(long)]
        start: Option<u32>,
        /// Last frame index (defaults to the last hour of the year)
        #[arg(long)]
        end: Option<u32>,
        /// Start after the highest frame already present
        #[arg(long)]
        resume: bool,
        /// Parallel download workers
        #[arg(long)]
        workers: Option<usize>,
        /// Pause after each download, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Find the first and last new moon of the year
    NewMoons {
        /// Write the bracket to <frames-dir>/sequence.txt
        #[arg(long)]
        write_sequence: bool,
        /// Print the bracket as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the hour offset where the phase matches January 1 again
    LoopPoint {
        /// Search preset (defaults to the [loop_search] config table)
        #[arg(long, value_enum)]
        preset: Option<Preset>,
        /// Print the loop point as JSON (null when none is found)
        #[arg(long)]
        json: bool,
    },
    /// Copy a frame range into a new 1-based sequence
    Reindex {
        /// First source frame
        #[arg(long, requires = "end", conflicts_with = "sequence")]
        start: Option<u32>,
        /// Last source frame
        #[arg(long, requires = "start")]
        end: Option<u32>,
        /// Read the range from a sequence file (default: <frames-dir>/sequence.txt)
        #[arg(long)]
        sequence: Option<PathBuf>,
        /// Destination directory (default: paths.loop_dir)
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Render procedural phase sprites
    Phases {
        /// Destination directory (default: paths.phases_dir)
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Check the frames directory for missing or damaged frames
    Verify {
        /// Number of frames expected (default: hours in the year)
        #[arg(long)]
        expected: Option<u32>,
        /// Also flag frames byte-identical to their predecessor
        #[arg(long)]
        duplicates: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Phase angle of every frame, as JSON
    Angles {
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a stock moonloop.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut cfg = config::load_config(&cli.config)?;
    if let Some(dir) = cli.frames_dir {
        cfg.paths.frames_dir = dir;
    }
    let timeline = YearTimeline::new(cfg.source.year)?;
    let ephemeris = AnalyticEphemeris::new();

    match cli.command {
        Command::Fetch {
            start,
            end,
            resume,
            workers,
            delay_ms,
        } => {
            let frames_dir = &cfg.paths.frames_dir;
            let start = if resume {
                frames::last_frame_index(frames_dir) + 1
            } else {
                start.unwrap_or(1)
            };
            let end = end.unwrap_or(timeline.hours());
            if let Some(w) = workers {
                cfg.fetch.workers = w;
            }
            if let Some(ms) = delay_ms {
                cfg.fetch.delay_ms = ms;
            }
            if start > end {
                println!("Nothing to fetch: frames up to {end} already present");
                return Ok(());
            }

            let source = HttpSource::new(&cfg.source.base_url, cfg.fetch.timeout())?;
            let options = FetchOptions {
                workers: config::effective_workers(&cfg.fetch),
                delay: cfg.fetch.delay(),
            };
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_fetch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary = fetch::fetch(&source, start..=end, frames_dir, &options, Some(tx))?;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            println!();
            output::print_fetch_summary(&summary);
            if !summary.is_complete() {
                std::process::exit(1);
            }
        }
        Command::NewMoons {
            write_sequence,
            json,
        } => {
            let bracket =
                search::find_new_moons(&ephemeris, &timeline, cfg.new_moon.tolerance_deg)?;
            let sequence_file = if write_sequence {
                let path = cfg.paths.frames_dir.join(SEQUENCE_FILENAME);
                sequence::write_sequence(&path, bracket.first_frame(), bracket.last_frame())?;
                Some(path)
            } else {
                None
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&bracket)?);
            } else {
                output::print_new_moons(&bracket, sequence_file.as_deref());
            }
        }
        Command::LoopPoint { preset, json } => {
            let search = match preset {
                Some(p) => LoopSearch::from(p),
                None => LoopSearch::from(&cfg.loop_search),
            };
            let reference_angle = phase_angle(&ephemeris, timeline.start_jd())?;
            let point = search::find_year_loop_point(&ephemeris, &timeline, &search)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&point)?);
            } else {
                output::print_loop_point(reference_angle, point.as_ref(), timeline.hours());
            }
        }
        Command::Reindex {
            start,
            end,
            sequence,
            dest,
        } => {
            let (start, end) = match (start, end) {
                (Some(start), Some(end)) => (start, end),
                _ => {
                    let path = sequence
                        .unwrap_or_else(|| cfg.paths.frames_dir.join(SEQUENCE_FILENAME));
                    sequence::read_sequence(&path)?
                }
            };
            let dest = dest.unwrap_or(cfg.paths.loop_dir);
            let summary = reindex::reindex(&cfg.paths.frames_dir, start, end, &dest)?;
            output::print_reindex_summary(&summary, start, end, &dest);
        }
        Command::Phases { dest } => {
            let dest = dest.unwrap_or(cfg.paths.phases_dir);
            let paths = phases::generate_all_phases(&dest, &PhaseSetConfig::from(&cfg.phases))?;
            output::print_phases(&paths);
        }
        Command::Verify {
            expected,
            duplicates,
            json,
        } => {
            let options = VerifyOptions {
                size_jump_bytes: cfg.verify.size_jump_bytes,
                detect_duplicates: duplicates,
            };
            let expected = expected.unwrap_or(timeline.hours());
            let report = verify::verify(&cfg.paths.frames_dir, expected, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_verify_report(&report);
            }
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Command::Angles { output: path } => {
            let table = phase_table::build(&ephemeris, &timeline)?;
            let json = table.to_json()?;
            match path {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!(
                        "Wrote {} phase angles to {}",
                        table.phase_angles.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
        // Printed before the config is loaded
        Command::GenConfig => {}
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `moonloop=info`, or `moonloop=debug`
/// with `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("moonloop=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moonloop=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
