//! This crate collects elements that are shared between the Game of Life
//! binaries, one per compute strategy.

#[cfg(feature = "simulation")]
use clap::{error::ErrorKind, Args, Parser};
#[cfg(feature = "simulation")]
use compute::SimulateBase;
#[cfg(feature = "simulation")]
use data::init::{Pattern, DEFAULT_SEED};
#[cfg(feature = "tui")]
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
#[cfg(feature = "tui")]
use log::LevelFilter;
#[cfg(feature = "simulation")]
use std::num::NonZeroUsize;
use std::path::PathBuf;
#[cfg(feature = "tui")]
use std::{borrow::Cow, time::Duration};
#[cfg(feature = "tui")]
use syslog::Facility;

/// CLI arguments shared by all simulation binaries
#[cfg(feature = "simulation")]
#[derive(Args, Debug)]
pub struct SharedArgs<Simulation: SimulateBase> {
    /// Number of rows of the board
    pub height: NonZeroUsize,

    /// Number of columns of the board
    pub width: NonZeroUsize,

    /// Number of generations to simulate
    pub turns: usize,

    /// Seed of the random board initialization
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Initial board contents
    #[arg(short, long, value_enum, default_value_t)]
    pub pattern: Pattern,

    /// Path to the results output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Backend-specific CLI arguments
    #[command(flatten)]
    pub backend: Simulation::CliArgs,
}
//
#[cfg(feature = "simulation")]
impl<Simulation: SimulateBase> SharedArgs<Simulation> {
    /// Board shape, in ndarray's [rows, columns] convention
    pub fn shape(&self) -> [usize; 2] {
        [self.height.into(), self.width.into()]
    }
}

/// Parse CLI arguments
///
/// Missing or extraneous positional arguments print a short usage message to
/// stdout and exit with status 1. Other errors (e.g. numbers that fail to
/// parse) are reported by clap, which exits with a nonzero status.
#[cfg(feature = "simulation")]
pub fn parse_args<Cli: Parser>() -> Cli {
    match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument => {
                println!("{}", Cli::command().render_usage());
                std::process::exit(1)
            }
            _ => e.exit(),
        },
    }
}

/// Name of the output file, unless overriden via CLI
pub fn output_path(strategy: &str, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| format!("output-{strategy}.txt").into())
}

/// Print a timing measurement to stdout, in microseconds
pub fn print_time(what: &str, duration: std::time::Duration) {
    println!("{what}: {} us", duration.as_micros());
}

/// Set up logging to syslog, falling back to stderr if that's not available
#[cfg(feature = "tui")]
pub fn init_logging() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = syslog::init(Facility::default(), level, None) {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Warn)
            .parse_default_env()
            .init();
        log::warn!("Failed to initialize syslog ({e}), logging to stderr instead");
    }
}

/// Set up a progress bar over simulated generations
#[cfg(feature = "tui")]
pub fn init_progress_reporting(
    message: impl Into<Cow<'static, str>>,
    num_generations: usize,
) -> ProgressBar {
    let progress = ProgressBar::new(num_generations as u64)
        .with_message(message)
        .with_style(
            ProgressStyle::with_template("{msg} {pos}/{len} {wide_bar} {elapsed}/~{duration}")
                .expect("Failed to parse style"),
        )
        .with_finish(ProgressFinish::AndClear);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
