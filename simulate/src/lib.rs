//! Game of Life simulation binaries
//!
//! Every strategy binary runs the same sequence: parse the command line, build
//! the initial board, compute the requested number of generations, then write
//! the final board to `output-<strategy>.txt`. Only the compute backend
//! differs from one binary to another.

use clap::Parser;
use compute::{
    driver::{Driver, DriverResult},
    Simulate,
};
use data::{
    board::{Board, BoardView},
    init::Initializer,
    text::Writer,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{num::NonZeroUsize, time::Instant};
use ui::SharedArgs;

/// Simulate Conway's Game of Life on a toroidal board
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args<Simulation: Simulate> {
    /// CLI arguments shared by all strategies
    #[command(flatten)]
    shared: SharedArgs<Simulation>,

    /// Number of generations to compute between progress updates
    #[arg(short = 'e', long, default_value_t = NonZeroUsize::new(64).unwrap())]
    steps_per_report: NonZeroUsize,
}

/// Entry point of the strategy binaries
///
/// `strategy` is the short strategy name that goes into the output file name.
pub fn main<Simulation: Simulate>(strategy: &str) -> eyre::Result<()> {
    let total_start = Instant::now();

    // Enable logging to syslog
    ui::init_logging();

    // Parse CLI arguments
    let args = ui::parse_args::<Args<Simulation>>();
    let shape = args.shared.shape();
    let SharedArgs {
        seed,
        pattern,
        turns,
        output,
        backend,
        ..
    } = args.shared;
    let file_name = ui::output_path(strategy, output);
    info!("Running the {strategy} strategy with seed {seed}, output goes to {file_name:?}");

    // Set up the initial board and the simulation
    let initial = Initializer::seeded(seed).make_board(shape, pattern);
    let simulation = Simulation::new(backend)?;
    let mut driver = Driver::new(&simulation, turns);
    driver.initialize(initial.view())?;

    // Run the simulation
    let progress = ui::init_progress_reporting("Computing generation", turns);
    let model_start = Instant::now();
    driver.run(args.steps_per_report, |steps| progress.inc(steps as u64))?;
    let result = driver.make_result_view()?;
    let model_time = model_start.elapsed();
    drop(progress);
    ui::print_time("Model run time", model_time);

    // Write down the final board
    let mut writer = Writer::create(&file_name)?;
    writer.write(result.view())?;
    writer.close()?;
    ui::print_time("Total time", total_start.elapsed());
    Ok(())
}

/// Compute `turns` generations starting from `initial`
///
/// This is what the strategy binaries do, minus the I/O.
pub fn simulate<Simulation: Simulate>(
    simulation: &Simulation,
    initial: BoardView<'_>,
    turns: usize,
) -> DriverResult<Board, Simulation> {
    let mut driver = Driver::new(simulation, turns);
    driver.initialize(initial)?;
    driver.run(NonZeroUsize::MAX, |_| {})?;
    let result = driver.make_result_view()?.into_owned();
    Ok(result)
}
