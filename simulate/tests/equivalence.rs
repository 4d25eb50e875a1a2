//! Checks that all compute strategies agree with each other

use compute::{Simulate, SimulateCreate};
use data::{
    board::{self, Board},
    init::{Initializer, Pattern},
    text,
};
use simulate::simulate;
use std::sync::Once;

fn init_logger() {
    static INIT_LOGGER: Once = Once::new();
    INIT_LOGGER.call_once(env_logger::init);
}

fn run<Simulation: Simulate>(initial: &Board, turns: usize) -> Board
where
    Simulation::CliArgs: Default,
{
    let simulation = Simulation::new(Default::default()).unwrap();
    simulate(&simulation, initial.view(), turns).unwrap()
}

/// Results of every CPU strategy, along with the strategy name
fn run_cpu_strategies(initial: &Board, turns: usize) -> [(&'static str, Board); 3] {
    [
        ("serial", run::<compute_naive::Simulation>(initial, turns)),
        ("simd", run::<compute_autovec::Simulation>(initial, turns)),
        ("parallel", run_parallel(initial, turns)),
    ]
}

fn run_parallel(initial: &Board, turns: usize) -> Board {
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        args: compute_parallel::ParallelArgs<compute::NoArgs>,
    }

    let cli = Cli::try_parse_from(["test", "--seq-rows", "3"]).unwrap();
    let simulation = compute_parallel::Simulation::new(cli.args).unwrap();
    simulate(&simulation, initial.view(), turns).unwrap()
}

#[test]
fn strategies_agree() {
    init_logger();
    let mut initializer = Initializer::seeded(2024);
    for shape in [[3, 3], [3, 40], [40, 3], [31, 67], [100, 130]] {
        let initial = initializer.make_board(shape, Pattern::Random);
        for turns in [0, 1, 2, 25] {
            let [(_, reference), others @ ..] = run_cpu_strategies(&initial, turns);
            for (name, result) in others {
                assert_eq!(result, reference, "{name} on {shape:?} after {turns} turns");
            }
        }
    }
}

#[test]
fn glider_fixture() {
    init_logger();
    let initial = text::parse_board("00000\n00010\n01010\n00110\n00000\n").unwrap();
    let expected = "00000\n00000\n00001\n00101\n00011\n";
    for (name, result) in run_cpu_strategies(&initial, 4) {
        let mut output = Vec::new();
        text::write_board(&mut output, result.view()).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), expected, "{name}");
    }
}

#[test]
fn zero_turns_is_identity() {
    init_logger();
    let initial = Initializer::seeded(7).make_board([9, 21], Pattern::Random);
    for (name, result) in run_cpu_strategies(&initial, 0) {
        assert_eq!(result, initial, "{name}");
    }
}

#[test]
fn runs_are_deterministic() {
    init_logger();
    let make_initial = || Initializer::seeded(99).make_board([20, 50], Pattern::Random);
    let first = run_cpu_strategies(&make_initial(), 13);
    let second = run_cpu_strategies(&make_initial(), 13);
    assert_eq!(first, second);
}

#[test]
fn shape_is_conserved() {
    init_logger();
    let initial = Initializer::seeded(3).make_board([7, 11], Pattern::Random);
    for (name, result) in run_cpu_strategies(&initial, 5) {
        assert_eq!(board::shape(&result.view()), [7, 11], "{name}");
        let mut output = Vec::new();
        text::write_board(&mut output, result.view()).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 7, "{name}");
        assert!(output.lines().all(|line| line.len() == 11), "{name}");
        assert!(output.ends_with('\n'), "{name}");
    }
}

#[cfg(feature = "gpu")]
#[test]
fn gpu_agrees_with_serial() {
    use compute::gpu::{ContextBuildError, SimulateGpu, VulkanConfig};
    use compute_gpu_naive::Error;

    init_logger();
    let config = VulkanConfig {
        enumerate_portability: true,
        ..VulkanConfig::default()
    };
    let gpu = match compute_gpu_naive::Simulation::with_config(Default::default(), config) {
        Ok(gpu) => gpu,
        Err(Error::Init(ContextBuildError::Loading(_) | ContextBuildError::NoMatchingDevice)) => {
            log::warn!("No Vulkan device available, skipping test");
            return;
        }
        Err(other) => panic!("Failed to set up GPU simulation: {other}"),
    };
    let initial = Initializer::seeded(11).make_board([33, 65], Pattern::Random);
    for turns in [0, 1, 30] {
        assert_eq!(
            simulate(&gpu, initial.view(), turns).unwrap(),
            run::<compute_naive::Simulation>(&initial, turns),
            "{turns} turns"
        );
    }
}
