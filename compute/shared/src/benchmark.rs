//! Benchmarking utilities
//!
//! Please consider using the macros provided by this crate instead of calling
//! these implementation details directly.

use crate::{init_logger, Simulate};
use clap::{Args, Command, FromArgMatches};
use criterion::{BenchmarkId, Criterion, Throughput};
use data::init::{Initializer, Pattern};
use std::hint::black_box;

/// Re-export criterion for the criterion_benchmark macro
pub use criterion;

/// Common criterion benchmark for all Game of Life computations
/// Use via the criterion_benchmark macro
pub fn criterion_benchmark<Simulation: Simulate>(c: &mut Criterion, backend_name: &str) {
    init_logger();

    let args = Simulation::CliArgs::from_arg_matches(
        &Simulation::CliArgs::augment_args(Command::default().no_binary_name(true))
            .get_matches_from(None::<&str>),
    )
    .expect("Failed to parse arguments from defaults & environment");

    let sim = Simulation::new(black_box(args)).unwrap();
    let mut initializer = Initializer::default();
    let mut group = c.benchmark_group(backend_name.to_owned());
    for num_steps_pow2 in [0, 4, 8] {
        let num_steps = 2u64.pow(num_steps_pow2);
        for size_pow2 in 5..=11 {
            let size = 2usize.pow(size_pow2);
            let shape = [size, 2 * size];
            let num_cells = (shape[0] * shape[1]) as u64;

            let board = initializer.make_board(shape, Pattern::Random);
            let mut generations = sim.make_generations(black_box(board.view())).unwrap();

            group.throughput(Throughput::Elements(num_cells * num_steps));
            group.bench_function(
                BenchmarkId::from_parameter(format!(
                    "{}x{}cells,{num_steps}steps",
                    shape[1], shape[0]
                )),
                |b| {
                    b.iter(|| {
                        sim.perform_steps(&mut generations, num_steps as usize)
                            .unwrap()
                    });
                },
            );
            black_box(generations.make_result_view().unwrap());
        }
    }
    group.finish();
}
