//! Parallel implementation of the Game of Life
//!
//! This crates implements a parallel version of the Game of Life based on
//! domain decomposition and fork-join parallelism. The rows of the next
//! generation are recursively split into bands, each of which is computed by
//! a sequential backend that reads from the full current generation.

mod args;

pub use args::ParallelArgs;
use compute::{
    cpu::{CpuGrid, SimulateCpu},
    SimulateBase, SimulateCreate,
};
use data::{board::BoardView, cells::Generations, Cell};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use rayon::{prelude::*, ThreadPoolBuildError, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use thiserror::Error;

/// Game of Life simulation
pub type Simulation = ParallelSimulation<compute_naive::Simulation>;

/// Default amount of output cells per sequential task, in bytes
const DEFAULT_SEQ_BAND_BYTES: usize = 16 * 1024;

/// Game of Life simulation wrapper that enforces parallel iteration
#[derive(Debug)]
pub struct ParallelSimulation<Backend: SimulateCpu + Sync> {
    /// Number of output rows below which parallelism is not considered
    /// worthwhile, if set by the user
    seq_rows: Option<NonZeroUsize>,

    /// Underlying sequential compute backend
    backend: Backend,
}
//
impl<Backend: SimulateCpu + Sync> ParallelSimulation<Backend> {
    /// Number of output rows below which a band is processed sequentially
    fn sequential_rows(&self, width: usize) -> usize {
        self.seq_rows.map(usize::from).unwrap_or_else(|| {
            let row_bytes = width.max(1) * std::mem::size_of::<Cell>();
            (DEFAULT_SEQ_BAND_BYTES / row_bytes).max(1)
        })
    }
}
//
impl<Backend: SimulateCpu + Sync> SimulateBase for ParallelSimulation<Backend> {
    type CliArgs = ParallelArgs<Backend::CliArgs>;

    type Cells = Backend::Cells;

    type Error = Error<Backend::Error>;

    fn make_generations(
        &self,
        initial: BoardView<'_>,
    ) -> Result<Generations<Self::Cells>, Self::Error> {
        self.backend
            .make_generations(initial)
            .map_err(Error::Backend)
    }
}
//
impl<Backend: SimulateCpu + Sync> SimulateCreate for ParallelSimulation<Backend> {
    fn new(args: Self::CliArgs) -> Result<Self, Self::Error> {
        if let Some(num_threads) = args.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads.into())
                .build_global()
                .map_err(Error::ThreadPool)?;
        }
        info!(
            "Running on {} threads, {}",
            rayon::current_num_threads(),
            match args.seq_rows {
                Some(rows) => format!("with {rows} rows per sequential task"),
                None => "with automatic sequential task size".to_owned(),
            }
        );
        Ok(Self {
            seq_rows: args.seq_rows,
            backend: Backend::new(args.backend).map_err(Error::Backend)?,
        })
    }
}
//
impl<Backend: SimulateCpu + Sync> SimulateCpu for ParallelSimulation<Backend> {
    fn unchecked_step_impl(&self, grid: CpuGrid<'_, '_>) {
        let sequential_rows = self.sequential_rows(grid.input.ncols());
        rayon::iter::split(grid, |subgrid| {
            if Self::grid_rows(&subgrid) <= sequential_rows {
                (subgrid, None)
            } else {
                let [half1, half2] = Self::split_grid(subgrid);
                (half1, Some(half2))
            }
        })
        .for_each(|subgrid| {
            self.backend.step_impl(subgrid);
        });
    }
}

/// Things that can go wrong when performing parallel simulation
#[derive(Debug, Error)]
pub enum Error<BackendError: std::error::Error> {
    /// Error from the underlying compute backend
    #[error(transparent)]
    Backend(BackendError),

    /// Failed to configure thread pool
    #[error("failed to configure thread pool")]
    ThreadPool(#[source] ThreadPoolBuildError),
}
