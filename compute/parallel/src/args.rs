//! CLI arguments

use clap::Args;
use std::num::NonZeroUsize;

/// CLI parameters for the multithreaded implementation
#[derive(Args, Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct ParallelArgs<BackendArgs: Args> {
    /// Number of processing threads
    ///
    /// Defaults to one thread per logical CPU core.
    #[arg(short = 'j', long, env)]
    pub(crate) num_threads: Option<NonZeroUsize>,

    /// Number of output rows below which a band of the board is processed
    /// sequentially instead of being split further
    ///
    /// There is a granularity compromise between exposing opportunities for
    /// parallelism and keeping individual sequential tasks efficient. By
    /// default, bands are sized so that one band of output cells fits in a
    /// typical L1 data cache.
    #[arg(long, env)]
    pub(crate) seq_rows: Option<NonZeroUsize>,

    /// Expose backend arguments too
    #[command(flatten)]
    pub(crate) backend: BackendArgs,
}
