//! Common facilities shared by all compute backends

#[cfg(feature = "criterion")]
#[doc(hidden)]
pub mod benchmark;
pub mod cpu;
pub mod driver;
#[cfg(feature = "gpu")]
pub mod gpu;

use clap::Args;
use data::{
    board::BoardView,
    cells::{Cells, Generations},
};
#[cfg(any(test, feature = "criterion"))]
use std::sync::Once;
use std::{error::Error, fmt::Debug};

/// Commonalities between all ways to set up a simulation
pub trait SimulateBase: Sized {
    /// Supplementary CLI arguments allowing fine-tuning of this backend
    ///
    /// To honor the principle of least surprise and make criterion
    /// microbenchmarks work smoothly, any argument you add must have a default
    /// value and should also be configurable through environment variables.
    type CliArgs: Args + Debug;

    /// Cell storage type
    type Cells: Cells;

    /// Error type used by simulation operations
    type Error: Error + Send + Sync + 'static;

    /// Set up double-buffered cell storage, with `initial` as the current
    /// generation
    fn make_generations(
        &self,
        initial: BoardView<'_>,
    ) -> Result<Generations<Self::Cells>, Self::Error>;
}

/// Simulation compute backend interface expected by the binaries
pub trait SimulateCreate: SimulateBase {
    /// Set up the simulation
    fn new(args: Self::CliArgs) -> Result<Self, Self::Error>;
}

/// Simulation compute backend interface expected by the binaries
pub trait Simulate: SimulateBase + SimulateCreate {
    /// Perform `steps` simulation generations
    ///
    /// On exit, the current generation of `generations` contains the result
    /// of the last generation. Any intermediary state which does not feature
    /// a fully computed generation is never observable from the outside.
    fn perform_steps(
        &self,
        generations: &mut Generations<Self::Cells>,
        steps: usize,
    ) -> Result<(), Self::Error>;
}

/// Dummy command line arguments for backends that do not have any
#[derive(Args, Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct NoArgs;

/// Set up env_logger for tests and benchmarks
///
/// Every test module of this crate must go through this function, since
/// env_logger can only be initialized once per process.
#[cfg(any(test, feature = "criterion"))]
pub(crate) fn init_logger() {
    static INIT_LOGGER: Once = Once::new();
    INIT_LOGGER.call_once(env_logger::init);
}

/// Macro that generates a complete criterion benchmark harness for you
#[macro_export]
#[cfg(feature = "criterion")]
macro_rules! criterion_benchmark {
    ($backend:ident) => {
        fn criterion_benchmark(c: &mut $crate::benchmark::criterion::Criterion) {
            $crate::benchmark::criterion_benchmark::<$backend::Simulation>(
                c,
                stringify!($backend),
            )
        }
        $crate::benchmark::criterion::criterion_group!(benches, criterion_benchmark);
        $crate::benchmark::criterion::criterion_main!(benches);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_setup_is_reentrant() {
        init_logger();
        init_logger();
        std::thread::spawn(init_logger)
            .join()
            .expect("Logger setup from another thread failed");
        log::info!("Logger is up");
    }
}
