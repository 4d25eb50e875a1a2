//! Game of Life simulation, multi-threaded strategy

fn main() -> eyre::Result<()> {
    simulate::main::<compute_parallel::Simulation>("parallel")
}
