//! Game of Life simulation, scalar strategy

fn main() -> eyre::Result<()> {
    simulate::main::<compute_naive::Simulation>("serial")
}
