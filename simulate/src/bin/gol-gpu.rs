//! Game of Life simulation, GPU strategy

fn main() -> eyre::Result<()> {
    simulate::main::<compute_gpu_naive::Simulation>("gpu")
}
