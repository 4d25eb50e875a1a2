//! Game of Life simulation, SIMD strategy

fn main() -> eyre::Result<()> {
    simulate::main::<compute_autovec::Simulation>("simd")
}
