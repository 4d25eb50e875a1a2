//! Auto-vectorized implementation of the Game of Life
//!
//! While compilers can automatically vectorize computations, said computations
//! must in all but simplest cases be shaped exactly like manually vectorized
//! code based on hardware intrinsics would be. This compute backend follows
//! this strategy, which should allow it to perform decently on hardware other
//! than the hardware it was written for (x86_64), with minimal porting effort
//! revolving around picking the right vector width.
//!
//! Each row is processed in runs of `WIDTH` adjacent cells. For every run, the
//! neighbors of all cells are obtained by loading the same run shifted by one
//! cell to the left and to the right, in the row above, the row itself and the
//! row below. This only works away from the left and right edges of the
//! board, where horizontal neighbors wrap around to the other end of the row,
//! so edge cells are computed one at a time instead.

use cfg_if::cfg_if;
use compute::{
    cpu::{CpuGrid, SimulateCpu},
    NoArgs, SimulateBase, SimulateCreate,
};
use data::{
    board::{Board, BoardView},
    cells::Generations,
    rule, topology, Cell, ALIVE, DEAD,
};
use slipstream::{vector::align, Vector};
use std::convert::Infallible;

/// Game of Life simulation
#[derive(Debug)]
pub struct Simulation;
//
impl SimulateBase for Simulation {
    type CliArgs = NoArgs;

    type Cells = Board;

    type Error = Infallible;

    fn make_generations(&self, initial: BoardView<'_>) -> Result<Generations<Board>, Infallible> {
        Generations::new((), initial)
    }
}
//
impl SimulateCreate for Simulation {
    fn new(_args: NoArgs) -> Result<Self, Infallible> {
        Ok(Self)
    }
}
//
impl SimulateCpu for Simulation {
    #[inline]
    fn unchecked_step_impl(&self, grid: CpuGrid<'_, '_>) {
        let CpuGrid {
            input,
            mut output,
            first_row,
        } = grid;
        let [height, width] = [input.nrows(), input.ncols()];

        // Prepare vector versions of the rule's constants
        let dead = Values::splat(DEAD);
        let alive = Values::splat(ALIVE);
        let two = Values::splat(2);
        let three = Values::splat(3);

        for (offset, mut out_row) in output.rows_mut().into_iter().enumerate() {
            let y = first_row + offset;
            let rows = topology::neighborhood(y, height).map(|row| {
                input
                    .row(row)
                    .to_slice()
                    .expect("Board rows should be contiguous")
            });
            let out = out_row
                .as_slice_mut()
                .expect("Board rows should be contiguous");

            // Cells from 1 to `simd_end` have all their horizontal neighbors
            // within the row, without wraparound
            let simd_end = 1 + width.saturating_sub(2) / WIDTH * WIDTH;
            for start in (1..simd_end).step_by(WIDTH) {
                // Sum up the 8 neighbors of each lane
                let mut neighbors = dead;
                for (row_idx, row) in rows.iter().enumerate() {
                    neighbors += load(&row[start - 1..]) + load(&row[start + 1..]);
                    if row_idx != 1 {
                        neighbors += load(&row[start..]);
                    }
                }

                // Apply the rule: keep state on 2 neighbors, live on 3, else die
                let state = load(&rows[1][start..]);
                let next = dead
                    .blend(state, neighbors.eq(two))
                    .blend(alive, neighbors.eq(three));
                next.store(&mut out[start..start + WIDTH]);
            }

            // Handle the wrapping edges and the leftover cells
            for x in (0..1.min(width)).chain(simd_end.max(1)..width) {
                let neighbors = topology::neighbor_count(&input, [x, y]);
                out[x] = rule::next_state(rows[1][x], neighbors);
            }
        }
    }
}

/// Load a vector from the first `WIDTH` cells of a slice
#[inline]
fn load(cells: &[Cell]) -> Values {
    let lanes: [Cell; WIDTH] = cells[..WIDTH]
        .try_into()
        .expect("Cannot fail, the slice has the right length");
    Values::from(lanes)
}

// Pick vector size based on hardware support for vectorization of byte
// operations (which are the whole of our SIMD workload)
cfg_if! {
    if #[cfg(target_feature = "avx512bw")] {
        pub const WIDTH: usize = 64;
        pub type Values = Vector<align::Align64, Cell, WIDTH>;
    } else if #[cfg(target_feature = "avx2")] {
        pub const WIDTH: usize = 32;
        pub type Values = Vector<align::Align32, Cell, WIDTH>;
    } else {
        // NOTE: While most non-Intel CPUs use 128-bit vectorization, not all do.
        //       A benefit of autovectorization, however, is that supporting new
        //       hardware can just be a matter of adding cases in this cfg_if.
        pub const WIDTH: usize = 16;
        pub type Values = Vector<align::Align16, Cell, WIDTH>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute::Simulate;
    use data::init::{Initializer, Pattern};

    fn run<Sim: Simulate<Cells = Board>>(initial: &Board, steps: usize) -> Board
    where
        Sim::CliArgs: Default,
    {
        let sim = Sim::new(Default::default()).unwrap();
        let mut generations = sim.make_generations(initial.view()).unwrap();
        sim.perform_steps(&mut generations, steps).unwrap();
        generations.make_result_view().unwrap().into_owned()
    }

    #[test]
    fn matches_naive() {
        let mut initializer = Initializer::seeded(0xc0ffee);
        // Widths below, at and around multiples of the vector width
        let small = [1, 2, 3, 5];
        let around_simd = [WIDTH, WIDTH + 1, WIDTH + 2, WIDTH + 3, 2 * WIDTH + 7];
        for width in small.into_iter().chain(around_simd) {
            for height in [1, 3, 4] {
                let initial = initializer.make_board([height, width], Pattern::Random);
                for steps in [0, 1, 5] {
                    assert_eq!(
                        run::<Simulation>(&initial, steps),
                        run::<compute_naive::Simulation>(&initial, steps),
                        "{height}x{width} board, {steps} steps"
                    );
                }
            }
        }
    }

    #[test]
    fn wrapping_glider_matches_naive() {
        let mut initial = data::board::dead([7, WIDTH + 5]);
        data::init::place_glider(initial.view_mut(), [WIDTH + 3, 5]);
        assert_eq!(
            run::<Simulation>(&initial, 40),
            run::<compute_naive::Simulation>(&initial, 40)
        );
    }

    #[test]
    fn crowded_cells_die() {
        // Every cell has 8 live neighbors, which must all be summed up
        let initial = Board::from_elem([3, 2 * WIDTH + 2], ALIVE);
        let result = run::<Simulation>(&initial, 1);
        assert!(result.iter().all(|&cell| cell == DEAD));
    }
}
