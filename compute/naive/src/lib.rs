//! Naive implementation of the Game of Life
//!
//! This version walks the board one cell at a time, computing the toroidal
//! neighbor count of each cell with modular arithmetic. It is the reference
//! against which all other compute backends are checked.

use compute::{
    cpu::{CpuGrid, SimulateCpu},
    NoArgs, SimulateBase, SimulateCreate,
};
use data::{
    board::{Board, BoardView},
    cells::Generations,
    rule, topology,
};
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
    fn unchecked_step_impl(&self, grid: CpuGrid<'_, '_>) {
        let CpuGrid {
            input,
            output,
            first_row,
        } = grid;
        ndarray::azip!((index (row, col), out in output) {
            let y = first_row + row;
            let neighbors = topology::neighbor_count(&input, [col, y]);
            *out = rule::next_state(input[[y, col]], neighbors);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute::Simulate;
    use data::{
        board,
        init::{place_glider, Initializer, Pattern},
        text, ALIVE,
    };

    fn run(initial: &Board, steps: usize) -> Board {
        let sim = Simulation::new(NoArgs).unwrap();
        let mut generations = sim.make_generations(initial.view()).unwrap();
        sim.perform_steps(&mut generations, steps).unwrap();
        generations.make_result_view().unwrap().into_owned()
    }

    #[test]
    fn glider_on_small_torus() {
        let mut initial = board::dead([5, 5]);
        place_glider(initial.view_mut(), [1, 1]);
        assert_eq!(
            initial,
            text::parse_board("00000\n00010\n01010\n00110\n00000\n").unwrap()
        );
        assert_eq!(
            run(&initial, 4),
            text::parse_board("00000\n00000\n00001\n00101\n00011\n").unwrap()
        );
    }

    #[test]
    fn glider_period_on_torus() {
        // A glider moves by one cell diagonally every 4 generations, so it
        // comes back to its starting point after 4 * size generations
        let mut initial = board::dead([6, 6]);
        place_glider(initial.view_mut(), [2, 0]);
        assert_eq!(run(&initial, 24), initial);
        assert_ne!(run(&initial, 12), initial);
    }

    #[test]
    fn lone_cells_die() {
        let mut initial = board::dead([4, 7]);
        initial[[0, 0]] = ALIVE;
        initial[[2, 4]] = ALIVE;
        assert_eq!(run(&initial, 1), board::dead([4, 7]));
    }

    #[test]
    fn block_is_stable_across_corners() {
        // 2x2 block split across all four corners of the torus
        let mut initial = board::dead([5, 6]);
        for [row, col] in [[0, 0], [0, 5], [4, 0], [4, 5]] {
            initial[[row, col]] = ALIVE;
        }
        assert_eq!(run(&initial, 3), initial);
    }

    #[test]
    fn zero_steps_is_identity() {
        let initial = Initializer::default().make_board([9, 13], Pattern::Random);
        assert_eq!(run(&initial, 0), initial);
    }
}
