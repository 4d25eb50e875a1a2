//! Facilities that are specific to CPU implementations

use crate::{Simulate, SimulateBase, SimulateCreate};
use data::{
    board::{Board, BoardView, BoardViewMut},
    cells::Generations,
};
use ndarray::Axis;

/// Simplified version of Simulate that simulates a single generation at a time
///
/// If you implement this, then a [`Simulate`] implementation that loops while
/// flipping the cell buffers will be automatically provided.
///
/// This is good enough for single- and multi-core CPU computations, but GPU
/// computations benefit from the batching of simulation steps that is enabled
/// by direct implementation of the `Simulate` trait.
pub trait SimulateStep: SimulateBase + SimulateCreate {
    /// Compute a single generation
    ///
    /// At the end of the simulation, the output cells of `generations` will
    /// contain the next generation. It is the job of the caller to flip the
    /// buffers if they want the result to be their input.
    fn perform_step(&self, generations: &mut Generations<Self::Cells>) -> Result<(), Self::Error>;
}
//
impl<T: SimulateStep> Simulate for T {
    fn perform_steps(
        &self,
        generations: &mut Generations<Self::Cells>,
        steps: usize,
    ) -> Result<(), Self::Error> {
        for _ in 0..steps {
            self.perform_step(generations)?;
            generations.flip();
        }
        Ok(())
    }
}

/// Lower-level grid-based interface to a CPU compute backend
///
/// CPU compute backends expose a lower-level interface based on computations
/// over bands of rows of the output board.
///
/// This is used by the `parallel` backend to slice the original step
/// computation into smaller sub-computations that can run concurrently.
///
/// If you implement this, then `Simulate` will be implemented automatically
pub trait SimulateCpu: SimulateBase<Cells = Board> + SimulateCreate {
    /// Extract a view of the full grid from the double-buffered cells
    fn extract_grid(generations: &mut Generations<Board>) -> CpuGrid<'_, '_> {
        let (input, output) = generations.in_out();
        CpuGrid {
            input: input.view(),
            output: output.view_mut(),
            first_row: 0,
        }
    }

    /// Compute the next generation of every cell of a band of output rows
    ///
    /// This method does not check the grid for consistency, but is used to
    /// implement `step_impl` that does perform some sanity checks.
    fn unchecked_step_impl(&self, grid: CpuGrid<'_, '_>);

    /// Check that the CpuGrid seems correct
    ///
    /// Note that full correctness checking would involve making sure that the
    /// output band is a subset of the board that follows `input`, which cannot
    /// be done. Therefore, this is only a partial sanity check.
    fn check_grid(grid: &CpuGrid<'_, '_>) {
        debug_assert_eq!(grid.input.ncols(), grid.output.ncols());
        debug_assert!(grid.first_row + grid.output.nrows() <= grid.input.nrows());
    }

    /// Like `unchecked_step_impl()`, but with some sanity checks
    #[inline]
    fn step_impl(&self, grid: CpuGrid<'_, '_>) {
        Self::check_grid(&grid);
        self.unchecked_step_impl(grid);
    }

    /// Number of output rows that `step_impl()` would compute
    #[inline]
    fn grid_rows(grid: &CpuGrid<'_, '_>) -> usize {
        Self::check_grid(grid);
        grid.output.nrows()
    }

    /// Split the output band on which `step_impl()` operates into two halves
    ///
    /// Both halves keep read access to the full input board, since toroidal
    /// neighborhoods may reach any row.
    #[inline]
    fn split_grid<'input, 'output>(
        grid: CpuGrid<'input, 'output>,
    ) -> [CpuGrid<'input, 'output>; 2] {
        Self::check_grid(&grid);
        let CpuGrid {
            input,
            output,
            first_row,
        } = grid;
        let split_point = output.nrows() / 2;
        let (output_1, output_2) = output.split_at(Axis(0), split_point);
        [
            CpuGrid {
                input,
                output: output_1,
                first_row,
            },
            CpuGrid {
                input,
                output: output_2,
                first_row: first_row + split_point,
            },
        ]
    }
}
//
impl<T: SimulateCpu> SimulateStep for T {
    fn perform_step(&self, generations: &mut Generations<Board>) -> Result<(), Self::Error> {
        self.step_impl(Self::extract_grid(generations));
        Ok(())
    }
}

/// Low-level representation of the simulation grid used by SimulateCpu
///
/// Composed of the full current generation and of a band of rows of the next
/// generation, which starts at row `first_row` of the full board.
#[derive(Debug)]
pub struct CpuGrid<'input, 'output> {
    /// Full current generation
    pub input: BoardView<'input>,

    /// Band of rows of the next generation
    pub output: BoardViewMut<'output>,

    /// Index of the first row of `output` within the full board
    pub first_row: usize,
}
