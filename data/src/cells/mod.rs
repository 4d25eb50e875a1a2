//! Storage of cell states, on the host or on a compute device

#[cfg(feature = "gpu")]
pub mod gpu;

use crate::{
    board::{self, Board, BoardView},
    Cell,
};
use ndarray::{CowArray, Ix2};
use std::{convert::Infallible, error::Error};

/// Double-buffered cell storage
///
/// One buffer holds the current generation and acts as the input of the next
/// simulation step, while the other receives the next generation. Both buffers
/// always have the same shape, and they trade roles after each step.
pub struct Generations<C: Cells> {
    /// Input and output cells
    cells: [C; 2],

    /// Context needed to manipulate the cells
    context: C::Context,
}
//
impl<C: Cells> Generations<C> {
    /// Set up double-buffered storage, with `initial` as the current generation
    ///
    /// The output buffer is left in an unspecified state.
    pub fn new(mut context: C::Context, initial: BoardView<'_>) -> Result<Self, C::Error> {
        let shape = board::shape(&initial);
        let mut input = C::allocate(&mut context, shape)?;
        input.write_board(&mut context, initial)?;
        let output = C::allocate(&mut context, shape)?;
        Ok(Self {
            cells: [input, output],
            context,
        })
    }

    /// Check out the `[height, width]` shape of the grid
    pub fn shape(&self) -> [usize; 2] {
        self.cells[0].shape()
    }

    /// Access the current generation and the buffer that receives the next one
    pub fn in_out(&mut self) -> (&C, &mut C) {
        let [input, output] = &mut self.cells;
        (input, output)
    }

    /// Like [`in_out()`](Self::in_out), but also access the context
    pub fn in_out_context(&mut self) -> (&C, &mut C, &mut C::Context) {
        let [input, output] = &mut self.cells;
        (input, output, &mut self.context)
    }

    /// Make the output cells become the input ones
    pub fn flip(&mut self) {
        let [input, output] = &mut self.cells;
        std::mem::swap(input, output);
    }

    /// View the current generation on the host
    ///
    /// This may require a device-to-host transfer, do not use it frequently.
    pub fn make_result_view(&mut self) -> Result<CowBoard<'_>, C::Error> {
        self.cells[0].make_board_view(&mut self.context)
    }
}

/// Board that may be borrowed from the cell storage or copied out of it
pub type CowBoard<'a> = CowArray<'a, Cell, Ix2>;

/// Storage for a full grid of cells
///
/// Implementations may store cells in a different format or memory space than
/// the host-side [`Board`], but must behave as if a board of the shape that was
/// specified at allocation time was stored.
pub trait Cells: Sized {
    /// Context needed to allocate and transfer cells
    type Context;

    /// Error that can occur while allocating or transferring cells
    type Error: Error + Send + Sync + 'static;

    /// Allocate storage for a `[height, width]` grid of cells
    ///
    /// The initial contents of the storage are unspecified.
    fn allocate(context: &mut Self::Context, shape: [usize; 2]) -> Result<Self, Self::Error>;

    /// Retrieve the shape that was passed in to `allocate()`
    fn shape(&self) -> [usize; 2];

    /// Overwrite all cells with the contents of a host-side board
    ///
    /// `board` must have the same shape as this storage.
    fn write_board(
        &mut self,
        context: &mut Self::Context,
        board: BoardView<'_>,
    ) -> Result<(), Self::Error>;

    /// View the cells as a host-side board
    ///
    /// This operation may require a data transfer, do not use it frequently.
    fn make_board_view(
        &mut self,
        context: &mut Self::Context,
    ) -> Result<CowBoard<'_>, Self::Error>;
}
//
impl Cells for Board {
    type Context = ();

    type Error = Infallible;

    fn allocate(_context: &mut (), shape: [usize; 2]) -> Result<Self, Infallible> {
        Ok(board::dead(shape))
    }

    fn shape(&self) -> [usize; 2] {
        [self.nrows(), self.ncols()]
    }

    fn write_board(&mut self, _context: &mut (), board: BoardView<'_>) -> Result<(), Infallible> {
        self.assign(&board);
        Ok(())
    }

    fn make_board_view(&mut self, _context: &mut ()) -> Result<CowBoard<'_>, Infallible> {
        Ok(self.view().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ALIVE, DEAD};
    use ndarray::array;

    #[test]
    fn flip_swaps_roles() {
        let initial = array![[0, 1, 0], [1, 0, 1]];
        let mut generations = Generations::<Board>::new((), initial.view()).unwrap();
        assert_eq!(generations.shape(), [2, 3]);

        let (input, output) = generations.in_out();
        assert_eq!(input, &initial);
        output.fill(ALIVE);

        generations.flip();
        let result = generations.make_result_view().unwrap();
        assert!(result.iter().all(|&cell| cell == ALIVE));

        generations.flip();
        assert_eq!(generations.make_result_view().unwrap(), initial);
    }

    #[test]
    fn both_buffers_share_the_initial_shape() {
        let mut initial = board::dead([3, 4]);
        initial[[2, 3]] = ALIVE;
        let mut generations = Generations::<Board>::new((), initial.view()).unwrap();
        assert_eq!(generations.shape(), [3, 4]);

        let (input, output) = generations.in_out();
        assert_eq!(input, &initial);
        assert_eq!(output.shape(), input.shape());

        let result = generations.make_result_view().unwrap();
        assert_eq!(result[[2, 3]], ALIVE);
        assert_eq!(result[[0, 0]], DEAD);
    }
}
