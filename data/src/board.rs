//! Host-side storage of a full grid of cells
//!
//! A board is a 2D array of [`Cell`]s of shape `[height, width]`, stored in
//! row-major order so that cell (x, y) lives at flat index `y * width + x`.

use crate::{Cell, ALIVE, DEAD};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use std::fmt::{self, Display, Formatter};

/// Owned board of cells
pub type Board = Array2<Cell>;

/// Read-only view of a board
pub type BoardView<'a> = ArrayView2<'a, Cell>;

/// Mutable view of a board
pub type BoardViewMut<'a> = ArrayViewMut2<'a, Cell>;

/// Create a board of dead cells with a `[height, width]` shape
pub fn dead(shape: [usize; 2]) -> Board {
    Board::zeros(shape)
}

/// Query the `[height, width]` shape of a board
pub fn shape(board: &BoardView<'_>) -> [usize; 2] {
    [board.nrows(), board.ncols()]
}

/// Number of live cells on a board
pub fn population(board: &BoardView<'_>) -> usize {
    board.iter().filter(|&&cell| cell == ALIVE).count()
}

/// Character used to represent a cell in text form
#[inline]
pub fn cell_char(cell: Cell) -> char {
    if cell == DEAD {
        '0'
    } else {
        '1'
    }
}

/// Console rendition of a board, framed by horizontal rules
///
/// Used for debug logging, this is not the verification file format (see
/// [`crate::text`] for that).
pub struct Framed<'a>(pub BoardView<'a>);
//
impl Display for Framed<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.0.ncols());
        writeln!(f, "{rule}")?;
        for row in self.0.rows() {
            for &cell in row {
                write!(f, "{}", cell_char(cell))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn framed_display() {
        let board = array![[0, 1, 0], [1, 1, 0]];
        assert_eq!(
            Framed(board.view()).to_string(),
            "---\n010\n110\n---\n"
        );
        assert_eq!(population(&board.view()), 3);
        assert_eq!(shape(&board.view()), [2, 3]);
    }
}
