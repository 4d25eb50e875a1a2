//! Toroidal grid topology
//!
//! The left edge of the grid is adjacent to the right edge and the top edge is
//! adjacent to the bottom edge. Every compute backend must go through these
//! functions (or reproduce them exactly) when looking up neighbors.

use crate::{board::BoardView, Cell};

/// Flat position of cell `[x, y]` in a row-major grid of a certain width
#[inline]
pub fn index(width: usize, [x, y]: [usize; 2]) -> usize {
    y * width + x
}

/// Coordinate before `pos` on an axis of length `len`, with wraparound
///
/// `len` is added before taking the modulus to keep the computation unsigned.
#[inline]
pub fn before(pos: usize, len: usize) -> usize {
    (pos + len - 1) % len
}

/// Coordinate after `pos` on an axis of length `len`, with wraparound
#[inline]
pub fn after(pos: usize, len: usize) -> usize {
    (pos + 1) % len
}

/// Coordinates of the 3-cell neighborhood of `pos` along one axis
#[inline]
pub fn neighborhood(pos: usize, len: usize) -> [usize; 3] {
    [before(pos, len), pos, after(pos, len)]
}

/// Number of live cells among the 8 toroidal neighbors of cell `[x, y]`
///
/// Performs exactly 8 in-bounds reads for any `x < width` and `y < height`.
#[inline]
pub fn neighbor_count(current: &BoardView<'_>, [x, y]: [usize; 2]) -> Cell {
    let [above, row, below] = neighborhood(y, current.nrows());
    let [left, col, right] = neighborhood(x, current.ncols());
    current[[above, left]]
        + current[[above, col]]
        + current[[above, right]]
        + current[[row, left]]
        + current[[row, right]]
        + current[[below, left]]
        + current[[below, col]]
        + current[[below, right]]
}
