//! Game of Life update rule (B3/S23)

use crate::{Cell, ALIVE, DEAD};

/// Largest possible number of live neighbors
pub const MAX_NEIGHBORS: Cell = 8;

/// Next state of a cell given its current state and number of live neighbors
///
/// - A cell with 2 live neighbors keeps its state
/// - A cell with 3 live neighbors is alive
/// - Any other cell is dead
#[inline]
pub fn next_state(state: Cell, neighbors: Cell) -> Cell {
    match neighbors {
        2 => state,
        3 => ALIVE,
        _ => DEAD,
    }
}
