//! Data format used by the Game of Life simulation

pub mod board;
pub mod cells;
pub mod init;
pub mod rule;
pub mod text;
pub mod topology;

/// State of a single cell
///
/// Stored as a small unsigned integer rather than a `bool` so that neighbor
/// counts can be computed using plain additions, including in SIMD code.
pub type Cell = u8;

/// Value of a live cell
pub const ALIVE: Cell = 1;

/// Value of a dead cell
pub const DEAD: Cell = 0;
