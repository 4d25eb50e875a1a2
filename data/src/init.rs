//! Initial board generation

use crate::{
    board::{self, Board, BoardViewMut},
    ALIVE, DEAD,
};
use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed used when none is specified, so that runs are reproducible
pub const DEFAULT_SEED: u64 = 5489;

/// Live cells of a glider heading towards +x, +y, as [x, y] positions
/// relative to the top-left corner of its 3x3 bounding box
pub const GLIDER: [[usize; 2]; 5] = [[2, 0], [0, 1], [2, 1], [1, 2], [2, 2]];

/// Starting pattern of the simulation
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, ValueEnum)]
pub enum Pattern {
    /// Every cell is independently alive or dead with equal probability
    #[default]
    Random,

    /// A single glider in the top-left corner of an otherwise dead board
    Glider,
}

/// Initial board generator
///
/// The source of randomness is injected at construction time, which makes
/// seeding explicit and reproducible.
#[derive(Clone, Debug)]
pub struct Initializer<R: Rng> {
    /// Source of randomness
    rng: R,
}
//
impl Initializer<ChaCha8Rng> {
    /// Set up an initializer with a portable generator and a certain seed
    ///
    /// Identical seeds produce identical boards on every platform.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}
//
impl Default for Initializer<ChaCha8Rng> {
    fn default() -> Self {
        Self::seeded(DEFAULT_SEED)
    }
}
//
impl<R: Rng> Initializer<R> {
    /// Set up an initializer with a custom source of randomness
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a `[height, width]` board following a certain pattern
    pub fn make_board(&mut self, shape: [usize; 2], pattern: Pattern) -> Board {
        let mut board = board::dead(shape);
        match pattern {
            Pattern::Random => self.fill_random(board.view_mut()),
            Pattern::Glider => place_glider(board.view_mut(), [0, 0]),
        }
        board
    }

    /// Make every cell independently alive or dead with equal probability
    pub fn fill_random(&mut self, mut board: BoardViewMut<'_>) {
        // Row-major traversal keeps the result independent of memory layout
        for mut row in board.rows_mut() {
            for cell in row.iter_mut() {
                *cell = self.rng.gen_range(DEAD..=ALIVE);
            }
        }
    }
}

/// Clear a board and place a single glider with its bounding box's top-left
/// corner at `[x, y]`
///
/// Glider cells that fall outside of the board wrap around.
pub fn place_glider(mut board: BoardViewMut<'_>, [x, y]: [usize; 2]) {
    board.fill(DEAD);
    let [height, width] = [board.nrows(), board.ncols()];
    for [dx, dy] in GLIDER {
        let col = (x + dx) % width;
        let row = (y + dy) % height;
        board[[row, col]] = ALIVE;
    }
}
