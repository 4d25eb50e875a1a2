//! Simulation driver
//!
//! The driver owns the double-buffered cells of a simulation run and moves
//! them through the following states:
//!
//! - `Uninitialized`: no board has been provided yet
//! - `Ready`: the initial board is loaded, no generation was computed
//! - `Running`: some, but not all, of the requested generations were computed
//! - `Done`: all requested generations were computed
//!
//! Between two calls to the driver, the current generation of the cells is
//! always fully computed.

use crate::{Simulate, SimulateBase};
use data::{
    board::{self, BoardView, Framed},
    cells::{Cells, CowBoard, Generations},
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{error::Error, num::NonZeroUsize};
use thiserror::Error;

/// Lifecycle state of a simulation run
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum State {
    Uninitialized,
    Ready,
    Running,
    Done,
}

/// Simulation run of a fixed number of generations
pub struct Driver<'sim, Simulation: Simulate> {
    /// Compute backend
    simulation: &'sim Simulation,

    /// Cells, available once initialized
    generations: Option<Generations<Simulation::Cells>>,

    /// Number of generations computed so far
    generation: usize,

    /// Number of generations to be computed
    turns: usize,

    /// Truth that at least one batch of generations has been computed
    started: bool,
}
//
impl<'sim, Simulation: Simulate> Driver<'sim, Simulation> {
    /// Prepare to run `turns` generations of a simulation
    pub fn new(simulation: &'sim Simulation, turns: usize) -> Self {
        Self {
            simulation,
            generations: None,
            generation: 0,
            turns,
            started: false,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> State {
        match self.generations {
            None => State::Uninitialized,
            Some(_) if self.generation == self.turns && self.started => State::Done,
            Some(_) if self.turns == 0 => State::Done,
            Some(_) if self.started => State::Running,
            Some(_) => State::Ready,
        }
    }

    /// Number of generations computed so far
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Number of generations to be computed
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Load the initial board
    pub fn initialize(&mut self, board: BoardView<'_>) -> DriverResult<(), Simulation> {
        if self.generations.is_some() {
            return Err(DriverError::AlreadyInitialized);
        }
        let [height, width] = board::shape(&board);
        info!(
            "Initializing a {height}x{width} board for {} generations",
            self.turns
        );
        trace!("Initial board:\n{}", Framed(board));
        let generations = self
            .simulation
            .make_generations(board)
            .map_err(DriverError::Simulation)?;
        self.generations = Some(generations);
        Ok(())
    }

    /// Compute up to `max_steps` more generations, return how many were done
    ///
    /// Once all requested generations have been computed, this returns 0.
    pub fn advance(&mut self, max_steps: usize) -> DriverResult<usize, Simulation> {
        let generations = self
            .generations
            .as_mut()
            .ok_or(DriverError::NotInitialized)?;
        let steps = max_steps.min(self.turns - self.generation);
        if steps == 0 {
            return Ok(0);
        }
        self.simulation
            .perform_steps(generations, steps)
            .map_err(DriverError::Simulation)?;
        self.started = true;
        self.generation += steps;
        debug!("Reached generation {}/{}", self.generation, self.turns);
        Ok(steps)
    }

    /// Compute all remaining generations by batches of `batch_size`
    ///
    /// `on_batch` is called with the number of generations computed after
    /// each batch.
    pub fn run(
        &mut self,
        batch_size: NonZeroUsize,
        mut on_batch: impl FnMut(usize),
    ) -> DriverResult<(), Simulation> {
        if self.generations.is_none() {
            return Err(DriverError::NotInitialized);
        }
        loop {
            let steps = self.advance(batch_size.get())?;
            if steps == 0 {
                break;
            }
            on_batch(steps);
        }
        info!("Computed all {} generations", self.turns);
        Ok(())
    }

    /// View the current generation on the host
    pub fn make_result_view(&mut self) -> DriverResult<CowBoard<'_>, Simulation> {
        let generations = self
            .generations
            .as_mut()
            .ok_or(DriverError::NotInitialized)?;
        generations.make_result_view().map_err(DriverError::Cells)
    }
}

/// Things that can go wrong while driving a simulation
#[derive(Debug, Error)]
pub enum DriverError<SimulationError: Error + 'static, CellsError: Error + 'static> {
    #[error("the simulation has not been initialized")]
    NotInitialized,

    #[error("the simulation has already been initialized")]
    AlreadyInitialized,

    #[error("the compute backend failed")]
    Simulation(#[source] SimulationError),

    #[error("failed to access the cells")]
    Cells(#[source] CellsError),
}
//
/// Result type associated with a certain compute backend's Driver
pub type DriverResult<T, Simulation> = Result<
    T,
    DriverError<
        <Simulation as SimulateBase>::Error,
        <<Simulation as SimulateBase>::Cells as Cells>::Error,
    >,
>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{init_logger, NoArgs, SimulateCreate};
    use data::{
        board::{Board, BoardView},
        init::{place_glider, Pattern},
        rule, topology,
    };
    use ndarray::array;
    use std::convert::Infallible;

    /// Straightforward reference backend
    struct Reference;
    //
    impl SimulateBase for Reference {
        type CliArgs = NoArgs;
        type Cells = Board;
        type Error = Infallible;

        fn make_generations(
            &self,
            initial: BoardView<'_>,
        ) -> Result<Generations<Board>, Infallible> {
            Generations::new((), initial)
        }
    }
    //
    impl SimulateCreate for Reference {
        fn new(_args: NoArgs) -> Result<Self, Infallible> {
            Ok(Self)
        }
    }
    //
    impl Simulate for Reference {
        fn perform_steps(
            &self,
            generations: &mut Generations<Board>,
            steps: usize,
        ) -> Result<(), Infallible> {
            for _ in 0..steps {
                let (input, output) = generations.in_out();
                for ((y, x), cell) in output.indexed_iter_mut() {
                    let neighbors = topology::neighbor_count(&input.view(), [x, y]);
                    *cell = rule::next_state(input[[y, x]], neighbors);
                }
                generations.flip();
            }
            Ok(())
        }
    }

    #[test]
    fn lifecycle() {
        init_logger();
        let sim = Reference;
        let mut driver = Driver::new(&sim, 3);
        assert_eq!(driver.state(), State::Uninitialized);
        assert!(matches!(
            driver.advance(1),
            Err(DriverError::NotInitialized)
        ));
        assert!(matches!(
            driver.make_result_view(),
            Err(DriverError::NotInitialized)
        ));

        driver.initialize(board::dead([4, 4]).view()).unwrap();
        assert_eq!(driver.state(), State::Ready);
        assert!(matches!(
            driver.initialize(board::dead([4, 4]).view()),
            Err(DriverError::AlreadyInitialized)
        ));

        assert_eq!(driver.advance(2).unwrap(), 2);
        assert_eq!(driver.state(), State::Running);
        assert_eq!(driver.generation(), 2);

        assert_eq!(driver.advance(2).unwrap(), 1);
        assert_eq!(driver.state(), State::Done);
        assert_eq!(driver.generation(), driver.turns());
        assert_eq!(driver.advance(5).unwrap(), 0);
    }

    #[test]
    fn zero_turns_is_identity() {
        init_logger();
        let sim = Reference;
        let initial = data::init::Initializer::seeded(7).make_board([5, 9], Pattern::Random);
        let mut driver = Driver::new(&sim, 0);
        driver.initialize(initial.view()).unwrap();
        assert_eq!(driver.state(), State::Done);
        driver
            .run(NonZeroUsize::MIN, |_| panic!("No batch should run"))
            .unwrap();
        assert_eq!(driver.make_result_view().unwrap(), initial);
    }

    #[test]
    fn batches_add_up() {
        init_logger();
        let sim = Reference;
        let mut initial = board::dead([8, 8]);
        place_glider(initial.view_mut(), [1, 1]);

        let mut batched = Driver::new(&sim, 10);
        batched.initialize(initial.view()).unwrap();
        let mut batches = Vec::new();
        batched
            .run(NonZeroUsize::new(4).unwrap(), |steps| batches.push(steps))
            .unwrap();
        assert_eq!(batches, [4, 4, 2]);

        let mut single = Driver::new(&sim, 10);
        single.initialize(initial.view()).unwrap();
        single.run(NonZeroUsize::MIN, |_| {}).unwrap();

        let single = single.make_result_view().unwrap().to_owned();
        assert_eq!(batched.make_result_view().unwrap(), single);
    }

    #[test]
    fn narrow_torus_blinker() {
        init_logger();
        let sim = Reference;
        let horizontal = array![[0, 0, 0], [1, 1, 1], [0, 0, 0], [0, 0, 0]];
        let grown = array![[1, 1, 1], [1, 1, 1], [1, 1, 1], [0, 0, 0]];
        let mut driver = Driver::new(&sim, 1);
        driver.initialize(horizontal.view()).unwrap();
        driver.run(NonZeroUsize::MIN, |_| {}).unwrap();
        // On a 3-wide torus, every cell next to the blinker sees all of it
        assert_eq!(driver.make_result_view().unwrap(), grown);
    }
}
