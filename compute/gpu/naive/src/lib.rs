//! Naive implementation of GPU-based Game of Life simulation
//!
//! This version stores the board in plain storage buffers with one 32-bit
//! integer per cell, and launches one shader invocation per cell. It
//! illustrates the challenge of keeping CPU and GPU code in sync in the
//! split-source model that Vulkan-based Rust code must sadly use until
//! rust-gpu is mature enough.

#![allow(clippy::result_large_err)]

mod pipeline;

use clap::Args;
use compute::{
    gpu::{ContextBuildError, SimulateGpu, VulkanConfig, VulkanContext},
    Simulate, SimulateBase,
};
use data::{
    board::BoardView,
    cells::{
        gpu::{self as gpu_cells, BufferCells},
        Generations,
    },
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{num::NonZeroU32, sync::Arc};
use thiserror::Error;
use vulkano::{
    command_buffer::{
        AutoCommandBufferBuilder, CommandBufferExecError, CommandBufferExecFuture,
        CommandBufferUsage,
    },
    device::Queue,
    pipeline::{layout::IntoPipelineLayoutCreateInfoError, ComputePipeline},
    sync::GpuFuture,
    Validated, ValidationError, VulkanError,
};

/// Parameters are tunable via CLI args and environment variables
#[derive(Args, Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct CliArgs {
    /// Maximal number of work-groups per compute dispatch
    ///
    /// By default, one shader invocation is launched per cell, within the
    /// limits of the device. Lower values make each invocation process
    /// several cells.
    #[arg(long, env)]
    gpu_work_groups: Option<NonZeroU32>,
}

/// Game of Life simulation
pub struct Simulation {
    /// General-purpose Vulkan context
    context: VulkanContext,

    /// Compute pipeline
    pipeline: Arc<ComputePipeline>,

    /// Maximal number of work-groups per dispatch, if set by the user
    max_work_groups: Option<u32>,
}
//
impl SimulateBase for Simulation {
    type CliArgs = CliArgs;

    type Cells = BufferCells;

    type Error = Error;

    fn make_generations(&self, initial: BoardView<'_>) -> Result<Generations<BufferCells>> {
        Ok(Generations::new(self.make_buffer_context(), initial)?)
    }
}
//
impl SimulateGpu for Simulation {
    fn with_config(args: CliArgs, config: VulkanConfig) -> Result<Self> {
        // Set up Vulkan on a device that can run our shader
        let context = VulkanConfig {
            shader: config.shader.union(pipeline::REQUIREMENTS),
            ..config
        }
        .build()?;

        // Set up the compute pipeline
        let pipeline = pipeline::create(&context)?;
        let max_work_groups = args.gpu_work_groups.map(u32::from);
        if let Some(max_work_groups) = max_work_groups {
            info!("Capping compute dispatches to {max_work_groups} work-groups");
        }
        Ok(Self {
            context,
            pipeline,
            max_work_groups,
        })
    }

    fn context(&self) -> &VulkanContext {
        &self.context
    }

    type PrepareStepsFuture<After: GpuFuture + 'static> = CommandBufferExecFuture<After>;

    fn prepare_steps<After: GpuFuture + 'static>(
        &self,
        after: After,
        generations: &mut Generations<BufferCells>,
        steps: usize,
    ) -> Result<CommandBufferExecFuture<After>> {
        // Prepare to record GPU commands
        let mut builder = AutoCommandBufferBuilder::primary(
            self.context.command_allocator.as_ref(),
            self.queue().queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )?;

        // Set up the compute pipeline and board shape
        let shape = generations.shape();
        pipeline::bind_pipeline(&mut builder, self.pipeline.clone(), shape)?;
        let dispatch_size = pipeline::dispatch_size(
            self.context.device.physical_device(),
            shape,
            self.max_work_groups,
        );
        trace!("Will dispatch {dispatch_size:?} work-groups per step");

        // Record the simulation steps, with buffers trading roles every step
        let (input, output, buffer_context) = generations.in_out_context();
        let input = input.access_buffer().clone();
        let output = output.access_buffer().clone();
        for step in 0..steps {
            let cells = pipeline::cells_set(
                &self.context,
                &self.pipeline,
                buffer_context,
                pipeline::step_bindings([input.clone(), output.clone()], step),
            )?;
            pipeline::record_step(&mut builder, &self.pipeline, cells, dispatch_size)?;
        }

        // Schedule the simulation steps
        let commands = builder.build()?;
        self.context
            .set_debug_utils_object_name(commands.as_ref(), || "Compute simulation steps".into())?;
        let future = after.then_execute(self.queue().clone(), commands)?;

        // Only flip once the steps are sure to run
        if steps % 2 == 1 {
            generations.flip();
        }
        Ok(future)
    }
}
//
impl Simulate for Simulation {
    fn perform_steps(
        &self,
        generations: &mut Generations<BufferCells>,
        steps: usize,
    ) -> Result<()> {
        self.perform_steps_impl(generations, steps)
    }
}
//
impl Simulation {
    /// Queue that all simulation work goes to
    fn queue(&self) -> &Arc<Queue> {
        &self.context.queue
    }
}

/// Errors that can occur during this computation
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to initialize the Vulkan API")]
    Init(#[from] ContextBuildError),

    #[error("failed to manipulate device cells")]
    Cells(#[from] gpu_cells::Error),

    #[error("failed to derive the pipeline layout from the shader")]
    PipelineLayout(#[from] IntoPipelineLayoutCreateInfoError),

    #[error("failed to submit commands to the queue ({0})")]
    CommandBufferExec(#[from] CommandBufferExecError),

    #[error("a Vulkan API call errored out or failed validation ({0})")]
    Vulkan(#[from] Validated<VulkanError>),
}
//
impl From<VulkanError> for Error {
    fn from(value: VulkanError) -> Self {
        Self::Vulkan(Validated::Error(value))
    }
}
//
impl From<Box<ValidationError>> for Error {
    fn from(value: Box<ValidationError>) -> Self {
        Self::Vulkan(value.into())
    }
}
//
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use compute::{
        gpu::ContextBuildError::{Loading, NoMatchingDevice},
        SimulateCreate,
    };
    use data::{
        board::Board,
        init::{Initializer, Pattern},
        text,
    };
    use std::sync::Once;

    fn init_logger() {
        static INIT_LOGGER: Once = Once::new();
        INIT_LOGGER.call_once(env_logger::init);
    }

    /// Set up the simulation, or return None if no device is available
    fn make_simulation(gpu_work_groups: Option<u32>) -> Option<Simulation> {
        init_logger();
        let args = CliArgs {
            gpu_work_groups: gpu_work_groups.and_then(NonZeroU32::new),
        };
        let config = VulkanConfig {
            enumerate_portability: true,
            ..VulkanConfig::default()
        };
        match Simulation::with_config(args, config) {
            Ok(simulation) => Some(simulation),
            Err(Error::Init(Loading(_) | NoMatchingDevice)) => {
                warn!("No Vulkan device available, skipping test");
                None
            }
            Err(other) => panic!("Failed to set up GPU simulation: {other}"),
        }
    }

    fn run<Sim: Simulate>(sim: &Sim, initial: &Board, steps: usize) -> Board {
        let mut generations = sim.make_generations(initial.view()).unwrap();
        sim.perform_steps(&mut generations, steps).unwrap();
        generations.make_result_view().unwrap().into_owned()
    }

    #[test]
    fn matches_naive() {
        let Some(gpu) = make_simulation(None) else {
            return;
        };
        let naive = compute_naive::Simulation::new(Default::default()).unwrap();
        let mut initializer = Initializer::seeded(1234);
        for shape in [[1, 1], [3, 3], [5, 17], [64, 100]] {
            let initial = initializer.make_board(shape, Pattern::Random);
            for steps in [0, 1, 10] {
                assert_eq!(
                    run(&gpu, &initial, steps),
                    run(&naive, &initial, steps),
                    "{shape:?} board, {steps} steps"
                );
            }
        }
    }

    #[test]
    fn odd_and_even_batches_chain_up() {
        let Some(gpu) = make_simulation(None) else {
            return;
        };
        let initial = Initializer::seeded(42).make_board([20, 30], Pattern::Random);
        let mut generations = gpu.make_generations(initial.view()).unwrap();
        for steps in [1, 2, 3, 0, 5] {
            gpu.perform_steps(&mut generations, steps).unwrap();
        }
        let result = generations.make_result_view().unwrap().into_owned();

        let naive = compute_naive::Simulation::new(Default::default()).unwrap();
        assert_eq!(result, run(&naive, &initial, 11));
    }

    #[test]
    fn grid_stride_covers_all_cells() {
        // A single work-group must process all 3000 cells
        let Some(gpu) = make_simulation(Some(1)) else {
            return;
        };
        let naive = compute_naive::Simulation::new(Default::default()).unwrap();
        let initial = Initializer::seeded(99).make_board([50, 60], Pattern::Random);
        assert_eq!(run(&gpu, &initial, 7), run(&naive, &initial, 7));
    }

    #[test]
    fn glider_fixture() {
        let Some(gpu) = make_simulation(None) else {
            return;
        };
        let initial = text::parse_board("00000\n00010\n01010\n00110\n00000\n").unwrap();
        let expected = text::parse_board("00000\n00000\n00001\n00101\n00011\n").unwrap();
        assert_eq!(run(&gpu, &initial, 4), expected);
    }

    #[test]
    fn dispatch_is_capped() {
        let Some(gpu) = make_simulation(None) else {
            return;
        };
        let device = gpu.context.device.physical_device();
        assert_eq!(pipeline::dispatch_size(device, [1, 1], None), [1, 1, 1]);
        assert_eq!(pipeline::dispatch_size(device, [8, 16], None), [2, 1, 1]);
        assert_eq!(pipeline::dispatch_size(device, [8, 17], Some(1)), [1, 1, 1]);
    }
}
