//! Common facilities shared by all GPU compute backends

#![allow(clippy::result_large_err)]

pub mod context;

pub use self::context::{
    config::VulkanConfig, requirements::ShaderRequirements, ContextBuildError, VulkanContext,
};
use crate::{SimulateBase, SimulateCreate};
use data::cells::{
    gpu::{BufferCells, BufferContext},
    Generations,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use vulkano::{
    sync::{future::NowFuture, GpuFuture},
    Validated, VulkanError,
};

/// Lower-level, asynchronous interface to a GPU compute backend
///
/// GPU programming is, by nature, asynchronous. After the CPU has submitted
/// work to the GPU, it can move on to other things, and only wait for the GPU
/// when it needs actual results from it. This interface lets you leverage this
/// property by recording many simulation steps into a single submission.
///
/// If you implement this, then SimulateCreate will be implemented for free and
/// the provided `perform_steps_impl()` method can be used to implement
/// `Simulate`. We can't provide a blanket `Simulate` impl for both
/// `SimulateStep` and `SimulateGpu`, and since `SimulateStep` is the simplest
/// interface it took priority.
pub trait SimulateGpu: SimulateBase<Cells = BufferCells>
where
    <Self as SimulateBase>::Error: From<Validated<VulkanError>>,
{
    /// Variant of SimulateCreate::new() that also accepts a preliminary Vulkan
    /// context configuration
    ///
    /// Implementors of SimulateGpu should add the requirements of their
    /// shaders to `config.shader` with [`ShaderRequirements::union()`], so
    /// that only devices which can run them are selected.
    fn with_config(args: Self::CliArgs, config: VulkanConfig) -> Result<Self, Self::Error>;

    /// Access the Vulkan context used by the simulation
    fn context(&self) -> &VulkanContext;

    /// Set up the context of device-side cells
    fn make_buffer_context(&self) -> BufferContext {
        let context = self.context();
        BufferContext::new(
            context.memory_allocator.clone(),
            context.command_allocator.clone(),
            context.queue.clone(),
        )
    }

    /// Quick access to `vulkano::sync::now()` on our device
    fn now(&self) -> NowFuture {
        vulkano::sync::now(self.context().device.clone())
    }

    /// GpuFuture returned by `prepare_steps`
    type PrepareStepsFuture<After: GpuFuture + 'static>: GpuFuture + 'static;

    /// Prepare to perform `steps` simulation steps
    ///
    /// This is an asynchronous version of `Simulate::perform_steps`: it
    /// schedules for some simulation steps to occur after the work designated
    /// by `after`, but does not wait for the GPU to finish.
    ///
    /// `generations` is only updated once the steps have been submitted, so
    /// that the current generation holds the result of the last step once the
    /// returned future is complete. On error, it is left untouched.
    fn prepare_steps<After: GpuFuture + 'static>(
        &self,
        after: After,
        generations: &mut Generations<BufferCells>,
        steps: usize,
    ) -> Result<Self::PrepareStepsFuture<After>, Self::Error>;

    /// Use this to implement `Simulate::perform_steps`
    fn perform_steps_impl(
        &self,
        generations: &mut Generations<BufferCells>,
        steps: usize,
    ) -> Result<(), Self::Error> {
        if steps == 0 {
            return Ok(());
        }
        self.prepare_steps(self.now(), generations, steps)?
            .then_signal_fence_and_flush()?
            .wait(None)?;
        Ok(())
    }
}
//
impl<T: SimulateGpu> SimulateCreate for T
where
    <T as SimulateBase>::Error: From<Validated<VulkanError>>,
{
    fn new(args: Self::CliArgs) -> Result<Self, Self::Error> {
        Self::with_config(args, VulkanConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_logger;
    use vulkano::device::QueueFlags;

    /// Set up a Vulkan context, or return None if no device is suitable
    fn make_context(shader: ShaderRequirements) -> Option<VulkanContext> {
        init_logger();
        let config = VulkanConfig {
            enumerate_portability: true,
            shader,
        };
        match config.build() {
            Ok(context) => Some(context),
            Err(ContextBuildError::Loading(_) | ContextBuildError::NoMatchingDevice) => {
                warn!("No Vulkan device available, skipping test");
                None
            }
            Err(other) => panic!("Failed to set up Vulkan: {other}"),
        }
    }

    #[test]
    fn setup_vulkan() {
        let Some(context) = make_context(ShaderRequirements::default()) else {
            return;
        };
        let families = context.device.physical_device().queue_family_properties();
        let family_index = context.queue.queue_family_index() as usize;
        let flags = families[family_index].queue_flags;
        assert!(flags.contains(QueueFlags::COMPUTE));
    }

    #[test]
    fn selected_device_runs_the_shader() {
        let shader = ShaderRequirements {
            work_group_size: 64,
            storage_buffers: 2,
            push_constants_size: 8,
        };
        let Some(context) = make_context(shader) else {
            return;
        };
        assert!(shader.is_met_by(context.device.physical_device().properties()));
    }
}
