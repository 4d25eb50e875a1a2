//! Vulkan context configuration

use super::{
    cache::PersistentPipelineCache,
    device,
    instance::{self, DebuggedInstance},
    requirements::ShaderRequirements,
    ContextBuildError, ContextBuildResult, VulkanContext,
};
use directories::ProjectDirs;
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::sync::Arc;
use vulkano::{
    command_buffer::allocator::{
        StandardCommandBufferAllocator, StandardCommandBufferAllocatorCreateInfo,
    },
    descriptor_set::allocator::StandardDescriptorSetAllocator,
    memory::allocator::StandardMemoryAllocator,
};

/// Vulkan compute context configuration
///
/// Use struct update syntax on top of [`VulkanConfig::default()`] to change
/// some settings, then call [`build()`](VulkanConfig::build) to set up the
/// Vulkan context:
///
/// ```
/// # use compute::gpu::VulkanConfig;
/// let config = VulkanConfig {
///     enumerate_portability: true,
///     ..VulkanConfig::default()
/// };
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct VulkanConfig {
    /// Truth that Vulkan Portability devices should be enumerated
    ///
    /// Some Vulkan implementations, like MoltenVK on macOS, do not support the
    /// full Vulkan 1.0 specification. Setting this flag makes them visible.
    pub enumerate_portability: bool,

    /// Resources that the simulation shader needs from the device
    ///
    /// Devices which cannot provide these are not considered during device
    /// selection. By default, no particular resource is required.
    pub shader: ShaderRequirements,
}
//
impl VulkanConfig {
    /// Set up a Vulkan compute context with this configuration
    pub fn build(self) -> ContextBuildResult<VulkanContext> {
        let library = instance::load_library()?;
        let instance = DebuggedInstance::new(library, self.enumerate_portability)?;
        let selected = device::select(&instance, &self.shader)?;
        let (device, queue) = device::create(selected)?;

        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));
        let command_allocator = Arc::new(StandardCommandBufferAllocator::new(
            device.clone(),
            StandardCommandBufferAllocatorCreateInfo::default(),
        ));
        let descriptor_set_allocator = Arc::new(StandardDescriptorSetAllocator::new(
            device.clone(),
            Default::default(),
        ));

        let dirs = ProjectDirs::from("", "", "gol").ok_or(ContextBuildError::HomeDirNotFound)?;
        let pipeline_cache = PersistentPipelineCache::new(&dirs, device.clone())?;

        Ok(VulkanContext {
            device,
            queue,
            memory_allocator,
            command_allocator,
            descriptor_set_allocator,
            pipeline_cache,
            _messenger: instance.messenger,
        })
    }
}
