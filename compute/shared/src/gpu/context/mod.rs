//! Common Vulkan context shared by all simulations

mod cache;
pub mod config;
mod device;
mod instance;
pub mod requirements;

use self::cache::PersistentPipelineCache;
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{borrow::Cow, sync::Arc};
use thiserror::Error;
use vulkano::{
    command_buffer::allocator::StandardCommandBufferAllocator,
    descriptor_set::allocator::StandardDescriptorSetAllocator,
    device::{Device, DeviceOwnedVulkanObject, Queue},
    instance::debug::DebugUtilsMessenger,
    memory::allocator::StandardMemoryAllocator,
    ExtensionProperties, LoadingError, Validated, ValidationError, VulkanError,
};

/// Everything a simulation needs to run on a Vulkan device
///
/// Simulations submit all of their work, board transfers included, to a single
/// compute queue. Vulkan diagnostics are logged for as long as this is alive.
///
/// Built using the [`VulkanConfig`](config::VulkanConfig) configuration struct
pub struct VulkanContext {
    /// Logical device (used for resource allocation)
    pub device: Arc<Device>,

    /// Queue that simulation commands are submitted to
    pub queue: Arc<Queue>,

    /// Memory allocator (used for buffer allocation)
    pub memory_allocator: Arc<StandardMemoryAllocator>,

    /// Command buffer allocator
    pub command_allocator: Arc<StandardCommandBufferAllocator>,

    /// Descriptor set allocator
    pub descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,

    /// Compiled shader cache, persisted across runs
    pub pipeline_cache: PersistentPipelineCache,

    /// Messenger that sends Vulkan debug messages to the [`log`] crate
    pub(crate) _messenger: Option<DebugUtilsMessenger>,
}
//
impl VulkanContext {
    /// Give a Vulkan entity a name, if gpu_debug_utils is enabled
    pub fn set_debug_utils_object_name<Object: DeviceOwnedVulkanObject>(
        &self,
        object: &Object,
        make_name: impl FnOnce() -> Cow<'static, str>,
    ) -> Result<(), Validated<VulkanError>> {
        if cfg!(feature = "gpu-debug-utils") {
            let name = make_name();
            object.set_debug_utils_object_name(Some(&name))?;
        }
        Ok(())
    }
}

/// Things that can go wrong while setting up a VulkanContext
#[derive(Debug, Error)]
pub enum ContextBuildError {
    #[error("failed to load the Vulkan library")]
    Loading(#[from] LoadingError),

    #[error("no physical device matches requirements")]
    NoMatchingDevice,

    #[error("a Vulkan API call errored out or failed validation ({0})")]
    Vulkan(#[from] Validated<VulkanError>),

    #[error("did not find home directory")]
    HomeDirNotFound,

    #[error("failed to read or write on-disk pipeline cache")]
    PipelineCacheIo(#[from] std::io::Error),
}
//
impl From<VulkanError> for ContextBuildError {
    fn from(value: VulkanError) -> Self {
        Self::Vulkan(Validated::Error(value))
    }
}
//
impl From<Box<ValidationError>> for ContextBuildError {
    fn from(value: Box<ValidationError>) -> Self {
        Self::Vulkan(value.into())
    }
}
//
/// Result type associated with VulkanContext setup issues
pub type ContextBuildResult<T> = std::result::Result<T, ContextBuildError>;

/// Format Vulkan extension properties for display
fn format_extension_properties(extension_properties: &[ExtensionProperties]) -> String {
    format!(
        "{:#?}",
        extension_properties
            .iter()
            .map(|ext| format!("{} v{}", ext.extension_name, ext.spec_version))
            .collect::<Vec<_>>()
    )
}
