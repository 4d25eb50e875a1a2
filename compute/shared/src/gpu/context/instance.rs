//! Vulkan library loading and instance setup

use super::ContextBuildResult;
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{ops::Deref, sync::Arc};
use vulkano::{
    instance::{
        debug::{
            DebugUtilsMessageSeverity, DebugUtilsMessageType, DebugUtilsMessenger,
            DebugUtilsMessengerCallback, DebugUtilsMessengerCallbackData,
            DebugUtilsMessengerCreateInfo,
        },
        Instance, InstanceCreateFlags, InstanceCreateInfo, InstanceExtensions,
    },
    VulkanLibrary,
};

/// Name of the Khronos validation layer
const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Load the system's Vulkan library
pub fn load_library() -> ContextBuildResult<Arc<VulkanLibrary>> {
    let library = VulkanLibrary::new()?;
    info!("Loaded Vulkan library v{}", library.api_version());
    trace!(
        "- Supports instance extensions {}",
        super::format_extension_properties(library.extension_properties())
    );
    Ok(library)
}

/// Vulkan instance whose diagnostics are forwarded to the log
///
/// Diagnostics stop once this is dropped, even if other `Arc<Instance>` are
/// still around.
pub struct DebuggedInstance {
    /// Vulkan instance
    instance: Arc<Instance>,

    /// Messenger that forwards instance diagnostics, if supported
    pub(super) messenger: Option<DebugUtilsMessenger>,
}
//
impl DebuggedInstance {
    /// Set up a Vulkan instance
    ///
    /// Debug builds enable the validation layer if it is installed. Vulkan
    /// diagnostics go to the log whenever VK_EXT_debug_utils is available.
    ///
    /// `enumerate_portability` exposes implementations which do not fully
    /// conform to the Vulkan specification, like MoltenVK on macOS.
    pub fn new(
        library: Arc<VulkanLibrary>,
        enumerate_portability: bool,
    ) -> ContextBuildResult<Self> {
        let enabled_layers = validation_layers(&library)?;
        let supported = library
            .supported_extensions_with_layers(enabled_layers.iter().map(String::as_str))?;

        let mut enabled_extensions = InstanceExtensions::empty();
        enabled_extensions.ext_debug_utils = supported.ext_debug_utils;
        if cfg!(feature = "gpu-debug-utils") && !supported.ext_debug_utils {
            warn!("VK_EXT_debug_utils is unavailable, GPU objects will not be named");
        }
        let mut flags = InstanceCreateFlags::empty();
        if enumerate_portability {
            if supported.khr_portability_enumeration {
                enabled_extensions.khr_portability_enumeration = true;
                flags |= InstanceCreateFlags::ENUMERATE_PORTABILITY;
            } else {
                debug!("Portability enumeration is unsupported on this system");
            }
        }

        let messenger_info = enabled_extensions.ext_debug_utils.then(messenger_info);
        let create_info = InstanceCreateInfo {
            flags,
            enabled_layers,
            enabled_extensions,
            debug_utils_messengers: messenger_info.iter().cloned().collect(),
            ..InstanceCreateInfo::application_from_cargo_toml()
        };
        info!("Will now create a Vulkan instance with {create_info:#?}");
        let instance = Instance::new(library, create_info)?;

        let messenger = messenger_info
            .map(|info| DebugUtilsMessenger::new(instance.clone(), info))
            .transpose()?;
        Ok(Self {
            instance,
            messenger,
        })
    }
}
//
impl Deref for DebuggedInstance {
    type Target = Arc<Instance>;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

/// Layers to be enabled on this library
fn validation_layers(library: &VulkanLibrary) -> ContextBuildResult<Vec<String>> {
    if !cfg!(debug_assertions) {
        return Ok(Vec::new());
    }
    if library
        .layer_properties()?
        .any(|layer| layer.name() == VALIDATION_LAYER)
    {
        Ok(vec![VALIDATION_LAYER.to_owned()])
    } else {
        debug!("{VALIDATION_LAYER} is not installed, running without validation");
        Ok(Vec::new())
    }
}

/// Debug messenger configuration that only reports what `log` can print
fn messenger_info() -> DebugUtilsMessengerCreateInfo {
    let mut message_severity = DebugUtilsMessageSeverity::empty();
    for (level, severity) in [
        (log::Level::Error, DebugUtilsMessageSeverity::ERROR),
        (log::Level::Warn, DebugUtilsMessageSeverity::WARNING),
        (log::Level::Debug, DebugUtilsMessageSeverity::INFO),
        (log::Level::Trace, DebugUtilsMessageSeverity::VERBOSE),
    ] {
        if log::STATIC_MAX_LEVEL >= level {
            message_severity |= severity;
        }
    }
    let mut message_type = DebugUtilsMessageType::GENERAL;
    if cfg!(debug_assertions) {
        message_type |= DebugUtilsMessageType::VALIDATION | DebugUtilsMessageType::PERFORMANCE;
    }
    DebugUtilsMessengerCreateInfo {
        message_severity,
        message_type,
        // SAFETY: forward_message does not call into Vulkan
        ..DebugUtilsMessengerCreateInfo::user_callback(unsafe {
            DebugUtilsMessengerCallback::new(forward_message)
        })
    }
}

/// Forward a Vulkan diagnostic to `log`
fn forward_message(
    severity: DebugUtilsMessageSeverity,
    ty: DebugUtilsMessageType,
    data: DebugUtilsMessengerCallbackData<'_>,
) {
    let level = match severity {
        DebugUtilsMessageSeverity::ERROR => log::Level::Error,
        DebugUtilsMessageSeverity::WARNING => log::Level::Warn,
        DebugUtilsMessageSeverity::INFO => log::Level::Debug,
        DebugUtilsMessageSeverity::VERBOSE => log::Level::Trace,
        _ => log::Level::Info,
    };
    if level > log::max_level() {
        return;
    }
    let target = match data.message_id_name {
        Some(id_name) => format!("Vulkan {ty:?} {id_name}"),
        None => format!("Vulkan {ty:?}"),
    };
    let objects = data
        .objects
        .map(|object| match object.object_name {
            Some(name) => format!("{:?} \"{name}\"", object.object_type),
            None => format!("{:?} #{}", object.object_type, object.object_handle),
        })
        .collect::<Vec<_>>();
    log!(
        target: &target,
        level,
        "{} (objects: {objects:?})",
        data.message
    );
}
