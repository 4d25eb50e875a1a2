//! Device selection and setup

use super::{
    requirements::{self, ShaderRequirements},
    ContextBuildError, ContextBuildResult,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{env::VarError, sync::Arc};
use vulkano::{
    device::{
        physical::{PhysicalDevice, PhysicalDeviceType},
        Device, DeviceCreateInfo, DeviceExtensions, DeviceOwnedVulkanObject, Features, Queue,
        QueueCreateInfo,
    },
    instance::Instance,
};

/// Environment variable used to override the preferred device type
const PREFER_DEVICE_VAR: &str = "GOL_PREFER_DEVICE";

/// Physical device that simulations will run on
pub struct SelectedDevice {
    /// Physical device
    pub physical: Arc<PhysicalDevice>,

    /// Queue family that simulation commands go to
    pub queue_family_index: u32,
}

/// Pick the physical device that simulations will run on
///
/// Usable devices have a compute queue family and can run a shader with the
/// specified requirements. Among them, the device type named by the
/// `GOL_PREFER_DEVICE` environment variable comes first, followed by discrete
/// GPUs, virtual GPUs, integrated GPUs and CPU emulations. The first
/// enumerated device wins any remaining tie.
pub fn select(
    instance: &Arc<Instance>,
    shader: &ShaderRequirements,
) -> ContextBuildResult<SelectedDevice> {
    let preferred = preferred_device_type();
    let mut best: Option<(u8, SelectedDevice)> = None;
    for physical in instance.enumerate_physical_devices()? {
        let properties = physical.properties();
        info!("Found physical device {}", properties.device_name);
        trace!("- With {properties:#?}");
        trace!(
            "- With device extensions {}",
            super::format_extension_properties(physical.extension_properties())
        );

        let Some(queue_family_index) = requirements::compute_queue_family(&physical) else {
            info!("=> Device has no compute queue, skipping it");
            continue;
        };
        if !shader.is_met_by(properties) {
            info!("=> Device cannot run a shader with {shader:?}, skipping it");
            continue;
        }
        let score = device_type_score(properties.device_type, preferred);
        info!("=> Device is usable, with preference score {score}");
        if best
            .as_ref()
            .is_none_or(|(best_score, _)| score > *best_score)
        {
            let candidate = SelectedDevice {
                physical,
                queue_family_index,
            };
            best = Some((score, candidate));
        }
    }
    let (_, selected) = best.ok_or(ContextBuildError::NoMatchingDevice)?;
    info!(
        "Selected device {}",
        selected.physical.properties().device_name
    );
    Ok(selected)
}

/// Set up a logical device with a single simulation queue
///
/// Debug builds enable robust buffer access where available, so that
/// out-of-bounds shader accesses are caught.
pub fn create(selected: SelectedDevice) -> ContextBuildResult<(Arc<Device>, Arc<Queue>)> {
    let SelectedDevice {
        physical,
        queue_family_index,
    } = selected;

    let mut enabled_features = Features::empty();
    enabled_features.robust_buffer_access =
        cfg!(debug_assertions) && physical.supported_features().robust_buffer_access;
    let mut enabled_extensions = DeviceExtensions::empty();
    enabled_extensions.khr_portability_subset =
        physical.supported_extensions().khr_portability_subset;

    let create_info = DeviceCreateInfo {
        enabled_features,
        enabled_extensions,
        queue_create_infos: vec![QueueCreateInfo {
            queue_family_index,
            ..Default::default()
        }],
        ..Default::default()
    };
    info!("Will now create a logical device with {create_info:#?}");
    let (device, mut queues) = Device::new(physical, create_info)?;
    let queue = queues
        .next()
        .expect("A single queue was requested and must be present");
    if cfg!(feature = "gpu-debug-utils") {
        queue.set_debug_utils_object_name(Some("Simulation queue"))?;
    }
    Ok((device, queue))
}

/// Device type that the user would like to run on
fn preferred_device_type() -> PhysicalDeviceType {
    const FALLBACK: PhysicalDeviceType = PhysicalDeviceType::DiscreteGpu;
    match std::env::var(PREFER_DEVICE_VAR) {
        Ok(name) => parse_device_type(&name).unwrap_or_else(|| {
            warn!("Ignoring unknown {PREFER_DEVICE_VAR} device type {name:?}");
            FALLBACK
        }),
        Err(VarError::NotPresent) => FALLBACK,
        Err(VarError::NotUnicode(name)) => {
            warn!("Ignoring non-unicode {PREFER_DEVICE_VAR} value {name:?}");
            FALLBACK
        }
    }
}

/// Decode a device type name, as accepted by `GOL_PREFER_DEVICE`
fn parse_device_type(name: &str) -> Option<PhysicalDeviceType> {
    match name {
        "" | "discrete" => Some(PhysicalDeviceType::DiscreteGpu),
        "integrated" => Some(PhysicalDeviceType::IntegratedGpu),
        "virtual" => Some(PhysicalDeviceType::VirtualGpu),
        "cpu" => Some(PhysicalDeviceType::Cpu),
        "other" => Some(PhysicalDeviceType::Other),
        _ => None,
    }
}

/// How much a device type is wanted, higher is better
fn device_type_score(device_type: PhysicalDeviceType, preferred: PhysicalDeviceType) -> u8 {
    match device_type {
        ty if ty == preferred => 6,
        PhysicalDeviceType::DiscreteGpu => 5,
        PhysicalDeviceType::VirtualGpu => 4,
        PhysicalDeviceType::IntegratedGpu => 3,
        PhysicalDeviceType::Cpu => 2,
        PhysicalDeviceType::Other => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulkano::device::physical::PhysicalDeviceType::{Cpu, DiscreteGpu, IntegratedGpu};

    #[test]
    fn device_type_names() {
        for (name, expected) in [
            ("", Some(DiscreteGpu)),
            ("integrated", Some(IntegratedGpu)),
            ("cpu", Some(Cpu)),
            ("Integrated", None),
            ("gpu", None),
        ] {
            assert_eq!(parse_device_type(name), expected, "{name:?}");
        }
    }

    #[test]
    fn device_type_ranking() {
        let by_default = |ty| device_type_score(ty, DiscreteGpu);
        assert!(by_default(DiscreteGpu) > by_default(IntegratedGpu));
        assert!(by_default(IntegratedGpu) > by_default(Cpu));

        let cpu_first = |ty| device_type_score(ty, Cpu);
        assert!(cpu_first(Cpu) > cpu_first(DiscreteGpu));
    }
}
