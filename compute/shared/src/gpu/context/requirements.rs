//! What a simulation needs from a Vulkan device

use vulkano::device::{physical::PhysicalDevice, Properties, QueueFlags};

/// Device resources used by a simulation's compute shader
///
/// The default value describes a shader which needs nothing beyond what every
/// Vulkan implementation must provide.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ShaderRequirements {
    /// Number of invocations in a one-dimensional work-group
    pub work_group_size: u32,

    /// Number of storage buffers bound at the same time
    pub storage_buffers: u32,

    /// Size of the push constant block, in bytes
    pub push_constants_size: u32,
}
//
impl ShaderRequirements {
    /// Requirements of a device which can run both `self` and `other`
    pub fn union(self, other: Self) -> Self {
        Self {
            work_group_size: self.work_group_size.max(other.work_group_size),
            storage_buffers: self.storage_buffers.max(other.storage_buffers),
            push_constants_size: self.push_constants_size.max(other.push_constants_size),
        }
    }

    /// Truth that a device with these limits can run the shader
    pub fn is_met_by(&self, properties: &Properties) -> bool {
        let buffers = self.storage_buffers;
        properties.max_compute_work_group_size[0] >= self.work_group_size
            && properties.max_compute_work_group_invocations >= self.work_group_size
            && (buffers == 0 || properties.max_bound_descriptor_sets >= 1)
            && properties.max_descriptor_set_storage_buffers >= buffers
            && properties.max_per_stage_descriptor_storage_buffers >= buffers
            && properties.max_per_set_descriptors.unwrap_or(u32::MAX) >= buffers
            && properties.max_per_stage_resources >= buffers
            && properties.max_push_constants_size >= self.push_constants_size
    }
}

/// Queue family which simulation commands should be submitted to, if any
pub fn compute_queue_family(device: &PhysicalDevice) -> Option<u32> {
    pick_queue_family(
        device
            .queue_family_properties()
            .iter()
            .map(|family| family.queue_flags),
    )
}

/// Pick a compute-capable queue family given the flags of each family
///
/// Families which also support graphics are most likely to be the main family
/// of the device, and are thus favored. Ties go to the first family.
fn pick_queue_family(families: impl IntoIterator<Item = QueueFlags>) -> Option<u32> {
    let mut best: Option<(bool, u32)> = None;
    for (idx, flags) in (0..).zip(families) {
        if !flags.contains(QueueFlags::COMPUTE) {
            continue;
        }
        let is_main = flags.contains(QueueFlags::GRAPHICS);
        if best.is_none_or(|(was_main, _)| is_main && !was_main) {
            best = Some((is_main, idx));
        }
    }
    best.map(|(_, idx)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_takes_the_largest_limits() {
        let a = ShaderRequirements {
            work_group_size: 64,
            storage_buffers: 1,
            push_constants_size: 16,
        };
        let b = ShaderRequirements {
            work_group_size: 32,
            storage_buffers: 2,
            push_constants_size: 8,
        };
        let expected = ShaderRequirements {
            work_group_size: 64,
            storage_buffers: 2,
            push_constants_size: 16,
        };
        assert_eq!(a.union(b), expected);
        assert_eq!(b.union(a), expected);
        assert_eq!(a.union(ShaderRequirements::default()), a);
    }

    #[test]
    fn queue_family_choice() {
        assert_eq!(pick_queue_family([QueueFlags::empty(); 0]), None);
        assert_eq!(pick_queue_family([QueueFlags::TRANSFER]), None);
        assert_eq!(
            pick_queue_family([QueueFlags::TRANSFER, QueueFlags::COMPUTE]),
            Some(1)
        );
        assert_eq!(
            pick_queue_family([
                QueueFlags::COMPUTE,
                QueueFlags::GRAPHICS | QueueFlags::COMPUTE,
                QueueFlags::GRAPHICS | QueueFlags::COMPUTE,
            ]),
            Some(1)
        );
        assert_eq!(
            pick_queue_family([QueueFlags::COMPUTE, QueueFlags::COMPUTE]),
            Some(0)
        );
    }
}
