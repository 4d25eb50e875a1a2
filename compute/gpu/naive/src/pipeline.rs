//! Simulation pipeline

use crate::Result;
use compute::gpu::{ShaderRequirements, VulkanContext};
use data::cells::gpu::{BufferContext, DeviceCells};
use std::{collections::hash_map::Entry, sync::Arc};
use vulkano::{
    command_buffer::{allocator::CommandBufferAllocator, AutoCommandBufferBuilder},
    descriptor_set::{PersistentDescriptorSet, WriteDescriptorSet},
    device::physical::PhysicalDevice,
    pipeline::{
        compute::ComputePipelineCreateInfo, layout::PipelineDescriptorSetLayoutCreateInfo,
        ComputePipeline, Pipeline, PipelineBindPoint, PipelineLayout,
        PipelineShaderStageCreateInfo,
    },
};

/// Work-group size hardcoded in this specific shader
pub(crate) const WORK_GROUP_SIZE: u32 = 64;

/// Device resources used by the simulation shader
pub(crate) const REQUIREMENTS: ShaderRequirements = ShaderRequirements {
    work_group_size: WORK_GROUP_SIZE,
    storage_buffers: 2,
    push_constants_size: std::mem::size_of::<shader::Shape>() as u32,
};

/// Create the simulation pipeline
pub(crate) fn create(context: &VulkanContext) -> Result<Arc<ComputePipeline>> {
    // Load the compute shader
    let shader = shader::load(context.device.clone())?;
    context.set_debug_utils_object_name(shader.as_ref(), || "Simulation stepper shader".into())?;
    let entry_point = shader.entry_point("main").expect("Should be present");

    // Set up the pipeline layout, which is fully described by the shader
    let stage = PipelineShaderStageCreateInfo::new(entry_point);
    let layout = PipelineLayout::new(
        context.device.clone(),
        PipelineDescriptorSetLayoutCreateInfo::from_stages([&stage])
            .into_pipeline_layout_create_info(context.device.clone())?,
    )?;

    // Set up the compute pipeline
    let pipeline = ComputePipeline::new(
        context.device.clone(),
        Some(context.pipeline_cache.clone()),
        ComputePipelineCreateInfo::stage_layout(stage, layout),
    )?;
    context.set_debug_utils_object_name(pipeline.as_ref(), || "Simulation stepper".into())?;
    Ok(pipeline)
}

/// Bind the pipeline and the board shape
pub(crate) fn bind_pipeline<A: CommandBufferAllocator>(
    builder: &mut AutoCommandBufferBuilder<impl Sized, A>,
    pipeline: Arc<ComputePipeline>,
    [height, width]: [usize; 2],
) -> Result<()> {
    let layout = pipeline.layout().clone();
    let shape = shader::Shape {
        height: u32::try_from(height).expect("Checked by cell allocation"),
        width: u32::try_from(width).expect("Checked by cell allocation"),
    };
    builder
        .bind_pipeline_compute(pipeline)?
        .push_constants(layout, 0, shape)?;
    Ok(())
}

/// Number of work-groups to be dispatched for a certain board shape
///
/// Ideally there is one shader invocation per cell, but the dispatch is
/// capped by device limits and by the optional `max_work_groups` setting. The
/// shader's grid-stride loop takes care of the cells beyond the dispatch.
pub(crate) fn dispatch_size(
    device: &PhysicalDevice,
    [height, width]: [usize; 2],
    max_work_groups: Option<u32>,
) -> [u32; 3] {
    let num_cells = u32::try_from(height * width).expect("Checked by cell allocation");
    let device_max = device.properties().max_compute_work_group_count[0];
    let num_work_groups = num_cells
        .div_ceil(WORK_GROUP_SIZE)
        .min(device_max)
        .min(max_work_groups.unwrap_or(u32::MAX))
        .max(1);
    [num_work_groups, 1, 1]
}

/// Get the descriptor set for a particular (input, output) configuration
///
/// Descriptor sets are cached in the BufferContext, so they only need to be
/// created on the first two simulation steps.
pub(crate) fn cells_set(
    context: &VulkanContext,
    pipeline: &ComputePipeline,
    buffer_context: &mut BufferContext,
    [input, output]: [DeviceCells; 2],
) -> Result<Arc<PersistentDescriptorSet>> {
    match buffer_context
        .descriptor_sets
        .entry([input.clone(), output.clone()])
    {
        Entry::Occupied(occupied) => Ok(occupied.get().clone()),
        Entry::Vacant(vacant) => {
            let layout = pipeline.layout().set_layouts()[CELLS_SET as usize].clone();
            let descriptor_set = PersistentDescriptorSet::new(
                context.descriptor_set_allocator.as_ref(),
                layout,
                [
                    WriteDescriptorSet::buffer(INPUT, input),
                    WriteDescriptorSet::buffer(OUTPUT, output),
                ],
                [],
            )?;
            // FIXME: Name this descriptor set once vulkano allows for it
            Ok(vacant.insert(descriptor_set).clone())
        }
    }
}

/// Buffers to be bound as `[input, output]` on the `step`-th recorded step
///
/// Each step reads the output of the previous one, so the two buffers of a
/// generation pair trade roles on every step.
pub(crate) fn step_bindings<T>([current, next]: [T; 2], step: usize) -> [T; 2] {
    if step % 2 == 0 {
        [current, next]
    } else {
        [next, current]
    }
}

/// Record a simulation step
pub(crate) fn record_step<A: CommandBufferAllocator>(
    builder: &mut AutoCommandBufferBuilder<impl Sized, A>,
    pipeline: &ComputePipeline,
    cells: Arc<PersistentDescriptorSet>,
    dispatch_size: [u32; 3],
) -> Result<()> {
    builder
        .bind_descriptor_sets(
            PipelineBindPoint::Compute,
            pipeline.layout().clone(),
            CELLS_SET,
            cells,
        )?
        .dispatch(dispatch_size)?;
    Ok(())
}

/// Compute shader used for GPU-side simulation
mod shader {
    vulkano_shaders::shader! {
        ty: "compute",
        vulkan_version: "1.0",
        spirv_version: "1.0",
        path: "src/main.comp",
    }
}

/// Shader descriptor set to which input and output cells are bound
const CELLS_SET: u32 = 0;

/// Descriptor within `CELLS_SET` for reading the current generation
const INPUT: u32 = 0;

/// Descriptor within `CELLS_SET` for writing the next generation
const OUTPUT: u32 = 1;
