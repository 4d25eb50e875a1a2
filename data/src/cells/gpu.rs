//! Device-resident cell storage
//!
//! Cells are stored as one 32-bit integer per cell in a device-local storage
//! buffer, in the same row-major order as on the host. Shaders can then index
//! them directly as `uint[]`, at the expense of 4x more memory traffic than the
//! host representation.

use super::{Cells, CowBoard};
use crate::{
    board::{self, Board, BoardView},
    Cell,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use vulkano::{
    buffer::{AllocateBufferError, Buffer, BufferCreateInfo, BufferUsage, Subbuffer},
    command_buffer::{
        allocator::StandardCommandBufferAllocator, AutoCommandBufferBuilder,
        CommandBufferExecError, CommandBufferUsage, CopyBufferInfo,
    },
    descriptor_set::PersistentDescriptorSet,
    device::{Device, DeviceOwned, DeviceOwnedVulkanObject, Queue},
    memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator},
    sync::{GpuFuture, HostAccessError},
    DeviceSize, Validated, ValidationError, VulkanError,
};

/// Representation of a cell on the device side
pub type DeviceCell = u32;

/// Device buffer containing a full grid of cells
pub type DeviceCells = Subbuffer<[DeviceCell]>;

/// Buffer-based Cells implementation
///
/// Data only lives on the device. Uploads and downloads go through temporary
/// host-visible staging buffers, which is fine because they only happen when
/// the simulation starts and when the results are read out.
pub struct BufferCells {
    /// Device-side cells
    buffer: DeviceCells,

    /// Shape of the grid
    shape: [usize; 2],
}
//
impl Cells for BufferCells {
    type Context = BufferContext;

    type Error = Error;

    fn allocate(context: &mut BufferContext, shape: [usize; 2]) -> Result<Self> {
        let len = context.check_shape(shape)?;
        let buffer = Buffer::new_slice::<DeviceCell>(
            context.memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::STORAGE_BUFFER
                    | BufferUsage::TRANSFER_SRC
                    | BufferUsage::TRANSFER_DST,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE,
                ..Default::default()
            },
            len,
        )?;
        if cfg!(feature = "gpu-debug-utils") {
            buffer
                .buffer()
                .set_debug_utils_object_name(Some("Device cells"))?;
        }
        Ok(Self { buffer, shape })
    }

    fn shape(&self) -> [usize; 2] {
        self.shape
    }

    fn write_board(&mut self, context: &mut BufferContext, board: BoardView<'_>) -> Result<()> {
        assert_eq!(
            board::shape(&board),
            self.shape,
            "Board shape doesn't match"
        );
        let staging = Buffer::from_iter(
            context.memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::TRANSFER_SRC,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_HOST
                    | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            board.iter().map(|&cell| DeviceCell::from(cell)),
        )?;
        context.copy(staging, self.buffer.clone(), "Cell upload")
    }

    fn make_board_view(&mut self, context: &mut BufferContext) -> Result<CowBoard<'_>> {
        let staging = Buffer::new_slice::<DeviceCell>(
            context.memory_allocator.clone(),
            BufferCreateInfo {
                usage: BufferUsage::TRANSFER_DST,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_HOST
                    | MemoryTypeFilter::HOST_RANDOM_ACCESS,
                ..Default::default()
            },
            self.buffer.len(),
        )?;
        context.copy(self.buffer.clone(), staging.clone(), "Cell download")?;
        let cells = staging
            .read()?
            .iter()
            .map(|&cell| Cell::from(cell != 0))
            .collect::<Vec<_>>();
        let board = Board::from_shape_vec(self.shape, cells)
            .expect("Staging buffer length should match the grid shape");
        Ok(board.into())
    }
}
//
impl BufferCells {
    /// Access the inner buffer for GPU work
    ///
    /// Do not cache this buffer across simulation steps, as the buffer that
    /// holds the current generation changes from one step to the next.
    pub fn access_buffer(&self) -> &DeviceCells {
        &self.buffer
    }
}

/// External state needed to manipulate BufferCells
pub struct BufferContext {
    /// Descriptor set cache
    ///
    /// This member is not used by BufferContext methods and purely provided
    /// for the benefit of compute backends, which bind pairs of input and
    /// output buffers to their shaders. Since the two buffers of a simulation
    /// merely trade roles between steps, only two descriptor sets should ever
    /// need to be created.
    pub descriptor_sets: HashMap<[DeviceCells; 2], Arc<PersistentDescriptorSet>>,

    /// Buffer allocator
    memory_allocator: Arc<StandardMemoryAllocator>,

    /// Command buffer allocator
    command_allocator: Arc<StandardCommandBufferAllocator>,

    /// Queue used for host/device transfers
    queue: Arc<Queue>,
}
//
impl BufferContext {
    /// Prepare to set up buffer-based cells
    pub fn new(
        memory_allocator: Arc<StandardMemoryAllocator>,
        command_allocator: Arc<StandardCommandBufferAllocator>,
        queue: Arc<Queue>,
    ) -> Self {
        assert!(
            memory_allocator.device() == queue.device()
                && command_allocator.device() == queue.device(),
            "All specified entities should map to the same Vulkan device"
        );
        Self {
            descriptor_sets: HashMap::new(),
            memory_allocator,
            command_allocator,
            queue,
        }
    }

    /// Device on which cells are allocated
    pub fn device(&self) -> &Arc<Device> {
        self.queue.device()
    }

    /// Check that a grid shape can be stored, return the number of cells
    ///
    /// Shaders use 32-bit cell indices, and the full grid must fit in a single
    /// storage buffer binding.
    fn check_shape(&self, shape @ [height, width]: [usize; 2]) -> Result<DeviceSize> {
        let unsupported = || Error::UnsupportedShape(shape);
        let len = height.checked_mul(width).ok_or_else(unsupported)?;
        let max_range = self
            .device()
            .physical_device()
            .properties()
            .max_storage_buffer_range;
        let len32 = u32::try_from(len).map_err(|_| unsupported())?;
        let bytes = len32
            .checked_mul(std::mem::size_of::<DeviceCell>() as u32)
            .ok_or_else(unsupported)?;
        if len == 0 || bytes > max_range {
            return Err(unsupported());
        }
        Ok(DeviceSize::from(len32))
    }

    /// Synchronously copy the contents of a buffer into another
    fn copy(&mut self, src: DeviceCells, dst: DeviceCells, name: &str) -> Result<()> {
        let mut builder = AutoCommandBufferBuilder::primary(
            self.command_allocator.as_ref(),
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )?;
        builder.copy_buffer(CopyBufferInfo::buffers(src, dst))?;
        let commands = builder.build()?;

        if cfg!(feature = "gpu-debug-utils") {
            commands.set_debug_utils_object_name(Some(name))?;
        }
        trace!("Submitting {name}");

        vulkano::sync::now(self.device().clone())
            .then_execute(self.queue.clone(), commands)?
            .then_signal_fence_and_flush()?
            .wait(None)?;
        Ok(())
    }
}

/// Errors that can occur while using device cells
#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error("failed to execute a command buffer ({0})")]
    CommandBufferExec(#[from] CommandBufferExecError),

    #[error("failed to create a data buffer ({0})")]
    Buffer(#[from] Validated<AllocateBufferError>),

    #[error("failed to access data from the host ({0})")]
    HostAccess(#[from] HostAccessError),

    #[error("grid shape {0:?} cannot be stored on this device")]
    UnsupportedShape([usize; 2]),

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
