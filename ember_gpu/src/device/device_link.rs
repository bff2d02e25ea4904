/// DeviceLink - the capability every GPU resource is constructed with
///
/// A device link bundles the logical device, the memory allocator, the graphics
/// queue and a command pool. Resources borrow it (`&'a D`), so the borrow
/// checker guarantees the link outlives every resource created from it.
/// Resources never release anything the link owns.

use std::fmt::Debug;
use std::ptr::NonNull;

use crate::config::Settings;
use crate::device::{
    BufferDesc, BufferImageCopy, ImageBarrier, ImageCreateDesc, ImageViewDesc, SamplerDesc,
};
use crate::error::Result;

/// Device, allocator, queue and command pool, as seen by resources
///
/// All `cmd_*` methods record into a command buffer obtained from
/// `begin_one_shot`; nothing executes until `end_one_shot` submits it.
pub trait DeviceLink {
    /// Native buffer handle
    type Buffer: Copy + PartialEq + Debug;
    /// Native image handle
    type Image: Copy + PartialEq + Debug;
    /// Native image view handle
    type ImageView: Copy + PartialEq + Debug;
    /// Native sampler handle
    type Sampler: Copy + PartialEq + Debug;
    /// Memory allocation backing a buffer or image (moved back on free)
    type Allocation: Debug;
    /// Primary command buffer used for one-shot submissions
    type CommandBuffer: Copy + Debug;

    /// Resource settings (anisotropy level, ...)
    fn settings(&self) -> &Settings;

    // ===== BUFFERS =====

    /// Create a buffer and bind freshly allocated memory to it
    ///
    /// Fails with `AllocationFailed` or `OutOfMemory`; nothing is leaked on failure.
    fn create_buffer(&self, desc: &BufferDesc) -> Result<(Self::Buffer, Self::Allocation)>;

    /// Destroy a buffer and free its allocation
    fn destroy_buffer(&self, buffer: Self::Buffer, allocation: Self::Allocation);

    /// Map a host-visible allocation, returning a pointer valid until unmapped
    fn map_allocation(&self, allocation: &Self::Allocation) -> Result<NonNull<u8>>;

    /// Release a mapping obtained from `map_allocation`
    fn unmap_allocation(&self, allocation: &Self::Allocation);

    // ===== IMAGES =====

    /// Create a 2D image in the `Undefined` layout and bind memory to it
    fn create_image(&self, desc: &ImageCreateDesc) -> Result<(Self::Image, Self::Allocation)>;

    /// Destroy an image and free its allocation
    fn destroy_image(&self, image: Self::Image, allocation: Self::Allocation);

    /// Create a view over an image
    fn create_image_view(&self, image: Self::Image, desc: &ImageViewDesc) -> Result<Self::ImageView>;

    /// Destroy an image view
    fn destroy_image_view(&self, view: Self::ImageView);

    /// Create a sampler
    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Self::Sampler>;

    /// Destroy a sampler
    fn destroy_sampler(&self, sampler: Self::Sampler);

    // ===== ONE-SHOT COMMANDS =====

    /// Allocate a primary command buffer from the pool and begin it for a single submission
    fn begin_one_shot(&self) -> Result<Self::CommandBuffer>;

    /// End, submit alone on the graphics queue, wait for queue idle, then free
    ///
    /// The command buffer is freed on every path, including failures.
    fn end_one_shot(&self, command_buffer: Self::CommandBuffer) -> Result<()>;

    /// Record an image layout barrier
    fn cmd_image_barrier(
        &self,
        command_buffer: Self::CommandBuffer,
        image: Self::Image,
        barrier: &ImageBarrier,
    );

    /// Record a copy from a buffer into an image in `TransferDst` layout
    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: Self::CommandBuffer,
        buffer: Self::Buffer,
        image: Self::Image,
        region: &BufferImageCopy,
    );

    /// Record a copy from an image in `TransferSrc` layout into a buffer
    fn cmd_copy_image_to_buffer(
        &self,
        command_buffer: Self::CommandBuffer,
        image: Self::Image,
        buffer: Self::Buffer,
        region: &BufferImageCopy,
    );

    /// Begin a one-shot command buffer, let `record` fill it, then submit and wait
    ///
    /// Blocks the calling thread until the queue is idle.
    fn one_shot<R>(&self, record: impl FnOnce(Self::CommandBuffer) -> R) -> Result<R> {
        let command_buffer = self.begin_one_shot()?;
        let recorded = record(command_buffer);
        self.end_one_shot(command_buffer)?;
        Ok(recorded)
    }
}
