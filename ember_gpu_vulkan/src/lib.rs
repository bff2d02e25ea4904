/*!
# Ember GPU - Vulkan Backend

Vulkan implementation of the `ember_gpu` device link.

This crate provides a headless Vulkan bootstrap (`VulkanDevice`) and the
`GpuContext` device link, using the Ash library for Vulkan bindings and
gpu-allocator for memory management.

# Example

```no_run
use ember_gpu::ember::Config;
use ember_gpu::ember::device::{BufferDesc, BufferUsage, MemoryUsage};
use ember_gpu_vulkan::{Buffer, VulkanDevice};

let device = VulkanDevice::new(Config::default())?;
let mut staging = Buffer::new(device.context());
staging.create(&BufferDesc {
    size: 1024,
    usage: BufferUsage::TRANSFER_SRC,
    memory: MemoryUsage::CpuToGpu,
})?;
staging.destroy();
# Ok::<(), ember_gpu::ember::Error>(())
```
*/

mod vulkan_context;
mod vulkan_convert;
mod vulkan_device;
mod vulkan_one_shot;
#[cfg(feature = "vulkan-validation")]
mod debug;

use ember_gpu::ember::resource::{BufferResource, ImageResource};

pub use vulkan_context::GpuContext;
pub use vulkan_convert::vertex_input_descriptions;
pub use vulkan_device::VulkanDevice;

/// Buffer resource bound to the Vulkan device link
pub type Buffer<'a> = BufferResource<'a, GpuContext>;

/// Image resource bound to the Vulkan device link
pub type Image<'a> = ImageResource<'a, GpuContext>;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{print_validation_stats_report, validation_stats, ValidationStats};
