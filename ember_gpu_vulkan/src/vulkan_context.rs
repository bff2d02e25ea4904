/// GpuContext - the Vulkan device link every resource borrows
///
/// Contains everything resources need for GPU operations:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Queue for one-shot submissions
/// - Command pool for one-shot command buffers
///
/// The context never destroys the device or the command pool. Whoever created
/// them (`VulkanDevice`, or the embedding engine) releases the allocator with
/// `release_allocator` and then destroys them.

use ash::vk;
use ember_gpu::ember::device::{
    BufferDesc, BufferImageCopy, DeviceLink, ImageBarrier, ImageCreateDesc, ImageTiling,
    ImageViewDesc, SamplerDesc,
};
use ember_gpu::ember::{Error, Result, Settings};
use ember_gpu::{engine_err, engine_error, engine_trace};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::AllocationError;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::vulkan_convert::{
    access_to_vk, address_mode_to_vk, aspect_to_vk, border_color_to_vk, buffer_usage_to_vk,
    filter_to_vk, format_to_vk, image_usage_to_vk, layout_to_vk, memory_location,
    mipmap_mode_to_vk, sample_count_to_vk, stages_to_vk, tiling_to_vk,
};
use crate::vulkan_one_shot;

const SOURCE: &str = "ember::vulkan";

/// Vulkan implementation of `DeviceLink`
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety)
    /// Wrapped in ManuallyDrop so it can be released BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for one-shot submissions
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Command pool for one-shot command buffers
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    upload_command_pool: Mutex<vk::CommandPool>,

    /// Resource settings, already clamped to the device limits
    settings: Settings,
}

/// Map an allocator failure to the engine error taxonomy
fn allocation_error(what: &str, size: u64, e: AllocationError) -> Error {
    match e {
        AllocationError::OutOfMemory => {
            let size_mb = size as f64 / (1024.0 * 1024.0);
            engine_error!(SOURCE, "Out of GPU memory for {} ({:.2} MB)", what, size_mb);
            Error::OutOfMemory
        }
        other => {
            engine_error!(SOURCE, "Failed to allocate memory for {}: {}", what, other);
            Error::AllocationFailed(format!("{}: {}", what, other))
        }
    }
}

fn creation_error(what: &str, e: vk::Result) -> Error {
    engine_error!(SOURCE, "Failed to create {}: {:?}", what, e);
    Error::ResourceCreationFailed(format!("{}: {:?}", what, e))
}

impl GpuContext {
    /// Create a new GPU context from handles the caller owns
    ///
    /// # Arguments
    ///
    /// * `device` - Vulkan logical device
    /// * `allocator` - GPU memory allocator
    /// * `graphics_queue` - Queue used for one-shot submissions
    /// * `graphics_queue_family` - Family of `graphics_queue`
    /// * `upload_command_pool` - Pool on that family, created with RESET_COMMAND_BUFFER
    /// * `settings` - Resource settings (anisotropy level)
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
        settings: Settings,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            graphics_queue_family,
            upload_command_pool: Mutex::new(upload_command_pool),
            settings,
        }
    }

    /// Command pool one-shot command buffers are allocated from
    pub fn command_pool(&self) -> vk::CommandPool {
        match self.upload_command_pool.lock() {
            Ok(pool) => *pool,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Drop this context's reference to the allocator
    ///
    /// # Safety
    ///
    /// Must be called exactly once, after every resource created from this
    /// context was destroyed and before the device is destroyed. No
    /// `DeviceLink` method may be called afterwards.
    pub unsafe fn release_allocator(&mut self) {
        unsafe { ManuallyDrop::drop(&mut self.allocator) };
    }

    fn lock_allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!(SOURCE, "GPU allocator lock poisoned"))
    }

    fn lock_pool(&self) -> Result<MutexGuard<'_, vk::CommandPool>> {
        self.upload_command_pool
            .lock()
            .map_err(|_| engine_err!(SOURCE, "One-shot command pool lock poisoned"))
    }

    /// Allocate memory for `requirements` and hand it back, or free nothing and fail
    fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: gpu_allocator::MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        self.lock_allocator()?
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| allocation_error(name, requirements.size, e))
    }

    fn free(&self, allocation: Allocation) {
        match self.allocator.lock() {
            Ok(mut allocator) => {
                if let Err(e) = allocator.free(allocation) {
                    engine_error!(SOURCE, "Failed to free GPU allocation: {}", e);
                }
            }
            Err(_) => engine_error!(SOURCE, "GPU allocator lock poisoned; allocation leaked"),
        }
    }
}

impl DeviceLink for GpuContext {
    type Buffer = vk::Buffer;
    type Image = vk::Image;
    type ImageView = vk::ImageView;
    type Sampler = vk::Sampler;
    type Allocation = Allocation;
    type CommandBuffer = vk::CommandBuffer;

    fn settings(&self) -> &Settings {
        &self.settings
    }

    // ===== BUFFERS =====

    fn create_buffer(&self, desc: &BufferDesc) -> Result<(vk::Buffer, Allocation)> {
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self.device.create_buffer(&create_info, None).map_err(|e| {
                engine_error!(SOURCE, "Failed to create buffer of size {} bytes: {:?}", desc.size, e);
                Error::AllocationFailed(format!("vkCreateBuffer: {:?}", e))
            })?;

            let requirements = self.device.get_buffer_memory_requirements(buffer);
            let allocation = match self.allocate("buffer", requirements, memory_location(desc.memory), true) {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = self.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                self.free(allocation);
                self.device.destroy_buffer(buffer, None);
                return Err(engine_err!(SOURCE, "Failed to bind buffer memory: {:?}", e));
            }

            Ok((buffer, allocation))
        }
    }

    fn destroy_buffer(&self, buffer: vk::Buffer, allocation: Allocation) {
        self.free(allocation);
        unsafe {
            self.device.destroy_buffer(buffer, None);
        }
    }

    /// gpu-allocator maps host-visible memory for the allocation's whole life
    fn map_allocation(&self, allocation: &Allocation) -> Result<NonNull<u8>> {
        allocation
            .mapped_ptr()
            .map(|ptr| ptr.cast::<u8>())
            .ok_or_else(|| engine_err!(SOURCE, "Allocation is not host visible"))
    }

    fn unmap_allocation(&self, allocation: &Allocation) {
        // The mapping is released with the allocation itself.
        engine_trace!(SOURCE, "Released mapping of allocation at offset {}", allocation.offset());
    }

    // ===== IMAGES =====

    fn create_image(&self, desc: &ImageCreateDesc) -> Result<(vk::Image, Allocation)> {
        unsafe {
            let create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format_to_vk(desc.format))
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(desc.mip_levels)
                .array_layers(1)
                .samples(sample_count_to_vk(desc.samples))
                .tiling(tiling_to_vk(desc.tiling))
                .usage(image_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self.device.create_image(&create_info, None).map_err(|e| {
                engine_error!(
                    SOURCE,
                    "Failed to create {}x{} {:?} image: {:?}",
                    desc.width,
                    desc.height,
                    desc.format,
                    e
                );
                Error::AllocationFailed(format!("vkCreateImage: {:?}", e))
            })?;

            let requirements = self.device.get_image_memory_requirements(image);
            let linear = desc.tiling == ImageTiling::Linear;
            let allocation = match self.allocate("image", requirements, memory_location(desc.memory), linear) {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            if let Err(e) = self.device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                self.free(allocation);
                self.device.destroy_image(image, None);
                return Err(engine_err!(SOURCE, "Failed to bind image memory: {:?}", e));
            }

            Ok((image, allocation))
        }
    }

    fn destroy_image(&self, image: vk::Image, allocation: Allocation) {
        self.free(allocation);
        unsafe {
            self.device.destroy_image(image, None);
        }
    }

    fn create_image_view(&self, image: vk::Image, desc: &ImageViewDesc) -> Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format_to_vk(desc.format))
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_to_vk(desc.aspect),
                base_mip_level: 0,
                level_count: desc.mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe {
            self.device
                .create_image_view(&create_info, None)
                .map_err(|e| creation_error("image view", e))
        }
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe {
            self.device.destroy_image_view(view, None);
        }
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<vk::Sampler> {
        let address_mode = address_mode_to_vk(desc.address_mode);
        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(desc.mag_filter))
            .min_filter(filter_to_vk(desc.min_filter))
            .mipmap_mode(mipmap_mode_to_vk(desc.mipmap_mode))
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .anisotropy_enable(desc.max_anisotropy.is_some())
            .max_anisotropy(desc.max_anisotropy.unwrap_or(1.0))
            .border_color(border_color_to_vk(desc.border_color))
            .unnormalized_coordinates(false)
            .compare_enable(desc.compare_enable)
            .compare_op(vk::CompareOp::ALWAYS)
            .mip_lod_bias(desc.mip_lod_bias)
            .min_lod(desc.min_lod)
            .max_lod(desc.max_lod);

        unsafe {
            self.device
                .create_sampler(&create_info, None)
                .map_err(|e| creation_error("sampler", e))
        }
    }

    fn destroy_sampler(&self, sampler: vk::Sampler) {
        unsafe {
            self.device.destroy_sampler(sampler, None);
        }
    }

    // ===== ONE-SHOT COMMANDS =====

    fn begin_one_shot(&self) -> Result<vk::CommandBuffer> {
        let pool = self.lock_pool()?;
        unsafe { vulkan_one_shot::begin(&self.device, *pool) }
    }

    fn end_one_shot(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        let pool = self.lock_pool()?;
        unsafe { vulkan_one_shot::submit_and_wait(&self.device, self.graphics_queue, *pool, command_buffer) }
    }

    fn cmd_image_barrier(&self, command_buffer: vk::CommandBuffer, image: vk::Image, barrier: &ImageBarrier) {
        let image_barrier = vk::ImageMemoryBarrier::default()
            .old_layout(layout_to_vk(barrier.old_layout))
            .new_layout(layout_to_vk(barrier.new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_to_vk(barrier.aspect),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            })
            .src_access_mask(access_to_vk(barrier.src_access))
            .dst_access_mask(access_to_vk(barrier.dst_access));

        unsafe {
            self.device.cmd_pipeline_barrier(
                command_buffer,
                stages_to_vk(barrier.src_stage),
                stages_to_vk(barrier.dst_stage),
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[image_barrier],
            );
        }
    }

    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        image: vk::Image,
        region: &BufferImageCopy,
    ) {
        unsafe {
            self.device.cmd_copy_buffer_to_image(
                command_buffer,
                buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[copy_region(region)],
            );
        }
    }

    fn cmd_copy_image_to_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        buffer: vk::Buffer,
        region: &BufferImageCopy,
    ) {
        unsafe {
            self.device.cmd_copy_image_to_buffer(
                command_buffer,
                image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                buffer,
                &[copy_region(region)],
            );
        }
    }
}

/// Tightly packed region at buffer offset 0 and image offset (0, 0, 0), mip 0, layer 0
fn copy_region(region: &BufferImageCopy) -> vk::BufferImageCopy {
    vk::BufferImageCopy::default()
        .buffer_offset(0)
        .buffer_row_length(0)
        .buffer_image_height(0)
        .image_subresource(vk::ImageSubresourceLayers {
            aspect_mask: aspect_to_vk(region.aspect),
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        })
        .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
        .image_extent(vk::Extent3D {
            width: region.width,
            height: region.height,
            depth: 1,
        })
}
