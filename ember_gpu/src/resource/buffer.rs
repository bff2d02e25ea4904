/// Buffer resource: a device buffer, its allocation and an optional persistent mapping.
///
/// Host-visible buffers are mapped once at creation and stay mapped until
/// `destroy`. Teardown goes through the resource's deletion queue, so a buffer
/// whose mapping failed still frees its allocation.

use std::ptr::NonNull;

use crate::device::{BufferDesc, BufferImageCopy, DeviceLink, ImageAspect, ImageLayout};
use crate::error::{Error, Result};
use crate::resource::{DeletionQueue, ImageResource, Teardown};
use crate::{engine_bail, engine_debug, engine_error, engine_trace, engine_warn};

const SOURCE: &str = "ember::Buffer";

/// GPU buffer bound to a device link
///
/// Dropping a buffer runs `destroy`. Like an explicit `destroy`, that is only
/// valid once the GPU no longer uses the buffer.
pub struct BufferResource<'a, D: DeviceLink> {
    link: &'a D,
    buffer: Option<D::Buffer>,
    allocation: Option<D::Allocation>,
    mapped: Option<NonNull<u8>>,
    size: u64,
    deletion_queue: DeletionQueue,
}

impl<'a, D: DeviceLink> BufferResource<'a, D> {
    /// A buffer that has not been created yet
    pub fn new(link: &'a D) -> Self {
        Self {
            link,
            buffer: None,
            allocation: None,
            mapped: None,
            size: 0,
            deletion_queue: DeletionQueue::new(),
        }
    }

    /// Allocate the buffer and, for host-visible memory, map it
    ///
    /// Returns the persistent mapping, or `None` for device-local memory.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if the buffer already exists or `desc.size` is zero
    /// - `AllocationFailed` / `OutOfMemory` from the allocator
    /// - the backend's error if mapping fails (the allocation stays queued for `destroy`)
    pub fn create(&mut self, desc: &BufferDesc) -> Result<Option<NonNull<u8>>> {
        if self.buffer.is_some() {
            engine_bail!(SOURCE, InvalidResource => "Buffer already created; destroy it before creating again");
        }
        if desc.size == 0 {
            engine_bail!(SOURCE, InvalidResource => "Buffer size must be non-zero");
        }

        let (buffer, allocation) = self.link.create_buffer(desc)?;
        let mapping = desc
            .memory
            .is_host_visible()
            .then(|| self.link.map_allocation(&allocation));

        self.buffer = Some(buffer);
        self.allocation = Some(allocation);
        self.size = desc.size;
        self.deletion_queue.register(Teardown::BufferAllocation)?;

        if let Some(mapping) = mapping {
            self.mapped = Some(mapping?);
            self.deletion_queue.register(Teardown::Mapping)?;
        }

        engine_debug!(
            SOURCE,
            "Created buffer {:?} ({} bytes, {:?}, {:?}, mapped: {})",
            buffer,
            desc.size,
            desc.usage,
            desc.memory,
            self.mapped.is_some()
        );
        Ok(self.mapped)
    }

    /// Copy the buffer's first `width * height` texels into mip 0 of `image`
    ///
    /// The image must be in `TransferDst`. Blocks until the copy completed.
    pub fn copy_to_image(&self, image: &ImageResource<'_, D>, width: u32, height: u32) -> Result<()> {
        let buffer = self.require_handle()?;
        let (target, format) = match (image.image(), image.desc()) {
            (Some(target), Some(desc)) => (target, desc.format),
            _ => engine_bail!(SOURCE, InvalidResource => "Copy into an image that was never created"),
        };
        if image.layout() != ImageLayout::TransferDst {
            engine_error!(
                SOURCE,
                "Copy into image {:?} requires TransferDst but it is in {:?}",
                target,
                image.layout()
            );
            return Err(Error::LayoutMismatch {
                expected: ImageLayout::TransferDst,
                actual: image.layout(),
            });
        }
        self.check_region(image, width, height, format.bytes_per_pixel())?;

        let aspect = if format.is_depth() { ImageAspect::DEPTH } else { ImageAspect::COLOR };
        let region = BufferImageCopy { aspect, width, height };
        self.link
            .one_shot(|cb| self.link.cmd_copy_buffer_to_image(cb, buffer, target, &region))?;

        engine_trace!(SOURCE, "Copied {}x{} texels from {:?} into {:?}", width, height, buffer, target);
        Ok(())
    }

    /// Release everything the buffer holds, newest first
    ///
    /// Safe to call any number of times, including on a buffer never created.
    pub fn destroy(&mut self) {
        let mut queue = std::mem::take(&mut self.deletion_queue);
        if queue.is_empty() {
            return;
        }
        let handle = self.buffer;
        queue.run_all(|step| self.teardown(step));
        self.size = 0;
        engine_debug!(SOURCE, "Destroyed buffer {:?}", handle);
    }

    fn teardown(&mut self, step: Teardown) {
        match step {
            Teardown::Mapping => {
                if self.mapped.take().is_some() {
                    if let Some(allocation) = self.allocation.as_ref() {
                        self.link.unmap_allocation(allocation);
                    }
                }
            }
            Teardown::BufferAllocation => {
                if let (Some(buffer), Some(allocation)) = (self.buffer.take(), self.allocation.take()) {
                    self.link.destroy_buffer(buffer, allocation);
                }
            }
            other => engine_warn!(SOURCE, "Ignoring teardown {:?} on a buffer", other),
        }
    }

    // ===== ACCESSORS =====

    /// Native handle, `None` until created
    pub fn handle(&self) -> Option<D::Buffer> {
        self.buffer
    }

    pub fn is_created(&self) -> bool {
        self.buffer.is_some()
    }

    /// Size in bytes (0 until created)
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Persistent mapping, `None` for device-local or destroyed buffers
    pub fn mapped_ptr(&self) -> Option<NonNull<u8>> {
        self.mapped
    }

    /// View of the mapped bytes
    pub fn mapped_bytes(&self) -> Option<&[u8]> {
        // The mapping covers `size` bytes and lives until `destroy`, which needs `&mut self`.
        self.mapped
            .map(|ptr| unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.size as usize) })
    }

    /// Mutable view of the mapped bytes
    pub fn mapped_bytes_mut(&mut self) -> Option<&mut [u8]> {
        let size = self.size as usize;
        self.mapped
            .map(|ptr| unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    /// Write raw bytes at `offset` through the mapping
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let size = self.size;
        let Some(bytes) = self.mapped_bytes_mut() else {
            engine_bail!(SOURCE, InvalidResource => "Buffer is not host-mapped");
        };
        let end = offset.checked_add(data.len() as u64).filter(|&end| end <= size);
        match end {
            Some(end) => {
                bytes[offset as usize..end as usize].copy_from_slice(data);
                Ok(())
            }
            None => engine_bail!(
                SOURCE,
                InvalidResource => "Write of {} bytes at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                size
            ),
        }
    }

    /// Write plain-old-data values at `offset` through the mapping
    pub fn write_pod<T: bytemuck::Pod>(&mut self, offset: u64, values: &[T]) -> Result<()> {
        self.write(offset, bytemuck::cast_slice(values))
    }

    fn require_handle(&self) -> Result<D::Buffer> {
        match self.buffer {
            Some(buffer) => Ok(buffer),
            None => engine_bail!(SOURCE, InvalidResource => "Buffer was never created"),
        }
    }

    /// Reject copies that overrun this buffer or the image's mip 0
    pub(crate) fn check_region(
        &self,
        image: &ImageResource<'_, D>,
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
    ) -> Result<()> {
        let (image_width, image_height) = image.extent().unwrap_or((0, 0));
        if width == 0 || height == 0 || width > image_width || height > image_height {
            engine_bail!(
                SOURCE,
                InvalidResource => "Copy region {}x{} does not fit image extent {}x{}",
                width,
                height,
                image_width,
                image_height
            );
        }
        let required = width as u64 * height as u64 * bytes_per_pixel as u64;
        if required > self.size {
            engine_bail!(
                SOURCE,
                InvalidResource => "Copy of {} bytes exceeds buffer size {}",
                required,
                self.size
            );
        }
        Ok(())
    }
}

impl<D: DeviceLink> Drop for BufferResource<'_, D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
