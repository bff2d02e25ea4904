/// Image resource: image + allocation + view, plus a sampler for textures.
///
/// Layout state machine:
///
/// ```text
/// Texture:  Undefined --(upload)--> TransferDst --(sampler)--> ShaderReadOnly
/// Depth:    Undefined --(caller)--> DepthStencilAttachment
/// Color:    Undefined (TransferDst when created with a data source)
/// ```
///
/// The tracked layout changes only after the GPU finished the barrier.

use crate::device::{
    AccessFlags, BufferImageCopy, DeviceLink, Format, ImageAspect, ImageBarrier, ImageCreateDesc,
    ImageLayout, ImageTiling, ImageUsage, ImageViewDesc, MemoryUsage, PipelineStages, SampleCount,
    SamplerDesc,
};
use crate::error::{Error, Result};
use crate::resource::{BufferResource, DeletionQueue, LayoutTransition, Teardown};
use crate::{engine_bail, engine_debug, engine_error, engine_trace, engine_warn};

const SOURCE: &str = "ember::Image";

/// What an image is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Depth(-stencil) attachment
    Depth,
    /// Color attachment or storage target
    Color,
    /// Sampled texture; gets a sampler when uploaded
    Texture,
}

/// Descriptor for an image resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub format: Format,
    pub tiling: ImageTiling,
    pub samples: SampleCount,
    pub usage: ImageUsage,
    pub memory: MemoryUsage,
    pub mip_levels: u32,
    pub width: u32,
    pub height: u32,
    pub kind: ImageKind,
}

impl ImageDesc {
    /// Single-mip sampled texture in device-local memory
    pub fn texture(format: Format, width: u32, height: u32) -> Self {
        Self {
            format,
            tiling: ImageTiling::Optimal,
            samples: SampleCount::S1,
            usage: ImageUsage::SAMPLED | ImageUsage::TRANSFER_DST,
            memory: MemoryUsage::GpuOnly,
            mip_levels: 1,
            width,
            height,
            kind: ImageKind::Texture,
        }
    }

    /// Depth attachment in device-local memory
    pub fn depth(format: Format, width: u32, height: u32) -> Self {
        Self {
            usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT,
            kind: ImageKind::Depth,
            ..Self::texture(format, width, height)
        }
    }

    /// Color attachment that can also be copied out
    pub fn color(format: Format, width: u32, height: u32) -> Self {
        Self {
            usage: ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_SRC,
            kind: ImageKind::Color,
            ..Self::texture(format, width, height)
        }
    }

    fn view_aspect(&self) -> ImageAspect {
        match self.kind {
            ImageKind::Depth => ImageAspect::DEPTH,
            ImageKind::Color | ImageKind::Texture => ImageAspect::COLOR,
        }
    }

    fn copy_aspect(&self) -> ImageAspect {
        if self.format.is_depth() {
            ImageAspect::DEPTH
        } else {
            ImageAspect::COLOR
        }
    }
}

/// GPU image bound to a device link
///
/// Dropping an image runs `destroy`, which is only valid once the GPU no
/// longer uses the image.
pub struct ImageResource<'a, D: DeviceLink> {
    link: &'a D,
    image: Option<D::Image>,
    allocation: Option<D::Allocation>,
    view: Option<D::ImageView>,
    sampler: Option<D::Sampler>,
    desc: Option<ImageDesc>,
    layout: ImageLayout,
    deletion_queue: DeletionQueue,
}

impl<'a, D: DeviceLink> ImageResource<'a, D> {
    /// An image that has not been created yet
    pub fn new(link: &'a D) -> Self {
        Self {
            link,
            image: None,
            allocation: None,
            view: None,
            sampler: None,
            desc: None,
            layout: ImageLayout::Undefined,
            deletion_queue: DeletionQueue::new(),
        }
    }

    /// Create the image and its view; with a data source, upload it
    ///
    /// With `data_source`, the first `width * height` texels of the buffer are
    /// copied into mip 0. Textures then get a sampler and end in
    /// `ShaderReadOnly`; other kinds stay in `TransferDst`. `TransferDst` usage
    /// is added automatically when uploading.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` for a zero extent or mip count, an image that already
    ///   exists, or a data source that is missing or too small
    /// - `AllocationFailed` / `OutOfMemory` from the allocator
    /// - `ResourceCreationFailed` when the view or sampler is rejected
    /// - `CommandSubmissionFailed` from the upload
    ///
    /// Whatever was created before a failure stays queued for `destroy`.
    pub fn create(
        &mut self,
        desc: &ImageDesc,
        data_source: Option<&BufferResource<'_, D>>,
    ) -> Result<()> {
        if self.image.is_some() {
            engine_bail!(SOURCE, InvalidResource => "Image already created; destroy it before creating again");
        }
        if desc.width == 0 || desc.height == 0 || desc.mip_levels == 0 {
            engine_bail!(
                SOURCE,
                InvalidResource => "Invalid image extent {}x{} with {} mip levels",
                desc.width,
                desc.height,
                desc.mip_levels
            );
        }
        if let Some(source) = data_source {
            let required = desc.width as u64 * desc.height as u64 * desc.format.bytes_per_pixel() as u64;
            if !source.is_created() || source.size() < required {
                engine_bail!(
                    SOURCE,
                    InvalidResource => "Data source holds {} bytes, {}x{} {:?} needs {}",
                    source.size(),
                    desc.width,
                    desc.height,
                    desc.format,
                    required
                );
            }
        }

        let mut usage = desc.usage;
        if data_source.is_some() {
            usage |= ImageUsage::TRANSFER_DST;
        }
        let (image, allocation) = self.link.create_image(&ImageCreateDesc {
            format: desc.format,
            width: desc.width,
            height: desc.height,
            mip_levels: desc.mip_levels,
            samples: desc.samples,
            tiling: desc.tiling,
            usage,
            memory: desc.memory,
        })?;
        self.image = Some(image);
        self.allocation = Some(allocation);
        self.desc = Some(*desc);
        self.layout = ImageLayout::Undefined;
        self.deletion_queue.register(Teardown::ImageAllocation)?;

        let view = self.link.create_image_view(
            image,
            &ImageViewDesc {
                format: desc.format,
                aspect: desc.view_aspect(),
                mip_levels: desc.mip_levels,
            },
        )?;
        self.view = Some(view);
        self.deletion_queue.register(Teardown::ImageView)?;

        if let Some(source) = data_source {
            self.transition(ImageLayout::Undefined, ImageLayout::TransferDst)?;
            source.copy_to_image(self, desc.width, desc.height)?;

            if desc.kind == ImageKind::Texture {
                let sampler = self.link.create_sampler(&SamplerDesc::texture(self.link.settings()))?;
                self.sampler = Some(sampler);
                self.deletion_queue.register(Teardown::Sampler)?;
                self.transition(ImageLayout::TransferDst, ImageLayout::ShaderReadOnly)?;
            }
        }

        engine_debug!(
            SOURCE,
            "Created {:?} image {:?} ({}x{}, {:?}, {} mips, layout {:?})",
            desc.kind,
            image,
            desc.width,
            desc.height,
            desc.format,
            desc.mip_levels,
            self.layout
        );
        Ok(())
    }

    /// Move the image from `old` to `new` with a one-shot barrier
    ///
    /// Only the pairs of the transition table are accepted. `old` may be
    /// `Undefined` to discard the current contents; any other `old` must match
    /// the tracked layout. Blocks until the barrier executed.
    ///
    /// # Errors
    ///
    /// - `UnsupportedTransition` for a pair outside the table (nothing is recorded)
    /// - `InvalidResource` if the image was never created
    /// - `LayoutMismatch` if `old` disagrees with the tracked layout
    /// - `CommandSubmissionFailed` from the one-shot submission
    pub fn transition(&mut self, old: ImageLayout, new: ImageLayout) -> Result<()> {
        let masks = LayoutTransition::resolve(old, new)?;
        let (image, format) = match (self.image, self.desc) {
            (Some(image), Some(desc)) => (image, desc.format),
            _ => engine_bail!(SOURCE, InvalidResource => "Transition of an image that was never created"),
        };
        if old != ImageLayout::Undefined && old != self.layout {
            engine_error!(
                SOURCE,
                "Transition from {:?} requested but image {:?} is in {:?}",
                old,
                image,
                self.layout
            );
            return Err(Error::LayoutMismatch { expected: old, actual: self.layout });
        }

        let aspect = if format.is_depth() {
            format.depth_stencil_aspect()
        } else {
            ImageAspect::COLOR
        };
        let barrier = ImageBarrier {
            old_layout: old,
            new_layout: new,
            src_access: masks.src_access,
            dst_access: masks.dst_access,
            src_stage: masks.src_stage,
            dst_stage: masks.dst_stage,
            aspect,
        };
        self.link
            .one_shot(|cb| self.link.cmd_image_barrier(cb, image, &barrier))?;

        self.layout = new;
        engine_trace!(SOURCE, "Image {:?} transitioned {:?} -> {:?}", image, old, new);
        Ok(())
    }

    /// Read mip 0 back into `buffer`
    ///
    /// The image must be in `TransferDst` and is left there; the copy is
    /// bracketed by barriers through `TransferSrc`. Blocks until done.
    pub fn copy_to_buffer(&self, buffer: &BufferResource<'_, D>, width: u32, height: u32) -> Result<()> {
        let (image, desc) = match (self.image, self.desc) {
            (Some(image), Some(desc)) => (image, desc),
            _ => engine_bail!(SOURCE, InvalidResource => "Readback of an image that was never created"),
        };
        let Some(target) = buffer.handle() else {
            engine_bail!(SOURCE, InvalidResource => "Readback into a buffer that was never created");
        };
        if self.layout != ImageLayout::TransferDst {
            engine_error!(
                SOURCE,
                "Readback of image {:?} requires TransferDst but it is in {:?}",
                image,
                self.layout
            );
            return Err(Error::LayoutMismatch {
                expected: ImageLayout::TransferDst,
                actual: self.layout,
            });
        }
        buffer.check_region(self, width, height, desc.format.bytes_per_pixel())?;

        let aspect = desc.copy_aspect();
        let to_source = ImageBarrier {
            old_layout: ImageLayout::TransferDst,
            new_layout: ImageLayout::TransferSrc,
            src_access: AccessFlags::TRANSFER_WRITE,
            dst_access: AccessFlags::TRANSFER_READ,
            src_stage: PipelineStages::TRANSFER,
            dst_stage: PipelineStages::TRANSFER,
            aspect,
        };
        let back_to_destination = ImageBarrier {
            old_layout: ImageLayout::TransferSrc,
            new_layout: ImageLayout::TransferDst,
            src_access: AccessFlags::TRANSFER_READ,
            dst_access: AccessFlags::TRANSFER_WRITE,
            ..to_source
        };
        let region = BufferImageCopy { aspect, width, height };

        self.link.one_shot(|cb| {
            self.link.cmd_image_barrier(cb, image, &to_source);
            self.link.cmd_copy_image_to_buffer(cb, image, target, &region);
            self.link.cmd_image_barrier(cb, image, &back_to_destination);
        })?;

        engine_trace!(SOURCE, "Read back {}x{} texels of {:?} into {:?}", width, height, image, target);
        Ok(())
    }

    /// Release sampler, view and image (in that order)
    ///
    /// Safe to call any number of times, including on an image never created.
    pub fn destroy(&mut self) {
        let mut queue = std::mem::take(&mut self.deletion_queue);
        if queue.is_empty() {
            return;
        }
        let handle = self.image;
        queue.run_all(|step| self.teardown(step));
        self.desc = None;
        self.layout = ImageLayout::Undefined;
        engine_debug!(SOURCE, "Destroyed image {:?}", handle);
    }

    fn teardown(&mut self, step: Teardown) {
        match step {
            Teardown::Sampler => {
                if let Some(sampler) = self.sampler.take() {
                    self.link.destroy_sampler(sampler);
                }
            }
            Teardown::ImageView => {
                if let Some(view) = self.view.take() {
                    self.link.destroy_image_view(view);
                }
            }
            Teardown::ImageAllocation => {
                if let (Some(image), Some(allocation)) = (self.image.take(), self.allocation.take()) {
                    self.link.destroy_image(image, allocation);
                }
            }
            other => engine_warn!(SOURCE, "Ignoring teardown {:?} on an image", other),
        }
    }

    // ===== ACCESSORS =====

    pub fn image(&self) -> Option<D::Image> {
        self.image
    }

    pub fn view(&self) -> Option<D::ImageView> {
        self.view
    }

    /// Sampler, present only for uploaded textures
    pub fn sampler(&self) -> Option<D::Sampler> {
        self.sampler
    }

    /// Tracked layout (`Undefined` until a transition completes)
    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    /// Descriptor the image was created with
    pub fn desc(&self) -> Option<&ImageDesc> {
        self.desc.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.image.is_some()
    }

    /// (width, height) of mip 0
    pub fn extent(&self) -> Option<(u32, u32)> {
        self.desc.map(|desc| (desc.width, desc.height))
    }

    pub fn format(&self) -> Option<Format> {
        self.desc.map(|desc| desc.format)
    }

    pub fn kind(&self) -> Option<ImageKind> {
        self.desc.map(|desc| desc.kind)
    }

    pub fn mip_levels(&self) -> Option<u32> {
        self.desc.map(|desc| desc.mip_levels)
    }
}

impl<D: DeviceLink> Drop for ImageResource<'_, D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
