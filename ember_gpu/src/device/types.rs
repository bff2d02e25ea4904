/// Backend-agnostic descriptions of GPU objects and commands
///
/// These types cross the `DeviceLink` seam; backends convert them to their
/// native equivalents (see the Vulkan crate's conversion module).

use bitflags::bitflags;

use crate::config::Settings;

// ============================================================================
// FORMATS
// ============================================================================

/// Image pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Format {
    R8_UNORM,
    R8G8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,
    R32_SFLOAT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    D32_SFLOAT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
}

impl Format {
    /// Bytes per texel in a tightly packed upload buffer
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Format::R8_UNORM => 1,
            Format::R8G8_UNORM | Format::D16_UNORM => 2,
            Format::R8G8B8A8_UNORM
            | Format::R8G8B8A8_SRGB
            | Format::B8G8R8A8_UNORM
            | Format::B8G8R8A8_SRGB
            | Format::R32_SFLOAT
            | Format::D32_SFLOAT
            | Format::D24_UNORM_S8_UINT => 4,
            Format::R16G16B16A16_SFLOAT | Format::D32_SFLOAT_S8_UINT => 8,
            Format::R32G32B32A32_SFLOAT => 16,
        }
    }

    /// Whether the format has a depth component
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            Format::D16_UNORM
                | Format::D32_SFLOAT
                | Format::D24_UNORM_S8_UINT
                | Format::D32_SFLOAT_S8_UINT
        )
    }

    /// Whether the format has a stencil component
    pub fn has_stencil(&self) -> bool {
        matches!(self, Format::D24_UNORM_S8_UINT | Format::D32_SFLOAT_S8_UINT)
    }

    /// Aspect addressed by a depth-stencil attachment barrier on this format
    pub fn depth_stencil_aspect(&self) -> ImageAspect {
        if self.has_stencil() {
            ImageAspect::DEPTH | ImageAspect::STENCIL
        } else {
            ImageAspect::DEPTH
        }
    }
}

/// Image tiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageTiling {
    #[default]
    Optimal,
    Linear,
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleCount {
    #[default]
    S1,
    S2,
    S4,
    S8,
}

/// Memory placement policy handed to the allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryUsage {
    /// Device-local, no host access
    GpuOnly,
    /// Host-visible, written by the CPU and read by the GPU (uploads, uniforms)
    CpuToGpu,
    /// Host-visible, written by the GPU and read by the CPU (readback)
    GpuToCpu,
}

impl MemoryUsage {
    /// Whether allocations with this policy can be mapped
    pub fn is_host_visible(&self) -> bool {
        !matches!(self, MemoryUsage::GpuOnly)
    }
}

bitflags! {
    /// Buffer usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const UNIFORM = 1 << 2;
        const STORAGE = 1 << 3;
        const INDEX = 1 << 4;
        const VERTEX = 1 << 5;
    }
}

bitflags! {
    /// Image usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const SAMPLED = 1 << 2;
        const STORAGE = 1 << 3;
        const COLOR_ATTACHMENT = 1 << 4;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
    }
}

bitflags! {
    /// Image aspect addressed by a view, barrier or copy
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageAspect: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

// ============================================================================
// LAYOUTS AND SYNCHRONIZATION
// ============================================================================

/// Image layout
///
/// Wider than the set of layouts `ImageResource::transition` accepts so that
/// callers can name any state; only the transition table's pairs are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    TransferSrc,
    TransferDst,
    ShaderReadOnly,
    ColorAttachment,
    DepthStencilAttachment,
}

bitflags! {
    /// Memory access scopes used by barriers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const TRANSFER_READ = 1 << 0;
        const TRANSFER_WRITE = 1 << 1;
        const SHADER_READ = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 4;
        const COLOR_ATTACHMENT_WRITE = 1 << 5;
    }
}

bitflags! {
    /// Pipeline stages used by barriers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const TRANSFER = 1 << 1;
        const FRAGMENT_SHADER = 1 << 2;
        const EARLY_FRAGMENT_TESTS = 1 << 3;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 4;
    }
}

/// Image memory barrier over mip 0, layer 0, no queue ownership transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBarrier {
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
    pub aspect: ImageAspect,
}

/// Tightly packed copy region between a buffer (offset 0) and mip 0 of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferImageCopy {
    pub aspect: ImageAspect,
    pub width: u32,
    pub height: u32,
}

impl BufferImageCopy {
    /// Color copy of a `width` x `height` region at offset (0, 0, 0)
    pub fn color(width: u32, height: u32) -> Self {
        Self { aspect: ImageAspect::COLOR, width, height }
    }
}

// ============================================================================
// OBJECT DESCRIPTIONS
// ============================================================================

/// Descriptor for creating a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    /// Size in bytes (must be non-zero)
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// Memory placement policy
    pub memory: MemoryUsage,
}

/// Backend-level descriptor for a 2D, single-layer, exclusive image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCreateDesc {
    pub format: Format,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub samples: SampleCount,
    pub tiling: ImageTiling,
    pub usage: ImageUsage,
    pub memory: MemoryUsage,
}

/// Descriptor for a 2D view over the full mip range and one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageViewDesc {
    pub format: Format,
    pub aspect: ImageAspect,
    pub mip_levels: u32,
}

/// Texel filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Mipmap selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipmapMode {
    Nearest,
    Linear,
}

/// Texture coordinate addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Border color used by `AddressMode::ClampToBorder`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderColor {
    FloatTransparentBlack,
    IntOpaqueBlack,
    FloatOpaqueWhite,
}

/// Sampler description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmap_mode: MipmapMode,
    /// Applied to U, V and W
    pub address_mode: AddressMode,
    /// `None` disables anisotropic filtering
    pub max_anisotropy: Option<f32>,
    pub border_color: BorderColor,
    /// Depth compare is always disabled for texture samplers
    pub compare_enable: bool,
    pub mip_lod_bias: f32,
    pub min_lod: f32,
    pub max_lod: f32,
}

impl SamplerDesc {
    /// Sampler used for uploaded textures: linear filtering, repeat addressing,
    /// anisotropy from `settings`, opaque black border, LOD pinned to 0
    pub fn texture(settings: &Settings) -> Self {
        Self {
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            mipmap_mode: MipmapMode::Linear,
            address_mode: AddressMode::Repeat,
            max_anisotropy: settings.anisotropy_enabled().then(|| settings.anisotropy()),
            border_color: BorderColor::IntOpaqueBlack,
            compare_enable: false,
            mip_lod_bias: 0.0,
            min_lod: 0.0,
            max_lod: 0.0,
        }
    }
}
