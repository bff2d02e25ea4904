/// Vertex record and its input layout description

use std::hash::{Hash, Hasher};
use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Data format of one vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum AttributeFormat {
    R32_SFLOAT,          // float
    R32G32_SFLOAT,       // vec2
    R32G32B32_SFLOAT,    // vec3
    R32G32B32A32_SFLOAT, // vec4
    R32_UINT,
    R8G8B8A8_UNORM,
}

impl AttributeFormat {
    /// Size in bytes of one element in this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            AttributeFormat::R32_SFLOAT | AttributeFormat::R32_UINT | AttributeFormat::R8G8B8A8_UNORM => 4,
            AttributeFormat::R32G32_SFLOAT => 8,
            AttributeFormat::R32G32B32_SFLOAT => 12,
            AttributeFormat::R32G32B32A32_SFLOAT => 16,
        }
    }
}

/// Vertex input rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexInputRate {
    /// Data is per-vertex
    Vertex,
    /// Data is per-instance
    Instance,
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Binding index
    pub binding: u32,
    pub format: AttributeFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex binding description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub binding: u32,
    /// Stride in bytes between consecutive elements
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

/// Vertex input layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Attribute bound to `location`, if any
    pub fn attribute(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }

    /// Whether every attribute lies inside its binding's stride
    pub fn is_consistent(&self) -> bool {
        self.attributes.iter().all(|attribute| {
            self.bindings
                .iter()
                .find(|b| b.binding == attribute.binding)
                .is_some_and(|b| attribute.offset + attribute.format.size_bytes() <= b.stride)
        })
    }
}

/// Interleaved mesh vertex
///
/// Equality and hashing look at position, color and texture coordinate only,
/// so vertices that differ just by normal deduplicate together.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
    pub tex_coord: Vec2,
    pub normal: Vec3,
}

impl Vertex {
    pub const POSITION_LOCATION: u32 = 0;
    pub const COLOR_LOCATION: u32 = 1;
    pub const TEX_COORD_LOCATION: u32 = 2;
    pub const NORMAL_LOCATION: u32 = 3;

    pub fn new(position: Vec3, color: Vec3, tex_coord: Vec2, normal: Vec3) -> Self {
        Self { position, color, tex_coord, normal }
    }

    /// Single per-vertex binding at index 0 with one attribute per field
    pub fn layout() -> VertexLayout {
        let attribute = |location, format, offset: usize| VertexAttribute {
            location,
            binding: 0,
            format,
            offset: offset as u32,
        };
        VertexLayout {
            bindings: vec![VertexBinding {
                binding: 0,
                stride: size_of::<Vertex>() as u32,
                input_rate: VertexInputRate::Vertex,
            }],
            attributes: vec![
                attribute(Self::POSITION_LOCATION, AttributeFormat::R32G32B32_SFLOAT, offset_of!(Vertex, position)),
                attribute(Self::COLOR_LOCATION, AttributeFormat::R32G32B32_SFLOAT, offset_of!(Vertex, color)),
                attribute(Self::TEX_COORD_LOCATION, AttributeFormat::R32G32_SFLOAT, offset_of!(Vertex, tex_coord)),
                attribute(Self::NORMAL_LOCATION, AttributeFormat::R32G32B32_SFLOAT, offset_of!(Vertex, normal)),
            ],
        }
    }

    fn key_bits(&self) -> [u32; 8] {
        [
            float_key(self.position.x),
            float_key(self.position.y),
            float_key(self.position.z),
            float_key(self.color.x),
            float_key(self.color.y),
            float_key(self.color.z),
            float_key(self.tex_coord.x),
            float_key(self.tex_coord.y),
        ]
    }
}

/// Bit pattern with `-0.0` folded into `0.0`
fn float_key(value: f32) -> u32 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.key_bits() == other.key_bits()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_bits().hash(state);
    }
}

#[cfg(test)]
#[path = "vertex_tests.rs"]
mod tests;
