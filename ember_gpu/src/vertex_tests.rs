//! Unit tests for Vertex and VertexLayout

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use glam::{Vec2, Vec3};

use crate::vertex::{AttributeFormat, Vertex, VertexAttribute, VertexBinding, VertexInputRate, VertexLayout};

fn hash_of(vertex: &Vertex) -> u64 {
    let mut hasher = DefaultHasher::new();
    vertex.hash(&mut hasher);
    hasher.finish()
}

fn sample(normal: Vec3) -> Vertex {
    Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 0.25, 1.0), Vec2::new(0.0, 1.0), normal)
}

// ============================================================================
// LAYOUT
// ============================================================================

#[test]
fn test_vertex_record_size() {
    assert_eq!(std::mem::size_of::<Vertex>(), 44);
}

#[test]
fn test_layout_binding() {
    let layout = Vertex::layout();
    assert_eq!(
        layout.bindings,
        vec![VertexBinding { binding: 0, stride: 44, input_rate: VertexInputRate::Vertex }]
    );
}

#[test]
fn test_layout_attributes() {
    let layout = Vertex::layout();
    let expected = [
        (0, AttributeFormat::R32G32B32_SFLOAT, 0),
        (1, AttributeFormat::R32G32B32_SFLOAT, 12),
        (2, AttributeFormat::R32G32_SFLOAT, 24),
        (3, AttributeFormat::R32G32B32_SFLOAT, 32),
    ];
    assert_eq!(layout.attributes.len(), expected.len());
    for (location, format, offset) in expected {
        assert_eq!(
            layout.attribute(location),
            Some(&VertexAttribute { location, binding: 0, format, offset })
        );
    }
}

#[test]
fn test_normal_has_its_own_offset() {
    let layout = Vertex::layout();
    let tex = layout.attribute(Vertex::TEX_COORD_LOCATION).unwrap();
    let normal = layout.attribute(Vertex::NORMAL_LOCATION).unwrap();
    assert_ne!(tex.offset, normal.offset);
    assert!(normal.offset >= tex.offset + tex.format.size_bytes());
}

#[test]
fn test_layout_is_consistent() {
    assert!(Vertex::layout().is_consistent());

    let broken = VertexLayout {
        bindings: vec![VertexBinding { binding: 0, stride: 8, input_rate: VertexInputRate::Vertex }],
        attributes: vec![VertexAttribute {
            location: 0,
            binding: 0,
            format: AttributeFormat::R32G32B32_SFLOAT,
            offset: 0,
        }],
    };
    assert!(!broken.is_consistent());
}

#[test]
fn test_default_layout_is_empty() {
    let layout = VertexLayout::default();
    assert!(layout.bindings.is_empty());
    assert!(layout.attributes.is_empty());
    assert!(layout.attribute(0).is_none());
}

// ============================================================================
// EQUALITY AND HASH
// ============================================================================

#[test]
fn test_normal_is_ignored_by_equality_and_hash() {
    let a = sample(Vec3::Y);
    let b = sample(Vec3::NEG_Z);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_other_fields_matter() {
    let base = sample(Vec3::Y);
    let moved = Vertex { position: Vec3::ZERO, ..base };
    let recolored = Vertex { color: Vec3::ONE, ..base };
    let remapped = Vertex { tex_coord: Vec2::ONE, ..base };
    assert_ne!(base, moved);
    assert_ne!(base, recolored);
    assert_ne!(base, remapped);
}

#[test]
fn test_deduplication_in_hash_set() {
    let set: HashSet<Vertex> = [sample(Vec3::X), sample(Vec3::Y), sample(Vec3::Z)].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_signed_zero_deduplicates() {
    let a = Vertex::new(Vec3::new(0.0, 1.0, 2.0), Vec3::ONE, Vec2::new(0.0, 0.5), Vec3::Z);
    let b = Vertex::new(Vec3::new(-0.0, 1.0, 2.0), Vec3::ONE, Vec2::new(-0.0, 0.5), Vec3::Z);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let set: HashSet<Vertex> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_vertices_cast_to_bytes() {
    let vertices = [sample(Vec3::Y), sample(Vec3::X)];
    let bytes: &[u8] = bytemuck::cast_slice(&vertices);
    assert_eq!(bytes.len(), 88);
    assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
}
