//! Ember demo: upload a checkerboard texture, create a depth target, read pixels back
//!
//! Run with: cargo run -p ember_demo [--features vulkan-validation]

use ember_gpu::ember::device::{BufferDesc, BufferUsage, Format, ImageLayout, MemoryUsage};
use ember_gpu::ember::log::{DefaultLogger, LogSeverity};
use ember_gpu::ember::resource::ImageDesc;
use ember_gpu::ember::vertex::Vertex;
use ember_gpu::ember::{Config, Engine, Result};
use ember_gpu_vulkan::{Buffer, Image, VulkanDevice};
use glam::{Vec2, Vec3};

const TEXTURE_SIZE: u32 = 8;

/// RGBA8 checkerboard with 1-texel squares
fn checkerboard(size: u32) -> Vec<u8> {
    (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            if (x + y) % 2 == 0 {
                [255, 255, 255, 255]
            } else {
                [32, 32, 32, 255]
            }
        })
        .collect()
}

fn run() -> Result<()> {
    let device = VulkanDevice::new(Config {
        app_name: "Ember Demo".to_string(),
        ..Config::default()
    })?;
    println!("GPU: {}", device.device_name());

    let pixels = checkerboard(TEXTURE_SIZE);
    let mut staging = Buffer::new(device.context());
    staging.create(&BufferDesc {
        size: pixels.len() as u64,
        usage: BufferUsage::TRANSFER_SRC,
        memory: MemoryUsage::CpuToGpu,
    })?;
    staging.write(0, &pixels)?;

    let mut texture = Image::new(device.context());
    texture.create(
        &ImageDesc::texture(Format::R8G8B8A8_SRGB, TEXTURE_SIZE, TEXTURE_SIZE),
        Some(&staging),
    )?;
    println!("Texture {:?}: layout {:?}, sampler {:?}", texture.image(), texture.layout(), texture.sampler());

    let mut depth = Image::new(device.context());
    depth.create(&ImageDesc::depth(Format::D32_SFLOAT, 1280, 720), None)?;
    depth.transition(ImageLayout::Undefined, ImageLayout::DepthStencilAttachment)?;
    println!("Depth {:?}: layout {:?}", depth.image(), depth.layout());

    // Color target filled from the staging buffer, then read back
    let mut color = Image::new(device.context());
    color.create(&ImageDesc::color(Format::R8G8B8A8_UNORM, TEXTURE_SIZE, TEXTURE_SIZE), Some(&staging))?;
    let mut readback = Buffer::new(device.context());
    readback.create(&BufferDesc {
        size: pixels.len() as u64,
        usage: BufferUsage::TRANSFER_DST,
        memory: MemoryUsage::GpuToCpu,
    })?;
    color.copy_to_buffer(&readback, TEXTURE_SIZE, TEXTURE_SIZE)?;
    let matches = readback.mapped_bytes() == Some(pixels.as_slice());
    println!("Readback matches upload: {}", matches);

    let layout = Vertex::layout();
    println!("Vertex stride {} bytes", layout.bindings[0].stride);
    for attribute in &layout.attributes {
        println!("  location {} {:?} at offset {}", attribute.location, attribute.format, attribute.offset);
    }
    let quad = [
        Vertex::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::ONE, Vec2::new(0.0, 0.0), Vec3::Z),
        Vertex::new(Vec3::new(1.0, -1.0, 0.0), Vec3::ONE, Vec2::new(1.0, 0.0), Vec3::Z),
        Vertex::new(Vec3::new(1.0, 1.0, 0.0), Vec3::ONE, Vec2::new(1.0, 1.0), Vec3::Z),
        Vertex::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::ONE, Vec2::new(0.0, 1.0), Vec3::Z),
    ];
    let mut vertices = Buffer::new(device.context());
    vertices.create(&BufferDesc {
        size: std::mem::size_of_val(&quad) as u64,
        usage: BufferUsage::VERTEX,
        memory: MemoryUsage::CpuToGpu,
    })?;
    vertices.write_pod(0, &quad)?;

    // Nothing is in flight; tear down in reverse creation order
    device.wait_idle()?;
    vertices.destroy();
    readback.destroy();
    color.destroy();
    depth.destroy();
    texture.destroy();
    staging.destroy();

    #[cfg(feature = "vulkan-validation")]
    ember_gpu_vulkan::print_validation_stats_report();

    Ok(())
}

fn main() {
    Engine::set_logger(DefaultLogger::with_min_severity(LogSeverity::Debug));

    if let Err(e) = run() {
        eprintln!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
