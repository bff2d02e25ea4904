/*!
# Ember GPU

Backend-agnostic GPU resource lifecycle for the Ember engine.

Resources borrow a device link, create their native objects step by step and
queue the matching teardown for each step. `destroy` (or `Drop`) runs that
queue newest first, so partially created resources release exactly what they
own.

## Architecture

- **DeviceLink**: Capability trait a backend implements (objects, memory, one-shot commands)
- **BufferResource**: Device buffer with an optional persistent host mapping
- **ImageResource**: Image, view and sampler with a tracked layout
- **DeletionQueue**: Fixed-capacity LIFO list of teardown steps
- **LayoutTransition**: Closed table of supported layout transitions
- **Vertex**: Interleaved vertex record and its input layout

The Vulkan backend lives in the `ember_gpu_vulkan` crate.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod device;
pub mod resource;
pub mod vertex;

// Main ember namespace module
pub mod ember {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logger host)
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{Config, DebugSeverity, Settings};

    // Logging sub-module (types only; the engine_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Device seam
    pub mod device {
        pub use crate::device::*;
    }

    // Buffers, images and their teardown
    pub mod resource {
        pub use crate::resource::*;
    }

    // Vertex record and layout
    pub mod vertex {
        pub use crate::vertex::*;
    }
}

// Re-export math and POD libraries at crate root
pub use bytemuck;
pub use glam;
