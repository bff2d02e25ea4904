//! GPU resources and their teardown machinery
//!
//! Buffers and images borrow a `DeviceLink`, register every creation step in
//! their own `DeletionQueue`, and release it all, newest first, on `destroy`.

mod buffer;
mod deletion_queue;
mod image;
mod layout;

pub use buffer::BufferResource;
pub use deletion_queue::{DeletionQueue, Teardown};
pub use image::{ImageDesc, ImageKind, ImageResource};
pub use layout::LayoutTransition;
