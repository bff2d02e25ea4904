/// Device seam: backend-agnostic object descriptions and the DeviceLink trait

mod device_link;
mod types;

#[cfg(test)]
pub(crate) mod mock_device;

pub use device_link::DeviceLink;
pub use types::*;
