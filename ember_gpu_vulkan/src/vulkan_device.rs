/// VulkanDevice - headless Vulkan bootstrap owning the instance and the device link
///
/// Creates instance, optional validation messenger, logical device, allocator
/// and one-shot command pool. Resources borrow `context()`; they must all be
/// destroyed before the `VulkanDevice` is dropped, which the borrow checker
/// enforces.

use ash::vk;
use ember_gpu::ember::{Config, Error, Result};
use ember_gpu::{engine_error, engine_info, engine_warn};
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::ffi::{CStr, CString};
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "ember::vulkan";

fn init_error(what: &str, e: impl std::fmt::Debug) -> Error {
    engine_error!(SOURCE, "{}: {:?}", what, e);
    Error::InitializationFailed(format!("{}: {:?}", what, e))
}

/// Vulkan instance, physical device and the device link built on them
pub struct VulkanDevice {
    /// Vulkan entry (keeps the loader alive)
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device_name: String,
    context: GpuContext,
    /// Debug utils loader and messenger (validation layers only)
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

/// Native objects created so far by `VulkanDevice::new`
///
/// Dropping it destroys whatever it still holds, newest first, so a failed
/// bootstrap releases exactly what it created. `finish` hands everything over
/// to the caller instead.
#[derive(Default)]
struct PartialDevice {
    instance: Option<ash::Instance>,
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    device: Option<ash::Device>,
    allocator: Option<Allocator>,
}

impl PartialDevice {
    fn finish(
        mut self,
    ) -> Option<(
        ash::Instance,
        Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
        ash::Device,
        Allocator,
    )> {
        let instance = self.instance.take()?;
        let debug_messenger = self.debug_messenger.take();
        let device = self.device.take()?;
        let allocator = self.allocator.take()?;
        Some((instance, debug_messenger, device, allocator))
    }
}

impl Drop for PartialDevice {
    fn drop(&mut self) {
        unsafe {
            // Allocator frees its memory blocks through the device
            drop(self.allocator.take());

            if let Some(device) = self.device.take() {
                device.destroy_device(None);
            }

            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                #[cfg(feature = "vulkan-validation")]
                crate::debug::cleanup_debug_config();
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            if let Some(instance) = self.instance.take() {
                instance.destroy_instance(None);
            }
        }
    }
}

impl VulkanDevice {
    /// Create a headless device on the first GPU exposing a graphics queue
    ///
    /// Validation layers are requested only when `config.enable_validation` is
    /// set and the crate is built with the `vulkan-validation` feature. On
    /// failure every object created so far is destroyed again.
    pub fn new(config: Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| init_error("Failed to load Vulkan library", e))?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| init_error("Invalid application name", e))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Ember")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let validation = config.enable_validation && cfg!(feature = "vulkan-validation");
            if config.enable_validation && !validation {
                engine_warn!(SOURCE, "Validation requested but the vulkan-validation feature is disabled");
            }

            let mut extension_names = Vec::new();
            let mut layer_names = Vec::new();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let mut partial = PartialDevice::default();
            let instance: &ash::Instance = partial.instance.insert(
                entry
                    .create_instance(&create_info, None)
                    .map_err(|e| init_error("Failed to create Vulkan instance", e))?,
            );

            #[cfg(feature = "vulkan-validation")]
            if validation {
                partial.debug_messenger =
                    Some(crate::debug::create_messenger(&entry, instance, config.debug_severity)?);
            }

            // Pick the first physical device with a graphics queue family
            let physical_devices = instance
                .enumerate_physical_devices()
                .map_err(|e| init_error("Failed to enumerate physical devices", e))?;

            let (physical_device, graphics_family_index) = physical_devices
                .into_iter()
                .find_map(|pd| {
                    instance
                        .get_physical_device_queue_family_properties(pd)
                        .iter()
                        .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                        .map(|index| (pd, index as u32))
                })
                .ok_or_else(|| {
                    engine_error!(SOURCE, "No Vulkan-capable GPU with a graphics queue found");
                    Error::InitializationFailed("No Vulkan-capable GPU with a graphics queue found".to_string())
                })?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = CStr::from_ptr(properties.device_name.as_ptr())
                .to_string_lossy()
                .into_owned();
            let supported = instance.get_physical_device_features(physical_device);
            let anisotropy_supported = supported.sampler_anisotropy == vk::TRUE;
            let settings = config.settings.clamped_to_device(
                anisotropy_supported.then_some(properties.limits.max_sampler_anisotropy),
            );

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)];

            let device_features = vk::PhysicalDeviceFeatures::default()
                .sampler_anisotropy(settings.anisotropy_enabled());

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| init_error("Failed to create logical device", e))?;
            let instance = instance.clone();
            let device: &ash::Device = partial.device.insert(device);

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);

            // Create GPU allocator
            partial.allocator = Some(
                Allocator::new(&AllocatorCreateDesc {
                    instance,
                    device: device.clone(),
                    physical_device,
                    debug_settings: Default::default(),
                    buffer_device_address: false,
                    allocation_sizes: Default::default(),
                })
                .map_err(|e| init_error("Failed to create GPU allocator", e))?,
            );

            // Create one-shot command pool (TRANSIENT + RESET for reusable one-shot submissions)
            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = device
                .create_command_pool(&pool_create_info, None)
                .map_err(|e| init_error("Failed to create one-shot command pool", e))?;

            let Some((instance, debug_messenger, device, allocator)) = partial.finish() else {
                return Err(init_error("Incomplete device bootstrap", "missing handle"));
            };

            let context = GpuContext::new(
                device,
                Arc::new(Mutex::new(allocator)),
                graphics_queue,
                graphics_family_index,
                command_pool,
                settings,
            );

            engine_info!(
                SOURCE,
                "Vulkan device ready: {} (queue family {}, anisotropy {})",
                device_name,
                graphics_family_index,
                settings.anisotropy()
            );

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                device_name,
                context,
                debug_messenger,
            })
        }
    }

    /// Device link handed to resources
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Driver-reported GPU name
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.context
                .device
                .device_wait_idle()
                .map_err(|e| ember_gpu::engine_err!(SOURCE, "Failed to wait idle: {:?}", e))
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.context.device.device_wait_idle().ok();

            // 1. Destroy the one-shot command pool
            self.context
                .device
                .destroy_command_pool(self.context.command_pool(), None);

            // 2. Drop allocator: free VkDeviceMemory pages BEFORE destroying device
            self.context.release_allocator();

            // 3. Stop forwarding validation messages, then destroy the messenger
            #[cfg(feature = "vulkan-validation")]
            crate::debug::cleanup_debug_config();
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 4. Destroy device and instance
            self.context.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
