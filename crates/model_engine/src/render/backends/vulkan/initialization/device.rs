//! Physical device selection and logical device creation

use std::collections::HashSet;
use std::ffi::CStr;

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Instance};
use log::{debug, info, warn};

use super::surface::SurfaceHandle;
use crate::render::backends::vulkan::resources::texture::anisotropy_level;
use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

/// Physical device selection and capabilities
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory heaps and types, used for every allocation
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Whether anisotropic filtering can be enabled
    pub sampler_anisotropy: bool,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Pick the first device that can draw and present to `surface`
    ///
    /// Discrete GPUs are tried before everything else.
    pub fn select_suitable_device(instance: &Instance, surface: &SurfaceHandle) -> VulkanResult<Self> {
        let mut devices = unsafe { instance.enumerate_physical_devices() }.or_vk("enumerate physical devices")?;
        devices.sort_by_key(|&device| {
            let properties = unsafe { instance.get_physical_device_properties(device) };
            properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU
        });

        let mut rejections = Vec::new();
        for device in devices {
            match Self::evaluate_device(instance, device, surface) {
                Ok(info) => {
                    info!("Selected GPU: {}", info.name());
                    return Ok(info);
                }
                Err(e) => {
                    debug!("Skipping GPU: {}", e);
                    rejections.push(e.description().to_string());
                }
            }
        }

        let error = VulkanError::new("No suitable GPU found");
        Err(if rejections.is_empty() {
            error
        } else {
            error.with_message(&rejections.join("; "))
        })
    }

    fn evaluate_device(instance: &Instance, device: vk::PhysicalDevice, surface: &SurfaceHandle) -> VulkanResult<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let features = unsafe { instance.get_physical_device_features(device) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        let name = device_name(&properties);

        let mut graphics_family = None;
        let mut present_family = None;
        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;
            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics_family.is_none() {
                graphics_family = Some(index);
            }
            if present_family.is_none() && surface.supports_present(device, index)? {
                present_family = Some(index);
            }
            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family
            .ok_or_else(|| VulkanError::new(format!("{name} has no graphics queue family")))?;
        let present_family = present_family
            .ok_or_else(|| VulkanError::new(format!("{name} cannot present to the window surface")))?;

        let extensions = unsafe { instance.enumerate_device_extension_properties(device) }
            .or_vk("enumerate device extensions")?;
        let has_swapchain = extensions
            .iter()
            .any(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) } == SwapchainLoader::name());
        if !has_swapchain {
            return Err(VulkanError::new(format!("{name} does not support VK_KHR_swapchain")));
        }

        if surface.formats(device)?.is_empty() || surface.present_modes(device)?.is_empty() {
            return Err(VulkanError::new(format!("{name} has no surface formats or present modes")));
        }

        Ok(Self {
            device,
            properties,
            memory_properties,
            sampler_anisotropy: features.sampler_anisotropy == vk::TRUE,
            graphics_family,
            present_family,
        })
    }

    /// Sampler anisotropy level, `None` without the feature
    pub fn max_anisotropy(&self) -> Option<f32> {
        anisotropy_level(self.sampler_anisotropy, self.properties.limits.max_sampler_anisotropy)
    }

    /// Human readable device name
    pub fn name(&self) -> String {
        device_name(&self.properties)
    }
}

fn device_name(properties: &vk::PhysicalDeviceProperties) -> String {
    unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
    /// Swapchain extension loader
    pub swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create a device with one graphics and one present queue
    pub fn new(instance: &Instance, physical: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let unique_families: HashSet<u32> = [physical.graphics_family, physical.present_family]
            .into_iter()
            .collect();

        let priorities = [1.0];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::builder()
            .sampler_anisotropy(physical.sampler_anisotropy)
            .build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device =
            unsafe { instance.create_device(physical.device, &create_info, None) }.or_vk("create logical device")?;
        let graphics_queue = unsafe { device.get_device_queue(physical.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(physical.present_family, 0) };
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            swapchain_loader,
        })
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device.device_wait_idle() }.or_vk("wait for device idle")
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        if let Err(e) = self.wait_idle() {
            warn!("Device did not go idle before destruction: {}", e);
        }
        unsafe { self.device.destroy_device(None) };
    }
}
