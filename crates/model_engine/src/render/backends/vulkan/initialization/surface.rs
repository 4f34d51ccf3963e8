//! Vulkan surface management
//!
//! [`VulkanSurface`] is a window's Vulkan presentation resource. It owns the
//! instance it was created from, so the pair is torn down together and in
//! order. Renderers work through a non-owning [`SurfaceHandle`] and keep the
//! window alive with a lifecycle token instead.

use ash::extensions::khr;
use ash::{vk, Entry};

use super::instance::VulkanInstance;
use crate::render::backends::vulkan::{VkResultExt, VulkanResult};

/// Non-owning surface handle plus its extension loader
#[derive(Clone)]
pub struct SurfaceHandle {
    surface: vk::SurfaceKHR,
    loader: khr::Surface,
}

impl SurfaceHandle {
    /// Raw surface
    pub fn raw(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Surface capabilities for a physical device
    pub fn capabilities(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
        }
        .or_vk("query surface capabilities")
    }

    /// Supported surface formats for a physical device
    pub fn formats(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe { self.loader.get_physical_device_surface_formats(physical_device, self.surface) }
            .or_vk("query surface formats")
    }

    /// Supported present modes for a physical device
    pub fn present_modes(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
        }
        .or_vk("query present modes")
    }

    /// Whether a queue family can present to this surface
    pub fn supports_present(&self, physical_device: vk::PhysicalDevice, queue_family: u32) -> VulkanResult<bool> {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, queue_family, self.surface)
        }
        .or_vk("query surface support")
    }
}

/// Presentation surface plus the instance it belongs to
pub struct VulkanSurface {
    handle: SurfaceHandle,
    instance: VulkanInstance,
}

impl VulkanSurface {
    /// Attach a surface created by the windowing toolkit
    ///
    /// `create` receives the instance and returns the raw surface. If it
    /// fails, the instance is destroyed before the error is returned.
    pub fn new<F>(entry: &Entry, instance: VulkanInstance, create: F) -> VulkanResult<Self>
    where
        F: FnOnce(&ash::Instance) -> VulkanResult<vk::SurfaceKHR>,
    {
        let surface = create(instance.handle())?;
        let loader = khr::Surface::new(entry, instance.handle());
        Ok(Self {
            handle: SurfaceHandle { surface, loader },
            instance,
        })
    }

    /// Surface handle for renderer use
    pub fn handle(&self) -> &SurfaceHandle {
        &self.handle
    }

    /// Instance function table
    pub fn instance(&self) -> &ash::Instance {
        self.instance.handle()
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        unsafe {
            self.handle.loader.destroy_surface(self.handle.surface, None);
        }
    }
}
