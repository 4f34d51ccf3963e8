//! Vulkan swapchain management
//!
//! Format, present mode, extent and image count are chosen by plain
//! functions over the surface's reported support, so the policy is testable
//! without a device.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};
use log::debug;

use crate::render::backends::vulkan::initialization::device::{LogicalDevice, PhysicalDeviceInfo};
use crate::render::backends::vulkan::initialization::surface::SurfaceHandle;
use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

/// Prefer 8-bit BGRA sRGB, else take the first reported format
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .or_else(|| formats.first())
        .copied()
}

/// Prefer mailbox, fall back to FIFO which is always available
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Surface extent, or the window size clamped to the supported range
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, window: vk::Extent2D) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }
    vk::Extent2D {
        width: window
            .width
            .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
        height: window
            .height
            .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
    }
}

/// One more than the minimum, capped by the maximum when there is one
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        desired.min(caps.max_image_count)
    } else {
        desired
    }
}

/// Swapchain wrapper with RAII cleanup
pub struct Swapchain {
    device: Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for the surface
    ///
    /// Pass the previous swapchain as `old` when recreating; it stays valid
    /// until the caller drops it.
    pub fn new(
        device: &LogicalDevice,
        surface: &SurfaceHandle,
        physical: &PhysicalDeviceInfo,
        window_extent: vk::Extent2D,
        old: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        let caps = surface.capabilities(physical.device)?;
        let format = choose_surface_format(&surface.formats(physical.device)?)
            .ok_or_else(|| VulkanError::new("Failed to create swapchain").with_message("surface reports no formats"))?;
        let present_mode = choose_present_mode(&surface.present_modes(physical.device)?);
        let extent = choose_extent(&caps, window_extent);
        let image_count = choose_image_count(&caps);

        let families = [physical.graphics_family, physical.present_family];
        let (sharing_mode, family_indices): (_, &[u32]) = if physical.graphics_family == physical.present_family {
            (vk::SharingMode::EXCLUSIVE, &[])
        } else {
            (vk::SharingMode::CONCURRENT, &families)
        };

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.raw())
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(family_indices)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old);

        let loader = device.swapchain_loader.clone();
        let mut wrapper = Self {
            device: device.device.clone(),
            swapchain: unsafe { loader.create_swapchain(&create_info, None) }.or_vk("create swapchain")?,
            loader,
            images: Vec::new(),
            image_views: Vec::new(),
            format,
            extent,
        };

        wrapper.images = unsafe { wrapper.loader.get_swapchain_images(wrapper.swapchain) }
            .or_vk("get swapchain images")?;
        for &image in &wrapper.images {
            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let view = unsafe { wrapper.device.create_image_view(&view_info, None) }
                .or_vk("create swapchain image view")?;
            wrapper.image_views.push(view);
        }

        debug!(
            "Swapchain {}x{}, {} images, {:?}, {:?}",
            extent.width,
            extent.height,
            wrapper.images.len(),
            format.format,
            present_mode
        );
        Ok(wrapper)
    }

    /// Acquire the next image; `Ok((index, suboptimal))`
    pub fn acquire_next_image(&self, signal: vk::Semaphore) -> VulkanResult<(u32, bool)> {
        unsafe {
            self.loader
                .acquire_next_image(self.swapchain, u64::MAX, signal, vk::Fence::null())
        }
        .or_vk("acquire swapchain image")
    }

    /// Queue an image for presentation; `Ok(true)` when suboptimal
    pub fn present(&self, queue: vk::Queue, image_index: u32, wait: vk::Semaphore) -> VulkanResult<bool> {
        let wait_semaphores = [wait];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        unsafe { self.loader.queue_present(queue, &present_info) }.or_vk("present swapchain image")
    }

    /// Image extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Surface format
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// One view per swapchain image
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Swapchain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(current: (u32, u32), min_count: u32, max_count: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: current.0,
                height: current.1,
            },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            min_image_count: min_count,
            max_image_count: max_count,
            ..Default::default()
        }
    }

    #[test]
    fn test_prefers_srgb_format() {
        let unorm = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        let srgb = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        assert_eq!(choose_surface_format(&[unorm, srgb]), Some(srgb));
        assert_eq!(choose_surface_format(&[unorm]), Some(unorm));
        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn test_present_mode_fallback() {
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX]),
            vk::PresentModeKHR::MAILBOX
        );
        assert_eq!(choose_present_mode(&[vk::PresentModeKHR::IMMEDIATE]), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_extent_uses_current_extent() {
        let window = vk::Extent2D { width: 800, height: 600 };
        assert_eq!(choose_extent(&caps((1024, 768), 2, 3), window), vk::Extent2D { width: 1024, height: 768 });
    }

    #[test]
    fn test_extent_clamps_window_size() {
        let window = vk::Extent2D { width: 9000, height: 0 };
        let extent = choose_extent(&caps((u32::MAX, u32::MAX), 2, 3), window);
        assert_eq!(extent, vk::Extent2D { width: 4096, height: 1 });
    }

    #[test]
    fn test_image_count() {
        assert_eq!(choose_image_count(&caps((1, 1), 2, 0)), 3);
        assert_eq!(choose_image_count(&caps((1, 1), 2, 2)), 2);
    }
}
