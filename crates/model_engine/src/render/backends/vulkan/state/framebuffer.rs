//! Framebuffers and the depth attachment

use ash::{vk, Device};

use crate::render::backends::vulkan::resources::find_memory_type;
use crate::render::backends::vulkan::{VkResultExt, VulkanResult};

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a framebuffer over the given attachments
    pub fn new(
        device: &Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.create_framebuffer(&create_info, None) }.or_vk("create framebuffer")?;

        Ok(Self {
            device: device.clone(),
            framebuffer,
        })
    }

    /// Framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// Depth image sized to the swapchain
pub struct DepthBuffer {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    image_view: vk::ImageView,
}

impl DepthBuffer {
    /// Depth format used by the render pass
    pub const FORMAT: vk::Format = vk::Format::D32_SFLOAT;

    /// Allocate a device-local depth buffer
    pub fn new(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let mut wrapper = Self {
            device: device.clone(),
            image: vk::Image::null(),
            memory: vk::DeviceMemory::null(),
            image_view: vk::ImageView::null(),
        };

        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(Self::FORMAT)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);
        wrapper.image = unsafe { device.create_image(&image_info, None) }.or_vk("create depth image")?;

        let requirements = unsafe { device.get_image_memory_requirements(wrapper.image) };
        let memory_type = find_memory_type(
            memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        wrapper.memory = unsafe { device.allocate_memory(&alloc_info, None) }.or_vk("allocate depth memory")?;
        unsafe { device.bind_image_memory(wrapper.image, wrapper.memory, 0) }.or_vk("bind depth memory")?;

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(wrapper.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(Self::FORMAT)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        wrapper.image_view = unsafe { device.create_image_view(&view_info, None) }.or_vk("create depth view")?;

        Ok(wrapper)
    }

    /// Image view handle
    pub fn view(&self) -> vk::ImageView {
        self.image_view
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
