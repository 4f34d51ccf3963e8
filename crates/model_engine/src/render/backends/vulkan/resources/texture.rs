//! Sampled 2D textures uploaded through a staging buffer

use ash::{vk, Device};
use log::debug;

use super::buffer::Buffer;
use super::find_memory_type;
use crate::assets::ImageData;
use crate::render::backends::vulkan::rendering::commands::CommandPool;
use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

/// Device access needed to upload textures
pub struct TransferContext<'a> {
    /// Logical device
    pub device: &'a Device,
    /// Memory types of the physical device
    pub memory_properties: &'a vk::PhysicalDeviceMemoryProperties,
    /// Queue the copy is submitted to
    pub queue: vk::Queue,
    /// Pool for the one-shot copy command buffer
    pub command_pool: &'a CommandPool,
    /// Sampler anisotropy level, `None` when the device lacks the feature
    pub anisotropy: Option<f32>,
}

/// Highest anisotropy level requested for texture samplers
pub const PREFERRED_ANISOTROPY: f32 = 16.0;

/// Anisotropy level for samplers on a device
///
/// Never exceeds the device's `maxSamplerAnisotropy` limit.
pub fn anisotropy_level(supported: bool, device_limit: f32) -> Option<f32> {
    supported.then(|| PREFERRED_ANISOTROPY.min(device_limit).max(1.0))
}

/// Device-local RGBA texture with view and sampler
pub struct Texture {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    sampler: vk::Sampler,
}

impl Texture {
    /// sRGB format matching the GL backend's `SRGB8_ALPHA8`
    pub const FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

    /// Upload an RGBA8 image
    pub fn from_image(ctx: &TransferContext<'_>, image: &ImageData) -> VulkanResult<Self> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.width == 0 || image.height == 0 || image.byte_len() != expected {
            return Err(VulkanError::new("Failed to create texture").with_message(&format!(
                "{}x{} image has {} bytes, expected {}",
                image.width,
                image.height,
                image.byte_len(),
                expected
            )));
        }

        let staging = Buffer::with_data(
            ctx.device,
            ctx.memory_properties,
            &image.data,
            vk::BufferUsageFlags::TRANSFER_SRC,
        )?;

        let mut texture = Self {
            device: ctx.device.clone(),
            image: vk::Image::null(),
            memory: vk::DeviceMemory::null(),
            view: vk::ImageView::null(),
            sampler: vk::Sampler::null(),
        };
        let extent = vk::Extent3D {
            width: image.width,
            height: image.height,
            depth: 1,
        };
        texture.create_image(ctx, extent)?;

        let target = texture.image;
        ctx.command_pool.submit_one_time(ctx.queue, |device, cmd| unsafe {
            transition(
                device,
                cmd,
                target,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );
            let region = vk::BufferImageCopy::builder()
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_extent(extent)
                .build();
            device.cmd_copy_buffer_to_image(
                cmd,
                staging.handle(),
                target,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
            transition(
                device,
                cmd,
                target,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            );
        })?;

        texture.create_view_and_sampler(ctx.anisotropy)?;
        debug!("Uploaded {}x{} texture", image.width, image.height);
        Ok(texture)
    }

    /// 1x1 white texture bound for untextured materials
    pub fn create_default_white(ctx: &TransferContext<'_>) -> VulkanResult<Self> {
        Self::from_image(ctx, &ImageData::solid_color(1, 1, [255, 255, 255, 255]))
    }

    fn create_image(&mut self, ctx: &TransferContext<'_>, extent: vk::Extent3D) -> VulkanResult<()> {
        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(extent)
            .mip_levels(1)
            .array_layers(1)
            .format(Self::FORMAT)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);
        self.image = unsafe { self.device.create_image(&image_info, None) }
            .or_vk(&format!("create {}x{} texture image", extent.width, extent.height))?;

        let requirements = unsafe { self.device.get_image_memory_requirements(self.image) };
        let memory_type = find_memory_type(
            ctx.memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        self.memory = unsafe { self.device.allocate_memory(&alloc_info, None) }
            .or_vk(&format!("allocate {} bytes of texture memory", requirements.size))?;
        unsafe { self.device.bind_image_memory(self.image, self.memory, 0) }.or_vk("bind texture memory")
    }

    fn create_view_and_sampler(&mut self, anisotropy: Option<f32>) -> VulkanResult<()> {
        let view_info = vk::ImageViewCreateInfo::builder()
            .image(self.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(Self::FORMAT)
            .subresource_range(color_range());
        self.view = unsafe { self.device.create_image_view(&view_info, None) }.or_vk("create texture view")?;

        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(anisotropy.is_some())
            .max_anisotropy(anisotropy.unwrap_or(1.0))
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .min_lod(0.0)
            .max_lod(0.0);
        self.sampler = unsafe { self.device.create_sampler(&sampler_info, None) }.or_vk("create texture sampler")?;
        Ok(())
    }

    /// Image view handle
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Sampler handle
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

fn color_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

unsafe fn transition(
    device: &Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    let (src_access, dst_access, src_stage, dst_stage) = match (old_layout, new_layout) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => (
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
        ),
        _ => (
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
    };

    let barrier = vk::ImageMemoryBarrier::builder()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(color_range())
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
        .build();

    device.cmd_pipeline_barrier(
        cmd,
        src_stage,
        dst_stage,
        vk::DependencyFlags::empty(),
        &[],
        &[],
        &[barrier],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anisotropy_respects_device_limit() {
        assert_eq!(anisotropy_level(true, 16.0), Some(16.0));
        assert_eq!(anisotropy_level(true, 4.0), Some(4.0));
        assert_eq!(anisotropy_level(true, 64.0), Some(PREFERRED_ANISOTROPY));
    }

    #[test]
    fn test_anisotropy_disabled_without_feature() {
        assert_eq!(anisotropy_level(false, 16.0), None);
    }
}
