//! Descriptor set layout, pool and updates
//!
//! Set 0 matches the model shaders: binding 0 is the `Uniforms` block read by
//! the vertex stage, binding 1 the diffuse sampler read by the fragment stage.

use ash::{vk, Device};

use crate::render::backends::vulkan::{VkResultExt, VulkanResult};

/// Binding of the uniform buffer
pub const UNIFORM_BINDING: u32 = 0;
/// Binding of the diffuse texture
pub const TEXTURE_BINDING: u32 = 1;

/// The layout's bindings
pub fn model_bindings() -> [vk::DescriptorSetLayoutBinding; 2] {
    [
        vk::DescriptorSetLayoutBinding::builder()
            .binding(UNIFORM_BINDING)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::VERTEX)
            .build(),
        vk::DescriptorSetLayoutBinding::builder()
            .binding(TEXTURE_BINDING)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::FRAGMENT)
            .build(),
    ]
}

/// Descriptor set layout wrapper
pub struct DescriptorSetLayout {
    device: Device,
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Layout for the model shaders
    pub fn for_model(device: &Device) -> VulkanResult<Self> {
        let bindings = model_bindings();
        let create_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);
        let layout = unsafe { device.create_descriptor_set_layout(&create_info, None) }
            .or_vk("create descriptor set layout")?;
        Ok(Self {
            device: device.clone(),
            layout,
        })
    }

    /// Layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe { self.device.destroy_descriptor_set_layout(self.layout, None) };
    }
}

/// Pool sized for a fixed number of model sets
///
/// Sets are freed all at once when the pool is dropped.
pub struct DescriptorPool {
    device: Device,
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    /// Pool able to hold `max_sets` model sets
    pub fn new(device: &Device, max_sets: u32) -> VulkanResult<Self> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: max_sets,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: max_sets,
            },
        ];
        let create_info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(&pool_sizes)
            .max_sets(max_sets);
        let pool = unsafe { device.create_descriptor_pool(&create_info, None) }
            .or_vk(&format!("create descriptor pool for {max_sets} sets"))?;
        Ok(Self {
            device: device.clone(),
            pool,
        })
    }

    /// Allocate `count` sets with the same layout
    pub fn allocate(&self, layout: &DescriptorSetLayout, count: usize) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let layouts = vec![layout.handle(); count];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);
        unsafe { self.device.allocate_descriptor_sets(&alloc_info) }
            .or_vk(&format!("allocate {count} descriptor sets"))
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe { self.device.destroy_descriptor_pool(self.pool, None) };
    }
}

/// Point a model set at a uniform buffer and a texture
///
/// The info structs live on this stack frame for the whole update call.
pub fn write_model_set(
    device: &Device,
    set: vk::DescriptorSet,
    uniform_buffer: vk::Buffer,
    uniform_range: vk::DeviceSize,
    view: vk::ImageView,
    sampler: vk::Sampler,
) {
    let buffer_info = [vk::DescriptorBufferInfo {
        buffer: uniform_buffer,
        offset: 0,
        range: uniform_range,
    }];
    let image_info = [vk::DescriptorImageInfo {
        sampler,
        image_view: view,
        image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    }];
    let writes = [
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(UNIFORM_BINDING)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&buffer_info)
            .build(),
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(TEXTURE_BINDING)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_info)
            .build(),
    ];
    unsafe { device.update_descriptor_sets(&writes, &[]) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_match_shader_interface() {
        let bindings = model_bindings();
        assert_eq!(bindings[0].binding, 0);
        assert_eq!(bindings[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(bindings[0].stage_flags, vk::ShaderStageFlags::VERTEX);
        assert_eq!(bindings[1].binding, 1);
        assert_eq!(bindings[1].descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }
}
