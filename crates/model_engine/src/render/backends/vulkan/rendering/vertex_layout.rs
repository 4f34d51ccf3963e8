//! Vertex input description for [`Vertex`]

use std::mem::size_of;

use ash::vk;

use crate::render::Vertex;

/// Vulkan vertex layout of the engine's Vertex type
pub struct VulkanVertexLayout;

impl VulkanVertexLayout {
    /// One interleaved binding advancing per vertex
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Position, normal and texture coordinate at locations 0, 1 and 2
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: Vertex::POSITION_OFFSET as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: Vertex::NORMAL_OFFSET as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: Vertex::TEX_COORD_OFFSET as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_stride() {
        let binding = VulkanVertexLayout::binding_description();
        assert_eq!(binding.stride, 32);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_attributes_cover_vertex() {
        let attributes = VulkanVertexLayout::attribute_descriptions();
        let offsets: Vec<u32> = attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let locations: Vec<u32> = attributes.iter().map(|a| a.location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
        assert_eq!(attributes[2].format, vk::Format::R32G32_SFLOAT);
    }
}
