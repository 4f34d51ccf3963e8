//! Vulkan resource management (buffers, textures, descriptors)

pub mod buffer;
pub mod descriptor;
pub mod texture;

use ash::vk;

use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Index of the first memory type allowed by `type_filter` that has all of `flags`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    flags: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    (0..memory_properties.memory_type_count)
        .find(|&i| {
            type_filter & (1 << i) != 0
                && memory_properties.memory_types[i as usize].property_flags.contains(flags)
        })
        .ok_or_else(|| {
            VulkanError::new("Failed to find a suitable memory type")
                .with_message(&format!("filter {type_filter:#b}, required {flags:?}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(types: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: types.len() as u32,
            ..Default::default()
        };
        for (slot, &flags) in props.memory_types.iter_mut().zip(types) {
            slot.property_flags = flags;
        }
        props
    }

    #[test]
    fn test_picks_first_matching_type() {
        let props = properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        ]);
        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        assert_eq!(find_memory_type(&props, 0b111, host).unwrap(), 2);
        assert_eq!(find_memory_type(&props, 0b111, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap(), 1);
    }

    #[test]
    fn test_respects_type_filter() {
        let props = properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL, vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        assert_eq!(find_memory_type(&props, 0b10, vk::MemoryPropertyFlags::DEVICE_LOCAL).unwrap(), 1);
    }

    #[test]
    fn test_no_match_is_error() {
        let props = properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        let error = find_memory_type(&props, 0b1, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap_err();
        assert!(error.description().starts_with("Failed to find a suitable memory type"));
        assert!(error.description().contains("HOST_VISIBLE"));
    }
}
