//! Vulkan backend implementation
//!
//! Organized into initialization, resources, rendering and state modules.

/// Vulkan error wrapper
pub mod error;

/// Vulkan initialization types (instance, surface, device)
pub mod initialization;

/// Vulkan resource management (buffers, textures, descriptors)
pub mod resources;

/// Vulkan rendering operations (shaders, pipelines, render passes, commands)
pub mod rendering;

/// Vulkan state management
pub mod state;

/// Main Vulkan renderer implementation
pub mod renderer;

pub use error::{VkResultExt, VulkanError, VulkanResult};
pub use initialization::device::{LogicalDevice, PhysicalDeviceInfo};
pub use initialization::instance::VulkanInstance;
pub use initialization::surface::{SurfaceHandle, VulkanSurface};
pub use renderer::VulkanRenderer;
pub use rendering::shader::{get_shaders, SpirvShader};
