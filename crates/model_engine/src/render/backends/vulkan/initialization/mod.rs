//! Vulkan initialization (instance, surface, devices)

pub mod device;
pub mod instance;
pub mod surface;
