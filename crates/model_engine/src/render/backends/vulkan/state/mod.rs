//! Vulkan presentation state (swapchain, framebuffers, synchronization)

pub mod framebuffer;
pub mod swapchain;
pub mod sync;
