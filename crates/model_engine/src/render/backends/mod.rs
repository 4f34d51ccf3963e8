//! Graphics API backends
//!
//! Each backend implements [`RenderBackend`](crate::render::RenderBackend) on
//! top of the presentation resource its window created: a current OpenGL
//! context, or a Vulkan instance and surface.

pub mod opengl;
pub mod vulkan;
