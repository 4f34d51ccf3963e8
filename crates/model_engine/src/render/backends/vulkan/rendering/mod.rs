//! Vulkan rendering operations (shaders, pipelines, render passes, commands)

pub mod commands;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod vertex_layout;
