//! OpenGL 3.3 core backend

pub mod error;
pub mod renderer;
pub mod resources;
pub mod shader;

pub use error::{GlError, GlResult};
pub use renderer::OpenGlRenderer;
pub use shader::{get_shaders, GlShader, ShaderStage};
