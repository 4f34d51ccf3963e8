//! Rendering system
//!
//! [`Renderer`] is the engine-facing renderer. It is a tagged variant over
//! the two backend renderers; both implement [`RenderBackend`], and the
//! variant is picked from the window's presentation resource when the
//! renderer is created.
//!
//! A renderer owns exactly one resource set (the GPU copy of the loaded
//! model). [`RenderBackend::load_model`] builds the replacement completely
//! before the old set is released, so a failed load leaves the renderer
//! drawing what it drew before.

pub mod backends;
pub mod config;
pub mod frame;
pub mod model;
pub mod primitives;
pub mod window;

use std::path::Path;

use log::info;

pub use config::RendererConfig;
pub use model::{DrawRange, Model};
pub use primitives::{Uniforms, Vertex};

use crate::assets::ModelError;
use crate::platform::GraphicsApi;
use backends::opengl::{GlError, OpenGlRenderer};
use backends::vulkan::{VulkanError, VulkanRenderer};
use window::{Presentation, Window, WindowError};

/// High-level rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// OpenGL call failed
    #[error("OpenGL: {0}")]
    Gl(#[from] GlError),

    /// Vulkan call failed
    #[error("Vulkan: {0}")]
    Vulkan(#[from] VulkanError),

    /// Model could not be loaded
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Window could not provide its presentation resource
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Operations every backend renderer provides
pub trait RenderBackend {
    /// Load an OBJ model and replace the current resource set
    ///
    /// On error the previous model stays loaded and drawable.
    fn load_model(&mut self, path: &Path) -> RenderResult<()>;

    /// Draw one frame; clears only when no model is loaded
    fn render_frame(&mut self) -> RenderResult<()>;

    /// Metadata of the loaded model
    fn model(&self) -> Option<&Model>;

    /// Drawable size changed
    fn resize(&mut self, width: u32, height: u32);
}

/// Renderer for the window's graphics API
pub enum Renderer {
    /// OpenGL 3.3 core renderer
    OpenGl(OpenGlRenderer),
    /// Vulkan 1.0 renderer
    Vulkan(VulkanRenderer),
}

impl Renderer {
    /// Create the renderer matching the window's presentation resource
    ///
    /// For OpenGL the window's context is made current first.
    pub fn new(window: &mut Window<'_>, config: &RendererConfig) -> RenderResult<Self> {
        let size = window.size();
        if window.api() == GraphicsApi::OpenGl {
            window.make_current()?;
        }
        let renderer = match window.presentation() {
            Presentation::OpenGl => Renderer::OpenGl(OpenGlRenderer::new(window.dependent(), size, config)?),
            Presentation::Vulkan(surface) => {
                Renderer::Vulkan(VulkanRenderer::new(surface, size, window.dependent(), config)?)
            }
        };
        info!("{} renderer created", renderer.api());
        Ok(renderer)
    }

    /// Graphics API of the active variant
    pub fn api(&self) -> GraphicsApi {
        match self {
            Renderer::OpenGl(_) => GraphicsApi::OpenGl,
            Renderer::Vulkan(_) => GraphicsApi::Vulkan,
        }
    }

    fn backend(&self) -> &dyn RenderBackend {
        match self {
            Renderer::OpenGl(renderer) => renderer,
            Renderer::Vulkan(renderer) => renderer,
        }
    }

    fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        match self {
            Renderer::OpenGl(renderer) => renderer,
            Renderer::Vulkan(renderer) => renderer,
        }
    }
}

impl RenderBackend for Renderer {
    fn load_model(&mut self, path: &Path) -> RenderResult<()> {
        self.backend_mut().load_model(path)?;
        if let Some(model) = self.model() {
            info!(
                "Loaded {:?}: {} vertices, {} indices, {} draw range(s)",
                model.path,
                model.vertex_count,
                model.index_count,
                model.draws.len()
            );
        }
        Ok(())
    }

    fn render_frame(&mut self) -> RenderResult<()> {
        self.backend_mut().render_frame()
    }

    fn model(&self) -> Option<&Model> {
        self.backend().model()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.backend_mut().resize(width, height);
    }
}
