//! # Model Engine
//!
//! A small real-time model renderer with interchangeable graphics APIs
//! (OpenGL 3.3 core, Vulkan 1.0) and windowing toolkits (GLFW, SDL2).
//!
//! ## Features
//!
//! - **Runtime backend selection**: one API for every API/toolkit pair
//! - **Ordered lifecycles**: instance, window and renderer teardown order is
//!   enforced by ownership and lifecycle tokens
//! - **OBJ models**: de-duplicated vertices, MTL diffuse textures
//! - **Enriched errors**: every failed native call carries the driver's code
//!   or log
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use model_engine::prelude::*;
//!
//! struct Viewer {
//!     renderer: Renderer,
//! }
//!
//! impl EventHandler for Viewer {
//!     fn handle_event(&mut self, event: &WindowEvent) -> LoopControl {
//!         match event {
//!             WindowEvent::Key { key: Key::Escape, pressed: true } => LoopControl::Exit,
//!             WindowEvent::Resized { width, height } => {
//!                 self.renderer.resize(*width, *height);
//!                 LoopControl::Continue
//!             }
//!             _ => LoopControl::Continue,
//!         }
//!     }
//!
//!     fn frame(&mut self) -> EngineResult<()> {
//!         Ok(self.renderer.render_frame()?)
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     platform::select(BackendPair::new(GraphicsApi::OpenGl, Toolkit::Glfw))?;
//!     let instance = platform::get_instance()?;
//!     let mut window = platform::create_window(&instance, 1280, 720, "Viewer")?;
//!     let mut renderer = platform::create_renderer(&mut window, &RendererConfig::default())?;
//!     renderer.load_model(std::path::Path::new("cube.obj"))?;
//!
//!     let mut viewer = Viewer { renderer };
//!     while window.run_loop(&mut viewer)? {}
//!
//!     platform::destroy_renderer(viewer.renderer);
//!     platform::destroy_window(window).map_err(|refused| refused.error)?;
//!     platform::destroy_instance(instance);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod lifecycle;
pub mod platform;
pub mod render;

use assets::ModelError;
use config::ConfigError;
use lifecycle::LifecycleError;
use platform::{InstanceError, SelectionError};
use render::window::WindowError;
use render::RenderError;

/// Engine-level errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be read or written
    #[error("Configuration: {0}")]
    Config(#[from] ConfigError),

    /// Backend selection conflict
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Instance initialization failed
    #[error("Instance: {0}")]
    Instance(#[from] InstanceError),

    /// Window creation or event handling failed
    #[error("Window: {0}")]
    Window(#[from] WindowError),

    /// Renderer creation or drawing failed
    #[error("Renderer: {0}")]
    Render(#[from] RenderError),

    /// Model loading failed
    #[error("Model: {0}")]
    Model(#[from] ModelError),

    /// Teardown order violated
    #[error("Lifecycle: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ViewerConfig, WindowConfig},
        platform::{self, BackendPair, GraphicsApi, Instance, Toolkit},
        render::{
            window::{EventHandler, Key, LoopControl, MouseButton, Window, WindowEvent},
            Model, RenderBackend, Renderer, RendererConfig,
        },
        EngineError, EngineResult,
    };
}
