//! Window management subsystem
//!
//! A [`Window`] owns the native window and its presentation resource: the
//! OpenGL context, or a Vulkan instance plus surface. Creation order is
//! native window, then presentation resource; teardown is the exact reverse.
//!
//! - **`events`**: toolkit-neutral events and the [`EventHandler`] callbacks
//! - **`backend`**: internal trait implemented per toolkit
//! - **`glfw_backend`**, **`sdl_backend`**: the toolkit implementations

pub mod backend;
pub mod events;
mod glfw_backend;
mod sdl_backend;

use log::{debug, info};

pub use backend::{WindowError, WindowResult};
pub use events::{EventHandler, Key, LoopControl, MouseButton, WindowEvent};

use backend::WindowBackend;
use glfw_backend::GlfwWindow;
use sdl_backend::SdlWindow;

use crate::lifecycle::{Dependent, OwnerScope};
use crate::platform::instance::ToolkitContext;
use crate::platform::{GraphicsApi, Instance};
use crate::render::backends::vulkan::{VulkanInstance, VulkanSurface};
use crate::EngineResult;

/// Presentation resource of a window
pub(crate) enum Presentation {
    /// The context lives inside the native window
    OpenGl,
    /// Instance and surface owned by the window
    Vulkan(VulkanSurface),
}

/// Platform window bound to the [`Instance`] it was created from
///
/// The borrow keeps the instance alive; renderers built on the window hold a
/// lifecycle token, and dropping the window while one is alive is a fatal
/// ordering error.
pub struct Window<'i> {
    // Field order is teardown order
    scope: OwnerScope,
    presentation: Presentation,
    native: Box<dyn WindowBackend>,
    events: Vec<WindowEvent>,
    api: GraphicsApi,
    instance: &'i Instance,
}

impl<'i> Window<'i> {
    pub(crate) fn new(instance: &'i Instance, width: u32, height: u32, title: &str) -> WindowResult<Self> {
        let api = instance.backend().api;
        let native: Box<dyn WindowBackend> = match instance.toolkit() {
            ToolkitContext::Glfw(glfw) => Box::new(GlfwWindow::new(glfw, api, width, height, title)?),
            ToolkitContext::Sdl { sdl, video } => Box::new(SdlWindow::new(sdl, video, api, width, height, title)?),
        };

        let presentation = match api {
            GraphicsApi::OpenGl => Presentation::OpenGl,
            GraphicsApi::Vulkan => {
                let entry = instance
                    .vulkan_entry()
                    .ok_or(WindowError::ApiMismatch("Vulkan"))?;
                let extensions = native.required_instance_extensions()?;
                let vulkan = VulkanInstance::new(entry, &extensions, title)?;
                Presentation::Vulkan(VulkanSurface::new(entry, vulkan, |handle| native.create_surface(handle))?)
            }
        };

        info!(
            "Created {}x{} {} window \"{}\" ({})",
            width,
            height,
            api,
            title,
            instance.backend().toolkit
        );
        Ok(Self {
            scope: OwnerScope::new("window"),
            presentation,
            native,
            events: Vec::new(),
            api,
            instance,
        })
    }

    /// Run one loop iteration
    ///
    /// Pending events are forwarded to `handler`, then `handler.frame()` draws
    /// and, for OpenGL, the back buffer is swapped. Returns `Ok(false)` once
    /// the window should close; the frame is skipped in that case.
    pub fn run_loop(&mut self, handler: &mut dyn EventHandler) -> EngineResult<bool> {
        self.native.poll_events(&mut self.events);
        for event in self.events.drain(..) {
            if handler.handle_event(&event) == LoopControl::Exit {
                self.native.set_should_close(true);
            }
        }
        if self.native.should_close() {
            debug!("Window close requested");
            return Ok(false);
        }

        if self.api == GraphicsApi::OpenGl {
            self.native.make_current()?;
        }
        handler.frame()?;
        if self.api == GraphicsApi::OpenGl {
            self.native.swap_buffers();
        }
        Ok(!self.native.should_close())
    }

    /// Drawable size in pixels
    pub fn size(&self) -> (u32, u32) {
        self.native.drawable_size()
    }

    /// Set the title bar text
    pub fn set_title(&mut self, title: &str) {
        self.native.set_title(title);
    }

    /// Ask the loop to stop after the current iteration
    pub fn request_close(&mut self) {
        self.native.set_should_close(true);
    }

    /// Whether closing has been requested
    pub fn should_close(&self) -> bool {
        self.native.should_close()
    }

    /// Graphics API of the presentation resource
    pub fn api(&self) -> GraphicsApi {
        self.api
    }

    /// Instance the window belongs to
    pub fn instance(&self) -> &'i Instance {
        self.instance
    }

    /// Number of live renderers built on this window
    pub fn live_renderers(&self) -> usize {
        self.scope.live_dependents()
    }

    pub(crate) fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub(crate) fn dependent(&self) -> Dependent {
        self.scope.dependent()
    }

    pub(crate) fn scope(&self) -> &OwnerScope {
        &self.scope
    }

    pub(crate) fn make_current(&mut self) -> WindowResult<()> {
        self.native.make_current()
    }
}
