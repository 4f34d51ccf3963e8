//! Toolkit-agnostic window trait
//!
//! Each windowing toolkit implements [`WindowBackend`]. The trait is
//! `pub(crate)`: applications only ever see [`Window`](super::Window).

use std::ffi::CString;

use ash::vk;

use super::events::WindowEvent;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Window management errors
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// The toolkit refused to create the native window
    #[error("{toolkit} window creation failed: {reason}")]
    CreationFailed {
        /// Toolkit name
        toolkit: &'static str,
        /// Toolkit diagnostic
        reason: String,
    },

    /// OpenGL context creation or activation failed
    #[error("OpenGL context error: {0}")]
    Context(String),

    /// Vulkan instance or surface creation failed
    #[error(transparent)]
    Vulkan(#[from] VulkanError),

    /// Graphics API and instance do not match
    #[error("instance was not initialized for {0}")]
    ApiMismatch(&'static str),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Internal trait for native window implementations
///
/// Implementations own the native window and, for OpenGL, its context. They
/// run on the thread that created them.
pub(crate) trait WindowBackend {
    /// Drain pending native events, translated, into `out`
    fn poll_events(&mut self, out: &mut Vec<WindowEvent>);

    /// Whether closing has been requested
    fn should_close(&self) -> bool;

    /// Request or cancel closing
    fn set_should_close(&mut self, should_close: bool);

    /// Drawable size in pixels
    fn drawable_size(&self) -> (u32, u32);

    /// Set the title bar text
    fn set_title(&mut self, title: &str);

    /// Make the window's OpenGL context current on this thread
    fn make_current(&mut self) -> WindowResult<()>;

    /// Present the OpenGL back buffer
    fn swap_buffers(&mut self);

    /// Instance extensions the toolkit needs for surface creation
    fn required_instance_extensions(&self) -> WindowResult<Vec<CString>>;

    /// Create a Vulkan surface for this window
    fn create_surface(&self, instance: &ash::Instance) -> VulkanResult<vk::SurfaceKHR>;
}

/// Convert toolkit extension names for instance creation
pub(crate) fn extension_names<I, S>(names: I) -> WindowResult<Vec<CString>>
where
    I: IntoIterator<Item = S>,
    S: Into<Vec<u8>>,
{
    names
        .into_iter()
        .map(|name| {
            CString::new(name).map_err(|e| {
                WindowError::from(VulkanError::new("Invalid instance extension name").with_message(&e.to_string()))
            })
        })
        .collect()
}
