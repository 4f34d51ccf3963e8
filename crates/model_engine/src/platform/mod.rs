//! Backend selection and the engine factory
//!
//! The graphics API and windowing toolkit are picked once per process with
//! [`select`]. Everything else is created and destroyed through three
//! symmetric pairs of factory functions:
//!
//! | create | destroy |
//! |---|---|
//! | [`get_instance`] | [`destroy_instance`] |
//! | [`create_window`] | [`destroy_window`] |
//! | [`create_renderer`] | [`destroy_renderer`] |
//!
//! Creation returns an owned value; destruction consumes it. Dispatch over
//! the selected backends is a plain `match` on enums, never a loaded plugin.

pub mod instance;

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use instance::{Instance, InstanceError};

use crate::lifecycle::LifecycleError;
use crate::render::window::{Window, WindowResult};
use crate::render::{RenderResult, Renderer, RendererConfig};

/// Graphics API used for rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsApi {
    /// OpenGL 3.3 core
    #[default]
    OpenGl,
    /// Vulkan 1.0
    Vulkan,
}

/// Windowing toolkit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolkit {
    /// GLFW 3
    #[default]
    Glfw,
    /// SDL 2
    Sdl,
}

impl fmt::Display for GraphicsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GraphicsApi::OpenGl => "OpenGL",
            GraphicsApi::Vulkan => "Vulkan",
        })
    }
}

impl fmt::Display for Toolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Toolkit::Glfw => "GLFW",
            Toolkit::Sdl => "SDL",
        })
    }
}

/// Unrecognized backend name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} \"{name}\"")]
pub struct ParseBackendError {
    kind: &'static str,
    name: String,
}

impl FromStr for GraphicsApi {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "opengl" | "gl" => Ok(GraphicsApi::OpenGl),
            "vulkan" | "vk" => Ok(GraphicsApi::Vulkan),
            _ => Err(ParseBackendError {
                kind: "graphics API",
                name: s.to_string(),
            }),
        }
    }
}

impl FromStr for Toolkit {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "glfw" => Ok(Toolkit::Glfw),
            "sdl" | "sdl2" => Ok(Toolkit::Sdl),
            _ => Err(ParseBackendError {
                kind: "toolkit",
                name: s.to_string(),
            }),
        }
    }
}

/// Graphics API plus windowing toolkit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendPair {
    /// Graphics API
    pub api: GraphicsApi,
    /// Windowing toolkit
    pub toolkit: Toolkit,
}

impl BackendPair {
    /// Pair from its parts
    pub const fn new(api: GraphicsApi, toolkit: Toolkit) -> Self {
        Self { api, toolkit }
    }
}

impl fmt::Display for BackendPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api, self.toolkit)
    }
}

/// A different backend pair was already selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("backend already selected as {current}, cannot switch to {requested}")]
pub struct SelectionError {
    /// Pair fixed by the first selection
    pub current: BackendPair,
    /// Pair that was refused
    pub requested: BackendPair,
}

/// Write-once backend selection
#[derive(Debug, Default)]
pub struct Selection {
    pair: OnceLock<BackendPair>,
}

impl Selection {
    /// Empty selection
    pub const fn new() -> Self {
        Self { pair: OnceLock::new() }
    }

    /// Fix the pair; selecting the same pair again is a no-op
    pub fn select(&self, requested: BackendPair) -> Result<(), SelectionError> {
        let current = *self.pair.get_or_init(|| requested);
        if current == requested {
            Ok(())
        } else {
            Err(SelectionError { current, requested })
        }
    }

    /// The fixed pair, if any
    pub fn selected(&self) -> Option<BackendPair> {
        self.pair.get().copied()
    }
}

static SELECTION: Selection = Selection::new();

/// Fix the process-wide backend pair
pub fn select(pair: BackendPair) -> Result<(), SelectionError> {
    SELECTION.select(pair)?;
    debug!("Backend selected: {}", pair);
    Ok(())
}

/// The process-wide backend pair, if one was selected
pub fn selected() -> Option<BackendPair> {
    SELECTION.selected()
}

/// An object whose destruction was refused, handed back with the reason
#[derive(thiserror::Error)]
#[error("{error}")]
pub struct Refused<T> {
    /// The object, still alive
    pub value: T,
    /// Why it could not be destroyed
    pub error: LifecycleError,
}

impl<T> Refused<T> {
    /// Take the object back
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for Refused<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refused").field("error", &self.error).finish_non_exhaustive()
    }
}

/// Initialize the toolkit (and Vulkan loader) for the selected backend pair
pub fn get_instance() -> Result<Instance, InstanceError> {
    let pair = selected().ok_or(InstanceError::NotSelected)?;
    Instance::new(pair)
}

/// Tear down the instance
pub fn destroy_instance(instance: Instance) {
    drop(instance);
}

/// Create a window with its presentation resource
pub fn create_window<'i>(instance: &'i Instance, width: u32, height: u32, title: &str) -> WindowResult<Window<'i>> {
    Window::new(instance, width, height, title)
}

/// Destroy a window; refused while renderers built on it are alive
pub fn destroy_window(window: Window<'_>) -> Result<(), Refused<Window<'_>>> {
    if let Err(error) = window.scope().check_release() {
        return Err(Refused { value: window, error });
    }
    drop(window);
    info!("Window destroyed");
    Ok(())
}

/// Create the renderer matching the window's graphics API
pub fn create_renderer(window: &mut Window<'_>, config: &RendererConfig) -> RenderResult<Renderer> {
    Renderer::new(window, config)
}

/// Destroy a renderer and every GPU object it owns
pub fn destroy_renderer(renderer: Renderer) {
    let api = renderer.api();
    drop(renderer);
    info!("{} renderer destroyed", api);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_is_write_once() {
        let selection = Selection::new();
        assert_eq!(selection.selected(), None);

        let gl = BackendPair::new(GraphicsApi::OpenGl, Toolkit::Glfw);
        let vk = BackendPair::new(GraphicsApi::Vulkan, Toolkit::Sdl);
        selection.select(gl).unwrap();
        selection.select(gl).unwrap();
        assert_eq!(
            selection.select(vk),
            Err(SelectionError {
                current: gl,
                requested: vk
            })
        );
        assert_eq!(selection.selected(), Some(gl));
    }

    #[test]
    fn test_instance_requires_selection() {
        // No test in this crate fixes the process-wide selection
        assert_eq!(selected(), None);
        assert!(matches!(get_instance(), Err(InstanceError::NotSelected)));
    }

    #[test]
    fn test_parse_backend_names() {
        assert_eq!("Vulkan".parse::<GraphicsApi>().unwrap(), GraphicsApi::Vulkan);
        assert_eq!("gl".parse::<GraphicsApi>().unwrap(), GraphicsApi::OpenGl);
        assert_eq!("sdl2".parse::<Toolkit>().unwrap(), Toolkit::Sdl);
        assert!("directx".parse::<GraphicsApi>().is_err());
        assert!("qt".parse::<Toolkit>().is_err());
    }

    #[test]
    fn test_display_names() {
        let pair = BackendPair::new(GraphicsApi::Vulkan, Toolkit::Glfw);
        assert_eq!(pair.to_string(), "Vulkan/GLFW");
        assert_eq!(BackendPair::default().to_string(), "OpenGL/GLFW");
    }

    #[test]
    fn test_serde_names_are_lowercase() {
        let pair: BackendPair = toml::from_str("api = \"vulkan\"\ntoolkit = \"sdl\"\n").unwrap();
        assert_eq!(pair, BackendPair::new(GraphicsApi::Vulkan, Toolkit::Sdl));
    }
}
