//! Renderer settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the vertex shader binary used to locate the shader directory
const SHADER_PROBE: &str = "model_vert.spv";

/// Directories searched for compiled SPIR-V when none is configured
const SHADER_SEARCH_PATHS: [&str; 5] = [
    "target/shaders",
    "shaders",
    "resources/shaders",
    "../target/shaders",
    "../../target/shaders",
];

/// Renderer configuration shared by both backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Background color, linear RGBA
    pub clear_color: [f32; 4],
    /// Frames the CPU may record ahead of the GPU (Vulkan only)
    pub max_frames_in_flight: usize,
    /// Directory holding compiled SPIR-V shaders (Vulkan only)
    pub shader_dir: Option<PathBuf>,
    /// Spin the model around its vertical axis
    pub rotate_model: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.05, 0.05, 0.08, 1.0],
            max_frames_in_flight: 2,
            shader_dir: None,
            rotate_model: true,
        }
    }
}

impl RendererConfig {
    /// Largest accepted frames-in-flight count
    pub const MAX_FRAMES_IN_FLIGHT: usize = 8;

    /// Set the background color
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Set the frames-in-flight count
    pub fn with_max_frames_in_flight(mut self, frames: usize) -> Self {
        self.max_frames_in_flight = frames;
        self
    }

    /// Use a fixed SPIR-V directory
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    /// Enable or disable model rotation
    pub fn with_rotation(mut self, rotate: bool) -> Self {
        self.rotate_model = rotate;
        self
    }

    /// Frames-in-flight clamped to `1..=MAX_FRAMES_IN_FLIGHT`
    pub fn frames_in_flight(&self) -> usize {
        self.max_frames_in_flight.clamp(1, Self::MAX_FRAMES_IN_FLIGHT)
    }

    /// Directory holding the compiled SPIR-V shaders
    ///
    /// A configured directory is returned as is. Otherwise the search paths
    /// are probed relative to the working directory; `None` means nothing
    /// was found.
    pub fn resolve_shader_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.shader_dir {
            return Some(dir.clone());
        }
        SHADER_SEARCH_PATHS
            .iter()
            .map(Path::new)
            .find(|dir| dir.join(SHADER_PROBE).is_file())
            .map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_in_flight_is_clamped() {
        assert_eq!(RendererConfig::default().frames_in_flight(), 2);
        assert_eq!(RendererConfig::default().with_max_frames_in_flight(0).frames_in_flight(), 1);
        assert_eq!(
            RendererConfig::default().with_max_frames_in_flight(64).frames_in_flight(),
            RendererConfig::MAX_FRAMES_IN_FLIGHT
        );
    }

    #[test]
    fn test_configured_shader_dir_wins() {
        let config = RendererConfig::default().with_shader_dir("/opt/shaders");
        assert_eq!(config.resolve_shader_dir(), Some(PathBuf::from("/opt/shaders")));
    }

    #[test]
    fn test_builders() {
        let config = RendererConfig::default()
            .with_clear_color([1.0, 0.0, 0.0, 1.0])
            .with_rotation(false);
        assert_eq!(config.clear_color, [1.0, 0.0, 0.0, 1.0]);
        assert!(!config.rotate_model);
    }
}
