//! Configuration system
//!
//! Viewer settings are plain serde structs. Any type implementing [`Config`]
//! can be loaded from or saved to `.toml` and `.ron` files; the format is
//! picked from the file extension.

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

use crate::platform::BackendPair;
use crate::render::RendererConfig;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML
    Toml,
    /// Rusty Object Notation
    Ron,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Parse configuration text in the given format
    fn parse(contents: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Render configuration text in the given format
    fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string())),
        }
    }

    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, format)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = self.render(ConfigFormat::from_path(path)?)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Window creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Title bar text
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Model Viewer".to_string(),
        }
    }
}

/// Top level settings of the model viewer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window parameters
    pub window: WindowConfig,
    /// Graphics API and windowing toolkit
    pub backend: BackendPair,
    /// Renderer tuning
    pub renderer: RendererConfig,
    /// Model shown at startup
    pub model: Option<PathBuf>,
}

impl Config for ViewerConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{GraphicsApi, Toolkit};

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path(Path::new("viewer.toml")).unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a/b/viewer.ron")).unwrap(), ConfigFormat::Ron);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("viewer.json")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            model = "assets/cube.obj"

            [window]
            width = 800
            height = 600
            title = "Cube"

            [backend]
            api = "vulkan"
            toolkit = "sdl"

            [renderer]
            clear_color = [0.1, 0.2, 0.3, 1.0]
        "#;
        let config = ViewerConfig::parse(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.title, "Cube");
        assert_eq!(config.backend.api, GraphicsApi::Vulkan);
        assert_eq!(config.backend.toolkit, Toolkit::Sdl);
        assert_eq!(config.renderer.clear_color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(config.model, Some(PathBuf::from("assets/cube.obj")));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = ViewerConfig::parse("[window]\nwidth = 640\n", ConfigFormat::Toml).unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, WindowConfig::default().height);
        assert_eq!(config.backend, BackendPair::default());
        assert!(config.model.is_none());
    }

    #[test]
    fn test_ron_text_round_trips() {
        let mut config = ViewerConfig::default();
        config.window.title = "Ron".to_string();
        config.backend.api = GraphicsApi::Vulkan;
        let text = config.render(ConfigFormat::Ron).unwrap();
        let parsed = ViewerConfig::parse(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(parsed.window, config.window);
        assert_eq!(parsed.backend, config.backend);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = ViewerConfig::parse("[window\nwidth = ", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("model_engine_config_{}.toml", std::process::id()));
        let mut config = ViewerConfig::default();
        config.window.height = 480;
        config.save_to_file(&path).unwrap();
        let loaded = ViewerConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.window.height, 480);
    }
}
