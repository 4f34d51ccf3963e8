//! Model viewer
//!
//! Displays one OBJ model with the selected graphics API and windowing
//! toolkit. Escape closes the window; R reloads the model from disk and keeps
//! the previous one on screen if the reload fails.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{error, info, warn};
use model_engine::foundation::logging;
use model_engine::prelude::*;

struct ViewerApp {
    renderer: Renderer,
    model_path: Option<PathBuf>,
}

impl ViewerApp {
    fn reload(&mut self) {
        let Some(path) = self.model_path.as_deref() else {
            warn!("No model to reload");
            return;
        };
        match self.renderer.load_model(path) {
            Ok(()) => info!("Reloaded {}", path.display()),
            Err(e) => error!("Reload failed, keeping the previous model: {}", e),
        }
    }
}

impl EventHandler for ViewerApp {
    fn handle_event(&mut self, event: &WindowEvent) -> LoopControl {
        match *event {
            WindowEvent::CloseRequested
            | WindowEvent::Key {
                key: Key::Escape,
                pressed: true,
            } => LoopControl::Exit,
            WindowEvent::Key {
                key: Key::Char('r'),
                pressed: true,
            } => {
                self.reload();
                LoopControl::Continue
            }
            WindowEvent::Resized { width, height } => {
                self.renderer.resize(width, height);
                LoopControl::Continue
            }
            _ => LoopControl::Continue,
        }
    }

    fn frame(&mut self) -> EngineResult<()> {
        Ok(self.renderer.render_frame()?)
    }
}

fn cli() -> Command {
    Command::new("model_viewer")
        .about("Displays an OBJ model with OpenGL or Vulkan")
        .arg(
            Arg::new("model")
                .value_name("MODEL")
                .help("OBJ file to display")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Viewer configuration (.toml or .ron)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("api")
                .short('a')
                .long("api")
                .value_name("API")
                .help("Graphics API: opengl or vulkan")
                .value_parser(value_parser!(GraphicsApi)),
        )
        .arg(
            Arg::new("toolkit")
                .short('t')
                .long("toolkit")
                .value_name("TOOLKIT")
                .help("Windowing toolkit: glfw or sdl")
                .value_parser(value_parser!(Toolkit)),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .help("Window width")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .help("Window height")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("shader-dir")
                .long("shader-dir")
                .value_name("DIR")
                .help("Directory with compiled SPIR-V shaders (Vulkan)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-rotate")
                .long("no-rotate")
                .help("Keep the model still")
                .action(ArgAction::SetTrue),
        )
}

/// Config file first, then command line overrides
fn viewer_config(matches: &ArgMatches) -> Result<ViewerConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ViewerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    if let Some(&api) = matches.get_one::<GraphicsApi>("api") {
        config.backend.api = api;
    }
    if let Some(&toolkit) = matches.get_one::<Toolkit>("toolkit") {
        config.backend.toolkit = toolkit;
    }
    if let Some(&width) = matches.get_one::<u32>("width") {
        config.window.width = width;
    }
    if let Some(&height) = matches.get_one::<u32>("height") {
        config.window.height = height;
    }
    if let Some(dir) = matches.get_one::<PathBuf>("shader-dir") {
        config.renderer.shader_dir = Some(dir.clone());
    }
    if matches.get_flag("no-rotate") {
        config.renderer.rotate_model = false;
    }
    if let Some(model) = matches.get_one::<PathBuf>("model") {
        config.model = Some(model.clone());
    }
    Ok(config)
}

fn show(instance: &Instance, config: &ViewerConfig) -> Result<()> {
    let title = match &config.model {
        Some(model) => format!("{} - {} ({})", config.window.title, model.display(), config.backend),
        None => format!("{} ({})", config.window.title, config.backend),
    };
    let mut window = platform::create_window(instance, config.window.width, config.window.height, &title)
        .context("Failed to create window")?;
    let renderer = platform::create_renderer(&mut window, &config.renderer).context("Failed to create renderer")?;

    let mut app = ViewerApp {
        renderer,
        model_path: config.model.clone(),
    };
    match &config.model {
        Some(path) => app
            .renderer
            .load_model(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => warn!("No model given; showing an empty scene"),
    }

    while window.run_loop(&mut app)? {}

    platform::destroy_renderer(app.renderer);
    platform::destroy_window(window).map_err(|refused| refused.error)?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = viewer_config(matches)?;
    platform::select(config.backend)?;
    let instance = platform::get_instance().context("Failed to initialize platform")?;
    let result = show(&instance, &config);
    platform::destroy_instance(instance);
    result
}

fn main() -> ExitCode {
    logging::init();
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let matches = cli()
            .try_get_matches_from(["model_viewer", "--api", "vulkan", "-t", "sdl", "--width", "640", "cube.obj"])
            .unwrap();
        let config = viewer_config(&matches).unwrap();
        assert_eq!(config.backend, BackendPair::new(GraphicsApi::Vulkan, Toolkit::Sdl));
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, WindowConfig::default().height);
        assert_eq!(config.model, Some(PathBuf::from("cube.obj")));
        assert!(config.renderer.rotate_model);
    }

    #[test]
    fn test_cli_rejects_unknown_api() {
        assert!(cli().try_get_matches_from(["model_viewer", "--api", "metal"]).is_err());
        assert!(cli().try_get_matches_from(["model_viewer", "--width", "0"]).is_err());
    }

    #[test]
    fn test_cli_verifies() {
        cli().debug_assert();
    }
}
