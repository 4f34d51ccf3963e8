//! Window management using SDL2

use std::ffi::CString;

use ash::vk::{self, Handle};
use log::debug;
use sdl2::event::{Event, WindowEvent as SdlWindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton as SdlMouseButton;
use sdl2::video::{GLContext, GLProfile, SwapInterval};

use super::backend::{extension_names, WindowBackend, WindowError, WindowResult};
use super::events::{Key, MouseButton, WindowEvent};
use crate::platform::GraphicsApi;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// SDL window plus its event pump and, for OpenGL, its context
pub(crate) struct SdlWindow {
    // Declared first so the context is deleted before its window
    gl_context: Option<GLContext>,
    window: sdl2::video::Window,
    event_pump: sdl2::EventPump,
    api: GraphicsApi,
    should_close: bool,
}

impl SdlWindow {
    pub(crate) fn new(
        sdl: &sdl2::Sdl,
        video: &sdl2::VideoSubsystem,
        api: GraphicsApi,
        width: u32,
        height: u32,
        title: &str,
    ) -> WindowResult<Self> {
        let creation_failed = |reason: String| WindowError::CreationFailed { toolkit: "SDL", reason };

        let mut builder = video.window(title, width, height);
        builder.position_centered().resizable();
        match api {
            GraphicsApi::OpenGl => {
                let attr = video.gl_attr();
                attr.set_context_profile(GLProfile::Core);
                attr.set_context_version(3, 3);
                attr.set_framebuffer_srgb_compatible(true);
                attr.set_depth_size(24);
                attr.set_double_buffer(true);
                builder.opengl();
            }
            GraphicsApi::Vulkan => {
                builder.vulkan();
            }
        }
        let window = builder.build().map_err(|e| creation_failed(e.to_string()))?;
        let event_pump = sdl.event_pump().map_err(creation_failed)?;

        let gl_context = match api {
            GraphicsApi::OpenGl => {
                let context = window.gl_create_context().map_err(WindowError::Context)?;
                window.gl_make_current(&context).map_err(WindowError::Context)?;
                if let Err(e) = video.gl_set_swap_interval(SwapInterval::VSync) {
                    debug!("VSync unavailable: {}", e);
                }
                gl::load_with(|symbol| video.gl_get_proc_address(symbol) as *const _);
                debug!("OpenGL 3.3 core context current for \"{}\"", title);
                Some(context)
            }
            GraphicsApi::Vulkan => None,
        };

        Ok(Self {
            gl_context,
            window,
            event_pump,
            api,
            should_close: false,
        })
    }

    fn translate(&self, event: Event) -> Option<WindowEvent> {
        match event {
            Event::Quit { .. } => Some(WindowEvent::CloseRequested),
            Event::Window {
                win_event: SdlWindowEvent::Close,
                ..
            } => Some(WindowEvent::CloseRequested),
            Event::Window {
                win_event: SdlWindowEvent::SizeChanged(..),
                ..
            } => {
                // Reported size is in screen coordinates; the drawable may differ
                let (width, height) = self.drawable_size();
                Some(WindowEvent::Resized { width, height })
            }
            Event::KeyDown { keycode, .. } => Some(WindowEvent::Key {
                key: keycode.map_or(Key::Other, translate_key),
                pressed: true,
            }),
            Event::KeyUp { keycode, .. } => Some(WindowEvent::Key {
                key: keycode.map_or(Key::Other, translate_key),
                pressed: false,
            }),
            Event::MouseMotion { x, y, .. } => Some(WindowEvent::MouseMoved {
                x: f64::from(x),
                y: f64::from(y),
            }),
            Event::MouseButtonDown { mouse_btn, .. } => Some(WindowEvent::MouseButton {
                button: translate_button(mouse_btn),
                pressed: true,
            }),
            Event::MouseButtonUp { mouse_btn, .. } => Some(WindowEvent::MouseButton {
                button: translate_button(mouse_btn),
                pressed: false,
            }),
            _ => None,
        }
    }
}

impl WindowBackend for SdlWindow {
    fn poll_events(&mut self, out: &mut Vec<WindowEvent>) {
        let pending: Vec<Event> = self.event_pump.poll_iter().collect();
        for event in pending {
            if let Some(event) = self.translate(event) {
                if event == WindowEvent::CloseRequested {
                    self.should_close = true;
                }
                out.push(event);
            }
        }
    }

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.should_close = should_close;
    }

    fn drawable_size(&self) -> (u32, u32) {
        match self.api {
            GraphicsApi::OpenGl => self.window.drawable_size(),
            GraphicsApi::Vulkan => self.window.vulkan_drawable_size(),
        }
    }

    fn set_title(&mut self, title: &str) {
        if let Err(e) = self.window.set_title(title) {
            debug!("Title not set: {}", e);
        }
    }

    fn make_current(&mut self) -> WindowResult<()> {
        let context = self
            .gl_context
            .as_ref()
            .ok_or_else(|| WindowError::Context("window has no OpenGL context".to_string()))?;
        self.window.gl_make_current(context).map_err(WindowError::Context)
    }

    fn swap_buffers(&mut self) {
        self.window.gl_swap_window();
    }

    fn required_instance_extensions(&self) -> WindowResult<Vec<CString>> {
        let names = self
            .window
            .vulkan_instance_extensions()
            .map_err(|reason| WindowError::CreationFailed { toolkit: "SDL", reason })?;
        extension_names(names)
    }

    fn create_surface(&self, instance: &ash::Instance) -> VulkanResult<vk::SurfaceKHR> {
        let raw = self
            .window
            .vulkan_create_surface(instance.handle().as_raw() as usize as sdl2::video::VkInstance)
            .map_err(|e| VulkanError::new("Failed to create SDL window surface").with_message(&e))?;
        Ok(vk::SurfaceKHR::from_raw(raw))
    }
}

fn translate_key(keycode: Keycode) -> Key {
    match keycode {
        Keycode::Escape => Key::Escape,
        Keycode::Space => Key::Space,
        Keycode::Return | Keycode::KpEnter => Key::Enter,
        Keycode::Left => Key::Left,
        Keycode::Right => Key::Right,
        Keycode::Up => Key::Up,
        Keycode::Down => Key::Down,
        // SDL key codes for letters and digits are their lowercase ASCII values
        other => Key::from_ascii(other as i32),
    }
}

fn translate_button(button: SdlMouseButton) -> MouseButton {
    match button {
        SdlMouseButton::Left => MouseButton::Left,
        SdlMouseButton::Right => MouseButton::Right,
        SdlMouseButton::Middle => MouseButton::Middle,
        _ => MouseButton::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_translation() {
        assert_eq!(translate_key(Keycode::Escape), Key::Escape);
        assert_eq!(translate_key(Keycode::R), Key::Char('r'));
        assert_eq!(translate_key(Keycode::Num0), Key::Char('0'));
        assert_eq!(translate_key(Keycode::F5), Key::Other);
    }

    #[test]
    fn test_button_translation() {
        assert_eq!(translate_button(SdlMouseButton::Left), MouseButton::Left);
        assert_eq!(translate_button(SdlMouseButton::X1), MouseButton::Other);
    }
}
