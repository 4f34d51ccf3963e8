//! Window management using GLFW

use std::ffi::CString;

use ash::vk;
use glfw::Context;
use log::debug;

use super::backend::{extension_names, WindowBackend, WindowError, WindowResult};
use super::events::{Key, MouseButton, WindowEvent};
use crate::platform::GraphicsApi;
use crate::render::backends::vulkan::{VkResultExt, VulkanResult};

/// GLFW window; owns the OpenGL context when created for OpenGL
pub(crate) struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    glfw: glfw::Glfw,
}

impl GlfwWindow {
    pub(crate) fn new(glfw: &glfw::Glfw, api: GraphicsApi, width: u32, height: u32, title: &str) -> WindowResult<Self> {
        let mut glfw = glfw.clone();
        glfw.default_window_hints();
        glfw.window_hint(glfw::WindowHint::Resizable(true));
        match api {
            GraphicsApi::OpenGl => {
                glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::OpenGl));
                glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
                glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
                glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
                glfw.window_hint(glfw::WindowHint::SRgbCapable(true));
            }
            GraphicsApi::Vulkan => {
                if !glfw.vulkan_supported() {
                    return Err(WindowError::CreationFailed {
                        toolkit: "GLFW",
                        reason: "no Vulkan loader or ICD available".to_string(),
                    });
                }
                glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
            }
        }

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or_else(|| WindowError::CreationFailed {
                toolkit: "GLFW",
                reason: format!("{width}x{height} window \"{title}\" for {api}"),
            })?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_mouse_button_polling(true);

        if api == GraphicsApi::OpenGl {
            window.make_current();
            glfw.set_swap_interval(glfw::SwapInterval::Sync(1));
            gl::load_with(|symbol| window.get_proc_address(symbol) as *const _);
            debug!("OpenGL 3.3 core context current for \"{}\"", title);
        }

        Ok(Self { window, events, glfw })
    }
}

impl WindowBackend for GlfwWindow {
    fn poll_events(&mut self, out: &mut Vec<WindowEvent>) {
        self.glfw.poll_events();
        out.extend(glfw::flush_messages(&self.events).filter_map(|(_, event)| translate(event)));
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    fn drawable_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn make_current(&mut self) -> WindowResult<()> {
        self.window.make_current();
        Ok(())
    }

    fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    fn required_instance_extensions(&self) -> WindowResult<Vec<CString>> {
        let names = self.glfw.get_required_instance_extensions().ok_or_else(|| WindowError::CreationFailed {
            toolkit: "GLFW",
            reason: "Vulkan surface extensions unavailable".to_string(),
        })?;
        extension_names(names)
    }

    fn create_surface(&self, instance: &ash::Instance) -> VulkanResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(instance.handle(), std::ptr::null(), &mut surface);
        result.result().or_vk("create GLFW window surface")?;
        Ok(surface)
    }
}

fn translate(event: glfw::WindowEvent) -> Option<WindowEvent> {
    match event {
        glfw::WindowEvent::FramebufferSize(width, height) => Some(WindowEvent::Resized {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }),
        glfw::WindowEvent::Key(key, _, action, _) => Some(WindowEvent::Key {
            key: translate_key(key),
            pressed: action != glfw::Action::Release,
        }),
        glfw::WindowEvent::CursorPos(x, y) => Some(WindowEvent::MouseMoved { x, y }),
        glfw::WindowEvent::MouseButton(button, action, _) => Some(WindowEvent::MouseButton {
            button: match button {
                glfw::MouseButtonLeft => MouseButton::Left,
                glfw::MouseButtonRight => MouseButton::Right,
                glfw::MouseButtonMiddle => MouseButton::Middle,
                _ => MouseButton::Other,
            },
            pressed: action == glfw::Action::Press,
        }),
        glfw::WindowEvent::Close => Some(WindowEvent::CloseRequested),
        _ => None,
    }
}

fn translate_key(key: glfw::Key) -> Key {
    match key {
        glfw::Key::Escape => Key::Escape,
        glfw::Key::Space => Key::Space,
        glfw::Key::Enter | glfw::Key::KpEnter => Key::Enter,
        glfw::Key::Left => Key::Left,
        glfw::Key::Right => Key::Right,
        glfw::Key::Up => Key::Up,
        glfw::Key::Down => Key::Down,
        // GLFW key codes for letters and digits are their uppercase ASCII values
        other => Key::from_ascii(other as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_translation() {
        assert_eq!(translate_key(glfw::Key::Escape), Key::Escape);
        assert_eq!(translate_key(glfw::Key::R), Key::Char('r'));
        assert_eq!(translate_key(glfw::Key::Num3), Key::Char('3'));
        assert_eq!(translate_key(glfw::Key::F1), Key::Other);
    }

    #[test]
    fn test_event_translation() {
        assert_eq!(
            translate(glfw::WindowEvent::FramebufferSize(640, 480)),
            Some(WindowEvent::Resized { width: 640, height: 480 })
        );
        assert_eq!(
            translate(glfw::WindowEvent::Key(glfw::Key::Space, 0, glfw::Action::Repeat, glfw::Modifiers::empty())),
            Some(WindowEvent::Key {
                key: Key::Space,
                pressed: true
            })
        );
        assert_eq!(translate(glfw::WindowEvent::Close), Some(WindowEvent::CloseRequested));
        assert_eq!(translate(glfw::WindowEvent::Focus(true)), None);
    }
}
