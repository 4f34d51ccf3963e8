//! Per-frame camera and transform computation
//!
//! Both backends frame the model the same way; only the final clip space
//! differs. OpenGL expects y up and depth in -1..1, Vulkan y down and
//! depth in 0..1.

use std::time::Instant;

use crate::foundation::math::{Bounds, Mat4, Point3, Vec3};
use crate::render::Uniforms;

/// Vertical field of view in radians
const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
/// Model spin speed in radians per second
const SPIN_RATE: f32 = 0.5;

/// Clip space convention of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSpace {
    /// y up, depth -1..1
    OpenGl,
    /// y down, depth 0..1
    Vulkan,
}

impl ClipSpace {
    /// Matrix applied after an OpenGL-style projection
    pub fn correction(self) -> Mat4 {
        match self {
            Self::OpenGl => Mat4::identity(),
            #[rustfmt::skip]
            Self::Vulkan => Mat4::new(
                1.0,  0.0, 0.0, 0.0,
                0.0, -1.0, 0.0, 0.0,
                0.0,  0.0, 0.5, 0.5,
                0.0,  0.0, 0.0, 1.0,
            ),
        }
    }
}

/// Wall clock driving the model animation
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    frames: u64,
}

impl FrameClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frames: 0,
        }
    }

    /// Seconds since the clock started; counts one frame
    pub fn tick(&mut self) -> f32 {
        self.frames += 1;
        self.start.elapsed().as_secs_f32()
    }

    /// Frames counted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Transforms that frame `bounds` in a viewport of the given aspect ratio
///
/// The camera sits above and in front of the bounds center at a distance
/// proportional to the bounding radius. With `elapsed` set, the model spins
/// around the vertical axis through its center.
pub fn uniforms(bounds: &Bounds, aspect: f32, elapsed: Option<f32>, clip: ClipSpace) -> Uniforms {
    let center = bounds.center();
    let radius = bounds.radius().max(1e-3);

    let model = match elapsed {
        Some(seconds) => {
            let to_origin = Mat4::new_translation(&-center);
            let back = Mat4::new_translation(&center);
            back * Mat4::from_axis_angle(&Vec3::y_axis(), seconds * SPIN_RATE) * to_origin
        }
        None => Mat4::identity(),
    };

    let eye = Point3::from(center + Vec3::new(0.0, 0.5 * radius, 2.5 * radius));
    let view = Mat4::look_at_rh(&eye, &Point3::from(center), &Vec3::y());

    let znear = (0.05 * radius).max(0.01);
    let zfar = 10.0 * radius;
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    let projection = clip.correction() * Mat4::new_perspective(aspect, FOV_Y, znear, zfar);

    Uniforms::new(&model, &view, &projection)
}

/// Width over height, `1.0` for a degenerate size
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn unit_cube() -> Bounds {
        Bounds {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    fn project(uniforms: &Uniforms, point: Vec3) -> Vec3 {
        let projection = Mat4::from(uniforms.projection);
        let view = Mat4::from(uniforms.view);
        let model = Mat4::from(uniforms.model);
        let clip = projection * view * model * Vec4::new(point.x, point.y, point.z, 1.0);
        Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn test_center_projects_to_screen_center() {
        let u = uniforms(&unit_cube(), 1.0, None, ClipSpace::OpenGl);
        let ndc = project(&u, Vec3::zeros());
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_vulkan_depth_is_zero_to_one() {
        let gl = uniforms(&unit_cube(), 1.5, None, ClipSpace::OpenGl);
        let vk = uniforms(&unit_cube(), 1.5, None, ClipSpace::Vulkan);
        let point = Vec3::new(0.3, 0.7, -0.2);
        let gl_ndc = project(&gl, point);
        let vk_ndc = project(&vk, point);

        assert_relative_eq!(vk_ndc.x, gl_ndc.x, epsilon = 1e-5);
        assert_relative_eq!(vk_ndc.y, -gl_ndc.y, epsilon = 1e-5);
        assert_relative_eq!(vk_ndc.z, gl_ndc.z * 0.5 + 0.5, epsilon = 1e-5);
        assert!(vk_ndc.z > 0.0 && vk_ndc.z < 1.0);
    }

    #[test]
    fn test_rotation_keeps_center_fixed() {
        let bounds = Bounds {
            min: Vec3::new(2.0, 0.0, 2.0),
            max: Vec3::new(4.0, 2.0, 4.0),
        };
        let u = uniforms(&bounds, 1.0, Some(3.0), ClipSpace::OpenGl);
        let moved = Mat4::from(u.model).transform_point(&Point3::from(bounds.center()));
        assert_relative_eq!(moved.coords, bounds.center(), epsilon = 1e-5);
    }

    #[test]
    fn test_aspect_ratio() {
        assert_relative_eq!(aspect_ratio(1280, 720), 1280.0 / 720.0);
        assert_eq!(aspect_ratio(0, 720), 1.0);
    }
}
