//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the axis-aligned bounds used to frame a
//! loaded model.

pub use nalgebra::{Matrix4, Point3 as NPoint3, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = NPoint3<f32>;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for an empty set
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f32; 3]>,
    {
        let mut iter = points.into_iter();
        let first = Vec3::from(*iter.next()?);
        let mut bounds = Self { min: first, max: first };
        for p in iter {
            let p = Vec3::from(*p);
            bounds.min = bounds.min.inf(&p);
            bounds.max = bounds.max.sup(&p);
        }
        Some(bounds)
    }

    /// Center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the sphere enclosing the box
    pub fn radius(&self) -> f32 {
        (self.max - self.min).norm() * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounds_from_points() {
        let points = [[1.0, -2.0, 0.5], [-1.0, 2.0, 0.0], [0.0, 0.0, 3.0]];
        let bounds = Bounds::from_points(points.iter()).unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(bounds.center(), Vec3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn test_bounds_empty() {
        let points: [[f32; 3]; 0] = [];
        assert!(Bounds::from_points(points.iter()).is_none());
    }

    #[test]
    fn test_bounds_radius() {
        let points = [[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]];
        let bounds = Bounds::from_points(points.iter()).unwrap();
        assert_relative_eq!(bounds.radius(), 3.0_f32.sqrt(), epsilon = 1e-6);
    }
}
