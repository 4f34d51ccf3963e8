//! GPU-facing data layouts shared by both backends
//!
//! Both records are uploaded verbatim, so their layouts are part of the
//! shader interface: `Vertex` feeds attribute locations 0/1/2 and `Uniforms`
//! is the binding-0 uniform block (std140 in GLSL 330, the default UBO layout
//! in SPIR-V).

use std::hash::{Hash, Hasher};

use crate::foundation::math::Mat4;

/// Vertex data structure for 3D rendering with position, normal, and texture coordinates.
///
/// Equality and hashing compare the raw float bits, so two vertices are the
/// same exactly when every component has the same bit pattern. This is what
/// vertex de-duplication needs; `-0.0` and `0.0` are distinct here.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

// Only f32 arrays, no padding
unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Byte offset of `position`
    pub const POSITION_OFFSET: usize = 0;
    /// Byte offset of `normal`
    pub const NORMAL_OFFSET: usize = 12;
    /// Byte offset of `tex_coord`
    pub const TEX_COORD_OFFSET: usize = 24;

    /// Create a vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    fn bits(&self) -> [u32; 8] {
        [
            self.position[0].to_bits(),
            self.position[1].to_bits(),
            self.position[2].to_bits(),
            self.normal[0].to_bits(),
            self.normal[1].to_bits(),
            self.normal[2].to_bits(),
            self.tex_coord[0].to_bits(),
            self.tex_coord[1].to_bits(),
        ]
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// Per-frame transformation matrices, column major
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    /// Model to world
    pub model: [[f32; 4]; 4],
    /// World to view
    pub view: [[f32; 4]; 4],
    /// View to clip space of the active backend
    pub projection: [[f32; 4]; 4],
}

// Three 64-byte matrices, size is a multiple of the alignment so there is no padding
unsafe impl bytemuck::Pod for Uniforms {}
unsafe impl bytemuck::Zeroable for Uniforms {}

impl Uniforms {
    /// Build from nalgebra matrices
    pub fn new(model: &Mat4, view: &Mat4, projection: &Mat4) -> Self {
        Self {
            model: (*model).into(),
            view: (*view).into(),
            projection: (*projection).into(),
        }
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        let identity = Mat4::identity();
        Self::new(&identity, &identity, &identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::mem::{align_of, size_of};

    #[test]
    fn test_vertex_layout() {
        assert_eq!(size_of::<Vertex>(), 32);
        let v = Vertex::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0]);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&v));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(Vertex::NORMAL_OFFSET, 3 * size_of::<f32>());
        assert_eq!(Vertex::TEX_COORD_OFFSET, 6 * size_of::<f32>());
    }

    #[test]
    fn test_uniforms_layout() {
        assert_eq!(size_of::<Uniforms>(), 192);
        assert_eq!(align_of::<Uniforms>(), 16);
        assert_eq!(bytemuck::bytes_of(&Uniforms::default()).len(), 192);
    }

    #[test]
    fn test_uniforms_are_column_major() {
        let translation = Mat4::new_translation(&crate::foundation::math::Vec3::new(1.0, 2.0, 3.0));
        let uniforms = Uniforms::new(&translation, &Mat4::identity(), &Mat4::identity());
        assert_eq!(uniforms.model[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_vertex_equality_is_exact() {
        let a = Vertex::new([0.0, 1.0, 0.0], [0.0; 3], [0.5, 0.5]);
        let b = Vertex::new([-0.0, 1.0, 0.0], [0.0; 3], [0.5, 0.5]);
        let c = Vertex::new([0.0, 1.0 + f32::EPSILON, 0.0], [0.0; 3], [0.5, 0.5]);
        assert_eq!(a, a);
        assert_ne!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Vertex> = [a, a, b, c].into_iter().collect();
        assert_eq!(set.len(), 3);
    }
}
