//! GLSL shader compilation and program linking

use std::ffi::CString;

use gl::types::{GLenum, GLint, GLuint};
use log::debug;

use super::error::{GlError, GlResult};

/// Pipeline stage of a GLSL source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

impl ShaderStage {
    /// Matching `glCreateShader` enum
    pub fn gl_enum(self) -> GLenum {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// GLSL source tagged with its stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlShader {
    /// GLSL 330 core source
    pub source: &'static str,
    /// Stage the source is compiled for
    pub stage: ShaderStage,
}

static SHADERS: [GlShader; 2] = [
    GlShader {
        source: include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../resources/shaders/gl/model_vert.glsl")),
        stage: ShaderStage::Vertex,
    },
    GlShader {
        source: include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../resources/shaders/gl/model_frag.glsl")),
        stage: ShaderStage::Fragment,
    },
];

/// The OpenGL backend's fixed shader set
pub fn get_shaders() -> &'static [GlShader] {
    &SHADERS
}

/// Compiled shader object, deleted on drop
struct ShaderObject {
    id: GLuint,
}

impl ShaderObject {
    fn compile(shader: &GlShader) -> GlResult<Self> {
        let source = CString::new(shader.source)
            .map_err(|_| GlError::new(format!("{} shader source contains a NUL byte", shader.stage.name())))?;

        let id = unsafe { gl::CreateShader(shader.stage.gl_enum()) };
        if id == 0 {
            GlError::check(&format!("create {} shader", shader.stage.name()))?;
            return Err(GlError::new(format!("Failed to create {} shader", shader.stage.name())));
        }
        let object = Self { id };

        let mut status: GLint = 0;
        unsafe {
            gl::ShaderSource(id, 1, &source.as_ptr(), std::ptr::null());
            gl::CompileShader(id);
            gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut status);
        }
        if status != GLint::from(gl::TRUE) {
            return Err(GlError::from_shader(id, &format!("compile {} shader", shader.stage.name())));
        }
        Ok(object)
    }
}

impl Drop for ShaderObject {
    fn drop(&mut self) {
        unsafe { gl::DeleteShader(self.id) };
    }
}

/// Linked shader program, deleted on drop
#[derive(Debug)]
pub struct Program {
    id: GLuint,
}

impl Program {
    /// Compile every shader and link them into one program
    ///
    /// Compile and link failures carry the driver's info log.
    pub fn link(shaders: &[GlShader]) -> GlResult<Self> {
        let objects = shaders
            .iter()
            .map(ShaderObject::compile)
            .collect::<GlResult<Vec<_>>>()?;

        let id = unsafe { gl::CreateProgram() };
        if id == 0 {
            return Err(GlError::new("Failed to create program object"));
        }
        let program = Self { id };

        let mut status: GLint = 0;
        unsafe {
            for object in &objects {
                gl::AttachShader(id, object.id);
            }
            gl::LinkProgram(id);
            gl::GetProgramiv(id, gl::LINK_STATUS, &mut status);
            for object in &objects {
                gl::DetachShader(id, object.id);
            }
        }
        if status != GLint::from(gl::TRUE) {
            return Err(GlError::from_program(id, "link shader program"));
        }

        debug!("Linked GL program {} from {} shaders", id, objects.len());
        Ok(program)
    }

    /// Bind a named uniform block to a binding point
    pub fn bind_uniform_block(&self, name: &str, binding: GLuint) -> GlResult<()> {
        let c_name = CString::new(name).map_err(|_| GlError::new("uniform block name contains a NUL byte"))?;
        let index = unsafe { gl::GetUniformBlockIndex(self.id, c_name.as_ptr()) };
        if index == gl::INVALID_INDEX {
            return Err(GlError::new(format!("Uniform block '{name}' not found in program")));
        }
        unsafe { gl::UniformBlockBinding(self.id, index, binding) };
        GlError::check(&format!("bind uniform block '{name}'"))
    }

    /// Point a sampler uniform at a texture unit
    pub fn bind_sampler(&self, name: &str, unit: GLint) -> GlResult<()> {
        let c_name = CString::new(name).map_err(|_| GlError::new("sampler name contains a NUL byte"))?;
        unsafe {
            let location = gl::GetUniformLocation(self.id, c_name.as_ptr());
            if location < 0 {
                return Err(GlError::new(format!("Sampler uniform '{name}' not found in program")));
            }
            gl::UseProgram(self.id);
            gl::Uniform1i(location, unit);
            gl::UseProgram(0);
        }
        GlError::check(&format!("bind sampler '{name}'"))
    }

    /// Raw program name
    pub fn id(&self) -> GLuint {
        self.id
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        unsafe { gl::DeleteProgram(self.id) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_set() {
        let shaders = get_shaders();
        assert_eq!(shaders.len(), 2);
        assert_eq!(shaders[0].stage, ShaderStage::Vertex);
        assert_eq!(shaders[1].stage, ShaderStage::Fragment);
        for shader in shaders {
            assert!(shader.source.starts_with("#version 330 core"));
        }
    }

    #[test]
    fn test_shader_interface() {
        let vertex = get_shaders()[0].source;
        assert!(vertex.contains("uniform Uniforms"));
        assert!(vertex.contains("layout(location = 2) in vec2 inTexCoord"));
        assert!(get_shaders()[1].source.contains("uniform sampler2D diffuseTexture"));
    }

    #[test]
    fn test_stage_enums() {
        assert_eq!(ShaderStage::Vertex.gl_enum(), gl::VERTEX_SHADER);
        assert_eq!(ShaderStage::Fragment.gl_enum(), gl::FRAGMENT_SHADER);
    }
}
