//! RAII wrappers for OpenGL objects
//!
//! Every wrapper deletes its object on drop, so a failed upload halfway
//! through building a resource set releases whatever was already created.

use std::mem::size_of;

use gl::types::{GLenum, GLint, GLsizei, GLsizeiptr, GLuint};

use super::error::{GlError, GlResult};
use crate::assets::ImageData;
use crate::render::Vertex;

/// Vertex array object
#[derive(Debug)]
pub struct VertexArray {
    id: GLuint,
}

impl VertexArray {
    /// Generate a vertex array object
    pub fn new() -> GlResult<Self> {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        GlError::check("create vertex array")?;
        Ok(Self { id })
    }

    /// Bind for drawing or attribute setup
    pub fn bind(&self) {
        unsafe { gl::BindVertexArray(self.id) };
    }

    /// Clear the vertex array binding
    pub fn unbind() {
        unsafe { gl::BindVertexArray(0) };
    }

    /// Describe [`Vertex`] attributes 0/1/2 for the buffer bound to `GL_ARRAY_BUFFER`
    pub fn configure_vertex_layout(&self) -> GlResult<()> {
        let stride = size_of::<Vertex>() as GLsizei;
        let attributes: [(GLuint, GLint, usize); 3] = [
            (0, 3, Vertex::POSITION_OFFSET),
            (1, 3, Vertex::NORMAL_OFFSET),
            (2, 2, Vertex::TEX_COORD_OFFSET),
        ];
        self.bind();
        for (location, components, offset) in attributes {
            unsafe {
                gl::EnableVertexAttribArray(location);
                gl::VertexAttribPointer(location, components, gl::FLOAT, gl::FALSE, stride, offset as *const _);
            }
        }
        GlError::check("configure vertex attributes")
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        unsafe { gl::DeleteVertexArrays(1, &self.id) };
    }
}

/// Buffer object bound to a fixed target
#[derive(Debug)]
pub struct GlBuffer {
    id: GLuint,
    target: GLenum,
    size: usize,
}

impl GlBuffer {
    /// Create a buffer and fill it with `data`
    pub fn with_data<T: bytemuck::Pod>(target: GLenum, data: &[T], usage: GLenum) -> GlResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let mut id = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        let buffer = Self {
            id,
            target,
            size: bytes.len(),
        };
        unsafe {
            gl::BindBuffer(target, id);
            gl::BufferData(target, bytes.len() as GLsizeiptr, bytes.as_ptr().cast(), usage);
        }
        GlError::check(&format!("upload {} byte buffer", bytes.len()))?;
        Ok(buffer)
    }

    /// Create an uninitialized buffer of `size` bytes
    pub fn with_size(target: GLenum, size: usize, usage: GLenum) -> GlResult<Self> {
        let mut id = 0;
        unsafe {
            gl::GenBuffers(1, &mut id);
            gl::BindBuffer(target, id);
            gl::BufferData(target, size as GLsizeiptr, std::ptr::null(), usage);
            gl::BindBuffer(target, 0);
        }
        let buffer = Self { id, target, size };
        GlError::check(&format!("allocate {size} byte buffer"))?;
        Ok(buffer)
    }

    /// Overwrite the start of the buffer
    pub fn write<T: bytemuck::Pod>(&self, data: &T) -> GlResult<()> {
        let bytes = bytemuck::bytes_of(data);
        if bytes.len() > self.size {
            return Err(GlError::new(format!(
                "write of {} bytes exceeds {} byte buffer",
                bytes.len(),
                self.size
            )));
        }
        unsafe {
            gl::BindBuffer(self.target, self.id);
            gl::BufferSubData(self.target, 0, bytes.len() as GLsizeiptr, bytes.as_ptr().cast());
            gl::BindBuffer(self.target, 0);
        }
        Ok(())
    }

    /// Raw buffer name
    pub fn id(&self) -> GLuint {
        self.id
    }
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        unsafe { gl::DeleteBuffers(1, &self.id) };
    }
}

/// 2D RGBA texture with mipmaps
#[derive(Debug)]
pub struct Texture2D {
    id: GLuint,
}

impl Texture2D {
    /// Upload an RGBA8 image
    ///
    /// Rows go up in file order, so texture row 0 is the image's top row.
    pub fn from_image(image: &ImageData) -> GlResult<Self> {
        let mut id = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        let texture = Self { id };
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, id);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::SRGB8_ALPHA8 as GLint,
                image.width as GLsizei,
                image.height as GLsizei,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                image.data.as_ptr().cast(),
            );
            gl::GenerateMipmap(gl::TEXTURE_2D);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR_MIPMAP_LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        GlError::check(&format!("upload {}x{} texture", image.width, image.height))?;
        Ok(texture)
    }

    /// Bind to a texture unit
    pub fn bind(&self, unit: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, self.id);
        }
    }

    /// Clear the binding of a texture unit
    pub fn unbind(unit: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
    }
}

impl Drop for Texture2D {
    fn drop(&mut self) {
        unsafe { gl::DeleteTextures(1, &self.id) };
    }
}
