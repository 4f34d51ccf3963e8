//! OpenGL renderer
//!
//! GL objects live in the context that is current on the calling thread, so
//! the renderer holds a [`Dependent`] token on its window instead of a handle.
//! The token keeps the window (and with it the context) alive for as long as
//! any GL name owned here may still be deleted.

use std::path::Path;

use log::{debug, info};

use super::error::{GlError, GlResult};
use super::resources::{GlBuffer, Texture2D, VertexArray};
use super::shader::{get_shaders, Program};
use crate::assets::ImageData;
use crate::lifecycle::Dependent;
use crate::render::frame::{self, ClipSpace, FrameClock};
use crate::render::model::{DrawRange, Model, ModelAsset};
use crate::render::{RenderBackend, RenderError, RendererConfig, Uniforms};

/// Binding point of the `Uniforms` block
const UNIFORM_BINDING: u32 = 0;
/// Texture unit sampled by `diffuseTexture`
const DIFFUSE_UNIT: u32 = 0;

/// GPU objects backing one loaded model
struct GlResourceSet {
    vertex_array: VertexArray,
    _vertex_buffer: GlBuffer,
    _index_buffer: GlBuffer,
    textures: Vec<Texture2D>,
    draws: Vec<DrawRange>,
}

impl GlResourceSet {
    fn upload(asset: &ModelAsset) -> GlResult<Self> {
        let vertex_array = VertexArray::new()?;
        vertex_array.bind();
        let built = Self::upload_buffers(&vertex_array, asset);
        VertexArray::unbind();
        unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, 0) };
        let (vertex_buffer, index_buffer) = built?;

        let textures = asset
            .textures
            .iter()
            .map(Texture2D::from_image)
            .collect::<GlResult<Vec<_>>>()?;

        Ok(Self {
            vertex_array,
            _vertex_buffer: vertex_buffer,
            _index_buffer: index_buffer,
            textures,
            draws: asset.model.draws.clone(),
        })
    }

    // Runs with the vertex array bound so the element buffer binding is captured
    fn upload_buffers(vertex_array: &VertexArray, asset: &ModelAsset) -> GlResult<(GlBuffer, GlBuffer)> {
        let vertex_buffer = GlBuffer::with_data(gl::ARRAY_BUFFER, &asset.mesh.vertices, gl::STATIC_DRAW)?;
        let index_buffer = GlBuffer::with_data(gl::ELEMENT_ARRAY_BUFFER, &asset.mesh.indices, gl::STATIC_DRAW)?;
        vertex_array.configure_vertex_layout()?;
        Ok((vertex_buffer, index_buffer))
    }
}

/// Renderer for the OpenGL backend
pub struct OpenGlRenderer {
    resources: Option<GlResourceSet>,
    model: Option<Model>,
    program: Program,
    uniform_buffer: GlBuffer,
    default_texture: Texture2D,
    clock: FrameClock,
    clear_color: [f32; 4],
    rotate: bool,
    viewport: (u32, u32),
    _window: Dependent,
}

impl OpenGlRenderer {
    /// Link the shader program and create the per-renderer objects
    ///
    /// The window's context must be current.
    pub fn new(window: Dependent, framebuffer_size: (u32, u32), config: &RendererConfig) -> GlResult<Self> {
        let program = Program::link(get_shaders())?;
        program.bind_uniform_block("Uniforms", UNIFORM_BINDING)?;
        program.bind_sampler("diffuseTexture", DIFFUSE_UNIT as i32)?;

        let uniform_buffer =
            GlBuffer::with_size(gl::UNIFORM_BUFFER, std::mem::size_of::<Uniforms>(), gl::DYNAMIC_DRAW)?;
        let default_texture = Texture2D::from_image(&ImageData::solid_color(1, 1, [255, 255, 255, 255]))?;

        info!("OpenGL renderer ready, viewport {}x{}", framebuffer_size.0, framebuffer_size.1);
        Ok(Self {
            resources: None,
            model: None,
            program,
            uniform_buffer,
            default_texture,
            clock: FrameClock::new(),
            clear_color: config.clear_color,
            rotate: config.rotate_model,
            viewport: framebuffer_size,
            _window: window,
        })
    }

    fn draw(&mut self) -> GlResult<()> {
        let (width, height) = self.viewport;
        let [r, g, b, a] = self.clear_color;
        unsafe {
            gl::Viewport(0, 0, width as i32, height as i32);
            gl::ClearColor(r, g, b, a);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }

        let (Some(resources), Some(model)) = (&self.resources, &self.model) else {
            return GlError::check("clear frame");
        };

        let elapsed = self.clock.tick();
        let uniforms = frame::uniforms(
            &model.bounds,
            frame::aspect_ratio(width, height),
            self.rotate.then_some(elapsed),
            ClipSpace::OpenGl,
        );
        self.uniform_buffer.write(&uniforms)?;

        unsafe {
            gl::Enable(gl::DEPTH_TEST);
            gl::Enable(gl::CULL_FACE);
            gl::CullFace(gl::BACK);
            gl::Enable(gl::FRAMEBUFFER_SRGB);
            gl::UseProgram(self.program.id());
            gl::BindBufferBase(gl::UNIFORM_BUFFER, UNIFORM_BINDING, self.uniform_buffer.id());
        }
        resources.vertex_array.bind();

        for draw in &resources.draws {
            match draw.texture.and_then(|t| resources.textures.get(t)) {
                Some(texture) => texture.bind(DIFFUSE_UNIT),
                None => self.default_texture.bind(DIFFUSE_UNIT),
            }
            let offset = draw.first_index as usize * std::mem::size_of::<u32>();
            unsafe {
                gl::DrawElements(
                    gl::TRIANGLES,
                    draw.index_count as i32,
                    gl::UNSIGNED_INT,
                    offset as *const _,
                );
            }
        }

        // Leave no bindings behind for the next frame
        VertexArray::unbind();
        Texture2D::unbind(DIFFUSE_UNIT);
        unsafe {
            gl::BindBufferBase(gl::UNIFORM_BUFFER, UNIFORM_BINDING, 0);
            gl::UseProgram(0);
        }
        GlError::check("draw model")
    }
}

impl RenderBackend for OpenGlRenderer {
    fn load_model(&mut self, path: &Path) -> Result<(), RenderError> {
        let asset = ModelAsset::load(path)?;
        let resources = GlResourceSet::upload(&asset)?;
        // Old resource set is deleted only once the new one is complete
        self.resources = Some(resources);
        self.model = Some(asset.model);
        debug!("OpenGL resource set replaced for {:?}", path);
        Ok(())
    }

    fn render_frame(&mut self) -> Result<(), RenderError> {
        Ok(self.draw()?)
    }

    fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }
}
