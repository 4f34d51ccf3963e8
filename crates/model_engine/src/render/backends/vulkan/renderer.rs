//! Vulkan renderer
//!
//! Owns the logical device and everything created from it. The surface and
//! instance belong to the window; the renderer reaches them through a
//! [`SurfaceHandle`] and holds a [`Dependent`] token so the window cannot be
//! torn down first. Fields are declared in teardown order.

use std::path::Path;

use ash::vk;
use log::{debug, info, warn};

use super::initialization::device::{LogicalDevice, PhysicalDeviceInfo};
use super::initialization::surface::{SurfaceHandle, VulkanSurface};
use super::rendering::commands::{CommandPool, CommandRecorder};
use super::rendering::pipeline::GraphicsPipeline;
use super::rendering::render_pass::RenderPass;
use super::rendering::shader::{get_shaders, ShaderModule};
use super::resources::buffer::{IndexBuffer, UniformBuffer, VertexBuffer};
use super::resources::descriptor::{write_model_set, DescriptorPool, DescriptorSetLayout};
use super::resources::texture::{Texture, TransferContext};
use super::state::framebuffer::{DepthBuffer, Framebuffer};
use super::state::swapchain::Swapchain;
use super::state::sync::{submit_acquired, FrameSync};
use super::{VkResultExt, VulkanError, VulkanResult};
use crate::lifecycle::Dependent;
use crate::render::frame::{self, ClipSpace, FrameClock};
use crate::render::model::{DrawRange, Model, ModelAsset};
use crate::render::{RenderBackend, RenderError, RendererConfig, Uniforms};

/// GPU objects backing one loaded model
///
/// Descriptor sets are laid out frame-major, `frame * slots + slot`, and the
/// last slot of every frame binds the default texture.
struct VulkanResourceSet {
    descriptor_sets: Vec<vk::DescriptorSet>,
    _descriptor_pool: DescriptorPool,
    textures: Vec<Texture>,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
    draws: Vec<DrawRange>,
    slots: usize,
}

impl VulkanResourceSet {
    fn descriptor_set(&self, frame: usize, texture: Option<usize>) -> Option<vk::DescriptorSet> {
        let slot = texture
            .filter(|&t| t < self.textures.len())
            .unwrap_or(self.slots - 1);
        self.descriptor_sets.get(frame * self.slots + slot).copied()
    }
}

/// Per-frame-in-flight objects
struct FrameResources {
    sync: FrameSync,
    uniform_buffer: UniformBuffer<Uniforms>,
    // Freed together with the command pool
    command_buffer: vk::CommandBuffer,
}

impl FrameResources {
    fn new(
        device: &ash::Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        command_buffer: vk::CommandBuffer,
    ) -> VulkanResult<Self> {
        Ok(Self {
            sync: FrameSync::new(device)?,
            uniform_buffer: UniformBuffer::new(device, memory_properties)?,
            command_buffer,
        })
    }
}

/// Swapchain plus the attachments sized to it
struct Presentation {
    framebuffers: Vec<Framebuffer>,
    _depth_buffer: DepthBuffer,
    swapchain: Swapchain,
}

impl Presentation {
    fn new(
        device: &LogicalDevice,
        physical: &PhysicalDeviceInfo,
        render_pass: &RenderPass,
        swapchain: Swapchain,
    ) -> VulkanResult<Self> {
        let extent = swapchain.extent();
        let depth_buffer = DepthBuffer::new(&device.device, &physical.memory_properties, extent)?;
        let framebuffers = swapchain
            .image_views()
            .iter()
            .map(|&view| Framebuffer::new(&device.device, render_pass.handle(), &[view, depth_buffer.view()], extent))
            .collect::<VulkanResult<Vec<_>>>()?;
        Ok(Self {
            framebuffers,
            _depth_buffer: depth_buffer,
            swapchain,
        })
    }
}

/// Renderer for the Vulkan backend
pub struct VulkanRenderer {
    resources: Option<VulkanResourceSet>,
    model: Option<Model>,
    presentation: Option<Presentation>,
    frames: Vec<FrameResources>,
    default_texture: Texture,
    pipeline: GraphicsPipeline,
    descriptor_layout: DescriptorSetLayout,
    render_pass: RenderPass,
    command_pool: CommandPool,
    device: LogicalDevice,
    physical: PhysicalDeviceInfo,
    surface: SurfaceHandle,
    color_format: vk::Format,
    window_extent: vk::Extent2D,
    needs_recreate: bool,
    current_frame: usize,
    clock: FrameClock,
    clear_color: [f32; 4],
    rotate: bool,
    _window: Dependent,
}

impl VulkanRenderer {
    /// Create the device and presentation objects for a window surface
    pub fn new(
        surface: &VulkanSurface,
        window_size: (u32, u32),
        window: Dependent,
        config: &RendererConfig,
    ) -> VulkanResult<Self> {
        let shader_dir = config.resolve_shader_dir().ok_or_else(|| {
            VulkanError::new("Failed to locate compiled shaders")
                .with_message("set renderer.shader_dir or build the engine crate first")
        })?;
        let shaders = get_shaders(&shader_dir)?;

        let instance = surface.instance();
        let surface = surface.handle().clone();
        let physical = PhysicalDeviceInfo::select_suitable_device(instance, &surface)?;
        let device = LogicalDevice::new(instance, &physical)?;
        let window_extent = to_extent(window_size);

        let swapchain = Swapchain::new(&device, &surface, &physical, window_extent, vk::SwapchainKHR::null())?;
        let color_format = swapchain.format().format;
        let render_pass = RenderPass::new_forward_pass(&device.device, color_format, DepthBuffer::FORMAT)?;
        let presentation = Presentation::new(&device, &physical, &render_pass, swapchain)?;

        let descriptor_layout = DescriptorSetLayout::for_model(&device.device)?;
        let pipeline = {
            let modules = shaders
                .iter()
                .map(|shader| ShaderModule::new(&device.device, shader))
                .collect::<VulkanResult<Vec<_>>>()?;
            GraphicsPipeline::new(
                &device.device,
                render_pass.handle(),
                &modules,
                &[descriptor_layout.handle()],
            )?
        };

        let command_pool = CommandPool::new(&device.device, physical.graphics_family)?;
        let default_texture = Texture::create_default_white(&TransferContext {
            device: &device.device,
            memory_properties: &physical.memory_properties,
            queue: device.graphics_queue,
            command_pool: &command_pool,
            anisotropy: physical.max_anisotropy(),
        })?;

        let frame_count = config.frames_in_flight();
        let frames = command_pool
            .allocate_command_buffers(frame_count as u32)?
            .into_iter()
            .map(|command_buffer| FrameResources::new(&device.device, &physical.memory_properties, command_buffer))
            .collect::<VulkanResult<Vec<_>>>()?;

        info!(
            "Vulkan renderer ready on {}, {} frames in flight, {}x{}",
            physical.name(),
            frame_count,
            presentation.swapchain.extent().width,
            presentation.swapchain.extent().height
        );

        Ok(Self {
            resources: None,
            model: None,
            presentation: Some(presentation),
            frames,
            default_texture,
            pipeline,
            descriptor_layout,
            render_pass,
            command_pool,
            device,
            physical,
            surface,
            color_format,
            window_extent,
            needs_recreate: false,
            current_frame: 0,
            clock: FrameClock::new(),
            clear_color: config.clear_color,
            rotate: config.rotate_model,
            _window: window,
        })
    }

    /// Name of the GPU the renderer runs on
    pub fn device_name(&self) -> String {
        self.physical.name()
    }

    /// Block until the GPU has finished all submitted work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        self.device.wait_idle()
    }

    fn transfer_context(&self) -> TransferContext<'_> {
        TransferContext {
            device: &self.device.device,
            memory_properties: &self.physical.memory_properties,
            queue: self.device.graphics_queue,
            command_pool: &self.command_pool,
            anisotropy: self.physical.max_anisotropy(),
        }
    }

    fn upload(&self, asset: &ModelAsset) -> VulkanResult<VulkanResourceSet> {
        let device = &self.device.device;
        let memory_properties = &self.physical.memory_properties;

        let vertex_buffer = VertexBuffer::new(device, memory_properties, &asset.mesh.vertices)?;
        let index_buffer = IndexBuffer::new(device, memory_properties, &asset.mesh.indices)?;
        let ctx = self.transfer_context();
        let textures = asset
            .textures
            .iter()
            .map(|image| Texture::from_image(&ctx, image))
            .collect::<VulkanResult<Vec<_>>>()?;

        let slots = textures.len() + 1;
        let set_count = self.frames.len() * slots;
        let descriptor_pool = DescriptorPool::new(device, set_count as u32)?;
        let descriptor_sets = descriptor_pool.allocate(&self.descriptor_layout, set_count)?;
        for (frame, resources) in self.frames.iter().enumerate() {
            let images = textures.iter().chain(std::iter::once(&self.default_texture));
            for (slot, texture) in images.enumerate() {
                write_model_set(
                    device,
                    descriptor_sets[frame * slots + slot],
                    resources.uniform_buffer.handle(),
                    resources.uniform_buffer.range(),
                    texture.view(),
                    texture.sampler(),
                );
            }
        }

        Ok(VulkanResourceSet {
            descriptor_sets,
            _descriptor_pool: descriptor_pool,
            textures,
            vertex_buffer,
            index_buffer,
            draws: asset.model.draws.clone(),
            slots,
        })
    }

    fn recreate_presentation(&mut self) -> VulkanResult<()> {
        self.device.wait_idle()?;
        let old = self.presentation.take();
        let old_swapchain = old
            .as_ref()
            .map_or(vk::SwapchainKHR::null(), |p| p.swapchain.handle());
        let swapchain = Swapchain::new(&self.device, &self.surface, &self.physical, self.window_extent, old_swapchain)?;
        drop(old);

        if swapchain.format().format != self.color_format {
            return Err(VulkanError::new("Failed to recreate swapchain").with_message(&format!(
                "surface format changed from {:?} to {:?}",
                self.color_format,
                swapchain.format().format
            )));
        }

        let extent = swapchain.extent();
        self.presentation = Some(Presentation::new(&self.device, &self.physical, &self.render_pass, swapchain)?);
        self.needs_recreate = false;
        debug!("Swapchain recreated at {}x{}", extent.width, extent.height);
        Ok(())
    }

    /// Record the draw commands for one acquired swapchain image
    fn record_frame(
        &self,
        current: &FrameResources,
        presentation: &Presentation,
        image_index: u32,
        elapsed: f32,
    ) -> VulkanResult<vk::CommandBuffer> {
        let extent = presentation.swapchain.extent();
        if let Some(model) = &self.model {
            let uniforms = frame::uniforms(
                &model.bounds,
                frame::aspect_ratio(extent.width, extent.height),
                self.rotate.then_some(elapsed),
                ClipSpace::Vulkan,
            );
            current.uniform_buffer.update(&uniforms)?;
        }

        let framebuffer = presentation
            .framebuffers
            .get(image_index as usize)
            .ok_or_else(|| VulkanError::new(format!("No framebuffer for swapchain image {image_index}")))?;

        let mut recorder = CommandRecorder::new(current.command_buffer, &self.device.device);
        recorder.begin()?;
        {
            let clear_values = [
                vk::ClearValue {
                    color: vk::ClearColorValue {
                        float32: self.clear_color,
                    },
                },
                vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
                },
            ];
            let area = vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent,
            };
            let mut pass =
                recorder.begin_render_pass(self.render_pass.handle(), framebuffer.handle(), area, &clear_values)?;

            if let Some(resources) = &self.resources {
                pass.set_viewport(vk::Viewport {
                    x: 0.0,
                    y: 0.0,
                    width: extent.width as f32,
                    height: extent.height as f32,
                    min_depth: 0.0,
                    max_depth: 1.0,
                });
                pass.set_scissor(area);
                pass.bind_pipeline(self.pipeline.handle());
                pass.bind_geometry(resources.vertex_buffer.handle(), resources.index_buffer.handle());
                for draw in &resources.draws {
                    let Some(set) = resources.descriptor_set(self.current_frame, draw.texture) else {
                        continue;
                    };
                    pass.bind_descriptor_set(self.pipeline.layout(), set);
                    pass.draw_indexed(draw.index_count, draw.first_index);
                }
            }
        }
        recorder.end()
    }

    fn submit(&self, current: &FrameResources, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        let wait_semaphores = [current.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [current.sync.render_finished.handle()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();
        unsafe {
            self.device
                .device
                .queue_submit(self.device.graphics_queue, &[submit_info], current.sync.in_flight.handle())
        }
        .or_vk("submit draw command buffer")
    }

    /// Wait on the acquire semaphore without drawing anything
    fn release_acquire(&self, current: &FrameResources, signal_fence: bool) -> VulkanResult<()> {
        let wait_semaphores = [current.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::ALL_COMMANDS];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .build();
        let fence = if signal_fence {
            current.sync.in_flight.handle()
        } else {
            vk::Fence::null()
        };
        unsafe {
            self.device
                .device
                .queue_submit(self.device.graphics_queue, &[submit_info], fence)
        }
        .or_vk("release acquired image")
    }

    fn draw_frame(&mut self) -> VulkanResult<()> {
        // Minimized windows have nothing to present to
        if self.window_extent.width == 0 || self.window_extent.height == 0 {
            return Ok(());
        }
        if self.needs_recreate || self.presentation.is_none() {
            self.recreate_presentation()?;
        }
        let elapsed = self.clock.tick();
        let Some(presentation) = self.presentation.as_ref() else {
            return Ok(());
        };
        let current = self
            .frames
            .get(self.current_frame)
            .ok_or_else(|| VulkanError::new("Frame index out of range"))?;

        current.sync.in_flight.wait()?;
        let image_index = match presentation
            .swapchain
            .acquire_next_image(current.sync.image_available.handle())
        {
            Ok((index, _suboptimal)) => index,
            Err(e) if e.is_out_of_date() => {
                self.needs_recreate = true;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let submitted = submit_acquired(
            || self.record_frame(current, presentation, image_index, elapsed),
            || current.sync.in_flight.reset(),
            |command_buffer| self.submit(current, command_buffer),
            |signal_fence| self.release_acquire(current, signal_fence),
        );
        if let Err(e) = submitted {
            // The image was never presented; a fresh swapchain gives it back
            self.needs_recreate = true;
            return Err(e);
        }

        let presented = presentation.swapchain.present(
            self.device.present_queue,
            image_index,
            current.sync.render_finished.handle(),
        );
        self.current_frame = (self.current_frame + 1) % self.frames.len();
        match presented {
            Ok(suboptimal) => self.needs_recreate |= suboptimal,
            Err(e) if e.is_out_of_date() => self.needs_recreate = true,
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

impl RenderBackend for VulkanRenderer {
    fn load_model(&mut self, path: &Path) -> Result<(), RenderError> {
        let asset = ModelAsset::load(path)?;
        let resources = self.upload(&asset)?;
        // Frames in flight may still read the old set
        self.device.wait_idle()?;
        self.resources = Some(resources);
        self.model = Some(asset.model);
        debug!("Vulkan resource set replaced for {:?}", path);
        Ok(())
    }

    fn render_frame(&mut self) -> Result<(), RenderError> {
        Ok(self.draw_frame()?)
    }

    fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    fn resize(&mut self, width: u32, height: u32) {
        let extent = to_extent((width, height));
        if extent != self.window_extent {
            self.window_extent = extent;
            self.needs_recreate = true;
        }
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            warn!("Device did not go idle before teardown: {}", e);
        }
    }
}

fn to_extent((width, height): (u32, u32)) -> vk::Extent2D {
    vk::Extent2D { width, height }
}
