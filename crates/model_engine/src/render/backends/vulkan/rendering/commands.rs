//! Command buffer management
//!
//! Recording goes through [`CommandRecorder`]; a render pass is open for
//! exactly as long as its [`ActiveRenderPass`] guard lives.

use ash::{vk, Device};

use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

/// Command pool wrapper with RAII cleanup
pub struct CommandPool {
    device: Device,
    command_pool: vk::CommandPool,
}

impl CommandPool {
    /// Create a pool whose buffers can be reset individually
    pub fn new(device: &Device, queue_family_index: u32) -> VulkanResult<Self> {
        let pool_create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);

        let command_pool =
            unsafe { device.create_command_pool(&pool_create_info, None) }.or_vk("create command pool")?;

        Ok(Self {
            device: device.clone(),
            command_pool,
        })
    }

    /// Allocate primary command buffers
    pub fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe { self.device.allocate_command_buffers(&alloc_info) }
            .or_vk(&format!("allocate {count} command buffers"))
    }

    /// Record, submit and wait for a one-shot command buffer
    ///
    /// Used for uploads; blocks until the queue is idle.
    pub fn submit_one_time<F>(&self, queue: vk::Queue, record: F) -> VulkanResult<()>
    where
        F: FnOnce(&Device, vk::CommandBuffer),
    {
        let command_buffer = self
            .allocate_command_buffers(1)?
            .into_iter()
            .next()
            .ok_or_else(|| VulkanError::new("Failed to allocate one-shot command buffer"))?;

        let result = self.run_one_time(queue, command_buffer, record);
        unsafe {
            self.device.free_command_buffers(self.command_pool, &[command_buffer]);
        }
        result
    }

    fn run_one_time<F>(&self, queue: vk::Queue, command_buffer: vk::CommandBuffer, record: F) -> VulkanResult<()>
    where
        F: FnOnce(&Device, vk::CommandBuffer),
    {
        let begin_info =
            vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .or_vk("begin one-shot command buffer")?;
            record(&self.device, command_buffer);
            self.device
                .end_command_buffer(command_buffer)
                .or_vk("end one-shot command buffer")?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::builder().command_buffers(&command_buffers).build();
            self.device
                .queue_submit(queue, &[submit_info], vk::Fence::null())
                .or_vk("submit one-shot command buffer")?;
            self.device.queue_wait_idle(queue).or_vk("wait for upload queue")
        }
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            // Frees every buffer allocated from the pool
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Command buffer recorder
pub struct CommandRecorder {
    command_buffer: vk::CommandBuffer,
    device: Device,
    recording: bool,
}

impl CommandRecorder {
    /// Wrap a command buffer that is not being recorded
    pub fn new(command_buffer: vk::CommandBuffer, device: &Device) -> Self {
        Self {
            command_buffer,
            device: device.clone(),
            recording: false,
        }
    }

    /// Reset and begin recording
    pub fn begin(&mut self) -> VulkanResult<&mut Self> {
        if self.recording {
            return Err(VulkanError::new("Command buffer already recording"));
        }
        let begin_info =
            vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .or_vk("reset command buffer")?;
            self.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .or_vk("begin command buffer")?;
        }
        self.recording = true;
        Ok(self)
    }

    /// Begin a render pass; it ends when the returned guard drops
    pub fn begin_render_pass(
        &mut self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    ) -> VulkanResult<ActiveRenderPass<'_>> {
        if !self.recording {
            return Err(VulkanError::new("Command buffer not recording"));
        }
        let render_pass_begin = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(clear_values);
        unsafe {
            self.device
                .cmd_begin_render_pass(self.command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);
        }
        Ok(ActiveRenderPass { recorder: self })
    }

    /// Finish recording
    pub fn end(&mut self) -> VulkanResult<vk::CommandBuffer> {
        if !self.recording {
            return Err(VulkanError::new("Command buffer not recording"));
        }
        unsafe { self.device.end_command_buffer(self.command_buffer) }.or_vk("end command buffer")?;
        self.recording = false;
        Ok(self.command_buffer)
    }
}

/// Open render pass
pub struct ActiveRenderPass<'a> {
    recorder: &'a mut CommandRecorder,
}

impl ActiveRenderPass<'_> {
    fn device(&self) -> &Device {
        &self.recorder.device
    }

    fn command_buffer(&self) -> vk::CommandBuffer {
        self.recorder.command_buffer
    }

    /// Set viewport
    pub fn set_viewport(&mut self, viewport: vk::Viewport) {
        unsafe { self.device().cmd_set_viewport(self.command_buffer(), 0, &[viewport]) };
    }

    /// Set scissor
    pub fn set_scissor(&mut self, scissor: vk::Rect2D) {
        unsafe { self.device().cmd_set_scissor(self.command_buffer(), 0, &[scissor]) };
    }

    /// Bind a graphics pipeline
    pub fn bind_pipeline(&mut self, pipeline: vk::Pipeline) {
        unsafe {
            self.device()
                .cmd_bind_pipeline(self.command_buffer(), vk::PipelineBindPoint::GRAPHICS, pipeline)
        };
    }

    /// Bind vertex buffer 0 and a 32-bit index buffer
    pub fn bind_geometry(&mut self, vertex_buffer: vk::Buffer, index_buffer: vk::Buffer) {
        unsafe {
            self.device()
                .cmd_bind_vertex_buffers(self.command_buffer(), 0, &[vertex_buffer], &[0]);
            self.device()
                .cmd_bind_index_buffer(self.command_buffer(), index_buffer, 0, vk::IndexType::UINT32);
        }
    }

    /// Bind descriptor set 0
    pub fn bind_descriptor_set(&mut self, layout: vk::PipelineLayout, set: vk::DescriptorSet) {
        unsafe {
            self.device().cmd_bind_descriptor_sets(
                self.command_buffer(),
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                0,
                &[set],
                &[],
            );
        }
    }

    /// Draw indexed
    pub fn draw_indexed(&mut self, index_count: u32, first_index: u32) {
        unsafe {
            self.device()
                .cmd_draw_indexed(self.command_buffer(), index_count, 1, first_index, 0, 0)
        };
    }
}

impl Drop for ActiveRenderPass<'_> {
    fn drop(&mut self) {
        unsafe {
            self.device().cmd_end_render_pass(self.command_buffer());
        }
    }
}
