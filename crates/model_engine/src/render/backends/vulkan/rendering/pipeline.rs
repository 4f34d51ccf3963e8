//! Graphics pipeline for the model shaders

use ash::{vk, Device};

use super::shader::ShaderModule;
use super::vertex_layout::VulkanVertexLayout;
use crate::render::backends::vulkan::{VkResultExt, VulkanError, VulkanResult};

/// Pipeline plus its layout
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Build the model pipeline
    ///
    /// Viewport and scissor are dynamic so the pipeline survives swapchain
    /// recreation.
    pub fn new(
        device: &Device,
        render_pass: vk::RenderPass,
        shaders: &[ShaderModule],
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Self> {
        let mut wrapper = Self {
            device: device.clone(),
            pipeline: vk::Pipeline::null(),
            layout: vk::PipelineLayout::null(),
        };

        let layout_info = vk::PipelineLayoutCreateInfo::builder().set_layouts(descriptor_set_layouts);
        wrapper.layout =
            unsafe { device.create_pipeline_layout(&layout_info, None) }.or_vk("create pipeline layout")?;

        let stages: Vec<vk::PipelineShaderStageCreateInfo> = shaders.iter().map(ShaderModule::stage_info).collect();

        let bindings = [VulkanVertexLayout::binding_description()];
        let attributes = VulkanVertexLayout::attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        // The projection flips y, which keeps OBJ's counter-clockwise winding front facing
        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(wrapper.layout)
            .render_pass(render_pass)
            .subpass(0)
            .build();

        let pipelines = unsafe { device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None) }
            .map_err(|(_, code)| VulkanError::new("Failed to create graphics pipeline").with_code(code))?;
        wrapper.pipeline = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| VulkanError::new("Failed to create graphics pipeline").with_message("no pipeline returned"))?;

        Ok(wrapper)
    }

    /// Pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Pipeline layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
