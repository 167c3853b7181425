//! [`GpuDevice`] on top of erupt and vk-mem.

use std::{ffi::CString, os::raw::c_void};

use erupt::vk;
use itertools::Itertools;
use vk_mem_erupt as vma;

use crate::{
    device::{
        ColorTargetInfo,
        DescriptorBindingInfo,
        DescriptorPoolSize,
        DescriptorWrite,
        GraphicsPipelineInfo,
        PushConstantRange,
        RenderPassBegin,
        SamplerInfo,
        TextureInfo,
    },
    shader::make_shader_module,
    AllocatedBuffer,
    AllocatedImage,
    DeviceError,
    DeviceResult,
    GpuDevice,
    VulkanContext,
};

pub struct VulkanDevice {
    ctx: VulkanContext,
}

impl VulkanDevice {
    pub fn new(ctx: VulkanContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &VulkanContext {
        &self.ctx
    }

    fn create_pipeline_from_modules(
        &self,
        info: &GraphicsPipelineInfo<Self>,
        vertex_shader: vk::ShaderModule,
        fragment_shader: vk::ShaderModule,
    ) -> DeviceResult<vk::Pipeline> {
        let entry_point = CString::new("main").expect("literal has no interior nul");
        let shader_stages = vec![
            vk::PipelineShaderStageCreateInfoBuilder::new()
                .stage(vk::ShaderStageFlagBits::VERTEX)
                .module(vertex_shader)
                .name(&entry_point),
            vk::PipelineShaderStageCreateInfoBuilder::new()
                .stage(vk::ShaderStageFlagBits::FRAGMENT)
                .module(fragment_shader)
                .name(&entry_point),
        ];

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfoBuilder::new()
            .topology(info.topology)
            .primitive_restart_enable(false);

        let dynamic_pipeline_state = vk::PipelineDynamicStateCreateInfoBuilder::new()
            .dynamic_states(&[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]);

        let viewport_state = vk::PipelineViewportStateCreateInfoBuilder::new().viewport_count(1).scissor_count(1);

        let rasterisation_state = vk::PipelineRasterizationStateCreateInfoBuilder::new()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE);

        let multisample_state = vk::PipelineMultisampleStateCreateInfoBuilder::new()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlagBits::_1);

        let colour_blend_attachments = vec![vk::PipelineColorBlendAttachmentStateBuilder::new()
            .color_write_mask(info.color_write_mask)
            .blend_enable(false)];
        let colour_blending_info = vk::PipelineColorBlendStateCreateInfoBuilder::new()
            .logic_op_enable(false)
            .attachments(&colour_blend_attachments);

        let binding_descriptions = vec![vk::VertexInputBindingDescriptionBuilder::new()
            .binding(0)
            .input_rate(vk::VertexInputRate::VERTEX)
            .stride(info.vertex_stride)];
        let attribute_descriptions = info
            .vertex_attributes
            .iter()
            .map(|attribute| {
                vk::VertexInputAttributeDescriptionBuilder::new()
                    .binding(0)
                    .location(attribute.location)
                    .format(attribute.format)
                    .offset(attribute.offset)
            })
            .collect_vec();
        let vertex_input = vk::PipelineVertexInputStateCreateInfoBuilder::new()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions);

        let pipeline_infos = vec![vk::GraphicsPipelineCreateInfoBuilder::new()
            .vertex_input_state(&vertex_input)
            .color_blend_state(&colour_blending_info)
            .multisample_state(&multisample_state)
            .stages(&shader_stages)
            .layout(info.layout)
            .render_pass(info.render_pass)
            .subpass(0)
            .rasterization_state(&rasterisation_state)
            .dynamic_state(&dynamic_pipeline_state)
            .viewport_state(&viewport_state)
            .input_assembly_state(&input_assembly)];

        unsafe { self.ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), &pipeline_infos, None) }
            .result()?
            .first()
            .copied()
            .ok_or(DeviceError::MissingObject("graphics pipeline"))
    }
}

impl GpuDevice for VulkanDevice {
    type Buffer = AllocatedBuffer;
    type CommandBuffer = vk::CommandBuffer;
    type DescriptorPool = vk::DescriptorPool;
    type DescriptorSet = vk::DescriptorSet;
    type DescriptorSetLayout = vk::DescriptorSetLayout;
    type Framebuffer = vk::Framebuffer;
    type ImageView = vk::ImageView;
    type Pipeline = vk::Pipeline;
    type PipelineLayout = vk::PipelineLayout;
    type RenderPass = vk::RenderPass;
    type Sampler = vk::Sampler;
    type Texture = AllocatedImage;

    fn create_render_pass(&self, target: &ColorTargetInfo) -> DeviceResult<vk::RenderPass> {
        let attachments = vec![vk::AttachmentDescriptionBuilder::new()
            .format(target.format)
            .samples(vk::SampleCountFlagBits::_1)
            .load_op(target.load_op)
            .store_op(target.store_op)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(target.final_layout)];
        let colour_references = vec![vk::AttachmentReferenceBuilder::new()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];
        let subpasses = vec![vk::SubpassDescriptionBuilder::new()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&colour_references)];
        // The target is sampled by whatever pass runs before and after this one.
        let dependencies = vec![
            vk::SubpassDependencyBuilder::new()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::SHADER_READ)
                .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dependency_flags(vk::DependencyFlags::BY_REGION),
            vk::SubpassDependencyBuilder::new()
                .src_subpass(0)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ)
                .dependency_flags(vk::DependencyFlags::BY_REGION),
        ];
        let create_info = vk::RenderPassCreateInfoBuilder::new()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);
        let render_pass = unsafe { self.ctx.device.create_render_pass(&create_info, None) }.result()?;
        Ok(render_pass)
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        unsafe { self.ctx.device.destroy_render_pass(render_pass, None) };
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachment: vk::ImageView,
        extent: vk::Extent2D,
    ) -> DeviceResult<vk::Framebuffer> {
        let attachments = [attachment];
        let create_info = vk::FramebufferCreateInfoBuilder::new()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);
        let framebuffer = unsafe { self.ctx.device.create_framebuffer(&create_info, None) }.result()?;
        Ok(framebuffer)
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.ctx.device.destroy_framebuffer(framebuffer, None) };
    }

    fn create_descriptor_set_layout(&self, bindings: &[DescriptorBindingInfo]) -> DeviceResult<vk::DescriptorSetLayout> {
        let bindings = bindings
            .iter()
            .map(|binding| {
                vk::DescriptorSetLayoutBindingBuilder::new()
                    .binding(binding.binding)
                    .descriptor_count(1)
                    .descriptor_type(binding.descriptor_type)
                    .stage_flags(binding.shader_stage_flags)
            })
            .collect_vec();
        let create_info = vk::DescriptorSetLayoutCreateInfoBuilder::new().bindings(&bindings);
        let layout = unsafe { self.ctx.device.create_descriptor_set_layout(&create_info, None) }.result()?;
        Ok(layout)
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        unsafe { self.ctx.device.destroy_descriptor_set_layout(layout, None) };
    }

    fn create_descriptor_pool(&self, sizes: &[DescriptorPoolSize], max_sets: u32) -> DeviceResult<vk::DescriptorPool> {
        let sizes = sizes
            .iter()
            .map(|size| {
                vk::DescriptorPoolSizeBuilder::new()._type(size.descriptor_type).descriptor_count(size.descriptor_count)
            })
            .collect_vec();
        let create_info = vk::DescriptorPoolCreateInfoBuilder::new().max_sets(max_sets).pool_sizes(&sizes);
        let pool = unsafe { self.ctx.device.create_descriptor_pool(&create_info, None) }.result()?;
        Ok(pool)
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        unsafe { self.ctx.device.destroy_descriptor_pool(pool, None) };
    }

    fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
        count: usize,
    ) -> DeviceResult<Vec<vk::DescriptorSet>> {
        let set_layouts = vec![layout; count];
        let allocate_info =
            vk::DescriptorSetAllocateInfoBuilder::new().descriptor_pool(pool).set_layouts(&set_layouts);
        let sets = unsafe { self.ctx.device.allocate_descriptor_sets(&allocate_info) }.result()?;
        Ok(sets.into_iter().collect())
    }

    fn update_descriptor_set(&self, set: vk::DescriptorSet, writes: &[DescriptorWrite<Self>]) {
        let image_infos = writes
            .iter()
            .map(|write| match *write {
                DescriptorWrite::CombinedImageSampler { view, sampler, .. } => vec![vk::DescriptorImageInfoBuilder::new()
                    .image_view(view)
                    .sampler(sampler)
                    .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)],
                DescriptorWrite::UniformBuffer { .. } => vec![],
            })
            .collect_vec();
        let buffer_infos = writes
            .iter()
            .map(|write| match *write {
                DescriptorWrite::UniformBuffer { buffer, .. } => {
                    vec![vk::DescriptorBufferInfoBuilder::new().buffer(buffer.buffer).offset(0).range(vk::WHOLE_SIZE)]
                }
                DescriptorWrite::CombinedImageSampler { .. } => vec![],
            })
            .collect_vec();

        let descriptor_writes = writes
            .iter()
            .zip(image_infos.iter().zip(buffer_infos.iter()))
            .map(|(write, (image_info, buffer_info))| {
                let builder = vk::WriteDescriptorSetBuilder::new().dst_set(set);
                match *write {
                    DescriptorWrite::CombinedImageSampler { binding, .. } => builder
                        .dst_binding(binding)
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(image_info),
                    DescriptorWrite::UniformBuffer { binding, .. } => builder
                        .dst_binding(binding)
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .buffer_info(buffer_info),
                }
            })
            .collect_vec();

        unsafe { self.ctx.device.update_descriptor_sets(&descriptor_writes, &[]) };
    }

    fn create_pipeline_layout(
        &self,
        set_layout: vk::DescriptorSetLayout,
        push_constants: &[PushConstantRange],
    ) -> DeviceResult<vk::PipelineLayout> {
        let set_layouts = [set_layout];
        let push_constant_ranges = push_constants
            .iter()
            .map(|range| vk::PushConstantRangeBuilder::new().offset(0).size(range.size).stage_flags(range.stage_flags))
            .collect_vec();
        let create_info = vk::PipelineLayoutCreateInfoBuilder::new()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);
        let layout = unsafe { self.ctx.device.create_pipeline_layout(&create_info, None) }.result()?;
        Ok(layout)
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        unsafe { self.ctx.device.destroy_pipeline_layout(layout, None) };
    }

    fn create_graphics_pipeline(&self, info: &GraphicsPipelineInfo<Self>) -> DeviceResult<vk::Pipeline> {
        let vertex_shader = make_shader_module(&self.ctx.device, info.vertex_shader)?;
        let fragment_shader = match make_shader_module(&self.ctx.device, info.fragment_shader) {
            Ok(module) => module,
            Err(e) => {
                unsafe { self.ctx.device.destroy_shader_module(vertex_shader, None) };
                return Err(e);
            }
        };

        let pipeline = self.create_pipeline_from_modules(info, vertex_shader, fragment_shader);
        if let Err(e) = &pipeline {
            log::warn!("Graphics pipeline creation failed: {e}");
        }

        unsafe {
            self.ctx.device.destroy_shader_module(vertex_shader, None);
            self.ctx.device.destroy_shader_module(fragment_shader, None);
        }

        pipeline
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe { self.ctx.device.destroy_pipeline(pipeline, None) };
    }

    fn create_sampler(&self, info: &SamplerInfo) -> DeviceResult<vk::Sampler> {
        let create_info = vk::SamplerCreateInfoBuilder::new()
            .address_mode_u(info.address_mode)
            .address_mode_v(info.address_mode)
            .address_mode_w(info.address_mode)
            .min_filter(info.filter)
            .mag_filter(info.filter)
            .max_lod(1.0);
        let sampler = unsafe { self.ctx.device.create_sampler(&create_info, None) }.result()?;
        Ok(sampler)
    }

    fn destroy_sampler(&self, sampler: vk::Sampler) {
        unsafe { self.ctx.device.destroy_sampler(sampler, None) };
    }

    fn create_buffer_with_data(&self, usage: vk::BufferUsageFlags, data: &[u8]) -> DeviceResult<AllocatedBuffer> {
        AllocatedBuffer::with_data(self.ctx.allocator.clone(), usage, vma::MemoryUsage::CpuToGpu, data)
    }

    fn destroy_buffer(&self, buffer: AllocatedBuffer) {
        buffer.destroy();
    }

    fn create_texture_with_data(&self, info: &TextureInfo, data: &[u8]) -> DeviceResult<AllocatedImage> {
        AllocatedImage::texture_with_data(&self.ctx, info.format, info.extent, data)
    }

    fn texture_view(&self, texture: &AllocatedImage) -> vk::ImageView {
        texture.view
    }

    fn destroy_texture(&self, texture: AllocatedImage) {
        texture.destroy(&self.ctx.device);
    }

    fn allocate_command_buffers(&self, count: u32) -> DeviceResult<Vec<vk::CommandBuffer>> {
        let allocate_info = vk::CommandBufferAllocateInfoBuilder::new()
            .command_pool(self.ctx.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);
        let command_buffers = unsafe { self.ctx.device.allocate_command_buffers(&allocate_info) }.result()?;
        Ok(command_buffers.into_iter().collect())
    }

    fn free_command_buffers(&self, command_buffers: Vec<vk::CommandBuffer>) {
        unsafe { self.ctx.device.free_command_buffers(self.ctx.command_pool, &command_buffers) };
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        let begin_info = vk::CommandBufferBeginInfoBuilder::new().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.ctx.device.begin_command_buffer(command_buffer, &begin_info).expect("Cannot begin command buffer");
        }
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.ctx.device.end_command_buffer(command_buffer).expect("Cannot end command buffer");
        }
    }

    fn cmd_begin_render_pass(&self, command_buffer: vk::CommandBuffer, begin: &RenderPassBegin<Self>) {
        let clear_values = [vk::ClearValue { color: vk::ClearColorValue { float32: begin.clear_color } }];
        let begin_info = vk::RenderPassBeginInfoBuilder::new()
            .render_pass(begin.render_pass)
            .framebuffer(begin.framebuffer)
            .render_area(vk::Rect2D { offset: vk::Offset2D::default(), extent: begin.extent })
            .clear_values(&clear_values);
        unsafe {
            self.ctx.device.cmd_begin_render_pass(command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        unsafe { self.ctx.device.cmd_end_render_pass(command_buffer) };
    }

    fn cmd_set_viewport_and_scissor(&self, command_buffer: vk::CommandBuffer, extent: vk::Extent2D) {
        let scissor = vk::Rect2DBuilder::new().extent(extent);
        let viewport = vk::ViewportBuilder::new()
            .width(extent.width as _)
            .height(extent.height as _)
            .min_depth(0.0)
            .max_depth(1.0);
        unsafe {
            self.ctx.device.cmd_set_scissor(command_buffer, 0, &[scissor]);
            self.ctx.device.cmd_set_viewport(command_buffer, 0, &[viewport]);
        }
    }

    fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        unsafe {
            self.ctx.device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
    }

    fn cmd_bind_descriptor_set(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        set: vk::DescriptorSet,
    ) {
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                0,
                &[set],
                &[],
            );
        }
    }

    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stage_flags: vk::ShaderStageFlags,
        data: &[u8],
    ) {
        unsafe {
            self.ctx.device.cmd_push_constants(
                command_buffer,
                layout,
                stage_flags,
                0,
                data.len() as u32,
                data.as_ptr() as *const c_void,
            );
        }
    }

    fn cmd_bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: &AllocatedBuffer) {
        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(command_buffer, 0, &[buffer.buffer], &[0]);
        }
    }

    fn cmd_draw(&self, command_buffer: vk::CommandBuffer, vertex_count: u32, instance_count: u32) {
        unsafe { self.ctx.device.cmd_draw(command_buffer, vertex_count, instance_count, 0, 0) };
    }
}
