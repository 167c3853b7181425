//! Device capability interface used by render passes.
//!
//! Passes never talk to the driver directly: every object they own is created
//! and destroyed through [`GpuDevice`], and every command they record goes
//! through its `cmd_*` methods. [`crate::VulkanDevice`] implements it on top of
//! erupt and vk-mem; the `tracking` feature provides a bookkeeping double.

use std::fmt::Debug;

use erupt::vk;

use crate::DeviceResult;

/// The single colour attachment of a render pass.
#[derive(Copy, Clone, Debug)]
pub struct ColorTargetInfo {
    pub format:       vk::Format,
    pub load_op:      vk::AttachmentLoadOp,
    pub store_op:     vk::AttachmentStoreOp,
    pub final_layout: vk::ImageLayout,
}

#[derive(Copy, Clone, Debug)]
pub struct DescriptorBindingInfo {
    pub binding:            u32,
    pub descriptor_type:    vk::DescriptorType,
    pub shader_stage_flags: vk::ShaderStageFlags,
}

#[derive(Copy, Clone, Debug)]
pub struct DescriptorPoolSize {
    pub descriptor_type:  vk::DescriptorType,
    pub descriptor_count: u32,
}

#[derive(Copy, Clone, Debug)]
pub struct PushConstantRange {
    pub stage_flags: vk::ShaderStageFlags,
    pub size:        u32,
}

#[derive(Copy, Clone, Debug)]
pub struct VertexAttribute {
    pub location: u32,
    pub format:   vk::Format,
    pub offset:   u32,
}

#[derive(Copy, Clone, Debug)]
pub struct SamplerInfo {
    pub address_mode: vk::SamplerAddressMode,
    pub filter:       vk::Filter,
}

#[derive(Copy, Clone, Debug)]
pub struct TextureInfo {
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

pub struct GraphicsPipelineInfo<'a, D: GpuDevice + ?Sized> {
    pub render_pass:       D::RenderPass,
    pub layout:            D::PipelineLayout,
    pub vertex_shader:     &'a [u8],
    pub fragment_shader:   &'a [u8],
    pub topology:          vk::PrimitiveTopology,
    pub vertex_stride:     u32,
    pub vertex_attributes: &'a [VertexAttribute],
    pub color_write_mask:  vk::ColorComponentFlags,
}

pub enum DescriptorWrite<'a, D: GpuDevice + ?Sized> {
    CombinedImageSampler { binding: u32, view: D::ImageView, sampler: D::Sampler },
    UniformBuffer { binding: u32, buffer: &'a D::Buffer },
}

pub struct RenderPassBegin<D: GpuDevice + ?Sized> {
    pub render_pass: D::RenderPass,
    pub framebuffer: D::Framebuffer,
    pub extent:      vk::Extent2D,
    pub clear_color: [f32; 4],
}

pub trait GpuDevice {
    type ImageView: Copy + Debug;
    type RenderPass: Copy + Debug;
    type Framebuffer: Copy + Debug;
    type DescriptorSetLayout: Copy + Debug;
    type DescriptorPool: Copy + Debug;
    type DescriptorSet: Copy + Debug;
    type PipelineLayout: Copy + Debug;
    type Pipeline: Copy + Debug;
    type Sampler: Copy + Debug;
    type CommandBuffer: Copy + Eq + Debug;
    type Buffer;
    type Texture;

    fn create_render_pass(&self, target: &ColorTargetInfo) -> DeviceResult<Self::RenderPass>;
    fn destroy_render_pass(&self, render_pass: Self::RenderPass);

    fn create_framebuffer(
        &self,
        render_pass: Self::RenderPass,
        attachment: Self::ImageView,
        extent: vk::Extent2D,
    ) -> DeviceResult<Self::Framebuffer>;
    fn destroy_framebuffer(&self, framebuffer: Self::Framebuffer);

    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorBindingInfo],
    ) -> DeviceResult<Self::DescriptorSetLayout>;
    fn destroy_descriptor_set_layout(&self, layout: Self::DescriptorSetLayout);

    fn create_descriptor_pool(
        &self,
        sizes: &[DescriptorPoolSize],
        max_sets: u32,
    ) -> DeviceResult<Self::DescriptorPool>;
    /// Also frees every descriptor set allocated from `pool`.
    fn destroy_descriptor_pool(&self, pool: Self::DescriptorPool);

    /// Allocates `count` sets sharing `layout`.
    fn allocate_descriptor_sets(
        &self,
        pool: Self::DescriptorPool,
        layout: Self::DescriptorSetLayout,
        count: usize,
    ) -> DeviceResult<Vec<Self::DescriptorSet>>;
    fn update_descriptor_set(&self, set: Self::DescriptorSet, writes: &[DescriptorWrite<Self>]);

    fn create_pipeline_layout(
        &self,
        set_layout: Self::DescriptorSetLayout,
        push_constants: &[PushConstantRange],
    ) -> DeviceResult<Self::PipelineLayout>;
    fn destroy_pipeline_layout(&self, layout: Self::PipelineLayout);

    fn create_graphics_pipeline(&self, info: &GraphicsPipelineInfo<Self>) -> DeviceResult<Self::Pipeline>;
    fn destroy_pipeline(&self, pipeline: Self::Pipeline);

    fn create_sampler(&self, info: &SamplerInfo) -> DeviceResult<Self::Sampler>;
    fn destroy_sampler(&self, sampler: Self::Sampler);

    /// Creates a host-visible buffer initialised with `data`.
    fn create_buffer_with_data(&self, usage: vk::BufferUsageFlags, data: &[u8]) -> DeviceResult<Self::Buffer>;
    fn destroy_buffer(&self, buffer: Self::Buffer);

    /// Creates a sampled texture, uploads `data` and leaves it in `SHADER_READ_ONLY_OPTIMAL`.
    fn create_texture_with_data(&self, info: &TextureInfo, data: &[u8]) -> DeviceResult<Self::Texture>;
    fn texture_view(&self, texture: &Self::Texture) -> Self::ImageView;
    fn destroy_texture(&self, texture: Self::Texture);

    fn allocate_command_buffers(&self, count: u32) -> DeviceResult<Vec<Self::CommandBuffer>>;
    fn free_command_buffers(&self, command_buffers: Vec<Self::CommandBuffer>);

    fn begin_command_buffer(&self, command_buffer: Self::CommandBuffer);
    fn end_command_buffer(&self, command_buffer: Self::CommandBuffer);

    fn cmd_begin_render_pass(&self, command_buffer: Self::CommandBuffer, begin: &RenderPassBegin<Self>);
    fn cmd_end_render_pass(&self, command_buffer: Self::CommandBuffer);
    fn cmd_set_viewport_and_scissor(&self, command_buffer: Self::CommandBuffer, extent: vk::Extent2D);
    fn cmd_bind_pipeline(&self, command_buffer: Self::CommandBuffer, pipeline: Self::Pipeline);
    fn cmd_bind_descriptor_set(
        &self,
        command_buffer: Self::CommandBuffer,
        layout: Self::PipelineLayout,
        set: Self::DescriptorSet,
    );
    fn cmd_push_constants(
        &self,
        command_buffer: Self::CommandBuffer,
        layout: Self::PipelineLayout,
        stage_flags: vk::ShaderStageFlags,
        data: &[u8],
    );
    fn cmd_bind_vertex_buffer(&self, command_buffer: Self::CommandBuffer, buffer: &Self::Buffer);
    fn cmd_draw(&self, command_buffer: Self::CommandBuffer, vertex_count: u32, instance_count: u32);
}
