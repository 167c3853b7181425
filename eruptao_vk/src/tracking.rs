//! A [`GpuDevice`] that hands out numbered handles and keeps a ledger of
//! every object it created, instead of talking to a driver.
//!
//! It behaves like a strict validation layer: destroying an object twice,
//! destroying a parent before its children, or recording commands outside of
//! `begin_command_buffer`/`end_command_buffer` panics. Creation calls can be
//! made to fail at a chosen index to exercise partial-failure paths.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
};

use erupt::vk;

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
    DeviceError,
    DeviceResult,
    GpuDevice,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackedHandle(pub u64);

impl TrackedHandle {
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    RenderPass,
    Framebuffer,
    DescriptorSetLayout,
    DescriptorPool,
    DescriptorSet,
    PipelineLayout,
    Pipeline,
    Sampler,
    Buffer,
    Texture,
    CommandBuffer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    Created(ResourceKind, TrackedHandle),
    Destroyed(ResourceKind, TrackedHandle),
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCommand {
    BeginRenderPass {
        render_pass: TrackedHandle,
        framebuffer: TrackedHandle,
        extent:      [u32; 2],
        clear_color: [f32; 4],
    },
    SetViewportAndScissor([u32; 2]),
    BindPipeline(TrackedHandle),
    BindDescriptorSet { layout: TrackedHandle, set: TrackedHandle },
    PushConstants { layout: TrackedHandle, data: Vec<u8> },
    BindVertexBuffer(TrackedHandle),
    Draw { vertex_count: u32, instance_count: u32 },
    EndRenderPass,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WrittenDescriptor {
    pub binding:  u32,
    pub resource: TrackedHandle,
    pub sampler:  Option<TrackedHandle>,
}

#[derive(Debug)]
pub struct TrackedBuffer {
    pub handle: TrackedHandle,
    pub usage:  vk::BufferUsageFlags,
}

#[derive(Debug)]
pub struct TrackedTexture {
    pub handle: TrackedHandle,
    pub view:   TrackedHandle,
    pub info:   TextureInfo,
}

struct LiveObject {
    kind:    ResourceKind,
    parents: Vec<TrackedHandle>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum RecordingState {
    Initial,
    Recording { in_render_pass: bool, pipeline_bound: bool },
    Executable,
}

#[derive(Default)]
struct State {
    last_handle:       u64,
    creations:         usize,
    fail_at:           Option<usize>,
    live:              BTreeMap<TrackedHandle, LiveObject>,
    events:            Vec<DeviceEvent>,
    contents:          HashMap<TrackedHandle, Vec<u8>>,
    texture_views:     HashMap<TrackedHandle, TrackedHandle>,
    descriptor_writes: HashMap<TrackedHandle, Vec<WrittenDescriptor>>,
    recording_states:  HashMap<TrackedHandle, RecordingState>,
    commands:          HashMap<TrackedHandle, Vec<RecordedCommand>>,
}

impl State {
    fn next_handle(&mut self) -> TrackedHandle {
        self.last_handle += 1;
        TrackedHandle(self.last_handle)
    }

    /// Counts one creation call and fails it if it is the injected one.
    fn creation_call(&mut self) -> DeviceResult<()> {
        let index = self.creations;
        self.creations += 1;
        if self.fail_at == Some(index) {
            return Err(DeviceError::Vulkan(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
        }
        Ok(())
    }

    fn create(&mut self, kind: ResourceKind, parents: &[TrackedHandle]) -> DeviceResult<TrackedHandle> {
        self.creation_call()?;
        Ok(self.insert(kind, parents))
    }

    fn insert(&mut self, kind: ResourceKind, parents: &[TrackedHandle]) -> TrackedHandle {
        for parent in parents {
            assert!(self.live.contains_key(parent), "{kind:?} created from dead object {parent:?}");
        }
        let handle = self.next_handle();
        self.live.insert(handle, LiveObject { kind, parents: parents.to_vec() });
        self.events.push(DeviceEvent::Created(kind, handle));
        handle
    }

    fn destroy(&mut self, kind: ResourceKind, handle: TrackedHandle) {
        match self.live.get(&handle) {
            Some(object) if object.kind == kind => {}
            Some(object) => panic!("{handle:?} destroyed as {kind:?} but it is a {:?}", object.kind),
            None => panic!("{kind:?} {handle:?} destroyed twice or never created"),
        }

        if kind == ResourceKind::DescriptorPool {
            let sets = self.children_of(handle);
            for (set, set_kind) in sets {
                assert_eq!(set_kind, ResourceKind::DescriptorSet);
                self.live.remove(&set);
                self.descriptor_writes.remove(&set);
                self.events.push(DeviceEvent::Destroyed(set_kind, set));
            }
        }

        let children = self.children_of(handle);
        assert!(children.is_empty(), "{kind:?} {handle:?} destroyed while still used by {children:?}");

        self.live.remove(&handle);
        self.contents.remove(&handle);
        self.events.push(DeviceEvent::Destroyed(kind, handle));
    }

    fn children_of(&self, handle: TrackedHandle) -> Vec<(TrackedHandle, ResourceKind)> {
        self.live
            .iter()
            .filter(|(_, object)| object.parents.contains(&handle))
            .map(|(&child, object)| (child, object.kind))
            .collect()
    }

    fn assert_live(&self, kind: ResourceKind, handle: TrackedHandle) {
        match self.live.get(&handle) {
            Some(object) => assert_eq!(object.kind, kind, "{handle:?} used as {kind:?}"),
            None => panic!("use of destroyed or unknown {kind:?} {handle:?}"),
        }
    }

    fn recording(&mut self, command_buffer: TrackedHandle) -> &mut RecordingState {
        let state = self
            .recording_states
            .get_mut(&command_buffer)
            .unwrap_or_else(|| panic!("unknown command buffer {command_buffer:?}"));
        assert!(
            matches!(state, RecordingState::Recording { .. }),
            "command recorded into {command_buffer:?} while it is {state:?}"
        );
        state
    }

    fn record(&mut self, command_buffer: TrackedHandle, command: RecordedCommand) {
        self.recording(command_buffer);
        self.commands.entry(command_buffer).or_default().push(command);
    }
}

#[derive(Default)]
pub struct TrackingDevice {
    state: RefCell<State>,
}

impl TrackingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `index`-th creation call (counting from zero) fails with
    /// `ERROR_OUT_OF_DEVICE_MEMORY`.
    pub fn failing_at(index: usize) -> Self {
        let device = Self::default();
        device.state.borrow_mut().fail_at = Some(index);
        device
    }

    /// A view of an image owned by someone else; never tracked as live.
    pub fn external_view(&self) -> TrackedHandle {
        self.state.borrow_mut().next_handle()
    }

    pub fn creation_count(&self) -> usize {
        self.state.borrow().creations
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn live_count_of(&self, kind: ResourceKind) -> usize {
        self.state.borrow().live.values().filter(|object| object.kind == kind).count()
    }

    pub fn is_live(&self, handle: TrackedHandle) -> bool {
        self.state.borrow().live.contains_key(&handle)
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.state.borrow().events.clone()
    }

    /// Every handle of `kind` ever created, in creation order.
    pub fn created(&self, kind: ResourceKind) -> Vec<TrackedHandle> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|event| match *event {
                DeviceEvent::Created(k, handle) if k == kind => Some(handle),
                _ => None,
            })
            .collect()
    }

    /// Bytes uploaded to a live buffer or texture.
    pub fn contents(&self, handle: TrackedHandle) -> Option<Vec<u8>> {
        self.state.borrow().contents.get(&handle).cloned()
    }

    pub fn descriptor_writes(&self, set: TrackedHandle) -> Vec<WrittenDescriptor> {
        self.state.borrow().descriptor_writes.get(&set).cloned().unwrap_or_default()
    }

    pub fn commands(&self, command_buffer: TrackedHandle) -> Vec<RecordedCommand> {
        self.state.borrow().commands.get(&command_buffer).cloned().unwrap_or_default()
    }

    pub fn is_executable(&self, command_buffer: TrackedHandle) -> bool {
        self.state.borrow().recording_states.get(&command_buffer) == Some(&RecordingState::Executable)
    }
}

impl GpuDevice for TrackingDevice {
    type Buffer = TrackedBuffer;
    type CommandBuffer = TrackedHandle;
    type DescriptorPool = TrackedHandle;
    type DescriptorSet = TrackedHandle;
    type DescriptorSetLayout = TrackedHandle;
    type Framebuffer = TrackedHandle;
    type ImageView = TrackedHandle;
    type Pipeline = TrackedHandle;
    type PipelineLayout = TrackedHandle;
    type RenderPass = TrackedHandle;
    type Sampler = TrackedHandle;
    type Texture = TrackedTexture;

    fn create_render_pass(&self, _target: &ColorTargetInfo) -> DeviceResult<TrackedHandle> {
        self.state.borrow_mut().create(ResourceKind::RenderPass, &[])
    }

    fn destroy_render_pass(&self, render_pass: TrackedHandle) {
        self.state.borrow_mut().destroy(ResourceKind::RenderPass, render_pass);
    }

    fn create_framebuffer(
        &self,
        render_pass: TrackedHandle,
        attachment: TrackedHandle,
        extent: vk::Extent2D,
    ) -> DeviceResult<TrackedHandle> {
        assert!(!attachment.is_null(), "framebuffer created with a null attachment");
        assert!(extent.width > 0 && extent.height > 0, "framebuffer created with an empty extent");
        self.state.borrow_mut().create(ResourceKind::Framebuffer, &[render_pass])
    }

    fn destroy_framebuffer(&self, framebuffer: TrackedHandle) {
        self.state.borrow_mut().destroy(ResourceKind::Framebuffer, framebuffer);
    }

    fn create_descriptor_set_layout(&self, _bindings: &[DescriptorBindingInfo]) -> DeviceResult<TrackedHandle> {
        self.state.borrow_mut().create(ResourceKind::DescriptorSetLayout, &[])
    }

    fn destroy_descriptor_set_layout(&self, layout: TrackedHandle) {
        self.state.borrow_mut().destroy(ResourceKind::DescriptorSetLayout, layout);
    }

    fn create_descriptor_pool(&self, _sizes: &[DescriptorPoolSize], max_sets: u32) -> DeviceResult<TrackedHandle> {
        assert!(max_sets > 0, "descriptor pool without sets");
        self.state.borrow_mut().create(ResourceKind::DescriptorPool, &[])
    }

    fn destroy_descriptor_pool(&self, pool: TrackedHandle) {
        self.state.borrow_mut().destroy(ResourceKind::DescriptorPool, pool);
    }

    fn allocate_descriptor_sets(
        &self,
        pool: TrackedHandle,
        layout: TrackedHandle,
        count: usize,
    ) -> DeviceResult<Vec<TrackedHandle>> {
        let mut state = self.state.borrow_mut();
        // One call for the whole batch, which either fully succeeds or allocates nothing.
        state.creation_call()?;
        state.assert_live(ResourceKind::DescriptorPool, pool);
        state.assert_live(ResourceKind::DescriptorSetLayout, layout);
        Ok((0..count).map(|_| state.insert(ResourceKind::DescriptorSet, &[pool, layout])).collect())
    }

    fn update_descriptor_set(&self, set: TrackedHandle, writes: &[DescriptorWrite<Self>]) {
        let mut state = self.state.borrow_mut();
        state.assert_live(ResourceKind::DescriptorSet, set);
        let mut written = Vec::with_capacity(writes.len());
        for write in writes {
            match write {
                DescriptorWrite::CombinedImageSampler { binding, view, sampler } => {
                    state.assert_live(ResourceKind::Sampler, *sampler);
                    if let Some(&texture) = state.texture_views.get(view) {
                        state.assert_live(ResourceKind::Texture, texture);
                    }
                    written.push(WrittenDescriptor { binding: *binding, resource: *view, sampler: Some(*sampler) });
                }
                DescriptorWrite::UniformBuffer { binding, buffer } => {
                    state.assert_live(ResourceKind::Buffer, buffer.handle);
                    assert!(buffer.usage.contains(vk::BufferUsageFlags::UNIFORM_BUFFER));
                    written.push(WrittenDescriptor { binding: *binding, resource: buffer.handle, sampler: None });
                }
            }
        }
        state.descriptor_writes.insert(set, written);
    }

    fn create_pipeline_layout(
        &self,
        set_layout: TrackedHandle,
        _push_constants: &[PushConstantRange],
    ) -> DeviceResult<TrackedHandle> {
        self.state.borrow_mut().create(ResourceKind::PipelineLayout, &[set_layout])
    }

    fn destroy_pipeline_layout(&self, layout: TrackedHandle) {
        self.state.borrow_mut().destroy(ResourceKind::PipelineLayout, layout);
    }

    fn create_graphics_pipeline(&self, info: &GraphicsPipelineInfo<Self>) -> DeviceResult<TrackedHandle> {
        self.state.borrow_mut().create(ResourceKind::Pipeline, &[info.layout, info.render_pass])
    }

    fn destroy_pipeline(&self, pipeline: TrackedHandle) {
        self.state.borrow_mut().destroy(ResourceKind::Pipeline, pipeline);
    }

    fn create_sampler(&self, _info: &SamplerInfo) -> DeviceResult<TrackedHandle> {
        self.state.borrow_mut().create(ResourceKind::Sampler, &[])
    }

    fn destroy_sampler(&self, sampler: TrackedHandle) {
        self.state.borrow_mut().destroy(ResourceKind::Sampler, sampler);
    }

    fn create_buffer_with_data(&self, usage: vk::BufferUsageFlags, data: &[u8]) -> DeviceResult<TrackedBuffer> {
        assert!(!data.is_empty(), "zero-sized buffer");
        let mut state = self.state.borrow_mut();
        let handle = state.create(ResourceKind::Buffer, &[])?;
        state.contents.insert(handle, data.to_vec());
        Ok(TrackedBuffer { handle, usage })
    }

    fn destroy_buffer(&self, buffer: TrackedBuffer) {
        self.state.borrow_mut().destroy(ResourceKind::Buffer, buffer.handle);
    }

    fn create_texture_with_data(&self, info: &TextureInfo, data: &[u8]) -> DeviceResult<TrackedTexture> {
        assert!(!data.is_empty(), "texture without data");
        let mut state = self.state.borrow_mut();
        let handle = state.create(ResourceKind::Texture, &[])?;
        let view = state.next_handle();
        state.contents.insert(handle, data.to_vec());
        state.texture_views.insert(view, handle);
        Ok(TrackedTexture { handle, view, info: *info })
    }

    fn texture_view(&self, texture: &TrackedTexture) -> TrackedHandle {
        texture.view
    }

    fn destroy_texture(&self, texture: TrackedTexture) {
        let mut state = self.state.borrow_mut();
        state.destroy(ResourceKind::Texture, texture.handle);
        state.texture_views.remove(&texture.view);
    }

    fn allocate_command_buffers(&self, count: u32) -> DeviceResult<Vec<TrackedHandle>> {
        let mut state = self.state.borrow_mut();
        state.creation_call()?;
        let command_buffers =
            (0..count).map(|_| state.insert(ResourceKind::CommandBuffer, &[])).collect::<Vec<_>>();
        for &command_buffer in command_buffers.iter() {
            state.recording_states.insert(command_buffer, RecordingState::Initial);
        }
        Ok(command_buffers)
    }

    fn free_command_buffers(&self, command_buffers: Vec<TrackedHandle>) {
        let mut state = self.state.borrow_mut();
        for command_buffer in command_buffers {
            state.destroy(ResourceKind::CommandBuffer, command_buffer);
            state.recording_states.remove(&command_buffer);
            state.commands.remove(&command_buffer);
        }
    }

    fn begin_command_buffer(&self, command_buffer: TrackedHandle) {
        let mut state = self.state.borrow_mut();
        state.assert_live(ResourceKind::CommandBuffer, command_buffer);
        let recording = state.recording_states.get_mut(&command_buffer).expect("command buffer state");
        assert!(
            !matches!(recording, RecordingState::Recording { .. }),
            "{command_buffer:?} begun while already recording"
        );
        *recording = RecordingState::Recording { in_render_pass: false, pipeline_bound: false };
        state.commands.insert(command_buffer, Vec::new());
    }

    fn end_command_buffer(&self, command_buffer: TrackedHandle) {
        let mut state = self.state.borrow_mut();
        let recording = state.recording(command_buffer);
        assert!(
            matches!(recording, RecordingState::Recording { in_render_pass: false, .. }),
            "{command_buffer:?} ended inside a render pass"
        );
        *recording = RecordingState::Executable;
    }

    fn cmd_begin_render_pass(&self, command_buffer: TrackedHandle, begin: &RenderPassBegin<Self>) {
        let mut state = self.state.borrow_mut();
        state.assert_live(ResourceKind::RenderPass, begin.render_pass);
        state.assert_live(ResourceKind::Framebuffer, begin.framebuffer);
        let recording = state.recording(command_buffer);
        assert!(
            matches!(recording, RecordingState::Recording { in_render_pass: false, .. }),
            "nested render pass in {command_buffer:?}"
        );
        *recording = RecordingState::Recording { in_render_pass: true, pipeline_bound: false };
        state.record(command_buffer, RecordedCommand::BeginRenderPass {
            render_pass: begin.render_pass,
            framebuffer: begin.framebuffer,
            extent:      [begin.extent.width, begin.extent.height],
            clear_color: begin.clear_color,
        });
    }

    fn cmd_end_render_pass(&self, command_buffer: TrackedHandle) {
        let mut state = self.state.borrow_mut();
        let recording = state.recording(command_buffer);
        assert!(
            matches!(recording, RecordingState::Recording { in_render_pass: true, .. }),
            "render pass ended in {command_buffer:?} without being begun"
        );
        *recording = RecordingState::Recording { in_render_pass: false, pipeline_bound: false };
        state.record(command_buffer, RecordedCommand::EndRenderPass);
    }

    fn cmd_set_viewport_and_scissor(&self, command_buffer: TrackedHandle, extent: vk::Extent2D) {
        self.state
            .borrow_mut()
            .record(command_buffer, RecordedCommand::SetViewportAndScissor([extent.width, extent.height]));
    }

    fn cmd_bind_pipeline(&self, command_buffer: TrackedHandle, pipeline: TrackedHandle) {
        let mut state = self.state.borrow_mut();
        state.assert_live(ResourceKind::Pipeline, pipeline);
        if let RecordingState::Recording { pipeline_bound, .. } = state.recording(command_buffer) {
            *pipeline_bound = true;
        }
        state.record(command_buffer, RecordedCommand::BindPipeline(pipeline));
    }

    fn cmd_bind_descriptor_set(&self, command_buffer: TrackedHandle, layout: TrackedHandle, set: TrackedHandle) {
        let mut state = self.state.borrow_mut();
        state.assert_live(ResourceKind::PipelineLayout, layout);
        state.assert_live(ResourceKind::DescriptorSet, set);
        state.record(command_buffer, RecordedCommand::BindDescriptorSet { layout, set });
    }

    fn cmd_push_constants(
        &self,
        command_buffer: TrackedHandle,
        layout: TrackedHandle,
        _stage_flags: vk::ShaderStageFlags,
        data: &[u8],
    ) {
        let mut state = self.state.borrow_mut();
        state.assert_live(ResourceKind::PipelineLayout, layout);
        state.record(command_buffer, RecordedCommand::PushConstants { layout, data: data.to_vec() });
    }

    fn cmd_bind_vertex_buffer(&self, command_buffer: TrackedHandle, buffer: &TrackedBuffer) {
        let mut state = self.state.borrow_mut();
        state.assert_live(ResourceKind::Buffer, buffer.handle);
        assert!(buffer.usage.contains(vk::BufferUsageFlags::VERTEX_BUFFER));
        state.record(command_buffer, RecordedCommand::BindVertexBuffer(buffer.handle));
    }

    fn cmd_draw(&self, command_buffer: TrackedHandle, vertex_count: u32, instance_count: u32) {
        let mut state = self.state.borrow_mut();
        let recording = *state.recording(command_buffer);
        assert_eq!(
            recording,
            RecordingState::Recording { in_render_pass: true, pipeline_bound: true },
            "draw outside a render pass or without a pipeline"
        );
        state.record(command_buffer, RecordedCommand::Draw { vertex_count, instance_count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_failure_hits_the_requested_call() {
        let device = TrackingDevice::failing_at(1);
        assert!(device.create_sampler(&sampler()).is_ok());
        assert!(device.create_sampler(&sampler()).is_err());
        assert!(device.create_sampler(&sampler()).is_ok());
        assert_eq!(device.creation_count(), 3);
        assert_eq!(device.live_count_of(ResourceKind::Sampler), 2);
    }

    #[test]
    fn destroying_a_pool_frees_its_sets() {
        let device = TrackingDevice::new();
        let layout = device.create_descriptor_set_layout(&[]).unwrap();
        let pool = device.create_descriptor_pool(&[], 2).unwrap();
        let sets = device.allocate_descriptor_sets(pool, layout, 2).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(device.live_count_of(ResourceKind::DescriptorSet), 2);

        device.destroy_descriptor_pool(pool);
        assert!(sets.iter().all(|&set| !device.is_live(set)));
        assert!(device.is_live(layout));
        device.destroy_descriptor_set_layout(layout);
        assert_eq!(device.live_count(), 0);
    }

    #[test]
    fn texture_keeps_its_info_and_contents() {
        let device = TrackingDevice::new();
        let info = TextureInfo {
            format: vk::Format::R32G32B32A32_SFLOAT,
            extent: vk::Extent2D { width: 2, height: 2 },
        };
        let texture = device.create_texture_with_data(&info, &[7; 64]).unwrap();
        assert_eq!(texture.info.format, info.format);
        assert_eq!((texture.info.extent.width, texture.info.extent.height), (2, 2));
        assert_eq!(device.contents(texture.handle).unwrap(), vec![7; 64]);
        assert!(device.is_live(texture.handle));

        let handle = texture.handle;
        device.destroy_texture(texture);
        assert!(!device.is_live(handle));
    }

    #[test]
    fn failed_set_allocation_allocates_nothing() {
        let device = TrackingDevice::failing_at(2);
        let layout = device.create_descriptor_set_layout(&[]).unwrap();
        let pool = device.create_descriptor_pool(&[], 3).unwrap();
        assert!(device.allocate_descriptor_sets(pool, layout, 3).is_err());
        assert_eq!(device.live_count_of(ResourceKind::DescriptorSet), 0);
    }

    #[test]
    fn failed_command_buffer_batch_allocates_nothing() {
        let device = TrackingDevice::failing_at(0);
        assert!(device.allocate_command_buffers(3).is_err());
        assert_eq!(device.live_count(), 0);
    }

    #[test]
    #[should_panic(expected = "destroyed while still used")]
    fn parent_destroyed_before_child_panics() {
        let device = TrackingDevice::new();
        let target = ColorTargetInfo {
            format:       vk::Format::R8_UNORM,
            load_op:      vk::AttachmentLoadOp::CLEAR,
            store_op:     vk::AttachmentStoreOp::STORE,
            final_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        };
        let render_pass = device.create_render_pass(&target).unwrap();
        let _framebuffer = device
            .create_framebuffer(render_pass, device.external_view(), vk::Extent2D { width: 1, height: 1 })
            .unwrap();
        device.destroy_render_pass(render_pass);
    }

    #[test]
    #[should_panic(expected = "destroyed twice")]
    fn double_destroy_panics() {
        let device = TrackingDevice::new();
        let sampler = device.create_sampler(&sampler()).unwrap();
        device.destroy_sampler(sampler);
        device.destroy_sampler(sampler);
    }

    #[test]
    #[should_panic(expected = "while it is Initial")]
    fn recording_without_begin_panics() {
        let device = TrackingDevice::new();
        let command_buffer = device.allocate_command_buffers(1).unwrap()[0];
        device.cmd_draw(command_buffer, 3, 1);
    }

    fn sampler() -> SamplerInfo {
        SamplerInfo { address_mode: vk::SamplerAddressMode::REPEAT, filter: vk::Filter::NEAREST }
    }
}
