use std::{fs, path::Path, sync::Arc};

use anyhow::Context;
use erupt::vk;
use eruptao_vk::{
    as_bytes,
    device::{
        ColorTargetInfo,
        DescriptorBindingInfo,
        DescriptorPoolSize,
        DescriptorWrite,
        GraphicsPipelineInfo,
        PushConstantRange,
        RenderPassBegin,
        SamplerInfo,
    },
    GpuDevice,
    Scoped,
};
use nalgebra_glm as glm;
use rand::{rngs::StdRng, SeedableRng};
use std140::repr_std140;

use crate::{
    attachments::SsaoAttachments,
    kernel::KernelSampleSet,
    noise::NoiseTexture,
    screen_quad::ScreenQuad,
    settings::SsaoSettings,
    DeferredPass,
    Frame,
};

const POSITION_DEPTH_BINDING: u32 = 0;
const NORMAL_BINDING: u32 = 1;
const KERNEL_BINDING: u32 = 2;
const NOISE_BINDING: u32 = 3;

/// SPIR-V for the pass, compiled from `shaders/ssao.vert` and `shaders/ssao.frag`.
#[derive(Clone, Debug, Default)]
pub struct ShaderSet {
    pub vertex:   Vec<u8>,
    pub fragment: Vec<u8>,
}

impl ShaderSet {
    /// Reads `ssao_vert.spv` and `ssao_frag.spv` from `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let read = |name: &str| {
            let path = dir.as_ref().join(name);
            fs::read(&path).with_context(|| format!("Cannot read shader {}", path.display()))
        };
        Ok(Self { vertex: read("ssao_vert.spv")?, fragment: read("ssao_frag.spv")? })
    }
}

#[repr_std140]
#[derive(Copy, Clone, Debug)]
pub struct PushConstants {
    pub noise_scale: std140::vec2,
    pub radius_bias: std140::vec2,
}

/// Everything `initialize` creates, declared in reverse creation order so
/// that dropping it tears the pass down back to front.
struct SsaoResources<D: GpuDevice> {
    noise_texture:         Scoped<D, D::Texture>,
    kernel_buffer:         Scoped<D, D::Buffer>,
    noise_sampler:         Scoped<D, D::Sampler>,
    gbuffer_sampler:       Scoped<D, D::Sampler>,
    pipeline:              Scoped<D, D::Pipeline>,
    pipeline_layout:       Scoped<D, D::PipelineLayout>,
    // Freed together with the pool.
    descriptor_sets:       Vec<D::DescriptorSet>,
    descriptor_pool:       Scoped<D, D::DescriptorPool>,
    descriptor_set_layout: Scoped<D, D::DescriptorSetLayout>,
    framebuffers:          Vec<Scoped<D, D::Framebuffer>>,
    command_buffers:       Scoped<D, Vec<D::CommandBuffer>>,
    render_pass:           Scoped<D, D::RenderPass>,
    kernel:                KernelSampleSet,
}

pub struct SsaoPass<D: GpuDevice> {
    device:      Arc<D>,
    attachments: SsaoAttachments<D::ImageView>,
    screen_quad: Arc<ScreenQuad<D>>,
    shaders:     ShaderSet,
    settings:    SsaoSettings,
    resources:   Option<SsaoResources<D>>,
}

impl<D: GpuDevice> SsaoPass<D> {
    pub fn new(
        device: Arc<D>,
        attachments: SsaoAttachments<D::ImageView>,
        screen_quad: Arc<ScreenQuad<D>>,
        shaders: ShaderSet,
        settings: SsaoSettings,
    ) -> Self {
        Self { device, attachments, screen_quad, shaders, settings, resources: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    pub fn settings(&self) -> &SsaoSettings {
        &self.settings
    }

    /// The sample kernel uploaded by the last successful `initialize`.
    pub fn kernel(&self) -> Option<&KernelSampleSet> {
        self.resources.as_ref().map(|r| &r.kernel)
    }

    pub fn push_constants(&self) -> PushConstants {
        let extent = self.attachments.extent();
        let noise_size = self.settings.noise_size as f32;
        PushConstants {
            noise_scale: eruptao_vk::std140::vec2(&glm::vec2(
                extent.width as f32 / noise_size,
                extent.height as f32 / noise_size,
            )),
            radius_bias: eruptao_vk::std140::vec2(&glm::vec2(self.settings.radius, self.settings.bias)),
        }
    }

    fn create_resources(&self) -> anyhow::Result<SsaoResources<D>> {
        self.settings.validate().context("Invalid SSAO settings")?;
        self.attachments.validate().context("Invalid SSAO attachments")?;

        let device = &self.device;
        let frames_in_flight = self.settings.frames_in_flight;
        let frame_count = u32::try_from(frames_in_flight).context("frames_in_flight does not fit in u32")?;
        let extent = self.attachments.extent();

        let render_pass = Scoped::try_new(
            device,
            |d| {
                d.create_render_pass(&ColorTargetInfo {
                    format:       self.attachments.occlusion.format,
                    load_op:      vk::AttachmentLoadOp::CLEAR,
                    store_op:     vk::AttachmentStoreOp::STORE,
                    final_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                })
            },
            D::destroy_render_pass,
        )
        .context("Cannot create SSAO render pass")?;

        let command_buffers = Scoped::try_new(
            device,
            |d| d.allocate_command_buffers(frame_count),
            D::free_command_buffers,
        )
        .context("Cannot allocate SSAO command buffers")?;

        let framebuffers = (0..frames_in_flight)
            .map(|_| {
                Scoped::try_new(
                    device,
                    |d| d.create_framebuffer(*render_pass, self.attachments.occlusion.view, extent),
                    D::destroy_framebuffer,
                )
            })
            .collect::<Result<Vec<_>, _>>()
            .context("Cannot create SSAO framebuffers")?;
        log::debug!("Created SSAO render pass with {frames_in_flight} framebuffers");

        // Descriptor sets
        let bindings = [
            (POSITION_DEPTH_BINDING, vk::DescriptorType::COMBINED_IMAGE_SAMPLER),
            (NORMAL_BINDING, vk::DescriptorType::COMBINED_IMAGE_SAMPLER),
            (KERNEL_BINDING, vk::DescriptorType::UNIFORM_BUFFER),
            (NOISE_BINDING, vk::DescriptorType::COMBINED_IMAGE_SAMPLER),
        ]
        .map(|(binding, descriptor_type)| DescriptorBindingInfo {
            binding,
            descriptor_type,
            shader_stage_flags: vk::ShaderStageFlags::FRAGMENT,
        });

        let descriptor_set_layout = Scoped::try_new(
            device,
            |d| d.create_descriptor_set_layout(&bindings),
            D::destroy_descriptor_set_layout,
        )
        .context("Cannot create SSAO descriptor set layout")?;

        let pool_sizes = [vk::DescriptorType::COMBINED_IMAGE_SAMPLER, vk::DescriptorType::UNIFORM_BUFFER]
            .into_iter()
            .map(|descriptor_type| {
                let per_set = bindings.iter().filter(|b| b.descriptor_type == descriptor_type).count() as u32;
                per_set
                    .checked_mul(frame_count)
                    .map(|descriptor_count| DescriptorPoolSize { descriptor_type, descriptor_count })
                    .context("SSAO descriptor pool is too large")
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let descriptor_pool = Scoped::try_new(
            device,
            |d| d.create_descriptor_pool(&pool_sizes, frame_count),
            D::destroy_descriptor_pool,
        )
        .context("Cannot create SSAO descriptor pool")?;

        let descriptor_sets = device
            .allocate_descriptor_sets(*descriptor_pool, *descriptor_set_layout, frames_in_flight)
            .context("Cannot allocate SSAO descriptor sets")?;

        // Graphics pipeline
        let push_constant_ranges = [PushConstantRange {
            stage_flags: vk::ShaderStageFlags::FRAGMENT,
            size:        std::mem::size_of::<PushConstants>() as u32,
        }];
        let pipeline_layout = Scoped::try_new(
            device,
            |d| d.create_pipeline_layout(*descriptor_set_layout, &push_constant_ranges),
            D::destroy_pipeline_layout,
        )
        .context("Cannot create SSAO pipeline layout")?;

        let vertex_attributes = ScreenQuad::<D>::vertex_attributes();
        let pipeline = Scoped::try_new(
            device,
            |d| {
                d.create_graphics_pipeline(&GraphicsPipelineInfo {
                    render_pass:       *render_pass,
                    layout:            *pipeline_layout,
                    vertex_shader:     &self.shaders.vertex,
                    fragment_shader:   &self.shaders.fragment,
                    topology:          ScreenQuad::<D>::TOPOLOGY,
                    vertex_stride:     ScreenQuad::<D>::vertex_stride(),
                    vertex_attributes: &vertex_attributes,
                    color_write_mask:  vk::ColorComponentFlags::R,
                })
            },
            D::destroy_pipeline,
        )
        .context("Cannot create SSAO graphics pipeline")?;

        // Samplers
        let gbuffer_sampler = Scoped::try_new(
            device,
            |d| {
                d.create_sampler(&SamplerInfo {
                    address_mode: vk::SamplerAddressMode::CLAMP_TO_EDGE,
                    filter:       vk::Filter::NEAREST,
                })
            },
            D::destroy_sampler,
        )
        .context("Cannot create G-buffer sampler")?;
        let noise_sampler = Scoped::try_new(
            device,
            |d| {
                d.create_sampler(&SamplerInfo {
                    address_mode: vk::SamplerAddressMode::REPEAT,
                    filter:       vk::Filter::NEAREST,
                })
            },
            D::destroy_sampler,
        )
        .context("Cannot create noise sampler")?;

        // Kernel and noise share one stream so a seed pins down both.
        let mut rng = StdRng::seed_from_u64(self.settings.kernel_seed);

        let kernel = KernelSampleSet::generate(&mut rng);
        let kernel_buffer = Scoped::try_new(
            device,
            |d| d.create_buffer_with_data(vk::BufferUsageFlags::UNIFORM_BUFFER, as_bytes(&kernel.to_gpu())),
            D::destroy_buffer,
        )
        .context("Cannot upload SSAO kernel")?;

        let noise = NoiseTexture::generate(&mut rng, self.settings.noise_size);
        let noise_texture = Scoped::try_new(
            device,
            |d| d.create_texture_with_data(&noise.texture_info(), &noise.to_bytes()),
            D::destroy_texture,
        )
        .context("Cannot upload SSAO noise texture")?;
        let noise_view = device.texture_view(&noise_texture);

        for &set in descriptor_sets.iter() {
            device.update_descriptor_set(set, &[
                DescriptorWrite::CombinedImageSampler {
                    binding: POSITION_DEPTH_BINDING,
                    view:    self.attachments.position_depth.view,
                    sampler: *gbuffer_sampler,
                },
                DescriptorWrite::CombinedImageSampler {
                    binding: NORMAL_BINDING,
                    view:    self.attachments.normal.view,
                    sampler: *gbuffer_sampler,
                },
                DescriptorWrite::UniformBuffer { binding: KERNEL_BINDING, buffer: &*kernel_buffer },
                DescriptorWrite::CombinedImageSampler {
                    binding: NOISE_BINDING,
                    view:    noise_view,
                    sampler: *noise_sampler,
                },
            ]);
        }

        Ok(SsaoResources {
            noise_texture,
            kernel_buffer,
            noise_sampler,
            gbuffer_sampler,
            pipeline,
            pipeline_layout,
            descriptor_sets,
            descriptor_pool,
            descriptor_set_layout,
            framebuffers,
            command_buffers,
            render_pass,
            kernel,
        })
    }
}

impl<D: GpuDevice> DeferredPass<D> for SsaoPass<D> {
    fn name(&self) -> &str {
        "ssao"
    }

    fn initialize(&mut self) -> bool {
        if self.resources.is_some() {
            log::warn!("SSAO pass is already initialized");
            return true;
        }

        match self.create_resources() {
            Ok(resources) => {
                self.resources = Some(resources);
                log::info!(
                    "SSAO pass initialized ({} frames in flight, seed {:#x})",
                    self.settings.frames_in_flight,
                    self.settings.kernel_seed
                );
                true
            }
            Err(e) => {
                log::error!("Cannot initialize SSAO pass: {e:#}");
                false
            }
        }
    }

    fn shutdown(&mut self) {
        if self.resources.take().is_some() {
            log::info!("SSAO pass shut down");
        }
    }

    fn draw(&mut self, frame: Frame) -> D::CommandBuffer {
        let resources = self.resources.as_ref().expect("SSAO pass drawn while not initialized");
        let index = frame.index();
        assert!(
            index < resources.command_buffers.len(),
            "frame {index} is out of range for {} frames in flight",
            resources.command_buffers.len()
        );

        let device = self.device.as_ref();
        let command_buffer = resources.command_buffers[index];
        let extent = self.attachments.extent();
        let clear = self.settings.clear_value;

        device.begin_command_buffer(command_buffer);
        device.cmd_begin_render_pass(command_buffer, &RenderPassBegin {
            render_pass: *resources.render_pass,
            framebuffer: *resources.framebuffers[index],
            extent,
            clear_color: [clear, clear, clear, clear],
        });
        device.cmd_set_viewport_and_scissor(command_buffer, extent);
        device.cmd_bind_pipeline(command_buffer, *resources.pipeline);
        device.cmd_bind_descriptor_set(command_buffer, *resources.pipeline_layout, resources.descriptor_sets[index]);
        device.cmd_push_constants(
            command_buffer,
            *resources.pipeline_layout,
            vk::ShaderStageFlags::FRAGMENT,
            as_bytes(std::slice::from_ref(&self.push_constants())),
        );
        self.screen_quad.draw(device, command_buffer);
        device.cmd_end_render_pass(command_buffer);
        device.end_command_buffer(command_buffer);

        command_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::{AttachmentRole, ImageAttachment};
    use approx::assert_relative_eq;
    use eruptao_vk::tracking::{ResourceKind, TrackedHandle, TrackingDevice};
    use itertools::Itertools;

    fn pass(device: &Arc<TrackingDevice>, settings: SsaoSettings) -> SsaoPass<TrackingDevice> {
        let attachment = |role, format| ImageAttachment {
            role,
            view: device.external_view(),
            format,
            extent: vk::Extent2D { width: 1280, height: 720 },
        };
        let attachments = SsaoAttachments {
            position_depth: attachment(AttachmentRole::PositionDepth, vk::Format::R32G32B32A32_SFLOAT),
            normal:         attachment(AttachmentRole::Normal, vk::Format::R16G16B16A16_SFLOAT),
            occlusion:      attachment(AttachmentRole::Occlusion, vk::Format::R8_UNORM),
        };
        let screen_quad = Arc::new(ScreenQuad::new(device).unwrap());
        SsaoPass::new(device.clone(), attachments, screen_quad, ShaderSet::default(), settings)
    }

    #[test]
    fn push_constants_tile_noise_over_the_target() {
        let device = Arc::new(TrackingDevice::new());
        let pass = pass(&device, SsaoSettings { radius: 0.75, bias: 0.05, ..Default::default() });
        let bytes = as_bytes(std::slice::from_ref(&pass.push_constants())).to_vec();
        let floats = bytes
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect::<Vec<_>>();
        assert_eq!(bytes.len(), 16);
        assert_relative_eq!(floats[0], 320.0);
        assert_relative_eq!(floats[1], 180.0);
        assert_relative_eq!(floats[2], 0.75);
        assert_relative_eq!(floats[3], 0.05);
    }

    #[test]
    fn descriptor_sets_reference_inputs_kernel_and_noise() {
        let device = Arc::new(TrackingDevice::new());
        let mut pass = pass(&device, SsaoSettings::default());
        assert!(pass.initialize());

        let kernel_buffer = device.created(ResourceKind::Buffer)[1];
        let samplers = device.created(ResourceKind::Sampler);
        for set in device.created(ResourceKind::DescriptorSet) {
            let writes = device.descriptor_writes(set);
            assert_eq!(writes.iter().map(|w| w.binding).collect_vec(), vec![0, 1, 2, 3]);
            assert_eq!(writes[0].resource, pass.attachments.position_depth.view);
            assert_eq!(writes[0].sampler, Some(samplers[0]));
            assert_eq!(writes[1].resource, pass.attachments.normal.view);
            assert_eq!(writes[2].resource, kernel_buffer);
            assert_eq!(writes[2].sampler, None);
            assert_eq!(writes[3].sampler, Some(samplers[1]));
        }
    }

    #[test]
    fn kernel_buffer_holds_the_generated_kernel() {
        let device = Arc::new(TrackingDevice::new());
        let mut pass = pass(&device, SsaoSettings::default());
        assert!(pass.initialize());

        let kernel_buffer = device.created(ResourceKind::Buffer)[1];
        let uploaded = device.contents(kernel_buffer).unwrap();
        let expected = KernelSampleSet::from_seed(SsaoSettings::default().kernel_seed);
        assert_eq!(pass.kernel(), Some(&expected));
        assert_eq!(uploaded, as_bytes(&expected.to_gpu()));
    }

    #[test]
    fn noise_texture_is_uploaded() {
        let device = Arc::new(TrackingDevice::new());
        let mut pass = pass(&device, SsaoSettings { noise_size: 8, ..Default::default() });
        assert!(pass.initialize());

        let texture: TrackedHandle = device.created(ResourceKind::Texture)[0];
        assert_eq!(device.contents(texture).unwrap().len(), 8 * 8 * 16);
    }

    #[test]
    fn shader_set_loads_both_stages_from_a_directory() {
        let dir = std::env::temp_dir().join(format!("eruptao-ssao-shaders-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("ssao_vert.spv"), [0x03, 0x02, 0x23, 0x07, 1]).unwrap();
        let missing_fragment = ShaderSet::load(&dir).unwrap_err();
        fs::write(dir.join("ssao_frag.spv"), [0x03, 0x02, 0x23, 0x07, 2]).unwrap();
        let shaders = ShaderSet::load(&dir);
        fs::remove_dir_all(&dir).unwrap();

        assert!(format!("{missing_fragment:#}").contains("ssao_frag.spv"));
        let shaders = shaders.unwrap();
        assert_eq!(shaders.vertex, [0x03, 0x02, 0x23, 0x07, 1]);
        assert_eq!(shaders.fragment, [0x03, 0x02, 0x23, 0x07, 2]);
    }

    #[test]
    fn second_initialize_creates_nothing() {
        let device = Arc::new(TrackingDevice::new());
        let mut pass = pass(&device, SsaoSettings::default());
        assert!(pass.initialize());
        let created = device.creation_count();

        assert!(pass.initialize());
        assert_eq!(device.creation_count(), created);
    }
}
