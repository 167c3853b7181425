use std::sync::{Arc, RwLock};

use erupt::{vk, DeviceLoader};
use vk_mem_erupt as vma;

use crate::{command, contexts::read_allocator, AllocatedBuffer, DeviceError, DeviceResult, VulkanContext};

/// A device-local 2D image with a single mip level and layer, plus its view.
#[derive(Clone)]
pub struct AllocatedImage {
    pub image:             vk::Image,
    pub view:              vk::ImageView,
    pub subresource_range: vk::ImageSubresourceRange,
    pub extent:            vk::Extent3D,

    allocator:           Arc<RwLock<vma::Allocator>>,
    allocation:          vma::Allocation,
    pub allocation_info: vma::AllocationInfo,
}

impl AllocatedImage {
    pub fn new(vk_ctx: &VulkanContext, image_info: vk::ImageCreateInfoBuilder) -> DeviceResult<Self> {
        let allocation_create_info =
            vma::AllocationCreateInfo { usage: vma::MemoryUsage::GpuOnly, ..Default::default() };

        let (image, allocation, allocation_info) = vk_ctx
            .allocator()
            .create_image(&image_info.initial_layout(vk::ImageLayout::UNDEFINED), &allocation_create_info)
            .map_err(DeviceError::allocation)?;

        let subresource_range = vk::ImageSubresourceRangeBuilder::new()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(0)
            .level_count(1)
            .base_array_layer(0)
            .layer_count(1)
            .build();

        let view_info = vk::ImageViewCreateInfoBuilder::new()
            .image(image)
            .view_type(vk::ImageViewType::_2D)
            .format(image_info.format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(subresource_range);

        let view = match unsafe { vk_ctx.device.create_image_view(&view_info, None) }.result() {
            Ok(view) => view,
            Err(e) => {
                vk_ctx.allocator().destroy_image(image, &allocation);
                return Err(e.into());
            }
        };

        Ok(Self {
            image,
            view,
            subresource_range,
            extent: image_info.extent,
            allocator: vk_ctx.allocator.clone(),
            allocation,
            allocation_info,
        })
    }

    /// Creates a sampled texture and fills it with tightly packed `data`,
    /// leaving it in `SHADER_READ_ONLY_OPTIMAL`.
    pub fn texture_with_data(
        vk_ctx: &VulkanContext,
        format: vk::Format,
        extent: vk::Extent2D,
        data: &[u8],
    ) -> DeviceResult<Self> {
        let image_info = vk::ImageCreateInfoBuilder::new()
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .format(format)
            .extent(vk::Extent3D { width: extent.width, height: extent.height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlagBits::_1)
            .image_type(vk::ImageType::_2D);

        let this = Self::new(vk_ctx, image_info)?;
        if let Err(e) = this.set_data(vk_ctx, data) {
            this.destroy(&vk_ctx.device);
            return Err(e);
        }
        log::debug!("Uploaded {}x{} {:?} texture", extent.width, extent.height, format);
        Ok(this)
    }

    pub fn destroy(&self, device: &DeviceLoader) {
        unsafe {
            device.destroy_image_view(self.view, None);
        }
        read_allocator(&self.allocator).destroy_image(self.image, &self.allocation);
    }

    pub fn set_data(&self, vk_ctx: &VulkanContext, data: &[u8]) -> DeviceResult<()> {
        let staging_buffer = AllocatedBuffer::with_data(
            self.allocator.clone(),
            vk::BufferUsageFlags::TRANSFER_SRC,
            vma::MemoryUsage::CpuOnly,
            data,
        )?;

        let result = command::immediate_submit(vk_ctx, |device, command_buffer| unsafe {
            device.cmd_pipeline_barrier2(
                command_buffer,
                &vk::DependencyInfoBuilder::new().image_memory_barriers(&[vk::ImageMemoryBarrier2Builder::new()
                    .src_stage_mask(vk::PipelineStageFlags2::TOP_OF_PIPE)
                    .dst_stage_mask(vk::PipelineStageFlags2::TRANSFER)
                    .src_access_mask(vk::AccessFlags2::empty())
                    .dst_access_mask(vk::AccessFlags2::TRANSFER_WRITE)
                    .old_layout(vk::ImageLayout::UNDEFINED)
                    .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .image(self.image)
                    .subresource_range(self.subresource_range)]),
            );
            device.cmd_copy_buffer_to_image2(
                command_buffer,
                &vk::CopyBufferToImageInfo2Builder::new()
                    .src_buffer(staging_buffer.buffer)
                    .dst_image(self.image)
                    .dst_image_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .regions(&[vk::BufferImageCopy2Builder::new()
                        .buffer_offset(0)
                        .buffer_row_length(0)
                        .buffer_image_height(0)
                        .image_offset(vk::Offset3D::default())
                        .image_subresource(
                            vk::ImageSubresourceLayersBuilder::new()
                                .aspect_mask(vk::ImageAspectFlags::COLOR)
                                .mip_level(0)
                                .base_array_layer(0)
                                .layer_count(1)
                                .build(),
                        )
                        .image_extent(self.extent)]),
            );
            device.cmd_pipeline_barrier2(
                command_buffer,
                &vk::DependencyInfoBuilder::new().image_memory_barriers(&[vk::ImageMemoryBarrier2Builder::new()
                    .src_stage_mask(vk::PipelineStageFlags2::TRANSFER)
                    .dst_stage_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER)
                    .src_access_mask(vk::AccessFlags2::TRANSFER_WRITE)
                    .dst_access_mask(vk::AccessFlags2::SHADER_SAMPLED_READ)
                    .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                    .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                    .image(self.image)
                    .subresource_range(self.subresource_range)]),
            );
        });

        staging_buffer.destroy();
        result
    }
}
