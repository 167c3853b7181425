use erupt::{vk, DeviceLoader};

use crate::{DeviceError, DeviceResult, VulkanContext};

/// Records a one-off command buffer, submits it and blocks until the GPU is done with it.
pub fn immediate_submit<F>(vk_ctx: &VulkanContext, execute_commands: F) -> DeviceResult<()>
where
    F: FnOnce(&DeviceLoader, vk::CommandBuffer),
{
    let allocate_info = vk::CommandBufferAllocateInfoBuilder::new()
        .command_pool(vk_ctx.command_pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);
    let command_buffer = unsafe { vk_ctx.device.allocate_command_buffers(&allocate_info) }
        .result()?
        .first()
        .copied()
        .ok_or(DeviceError::MissingObject("upload command buffer"))?;

    let result = submit_and_wait(vk_ctx, command_buffer, execute_commands);
    unsafe {
        vk_ctx.device.free_command_buffers(vk_ctx.command_pool, &[command_buffer]);
    }
    result
}

fn submit_and_wait<F>(vk_ctx: &VulkanContext, command_buffer: vk::CommandBuffer, execute_commands: F) -> DeviceResult<()>
where
    F: FnOnce(&DeviceLoader, vk::CommandBuffer),
{
    let begin_info = vk::CommandBufferBeginInfoBuilder::new().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    unsafe {
        vk_ctx.device.begin_command_buffer(command_buffer, &begin_info).result()?;
        execute_commands(&vk_ctx.device, command_buffer);
        vk_ctx.device.end_command_buffer(command_buffer).result()?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfoBuilder::new().command_buffers(&command_buffers);
        vk_ctx.device.queue_submit(vk_ctx.queue, &[submit_info], vk_ctx.upload_fence).result()?;
        vk_ctx.device.wait_for_fences(&[vk_ctx.upload_fence], true, u64::MAX).result()?;
        vk_ctx.device.reset_fences(&[vk_ctx.upload_fence]).result()?;
    }
    Ok(())
}
