use erupt::{vk, DeviceLoader};

use crate::DeviceResult;

pub fn make_shader_module(device: &DeviceLoader, spv_bytes: &[u8]) -> DeviceResult<vk::ShaderModule> {
    let spv = erupt::utils::decode_spv(spv_bytes)?;
    let module_info = vk::ShaderModuleCreateInfoBuilder::new().code(&spv);
    let module = unsafe { device.create_shader_module(&module_info, None) }.result()?;
    Ok(module)
}
