use std::sync::{Arc, RwLock};

use erupt::vk;
use vk_mem_erupt as vma;

use crate::{contexts::read_allocator, DeviceError, DeviceResult};

/// Views a slice of plain data as the bytes uploaded to the GPU.
pub fn as_bytes<T: Copy>(data: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data)) }
}

#[derive(Clone)]
pub struct AllocatedBuffer {
    pub buffer: vk::Buffer,
    pub size:   vk::DeviceSize,
    pub usage:  vk::BufferUsageFlags,

    allocator:           Arc<RwLock<vma::Allocator>>,
    allocation:          vma::Allocation,
    pub allocation_info: vma::AllocationInfo,
}

impl AllocatedBuffer {
    pub fn with_data(
        allocator: Arc<RwLock<vma::Allocator>>,
        usage: vk::BufferUsageFlags,
        memory_usage: vma::MemoryUsage,
        data: &[u8],
    ) -> DeviceResult<Self> {
        let buffer_info = vk::BufferCreateInfoBuilder::new()
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .size(data.len() as vk::DeviceSize);
        let allocation_create_info = vma::AllocationCreateInfo { usage: memory_usage, ..Default::default() };
        let (buffer, allocation, allocation_info) = read_allocator(&allocator)
            .create_buffer(&buffer_info, &allocation_create_info)
            .map_err(DeviceError::allocation)?;

        let this = Self { buffer, size: buffer_info.size, usage, allocator, allocation, allocation_info };
        if let Err(e) = this.set_data(data) {
            this.destroy();
            return Err(e);
        }
        Ok(this)
    }

    pub fn set_data(&self, data: &[u8]) -> DeviceResult<()> {
        assert!(data.len() as vk::DeviceSize <= self.size, "{} bytes written into a {} byte buffer", data.len(), self.size);

        let allocator = read_allocator(&self.allocator);
        let buffer_addr = allocator.map_memory(&self.allocation).map_err(DeviceError::allocation)?;
        if buffer_addr.is_null() {
            allocator.unmap_memory(&self.allocation);
            return Err(DeviceError::MissingObject("mapped buffer memory"));
        }
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), buffer_addr, data.len());
        }
        allocator.unmap_memory(&self.allocation);
        allocator.flush_allocation(&self.allocation, 0, data.len());
        Ok(())
    }

    pub fn destroy(&self) {
        read_allocator(&self.allocator).destroy_buffer(self.buffer, &self.allocation);
    }
}
