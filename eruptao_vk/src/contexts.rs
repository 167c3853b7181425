use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use erupt::{vk, DeviceLoader};
use vk_mem_erupt as vma;

/// Device-level objects shared by everything that creates GPU resources.
///
/// `command_pool` must be created with `RESET_COMMAND_BUFFER`, since passes
/// re-record their command buffers every frame.
#[derive(Clone)]
pub struct VulkanContext {
    pub device:       Arc<DeviceLoader>,
    pub allocator:    Arc<RwLock<vma::Allocator>>,
    pub queue:        vk::Queue,
    pub command_pool: vk::CommandPool,
    pub upload_fence: vk::Fence,
}

impl VulkanContext {
    pub fn allocator(&self) -> RwLockReadGuard<'_, vma::Allocator> {
        read_allocator(&self.allocator)
    }
}

pub(crate) fn read_allocator(allocator: &RwLock<vma::Allocator>) -> RwLockReadGuard<'_, vma::Allocator> {
    allocator.read().unwrap_or_else(PoisonError::into_inner)
}
