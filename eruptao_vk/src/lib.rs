pub mod buffer;
pub mod command;
pub mod contexts;
pub mod device;
pub mod error;
pub mod image;
pub mod scoped;
pub mod shader;
pub mod std140;
pub mod vulkan;

#[cfg(any(test, feature = "tracking"))]
pub mod tracking;

pub use buffer::{as_bytes, AllocatedBuffer};
pub use contexts::VulkanContext;
pub use device::GpuDevice;
pub use error::{DeviceError, DeviceResult};
pub use image::AllocatedImage;
pub use scoped::Scoped;
pub use vulkan::VulkanDevice;
