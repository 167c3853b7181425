use erupt::vk;
use thiserror::Error;

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Vulkan call failed with {0:?}")]
    Vulkan(vk::Result),

    #[error("Memory allocation failed: {0}")]
    Allocation(String),

    #[error("Cannot decode SPIR-V")]
    Shader(#[from] std::io::Error),

    #[error("Driver returned no {0}")]
    MissingObject(&'static str),
}

impl From<vk::Result> for DeviceError {
    fn from(result: vk::Result) -> Self {
        Self::Vulkan(result)
    }
}

impl DeviceError {
    pub fn allocation<E: std::fmt::Debug>(error: E) -> Self {
        Self::Allocation(format!("{error:?}"))
    }
}
