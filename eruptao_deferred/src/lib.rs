pub mod attachments;
pub mod kernel;
pub mod noise;
pub mod screen_quad;
pub mod settings;
pub mod ssao_pass;

use eruptao_vk::GpuDevice;

pub use attachments::{AttachmentRole, ImageAttachment, SsaoAttachments};
pub use kernel::{KernelSampleSet, KERNEL_SIZE};
pub use noise::NoiseTexture;
pub use screen_quad::ScreenQuad;
pub use settings::{SsaoSettings, FRAMES_IN_FLIGHT_LIMIT, MAX_FRAMES_IN_FLIGHT, NOISE_SIZE_LIMIT};
pub use ssao_pass::{ShaderSet, SsaoPass};

/// Frame-in-flight slot handed to a pass by the frame loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame(pub usize);

impl Frame {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What the frame loop needs from a render pass.
pub trait DeferredPass<D: GpuDevice> {
    fn name(&self) -> &str;

    /// Creates every GPU object the pass owns. On failure nothing is left
    /// behind and `false` is returned.
    fn initialize(&mut self) -> bool;

    /// Releases everything `initialize` created. Calling it again, or
    /// without a prior `initialize`, does nothing.
    fn shutdown(&mut self);

    /// Records the pass into the command buffer of `frame` and returns it
    /// for the caller to submit.
    fn draw(&mut self, frame: Frame) -> D::CommandBuffer;
}
