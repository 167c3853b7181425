use anyhow::bail;
use eruptao_vk::GpuDevice;
use itertools::Itertools;

pub use erupt::vk;
pub use eruptao_deferred::{self as deferred, DeferredPass, Frame};
pub use eruptao_vk::{self as gpu, VulkanContext, VulkanDevice};

/// Installs `env_logger` at `info` unless `RUST_LOG` says otherwise.
/// Does nothing if the host already set up a logger.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Passes of one frame, run in registration order.
pub struct PassRegistry<D: GpuDevice> {
    passes: Vec<Box<dyn DeferredPass<D>>>,
}

impl<D: GpuDevice> Default for PassRegistry<D> {
    fn default() -> Self {
        Self { passes: Vec::new() }
    }
}

impl<D: GpuDevice> PassRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: DeferredPass<D> + 'static>(&mut self, pass: P) {
        log::debug!("Registered pass \"{}\"", pass.name());
        self.passes.push(Box::new(pass));
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect_vec()
    }

    /// Initializes every pass. If one fails, the passes before it are shut
    /// down again in reverse order and the failing pass is reported.
    pub fn initialize_all(&mut self) -> anyhow::Result<()> {
        for i in 0..self.passes.len() {
            if !self.passes[i].initialize() {
                let name = self.passes[i].name().to_owned();
                for pass in self.passes[..i].iter_mut().rev() {
                    pass.shutdown();
                }
                bail!("Cannot initialize pass \"{name}\"");
            }
        }
        log::info!("Initialized passes: {}", self.names().join(", "));
        Ok(())
    }

    /// Records every pass for `frame`, returning the command buffers in submission order.
    pub fn draw_all(&mut self, frame: Frame) -> Vec<D::CommandBuffer> {
        self.passes.iter_mut().map(|p| p.draw(frame)).collect_vec()
    }

    pub fn shutdown_all(&mut self) {
        for pass in self.passes.iter_mut().rev() {
            pass.shutdown();
        }
    }
}

impl<D: GpuDevice> Drop for PassRegistry<D> {
    fn drop(&mut self) {
        self.shutdown_all();
    }
}
