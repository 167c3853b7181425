use std::{fmt, ops::Deref, sync::Arc};

use crate::{DeviceResult, GpuDevice};

/// A device object that is released when the wrapper is dropped.
///
/// Locals of this type unwind in reverse declaration order, so a constructor
/// that bails out with `?` half way through releases exactly what it created.
pub struct Scoped<D: GpuDevice, T> {
    device:  Arc<D>,
    // Only `None` once `drop` has run.
    value:   Option<T>,
    release: fn(&D, T),
}

impl<D: GpuDevice, T> Scoped<D, T> {
    pub fn new(device: Arc<D>, value: T, release: fn(&D, T)) -> Self {
        Self { device, value: Some(value), release }
    }

    pub fn try_new<F>(device: &Arc<D>, create: F, release: fn(&D, T)) -> DeviceResult<Self>
    where
        F: FnOnce(&D) -> DeviceResult<T>,
    {
        let value = create(device)?;
        Ok(Self::new(device.clone(), value, release))
    }
}

impl<D: GpuDevice, T> Deref for Scoped<D, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("scoped value accessed after release")
    }
}

impl<D: GpuDevice, T> Drop for Scoped<D, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            (self.release)(&self.device, value);
        }
    }
}

impl<D: GpuDevice, T: fmt::Debug> fmt::Debug for Scoped<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scoped").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::ColorTargetInfo,
        tracking::{ResourceKind, TrackingDevice},
    };
    use erupt::vk;

    fn target() -> ColorTargetInfo {
        ColorTargetInfo {
            format:       vk::Format::R8_UNORM,
            load_op:      vk::AttachmentLoadOp::CLEAR,
            store_op:     vk::AttachmentStoreOp::STORE,
            final_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }

    #[test]
    fn releases_on_drop() {
        let device = Arc::new(TrackingDevice::new());
        let render_pass =
            Scoped::try_new(&device, |d| d.create_render_pass(&target()), TrackingDevice::destroy_render_pass)
                .unwrap();
        assert_eq!(device.live_count_of(ResourceKind::RenderPass), 1);
        assert!(!render_pass.is_null());

        drop(render_pass);
        assert_eq!(device.live_count(), 0);
    }

    #[test]
    fn derefs_to_the_wrapped_value_until_dropped() {
        let device = Arc::new(TrackingDevice::new());
        let buffers = Scoped::try_new(&device, |d| d.allocate_command_buffers(2), TrackingDevice::free_command_buffers)
            .unwrap();
        assert_eq!(buffers.len(), 2);
        assert!(format!("{buffers:?}").starts_with("Scoped(Some("));
        assert!(buffers.iter().all(|&cb| device.is_live(cb)));

        drop(buffers);
        assert_eq!(device.live_count_of(ResourceKind::CommandBuffer), 0);
    }

    #[test]
    fn failed_creation_leaves_nothing_behind() {
        let device = Arc::new(TrackingDevice::failing_at(0));
        let render_pass =
            Scoped::try_new(&device, |d| d.create_render_pass(&target()), TrackingDevice::destroy_render_pass);
        assert!(render_pass.is_err());
        assert_eq!(device.live_count(), 0);
    }

    #[test]
    fn locals_unwind_in_reverse_order() {
        let device = Arc::new(TrackingDevice::new());
        {
            let render_pass =
                Scoped::try_new(&device, |d| d.create_render_pass(&target()), TrackingDevice::destroy_render_pass)
                    .unwrap();
            let _framebuffer = Scoped::try_new(
                &device,
                |d| d.create_framebuffer(*render_pass, d.external_view(), vk::Extent2D { width: 4, height: 4 }),
                TrackingDevice::destroy_framebuffer,
            )
            .unwrap();
        }
        // The framebuffer must go first, otherwise the double panics on the render pass.
        assert_eq!(device.live_count(), 0);
    }
}
