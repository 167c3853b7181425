use std::sync::Arc;

use eruptao::{
    deferred::{AttachmentRole, ImageAttachment, ScreenQuad, ShaderSet, SsaoAttachments, SsaoPass, SsaoSettings},
    gpu::tracking::{ResourceKind, TrackingDevice},
    vk,
    Frame,
    PassRegistry,
};

fn ssao_pass(device: &Arc<TrackingDevice>, screen_quad: &Arc<ScreenQuad<TrackingDevice>>) -> SsaoPass<TrackingDevice> {
    let extent = vk::Extent2D { width: 640, height: 480 };
    let attachment = |role, format| ImageAttachment { role, view: device.external_view(), format, extent };
    let attachments = SsaoAttachments {
        position_depth: attachment(AttachmentRole::PositionDepth, vk::Format::R32G32B32A32_SFLOAT),
        normal:         attachment(AttachmentRole::Normal, vk::Format::R16G16B16A16_SFLOAT),
        occlusion:      attachment(AttachmentRole::Occlusion, vk::Format::R8_UNORM),
    };
    SsaoPass::new(device.clone(), attachments, screen_quad.clone(), ShaderSet::default(), SsaoSettings::default())
}

#[test]
fn sibling_passes_share_one_screen_quad() {
    eruptao::init_logging();
    let device = Arc::new(TrackingDevice::new());
    let screen_quad = Arc::new(ScreenQuad::new(&device).unwrap());

    let mut registry = PassRegistry::new();
    registry.register(ssao_pass(&device, &screen_quad));
    registry.register(ssao_pass(&device, &screen_quad));
    registry.initialize_all().unwrap();
    assert_eq!(device.live_count_of(ResourceKind::Buffer), 3);

    for frame in 0..6 {
        let command_buffers = registry.draw_all(Frame(frame % 3));
        assert_eq!(command_buffers.len(), 2);
        assert_ne!(command_buffers[0], command_buffers[1]);
    }

    drop(registry);
    assert_eq!(device.live_count(), 1);
    drop(screen_quad);
    assert_eq!(device.live_count(), 0);
}

#[test]
fn failing_pass_leaves_the_device_clean() {
    eruptao::init_logging();
    // Index 0 is the screen quad, then the first pass takes 14 creation calls.
    let device = Arc::new(TrackingDevice::failing_at(20));
    let screen_quad = Arc::new(ScreenQuad::new(&device).unwrap());

    let mut registry = PassRegistry::new();
    registry.register(ssao_pass(&device, &screen_quad));
    registry.register(ssao_pass(&device, &screen_quad));

    assert!(registry.initialize_all().is_err());
    assert_eq!(device.live_count(), 1);
}
