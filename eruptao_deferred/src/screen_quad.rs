use std::sync::Arc;

use erupt::vk;
use eruptao_vk::{as_bytes, device::VertexAttribute, DeviceResult, GpuDevice, Scoped};
use nalgebra_glm as glm;

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct Vertex {
    pub position:  glm::Vec2,
    pub texcoords: glm::Vec2,
}

/// Full-screen triangle strip shared by every screen-space pass.
///
/// Owned by whoever loads geometry and handed to passes as an `Arc`; the
/// vertex buffer goes away with the last clone.
pub struct ScreenQuad<D: GpuDevice> {
    vertex_buffer: Scoped<D, D::Buffer>,
}

impl<D: GpuDevice> ScreenQuad<D> {
    pub const VERTEX_COUNT: u32 = 4;
    pub const TOPOLOGY: vk::PrimitiveTopology = vk::PrimitiveTopology::TRIANGLE_STRIP;

    pub fn new(device: &Arc<D>) -> DeviceResult<Self> {
        let vertices = [
            Vertex { position: glm::vec2(-1.0, -1.0), texcoords: glm::vec2(0.0, 0.0) },
            Vertex { position: glm::vec2(-1.0, 1.0), texcoords: glm::vec2(0.0, 1.0) },
            Vertex { position: glm::vec2(1.0, -1.0), texcoords: glm::vec2(1.0, 0.0) },
            Vertex { position: glm::vec2(1.0, 1.0), texcoords: glm::vec2(1.0, 1.0) },
        ];
        let vertex_buffer = Scoped::try_new(
            device,
            |d| d.create_buffer_with_data(vk::BufferUsageFlags::VERTEX_BUFFER, as_bytes(&vertices)),
            D::destroy_buffer,
        )?;
        Ok(Self { vertex_buffer })
    }

    pub fn vertex_stride() -> u32 {
        std::mem::size_of::<Vertex>() as u32
    }

    pub fn vertex_attributes() -> [VertexAttribute; 2] {
        [
            VertexAttribute { location: 0, format: vk::Format::R32G32_SFLOAT, offset: 0 },
            VertexAttribute {
                location: 1,
                format:   vk::Format::R32G32_SFLOAT,
                offset:   std::mem::size_of::<glm::Vec2>() as u32,
            },
        ]
    }

    pub fn draw(&self, device: &D, command_buffer: D::CommandBuffer) {
        device.cmd_bind_vertex_buffer(command_buffer, &self.vertex_buffer);
        device.cmd_draw(command_buffer, Self::VERTEX_COUNT, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eruptao_vk::tracking::{ResourceKind, TrackingDevice};

    #[test]
    fn buffer_lives_as_long_as_the_last_owner() {
        let device = Arc::new(TrackingDevice::new());
        let quad = Arc::new(ScreenQuad::new(&device).unwrap());
        let sibling = quad.clone();
        assert_eq!(device.live_count_of(ResourceKind::Buffer), 1);

        drop(quad);
        assert_eq!(device.live_count_of(ResourceKind::Buffer), 1);
        drop(sibling);
        assert_eq!(device.live_count(), 0);
    }

    #[test]
    fn uploads_four_vertices() {
        let device = Arc::new(TrackingDevice::new());
        let _quad = ScreenQuad::new(&device).unwrap();
        let buffer = device.created(ResourceKind::Buffer)[0];
        assert_eq!(device.contents(buffer).unwrap().len(), 4 * ScreenQuad::<TrackingDevice>::vertex_stride() as usize);
    }
}
