use erupt::vk;
use eruptao_vk::device::TextureInfo;
use nalgebra_glm as glm;
use rand::Rng;

pub const NOISE_FORMAT: vk::Format = vk::Format::R32G32B32A32_SFLOAT;

/// Random rotations around the surface normal, tiled over the screen.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseTexture {
    size:   u32,
    texels: Vec<glm::Vec4>,
}

impl NoiseTexture {
    pub fn generate<R: Rng>(rng: &mut R, size: u32) -> Self {
        let texels = (0..(size as usize).pow(2))
            .map(|_| glm::vec4(rng.gen_range(-1.0f32..1.0), rng.gen_range(-1.0f32..1.0), 0.0, 0.0))
            .collect();
        Self { size, texels }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn texels(&self) -> &[glm::Vec4] {
        &self.texels
    }

    pub fn texture_info(&self) -> TextureInfo {
        TextureInfo { format: NOISE_FORMAT, extent: vk::Extent2D { width: self.size, height: self.size } }
    }

    /// Tightly packed RGBA32F rows, ready for a buffer-to-image copy.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.texels.iter().flat_map(|t| t.iter().flat_map(|c| c.to_ne_bytes())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn texels_rotate_around_z() {
        let noise = NoiseTexture::generate(&mut StdRng::seed_from_u64(5), 4);
        assert_eq!(noise.texels().len(), 16);
        for texel in noise.texels() {
            assert!((-1.0..1.0).contains(&texel.x));
            assert!((-1.0..1.0).contains(&texel.y));
            assert_eq!(texel.z, 0.0);
            assert_eq!(texel.w, 0.0);
        }
    }

    #[test]
    fn bytes_match_texture_size() {
        let noise = NoiseTexture::generate(&mut StdRng::seed_from_u64(5), 4);
        let info = noise.texture_info();
        assert_eq!(info.extent.width, 4);
        assert_eq!(info.extent.height, 4);
        assert_eq!(noise.to_bytes().len(), 4 * 4 * 16);
    }

    #[test]
    fn size_sets_the_texel_count() {
        let noise = NoiseTexture::generate(&mut StdRng::seed_from_u64(9), 8);
        assert_eq!(noise.size(), 8);
        assert_eq!(noise.texels().len(), 64);
    }
}
