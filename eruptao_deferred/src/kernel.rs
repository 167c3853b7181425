//! Hemisphere sample kernel used by the occlusion shader.

use itertools::Itertools;
use nalgebra_glm as glm;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std140::repr_std140;

pub const KERNEL_SIZE: usize = 64;

const MIN_SAMPLE_LENGTH: f32 = 1e-4;

/// One entry of the kernel uniform array.
#[repr_std140]
#[derive(Copy, Clone, Debug)]
pub struct GpuKernelSample {
    pub offset: std140::vec4,
}

/// Offsets in the +Z hemisphere of tangent space, denser near the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct KernelSampleSet {
    samples: Vec<glm::Vec4>,
}

impl KernelSampleSet {
    pub fn from_seed(seed: u64) -> Self {
        Self::generate(&mut StdRng::seed_from_u64(seed))
    }

    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let samples = (0..KERNEL_SIZE)
            .map(|i| {
                let direction = loop {
                    let v = glm::vec3(rng.gen_range(-1.0f32..1.0), rng.gen_range(-1.0f32..1.0), rng.gen_range(0.0f32..1.0));
                    if glm::length(&v) > MIN_SAMPLE_LENGTH {
                        break glm::normalize(&v);
                    }
                };
                let t = i as f32 / KERNEL_SIZE as f32;
                let scale = rng.gen::<f32>() * glm::lerp_scalar(0.1, 1.0, t * t);
                let offset = direction * scale;
                glm::vec4(offset.x, offset.y, offset.z, 0.0)
            })
            .collect_vec();
        Self { samples }
    }

    pub fn samples(&self) -> &[glm::Vec4] {
        &self.samples
    }

    pub fn to_gpu(&self) -> Vec<GpuKernelSample> {
        self.samples.iter().map(|s| GpuKernelSample { offset: eruptao_vk::std140::vec4(s) }).collect_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn kernel_has_fixed_size() {
        let kernel = KernelSampleSet::from_seed(7);
        assert_eq!(kernel.samples().len(), KERNEL_SIZE);
        assert_eq!(eruptao_vk::as_bytes(&kernel.to_gpu()).len(), KERNEL_SIZE * 16);
    }

    #[test]
    fn samples_lie_in_the_upper_unit_hemisphere() {
        for seed in 0..16 {
            for sample in KernelSampleSet::from_seed(seed).samples() {
                assert!(sample.z >= 0.0, "{sample:?}");
                assert_eq!(sample.w, 0.0);
                assert!(glm::length(&sample.xyz()) <= 1.0, "{sample:?}");
            }
        }
    }

    #[test]
    fn later_samples_reach_further() {
        let quarter = KERNEL_SIZE / 4;
        let mut near = 0.0;
        let mut far = 0.0;
        for seed in 0..32 {
            let kernel = KernelSampleSet::from_seed(seed);
            near += kernel.samples()[..quarter].iter().map(|s| glm::length(&s.xyz())).sum::<f32>();
            far += kernel.samples()[KERNEL_SIZE - quarter..].iter().map(|s| glm::length(&s.xyz())).sum::<f32>();
        }
        assert!(far > near * 2.0, "near {near}, far {far}");
    }

    #[test]
    fn same_seed_gives_identical_kernel() {
        let a = KernelSampleSet::from_seed(1234);
        let b = KernelSampleSet::from_seed(1234);
        for (a, b) in a.samples().iter().zip(b.samples()) {
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
            assert_eq!(a.z.to_bits(), b.z.to_bits());
        }
        assert_ne!(KernelSampleSet::from_seed(1), KernelSampleSet::from_seed(2));
    }

    #[test]
    fn gpu_layout_keeps_sample_order() {
        let kernel = KernelSampleSet::from_seed(3);
        let gpu = kernel.to_gpu();
        let floats = eruptao_vk::as_bytes(&gpu)
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect::<Vec<_>>();
        for (i, sample) in kernel.samples().iter().enumerate() {
            assert_relative_eq!(floats[i * 4], sample.x);
            assert_relative_eq!(floats[i * 4 + 1], sample.y);
            assert_relative_eq!(floats[i * 4 + 2], sample.z);
            assert_relative_eq!(floats[i * 4 + 3], 0.0);
        }
    }
}
