use std::{fs, path::Path};

use anyhow::{anyhow, ensure, Context};
use serde_json as js;

pub const MAX_FRAMES_IN_FLIGHT: usize = 3;
/// Upper bound accepted for `frames_in_flight`.
pub const FRAMES_IN_FLIGHT_LIMIT: usize = 16;
/// Upper bound accepted for `noise_size`.
pub const NOISE_SIZE_LIMIT: u32 = 64;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SsaoSettings {
    pub frames_in_flight: usize,
    pub kernel_seed:      u64,
    /// Width and height of the tiled rotation texture.
    pub noise_size:       u32,
    /// View-space radius of the sampling hemisphere.
    pub radius:           f32,
    /// Depth offset that keeps flat surfaces from occluding themselves.
    pub bias:             f32,
    /// Occlusion value the target is cleared to before shading.
    pub clear_value:      f32,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            frames_in_flight: MAX_FRAMES_IN_FLIGHT,
            kernel_seed:      0x55a0,
            noise_size:       4,
            radius:           0.5,
            bias:             0.025,
            clear_value:      1.0,
        }
    }
}

impl SsaoSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file_contents =
            fs::read_to_string(path).with_context(|| format!("Cannot read SSAO settings from {}", path.display()))?;
        let json: js::Value = js::from_str(&file_contents)
            .with_context(|| format!("Cannot parse SSAO settings in {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Reads the keys present in `object`; absent keys keep their defaults.
    pub fn from_json(object: &js::Value) -> anyhow::Result<Self> {
        let object = object.as_object().ok_or_else(|| anyhow!("SSAO settings must be a JSON object"))?;
        let defaults = Self::default();

        let uint = |key: &str, default: u64| -> anyhow::Result<u64> {
            object
                .get(key)
                .map_or(Ok(default), |v| v.as_u64().ok_or_else(|| anyhow!("\"{key}\" must be an unsigned integer")))
        };
        let float = |key: &str, default: f32| -> anyhow::Result<f32> {
            object.get(key).map_or(Ok(default), |v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| anyhow!("\"{key}\" must be a number"))
            })
        };

        let settings = Self {
            frames_in_flight: usize::try_from(uint("frames_in_flight", defaults.frames_in_flight as u64)?)
                .context("\"frames_in_flight\" is out of range")?,
            kernel_seed:      uint("kernel_seed", defaults.kernel_seed)?,
            noise_size:       u32::try_from(uint("noise_size", defaults.noise_size as u64)?)
                .context("\"noise_size\" is out of range")?,
            radius:           float("radius", defaults.radius)?,
            bias:             float("bias", defaults.bias)?,
            clear_value:      float("clear_value", defaults.clear_value)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=FRAMES_IN_FLIGHT_LIMIT).contains(&self.frames_in_flight),
            "frames_in_flight must be within [1, {FRAMES_IN_FLIGHT_LIMIT}], got {}",
            self.frames_in_flight
        );
        ensure!(
            (1..=NOISE_SIZE_LIMIT).contains(&self.noise_size),
            "noise_size must be within [1, {NOISE_SIZE_LIMIT}], got {}",
            self.noise_size
        );
        ensure!(self.radius.is_finite() && self.radius > 0.0, "radius must be positive, got {}", self.radius);
        ensure!(self.bias.is_finite() && self.bias >= 0.0, "bias must not be negative, got {}", self.bias);
        ensure!(
            (0.0..=1.0).contains(&self.clear_value),
            "clear_value must be within [0, 1], got {}",
            self.clear_value
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let settings = SsaoSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.frames_in_flight, 3);
        assert_eq!(settings.noise_size, 4);
        assert_relative_eq!(settings.clear_value, 1.0);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = SsaoSettings::from_json(&js::json!({ "radius": 1.5, "frames_in_flight": 2 })).unwrap();
        assert_eq!(settings.frames_in_flight, 2);
        assert_relative_eq!(settings.radius, 1.5);
        assert_eq!(settings.kernel_seed, SsaoSettings::default().kernel_seed);
    }

    #[test]
    fn wrong_types_are_rejected() {
        let error = SsaoSettings::from_json(&js::json!({ "noise_size": "four" })).unwrap_err();
        assert!(error.to_string().contains("noise_size"));
        assert!(SsaoSettings::from_json(&js::json!([1, 2, 3])).is_err());
    }

    #[test]
    fn zero_frames_in_flight_is_rejected() {
        assert!(SsaoSettings::from_json(&js::json!({ "frames_in_flight": 0 })).is_err());
    }

    #[test]
    fn oversized_values_are_rejected() {
        let error = SsaoSettings::from_json(&js::json!({ "noise_size": 65536 })).unwrap_err();
        assert!(error.to_string().contains("noise_size"), "{error}");
        assert!(SsaoSettings::from_json(&js::json!({ "noise_size": NOISE_SIZE_LIMIT })).is_ok());

        let error = SsaoSettings::from_json(&js::json!({ "frames_in_flight": u64::MAX })).unwrap_err();
        assert!(format!("{error:#}").contains("frames_in_flight"), "{error:#}");
        assert!(SsaoSettings::from_json(&js::json!({ "frames_in_flight": FRAMES_IN_FLIGHT_LIMIT })).is_ok());
    }

    #[test]
    fn load_reads_a_settings_file() {
        let path = std::env::temp_dir().join(format!("eruptao-ssao-settings-{}.json", std::process::id()));
        fs::write(&path, r#"{ "frames_in_flight": 2, "noise_size": 8, "radius": 0.3 }"#).unwrap();
        let settings = SsaoSettings::load(&path);
        fs::remove_file(&path).unwrap();

        let settings = settings.unwrap();
        assert_eq!(settings.frames_in_flight, 2);
        assert_eq!(settings.noise_size, 8);
        assert_relative_eq!(settings.radius, 0.3);
        assert_relative_eq!(settings.bias, SsaoSettings::default().bias);
    }

    #[test]
    fn load_reports_the_path() {
        let error = SsaoSettings::load("/nonexistent/ssao.json").unwrap_err();
        assert!(format!("{error:#}").contains("/nonexistent/ssao.json"));
    }
}
