use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Layered noise parameters consumed by the density sampler.
///
/// Shared read-only by every sampling job; nothing mutates it after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// World units per base frequency. Must be non-zero.
    pub scale: f32,
    /// Frequency of the first layer.
    pub base_roughness: f32,
    /// Per-layer frequency multiplier.
    pub roughness: f32,
    /// Per-layer amplitude multiplier.
    pub persistence: f32,
    /// Output multiplier applied after clamping.
    pub strength: f32,
    /// Bias subtracted from the summed noise before clamping.
    pub recede: f32,
    /// Floor for the receded noise.
    pub min_value: f32,
    /// Octave count. Zero layers yields a flat field.
    pub num_layers: u32,
    /// Offset added to every coordinate before scaling.
    pub seed: i32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: 48.0,
            base_roughness: 1.0,
            roughness: 2.0,
            persistence: 0.5,
            strength: 16.0,
            recede: 0.0,
            min_value: -1.0,
            num_layers: 4,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// Reject values that would turn the field into NaN or Inf.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("scale", self.scale),
            ("base_roughness", self.base_roughness),
            ("roughness", self.roughness),
            ("persistence", self.persistence),
            ("strength", self.strength),
            ("recede", self.recede),
            ("min_value", self.min_value),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        if self.scale == 0.0 {
            return Err(ConfigError::ZeroScale);
        }
        Ok(())
    }
}
