use std::path::Path;

use crate::constants::*;
use crate::error::ConfigError;
use crate::noise_config::NoiseConfig;
use glam::UVec3;
use serde::{Deserialize, Serialize};

/// Startup configuration for the streaming engine, loaded once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Cells per chunk along each axis.
    pub chunk_size: [u32; 3],
    /// View box extent in chunks along each axis.
    pub view_distance: [u32; 3],
    /// Surface threshold for mesh extraction.
    pub iso_level: f32,
    /// Seconds between throttled mesh completions.
    pub complete_interval: f32,
    /// Worker threads for density sampling. 0 = one per core.
    pub worker_threads: usize,
    pub noise: NoiseConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_size: [DEFAULT_CHUNK_SIZE; 3],
            view_distance: DEFAULT_VIEW_DISTANCE,
            iso_level: DEFAULT_ISO_LEVEL,
            complete_interval: DEFAULT_COMPLETE_INTERVAL,
            worker_threads: 0,
            noise: NoiseConfig::default(),
        }
    }
}

impl TerrainConfig {
    pub fn chunk_size(&self) -> UVec3 {
        UVec3::from_array(self.chunk_size)
    }

    pub fn view_distance(&self) -> UVec3 {
        UVec3::from_array(self.view_distance)
    }

    /// Check every startup invariant. Run before any chunk is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, size) in ['x', 'y', 'z'].into_iter().zip(self.chunk_size) {
            if size == 0 {
                return Err(ConfigError::ZeroChunkDimension { axis });
            }
        }
        for (axis, value) in ['x', 'y', 'z'].into_iter().zip(self.view_distance) {
            if value > i32::MAX as u32 {
                return Err(ConfigError::ViewDistanceTooLarge { axis, value });
            }
        }
        if !self.iso_level.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "iso_level",
                value: self.iso_level,
            });
        }
        if !self.complete_interval.is_finite() || self.complete_interval <= 0.0 {
            return Err(ConfigError::NonPositiveInterval(self.complete_interval));
        }
        self.noise.validate()
    }
}

/// Parse and validate a terrain config from RON text.
pub fn load_config_from_str(ron_str: &str) -> Result<TerrainConfig, ConfigError> {
    let options = ron::Options::default();
    let config: TerrainConfig = options
        .from_str(ron_str)
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a terrain config file.
pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
    load_config_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_full_config() {
        let ron = r#"(
            chunk_size: (16, 16, 16),
            view_distance: (4, 2, 4),
            iso_level: 0.5,
            complete_interval: 0.025,
            worker_threads: 2,
            noise: (
                scale: 32.0,
                base_roughness: 1.0,
                roughness: 2.0,
                persistence: 0.5,
                strength: 10.0,
                recede: 0.2,
                min_value: -1.0,
                num_layers: 3,
                seed: 7,
            ),
        )"#;
        let config = load_config_from_str(ron).expect("config parses");
        assert_eq!(config.chunk_size(), UVec3::splat(16));
        assert_eq!(config.view_distance(), UVec3::new(4, 2, 4));
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.noise.num_layers, 3);
        assert_eq!(config.noise.seed, 7);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = load_config_from_str("(iso_level: 0.0, noise: (seed: 3))").expect("parses");
        assert_eq!(config.iso_level, 0.0);
        assert_eq!(config.noise.seed, 3);
        assert_eq!(config.noise.scale, NoiseConfig::default().scale);
        assert_eq!(config.chunk_size, [DEFAULT_CHUNK_SIZE; 3]);
    }

    #[test]
    fn test_zero_scale_rejected_at_load() {
        let err = load_config_from_str("(noise: (scale: 0.0))").unwrap_err();
        assert_eq!(err, ConfigError::ZeroScale);
    }

    #[test]
    fn test_zero_chunk_dimension_rejected() {
        let err = load_config_from_str("(chunk_size: (16, 0, 16))").unwrap_err();
        assert_eq!(err, ConfigError::ZeroChunkDimension { axis: 'y' });
    }

    #[test]
    fn test_view_distance_beyond_coordinate_range_rejected() {
        let err = load_config_from_str("(view_distance: (4, 4, 4294967295))").unwrap_err();
        assert_eq!(
            err,
            ConfigError::ViewDistanceTooLarge {
                axis: 'z',
                value: u32::MAX
            }
        );
    }

    #[test]
    fn test_non_positive_interval_rejected() {
        let err = load_config_from_str("(complete_interval: 0.0)").unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveInterval(0.0));
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        let err = load_config_from_str("(chunk_size: [oops").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config_from_path(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = load_config_from_str(include_str!("../../../data/terrain.ron"))
            .expect("shipped config parses");
        assert_eq!(config, TerrainConfig::default());
    }
}
